//! Backend process lifecycle: spawn, readiness polling, teardown.

pub mod config;
pub mod health;
pub mod manager;
pub mod process;

pub use manager::BackendManager;
