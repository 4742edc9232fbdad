//! Backend Manager
//!
//! Owns the backend child process and its shutdown flag. Event handlers
//! reach it through Tauri managed state; nothing lives in module globals.

use std::process::Child;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::time::Duration;

use super::config::{base_url, resolve_script_dir};
use super::health::{is_port_free, wait_for_ready, RetryPolicy};
use super::process::{force_kill_process, forward_output, interrupt_process, spawn_backend};
use crate::error::ShellError;

/// How long a graceful shutdown may take before the child is force killed.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Escalate from interrupt to kill after this long.
const ESCALATE_AFTER: Duration = Duration::from_secs(5);

/// Lifecycle coordinator for the single backend process.
pub struct BackendManager {
    process: Arc<Mutex<Option<Child>>>,
    port: u16,
    shutting_down: Arc<AtomicBool>,
}

impl BackendManager {
    pub fn new(port: u16) -> Self {
        Self {
            process: Arc::new(Mutex::new(None)),
            port,
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Root URL the backend serves on.
    pub fn base_url(&self) -> String {
        base_url(self.port)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    pub async fn is_running(&self) -> bool {
        self.process.lock().await.is_some()
    }

    /// Spawn the backend and wait for it to become ready.
    ///
    /// The child is spawned at most once per run: a second call while the
    /// process is held is a no-op.
    pub async fn start(&self) -> Result<(), ShellError> {
        if self.is_running().await {
            log::info!("[backend] already running");
            return Ok(());
        }

        if !is_port_free(self.port) {
            return Err(ShellError::PortInUse { port: self.port });
        }

        let script_dir = resolve_script_dir()?;
        log::info!("[backend] starting server on port {}", self.port);

        let mut child = spawn_backend(&script_dir)?;
        let pid = child.id();
        forward_output(&mut child);
        *self.process.lock().await = Some(child);

        let policy = RetryPolicy::default();
        if let Err(e) = wait_for_ready(&self.base_url(), &policy, &self.shutting_down).await {
            // Never leave a half-started child behind
            let mut guard = self.process.lock().await;
            kill_now(&mut guard);
            return Err(e);
        }

        log::info!("[backend] started successfully (PID: {})", pid);
        Ok(())
    }

    /// Shut the backend down gracefully, escalating to a hard kill.
    ///
    /// Sends exactly one interrupt: once the handle is cleared, further
    /// calls are no-ops.
    pub async fn stop(&self) -> Result<(), ShellError> {
        self.shutting_down.store(true, Ordering::SeqCst);

        let mut guard = self.process.lock().await;
        let Some(child) = guard.as_mut() else {
            log::info!("[backend] not running");
            return Ok(());
        };

        let pid = child.id();
        log::info!("[backend] sending interrupt to PID {}", pid);
        interrupt_process(pid);

        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    log::info!("[backend] stopped gracefully ({})", status);
                    *guard = None;
                    return Ok(());
                }
                Ok(None) => {
                    if start.elapsed() > SHUTDOWN_GRACE {
                        break;
                    }
                    if start.elapsed() > ESCALATE_AFTER {
                        let _ = child.kill();
                    }
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                Err(e) => {
                    log::error!("[backend] error checking process status: {}", e);
                    break;
                }
            }
        }

        log::warn!("[backend] graceful shutdown timed out, force killing");
        kill_now(&mut guard);
        Ok(())
    }

    /// Synchronous best-effort kill, for app exit paths.
    pub fn force_kill(&self) {
        if let Ok(mut guard) = self.process.try_lock() {
            kill_now(&mut guard);
        }
    }
}

impl Drop for BackendManager {
    fn drop(&mut self) {
        self.force_kill();
    }
}

fn kill_now(guard: &mut Option<Child>) {
    if let Some(child) = guard.as_mut() {
        force_kill_process(child.id());
        let _ = child.kill();
        let _ = child.wait();
    }
    *guard = None;
}
