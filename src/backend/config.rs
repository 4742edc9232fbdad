//! Backend Configuration
//!
//! Fixed network constants plus interpreter and script path resolution.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::ShellError;

/// Port the Flask backend serves on.
pub const DEFAULT_PORT: u16 = 5000;

/// The backend only ever binds loopback.
pub const BACKEND_HOST: &str = "127.0.0.1";

/// Script the interpreter is launched with.
pub const BACKEND_SCRIPT: &str = "app.py";

/// Root URL the window loads and the readiness probe targets.
pub fn base_url(port: u16) -> String {
    format!("http://{}:{}", BACKEND_HOST, port)
}

/// Pick the Python interpreter for the backend.
///
/// Prefers a virtualenv sitting next to the script, falls back to the
/// system interpreter.
pub fn resolve_interpreter(script_dir: &Path) -> PathBuf {
    let venv = if cfg!(target_os = "windows") {
        script_dir.join(".venv").join("Scripts").join("python.exe")
    } else {
        script_dir.join(".venv").join("bin").join("python")
    };

    if venv.exists() {
        return venv;
    }

    if cfg!(target_os = "windows") {
        PathBuf::from("python")
    } else {
        PathBuf::from("python3")
    }
}

/// Locate the directory containing the backend script.
///
/// Packaged builds ship the script next to the executable; in development
/// it lives in the project root, so the current directory and a few
/// parents are checked as well.
pub fn resolve_script_dir() -> Result<PathBuf, ShellError> {
    if let Ok(exe_path) = env::current_exe() {
        if let Some(dir) = exe_path.parent() {
            if dir.join(BACKEND_SCRIPT).exists() {
                return Ok(dir.to_path_buf());
            }
        }
    }

    let cwd = env::current_dir()?;
    find_script_dir_from(&cwd).ok_or_else(|| ShellError::ScriptNotFound(cwd.join(BACKEND_SCRIPT)))
}

/// Walk from `start` up to three parent directories looking for the script.
pub fn find_script_dir_from(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    for _ in 0..=3 {
        if current.join(BACKEND_SCRIPT).exists() {
            return Some(current);
        }
        current = current.parent()?.to_path_buf();
    }
    None
}
