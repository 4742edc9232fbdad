//! Shell error type covering backend startup and window creation failures.

use std::path::PathBuf;

/// Everything that can go wrong between launch and a visible window.
#[derive(Debug)]
pub enum ShellError {
    Io(std::io::Error),
    PortInUse { port: u16 },
    ScriptNotFound(PathBuf),
    StartupTimeout { attempts: u32 },
    StartupCancelled,
    Http(String),
    InvalidUrl(String),
    Window(tauri::Error),
}

impl std::fmt::Display for ShellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShellError::Io(e) => write!(f, "I/O error: {}", e),
            ShellError::PortInUse { port } => {
                write!(f, "Port {} is already in use by another process", port)
            }
            ShellError::ScriptNotFound(path) => {
                write!(f, "Backend script not found: {}", path.display())
            }
            ShellError::StartupTimeout { attempts } => {
                write!(f, "Backend did not become ready after {} probes", attempts)
            }
            ShellError::StartupCancelled => write!(f, "Backend startup cancelled"),
            ShellError::Http(msg) => write!(f, "HTTP client error: {}", msg),
            ShellError::InvalidUrl(url) => write!(f, "Invalid backend URL: {}", url),
            ShellError::Window(e) => write!(f, "Window error: {}", e),
        }
    }
}

impl std::error::Error for ShellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShellError::Io(e) => Some(e),
            ShellError::Window(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ShellError {
    fn from(e: std::io::Error) -> Self {
        ShellError::Io(e)
    }
}

impl From<tauri::Error> for ShellError {
    fn from(e: tauri::Error) -> Self {
        ShellError::Window(e)
    }
}
