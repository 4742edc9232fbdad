//! Backend Process Management
//!
//! Spawns the Python backend and handles signal delivery for teardown.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, Stdio};

use super::config::{resolve_interpreter, BACKEND_SCRIPT};

/// Spawn the backend interpreter with the script as its only argument.
///
/// stdin is closed; stdout/stderr are piped so they can be forwarded to
/// the application log.
pub fn spawn_backend(script_dir: &Path) -> std::io::Result<Child> {
    let interpreter = resolve_interpreter(script_dir);

    log::info!("[backend] interpreter: {}", interpreter.display());
    log::info!("[backend] working directory: {}", script_dir.display());

    let mut cmd = Command::new(&interpreter);
    cmd.arg(BACKEND_SCRIPT)
        .current_dir(script_dir)
        .env("PYTHONUNBUFFERED", "1")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // Windows-specific: hide console window
    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW
    }

    cmd.spawn()
}

/// Forward the child's stdout/stderr to the log, line by line.
pub fn forward_output(child: &mut Child) {
    if let Some(stdout) = child.stdout.take() {
        let reader = BufReader::new(stdout);
        std::thread::spawn(move || {
            for line in reader.lines().map_while(Result::ok) {
                if !line.is_empty() {
                    log::info!("[backend] {}", line);
                }
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        let reader = BufReader::new(stderr);
        std::thread::spawn(move || {
            for line in reader.lines().map_while(Result::ok) {
                if line.is_empty() {
                    continue;
                }
                // Flask logs everything to stderr, so only real failures go to error level
                if line.contains("ERROR") || line.contains("Traceback") {
                    log::error!("[backend] {}", line);
                } else {
                    log::info!("[backend] {}", line);
                }
            }
        });
    }
}

/// Gracefully interrupt a process (Ctrl+C equivalent).
#[cfg(not(target_os = "windows"))]
pub fn interrupt_process(pid: u32) {
    let _ = Command::new("kill").args(["-2", &pid.to_string()]).output();
}

#[cfg(target_os = "windows")]
pub fn interrupt_process(pid: u32) {
    // Graceful tree kill (no /F flag)
    let _ = Command::new("taskkill")
        .args(["/pid", &pid.to_string(), "/T"])
        .output();
}

/// Force kill a process by PID.
#[cfg(not(target_os = "windows"))]
pub fn force_kill_process(pid: u32) {
    let _ = Command::new("kill").args(["-9", &pid.to_string()]).output();
}

#[cfg(target_os = "windows")]
pub fn force_kill_process(pid: u32) {
    let _ = Command::new("taskkill")
        .args(["/pid", &pid.to_string(), "/T", "/F"])
        .output();
}
