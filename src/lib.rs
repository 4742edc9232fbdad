//! Dataport desktop shell.
//!
//! Starts the local Flask backend, waits for it to answer on its loopback
//! port, then opens a maximized webview window on it. Closing the window
//! shuts the backend down; once all windows are gone the app exits.

pub mod backend;
pub mod error;
pub mod window;

use tauri::Manager;
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};

use backend::config::DEFAULT_PORT;
use backend::BackendManager;
use error::ShellError;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let mut builder = tauri::Builder::default();

    // Second launch focuses the existing window instead of spawning a second backend
    #[cfg(desktop)]
    {
        builder = builder.plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
            if let Some(window) = app.get_webview_window(window::MAIN_WINDOW_LABEL) {
                let _ = window.show();
                let _ = window.unminimize();
                let _ = window.set_focus();
            }
        }));
    }

    builder
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            app.handle().plugin(
                tauri_plugin_log::Builder::default()
                    .level(log::LevelFilter::Info)
                    .build(),
            )?;

            app.manage(BackendManager::new(DEFAULT_PORT));

            let handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                let manager = handle.state::<BackendManager>();
                match manager.start().await {
                    Ok(()) => {
                        if manager.is_shutting_down() {
                            return;
                        }
                        if let Err(e) = window::create_main_window(&handle, &manager.base_url()) {
                            log::error!("[shell] window creation failed: {}", e);
                            fail_startup(&handle, &e);
                        }
                    }
                    Err(ShellError::StartupCancelled) => {
                        log::info!("[shell] startup cancelled before backend became ready");
                    }
                    Err(e) => {
                        log::error!("[shell] backend startup failed: {}", e);
                        fail_startup(&handle, &e);
                    }
                }
            });

            Ok(())
        })
        .on_window_event(|window, event| {
            if let tauri::WindowEvent::CloseRequested { .. } = event {
                if window.label() == window::MAIN_WINDOW_LABEL {
                    let handle = window.app_handle().clone();
                    tauri::async_runtime::spawn(async move {
                        let manager = handle.state::<BackendManager>();
                        if let Err(e) = manager.stop().await {
                            log::warn!("[shell] backend shutdown failed: {}", e);
                        }
                    });
                }
            }
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| {
            if let tauri::RunEvent::Exit = event {
                // The child must not outlive the shell
                if let Some(manager) = app_handle.try_state::<BackendManager>() {
                    manager.force_kill();
                }
            }
        });
}

/// Report a fatal startup error and exit with a nonzero code.
fn fail_startup(handle: &tauri::AppHandle, err: &ShellError) {
    handle
        .dialog()
        .message(format!("Dataport could not start: {}", err))
        .title("Dataport")
        .kind(MessageDialogKind::Error)
        .blocking_show();
    handle.exit(1);
}
