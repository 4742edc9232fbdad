//! Window Presenter
//!
//! Creates the single main window pointed at the backend's root page.

use tauri::{AppHandle, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

use crate::error::ShellError;

/// Label of the one and only application window.
pub const MAIN_WINDOW_LABEL: &str = "main";

/// Window title.
const WINDOW_TITLE: &str = "Dataport";

/// Icon used for window chrome.
const WINDOW_ICON: &[u8] = include_bytes!("../icons/app-icon.png");

/// Create the main window: hidden at first, maximized, loading the backend
/// URL, then revealed once the load has been kicked off.
pub fn create_main_window(app: &AppHandle, base_url: &str) -> Result<WebviewWindow, ShellError> {
    let url = base_url
        .parse::<tauri::Url>()
        .map_err(|e| ShellError::InvalidUrl(format!("{}: {}", base_url, e)))?;

    let icon = tauri::image::Image::from_bytes(WINDOW_ICON)?;
    let window = WebviewWindowBuilder::new(app, MAIN_WINDOW_LABEL, WebviewUrl::External(url))
        .title(WINDOW_TITLE)
        .icon(icon)?
        .visible(false)
        .maximized(true)
        .build()?;

    window.show()?;
    window.set_focus()?;

    log::info!("[window] main window opened on {}", base_url);
    Ok(window)
}
