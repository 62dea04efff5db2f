//! Local viewer launch
//!
//! Once the session answers, a Chrome-family browser is opened in app mode
//! pointed at the tunnel's local address. Failing to open a viewer never
//! fails the session; the URL is printed either way and the user can open
//! it by hand.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// PATH names tried in order before falling back to fixed install paths.
const CHROME_CANDIDATES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

/// Standard macOS install location
const MAC_CHROME: &str = "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome";

/// Windows install location as seen from WSL
const WSL_CHROME: &str = "/mnt/c/Program Files (x86)/Google/Chrome/Application/chrome.exe";

/// Arguments for a minimal app-mode window.
///
/// Incognito keeps the session out of browser history and extension state;
/// the remote server holds everything worth keeping.
pub fn app_mode_args(url: &str) -> Vec<String> {
    vec![
        format!("--app={}", url),
        "--disable-extensions".to_string(),
        "--disable-plugins".to_string(),
        "--incognito".to_string(),
    ]
}

/// Find an executable by name on a PATH-style variable value.
pub fn find_in_path_in(name: &str, path_var: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    find_in_path_in(name, &path_var)
}

fn find_chrome() -> Option<PathBuf> {
    for name in CHROME_CANDIDATES {
        if let Some(found) = find_in_path(name) {
            return Some(found);
        }
    }
    [MAC_CHROME, WSL_CHROME]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Open a viewer for `url`.
///
/// Prefers a Chrome-family app-mode window, falling back to the platform's
/// default URL handler. The browser is spawned and left alone; its lifetime
/// is independent of the session.
pub fn launch(url: &str) {
    if let Some(chrome) = find_chrome() {
        let spawned = Command::new(&chrome)
            .args(app_mode_args(url))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(_) => return,
            Err(e) => {
                tracing::warn!("failed to launch {}: {}", chrome.display(), e);
            }
        }
    }

    if let Err(e) = open::that(url) {
        tracing::warn!("failed to open {}: {}", url, e);
    }
}
