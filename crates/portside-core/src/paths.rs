//! Local dataset directory resolution
//!
//! Where the user's settings and extensions live on this machine. Environment
//! overrides win over platform defaults so tests and unusual installations
//! can redirect both datasets.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::PathError;

/// Environment override for the local settings directory
pub const SETTINGS_DIR_ENV: &str = "PORTSIDE_SETTINGS_DIR";

/// Environment override for the local extensions directory
pub const EXTENSIONS_DIR_ENV: &str = "PORTSIDE_EXTENSIONS_DIR";

/// Resolve the local settings directory.
pub fn settings_dir() -> Result<PathBuf, PathError> {
    if let Ok(overridden) = std::env::var(SETTINGS_DIR_ENV) {
        return Ok(expand_path(&overridden));
    }

    #[cfg(target_os = "linux")]
    {
        Ok(home_dir()?.join(".config/Portside/User"))
    }

    #[cfg(target_os = "macos")]
    {
        Ok(home_dir()?.join("Library/Application Support/Portside/User"))
    }

    #[cfg(target_os = "windows")]
    {
        // Keep the Linux-shaped spelling that gitbash tooling understands.
        Ok(crate::translate::gitbash_windows_dir(
            &home_dir()?.join(".config/Portside/User"),
        ))
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        Err(PathError::UnsupportedPlatform(std::env::consts::OS))
    }
}

/// Resolve the local extensions directory.
pub fn extensions_dir() -> Result<PathBuf, PathError> {
    if let Ok(overridden) = std::env::var(EXTENSIONS_DIR_ENV) {
        return Ok(expand_path(&overridden));
    }

    #[cfg(any(target_os = "linux", target_os = "macos"))]
    {
        Ok(home_dir()?.join(".portside/extensions"))
    }

    #[cfg(target_os = "windows")]
    {
        Ok(crate::translate::gitbash_windows_dir(
            &home_dir()?.join(".portside/extensions"),
        ))
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        Err(PathError::UnsupportedPlatform(std::env::consts::OS))
    }
}

#[allow(dead_code)]
fn home_dir() -> Result<PathBuf, PathError> {
    dirs::home_dir().ok_or(PathError::NoHome)
}

/// Expand `$VAR` / `${VAR}` references and a leading tilde.
///
/// A tilde anywhere but the front is a valid filename character and is left
/// alone.
pub fn expand_path(path: &str) -> PathBuf {
    let expanded = expand_env(path);
    if let Some(home) = dirs::home_dir() {
        if expanded == "~" {
            return home;
        }
        if let Some(rest) = expanded.strip_prefix("~/") {
            return home.join(rest);
        }
    }
    PathBuf::from(expanded)
}

/// Substitute `$VAR` and `${VAR}` with environment values.
///
/// Unset variables expand to the empty string. A `$` not followed by a name
/// passes through unchanged.
pub fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if closed {
                    out.push_str(&std::env::var(&name).unwrap_or_default());
                } else {
                    out.push_str("${");
                    out.push_str(&name);
                }
            }
            Some(&n) if n == '_' || n.is_ascii_alphanumeric() => {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if n == '_' || n.is_ascii_alphanumeric() {
                        name.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(&std::env::var(&name).unwrap_or_default());
            }
            _ => out.push('$'),
        }
    }
    out
}

/// Create a directory if it does not exist.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}
