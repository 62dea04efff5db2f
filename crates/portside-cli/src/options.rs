//! Session configuration carried from the CLI into the lifecycle controller

use std::path::PathBuf;

/// Names of the external programs the session shells out to.
///
/// Kept as plain strings so tests can substitute recording stand-ins by
/// prepending a directory to PATH or by naming them outright.
#[derive(Debug, Clone)]
pub struct ExternalTools {
    pub ssh: String,
    pub rsync: String,
    pub lookup: String,
}

impl Default for ExternalTools {
    fn default() -> Self {
        Self {
            ssh: "ssh".to_string(),
            rsync: "rsync".to_string(),
            lookup: "gcloud".to_string(),
        }
    }
}

/// Per-session knobs collected from the command line.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Skip settings and extensions sync entirely
    pub skip_sync: bool,
    /// Mirror remote changes back to the local datasets on shutdown
    pub sync_back: bool,
    /// Do not launch a local viewer once the session is ready
    pub no_open: bool,
    /// Maintain a shared ssh master connection for the session
    pub reuse_connection: bool,
    /// Local bind address for the tunnel, `host:port` with either side optional
    pub bind_addr: Option<String>,
    /// Remote port for the server to listen on
    pub remote_port: Option<u16>,
    /// Extra flags passed through to every ssh invocation
    pub ssh_flags: String,
    /// Upload this local server binary instead of downloading a release
    pub upload_server: Option<PathBuf>,
}

/// Build identification for startup diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tools() {
        let tools = ExternalTools::default();
        assert_eq!(tools.ssh, "ssh");
        assert_eq!(tools.rsync, "rsync");
        assert_eq!(tools.lookup, "gcloud");
    }

    #[test]
    fn test_build_info_version_nonempty() {
        assert!(!BuildInfo::current().version.is_empty());
    }
}
