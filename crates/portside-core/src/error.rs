//! Core error types for portside

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the portside ecosystem
#[derive(Error, Debug)]
pub enum PortsideError {
    /// Host resolution error
    #[error("failed to resolve host: {0}")]
    Resolve(#[from] ResolveError),

    /// Master connection error
    #[error("master connection error: {0}")]
    Master(#[from] MasterError),

    /// Remote bootstrap error
    #[error("bootstrap error: {0}")]
    Bootstrap(#[from] BootstrapError),

    /// Settings/extensions sync error
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Session error
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Local path resolution error
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Host resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The lookup delegate could not be run or exited with a failure
    #[error("address lookup failed:\n---lookup cmd---\n{command}\n{output}")]
    LookupFailed { command: String, output: String },

    /// The lookup delegate produced output that does not look like a
    /// transport command line
    #[error("unexpected output for '{command}' command, {output}")]
    MalformedLookup { command: String, output: String },
}

/// Master connection errors
///
/// These never abort a session; the caller degrades to one transport
/// connection per invocation.
#[derive(Error, Debug)]
pub enum MasterError {
    /// The master process could not be spawned
    #[error("failed to start master process: {0}")]
    Spawn(#[from] std::io::Error),

    /// The master process exited before it became ready
    #[error("master process is not running")]
    NotRunning,

    /// The master did not answer control checks in time
    #[error("master wasn't ready on time: max number of tries exceeded: {attempts}")]
    NotReady { attempts: u32 },
}

/// Remote bootstrap errors
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// The local server binary path does not point at a regular file
    #[error("server binary path is not a file: {0}")]
    NotAFile(PathBuf),

    /// Transfer of the local server binary failed
    #[error("failed to upload server binary to '{dest}': {detail}")]
    Transfer { dest: String, detail: String },

    /// The remote chmod failed; the message carries the exact command line
    #[error("failed to make server binary executable:\n---ssh cmd---\n{command}\n{detail}")]
    Chmod { command: String, detail: String },

    /// The remote install script failed; the message carries the exact
    /// command line and the full script body
    #[error(
        "failed to update server binary:\n---ssh cmd---\n{command}\n---install script---\n{script}\n{detail}"
    )]
    Script {
        command: String,
        script: String,
        detail: String,
    },
}

/// Settings/extensions sync errors
#[derive(Error, Debug)]
pub enum SyncError {
    /// The mirroring tool exited with a failure
    #[error("failed to rsync '{src}' to '{dest}': {detail}")]
    Failed {
        src: String,
        dest: String,
        detail: String,
    },
}

/// Session lifecycle errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// No free local port was found
    #[error("failed to find available port: max number of tries exceeded: {tries}")]
    PortExhausted { tries: u32 },

    /// The bind address could not be parsed as host:port
    #[error("failed to parse bind address '{0}'")]
    InvalidBindAddr(String),

    /// The tunnel process could not be spawned
    #[error("failed to start server tunnel: {0}")]
    TunnelStart(String),

    /// The remote server never answered the readiness probe
    #[error("server didn't respond at {url} within {timeout_secs}s")]
    ReadinessTimeout { url: String, timeout_secs: u64 },
}

/// Local path resolution errors
#[derive(Error, Debug)]
pub enum PathError {
    /// The running OS has no known dataset directory layout
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(&'static str),

    /// The home directory could not be determined
    #[error("home directory not found")]
    NoHome,
}
