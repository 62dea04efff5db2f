//! Port-forwarded session tunnel
//!
//! One ssh process does double duty: it forwards the local bind address to
//! the server's remote port and runs the server itself on the far end. When
//! either side goes away the process exits, which is the session's natural
//! end signal.

use portside_core::error::SessionError;
use portside_core::script::SERVER_BINARY_PATH;
use portside_core::ssh;
use tokio::process::Child;
use tokio::sync::oneshot;

use crate::options::ExternalTools;

/// Shell command the tunnel runs on the remote host.
pub fn remote_command(dir: &str, remote_port: u16) -> String {
    format!(
        "cd {}; {} --host 127.0.0.1 --auth none --port={}",
        dir, SERVER_BINARY_PATH, remote_port
    )
}

/// A running tunnel process.
#[derive(Debug)]
pub struct Tunnel {
    child: Child,
}

/// Start the tunnel and remote server.
///
/// The child inherits all three stdio streams: the server's output is the
/// session's output, and an interactive prompt from ssh must reach the user.
pub fn start(
    tools: &ExternalTools,
    flags: &[String],
    host: &str,
    bind_addr: &str,
    remote_port: u16,
    dir: &str,
) -> Result<Tunnel, SessionError> {
    let cmd = ssh::tunnel(
        &tools.ssh,
        flags,
        host,
        bind_addr,
        remote_port,
        &remote_command(dir, remote_port),
    );
    tracing::debug!("starting tunnel: {}", cmd.render());

    let mut process = cmd.build();
    process
        .stdin(std::process::Stdio::inherit())
        .stdout(std::process::Stdio::inherit())
        .stderr(std::process::Stdio::inherit());

    let child = process
        .spawn()
        .map_err(|e| SessionError::TunnelStart(e.to_string()))?;
    Ok(Tunnel { child })
}

impl Tunnel {
    /// Convert the tunnel into an exit notification.
    ///
    /// The returned receiver fires when the tunnel process ends for any
    /// reason. The process itself is left to the session teardown; on a
    /// user interrupt the terminal's signal reaches it directly.
    pub fn observe_exit(mut self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = self.child.wait().await;
            let _ = tx.send(());
        });
        rx
    }
}
