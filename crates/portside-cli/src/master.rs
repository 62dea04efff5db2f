//! Shared ssh master connection
//!
//! One authenticated master process carries every later ssh and rsync
//! invocation over its control socket, so the user types a password at most
//! once per session. The master is optional: if it fails to come up the
//! session continues with per-command authentication.

use portside_core::error::MasterError;
use portside_core::{ssh, ExternalCommand};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::options::ExternalTools;

/// Control socket path template, expanded per-connection by ssh itself.
pub const CONTROL_PATH: &str = "~/.ssh/portside-%h-%p-%r";

/// Directory holding the user's ssh credentials and the control socket
pub const SSH_DIR: &str = "~/.ssh";

/// Permission bits that should not be set on the ssh directory
const UNSAFE_MODE_MASK: u32 = 0o022;

const READY_MAX_TRIES: u32 = 30;
const READY_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

/// Check that `~/.ssh` exists and is not group or world writable.
///
/// Returns whether connection sharing should be attempted. A writable ssh
/// directory only produces a warning when sharing was requested, since ssh
/// itself will refuse the control socket there.
pub fn check_credentials_dir(reuse_requested: bool) -> bool {
    let dir = portside_core::paths::expand_path(SSH_DIR);
    let metadata = match std::fs::symlink_metadata(&dir) {
        Ok(m) => m,
        Err(_) => {
            if reuse_requested {
                crate::output::print_warning(&format!(
                    "{} does not exist, disabling connection reuse",
                    dir.display()
                ));
            }
            return false;
        }
    };

    if !metadata.is_dir() {
        if reuse_requested {
            crate::output::print_warning(&format!(
                "{} is not a directory, disabling connection reuse",
                dir.display()
            ));
        }
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = metadata.permissions().mode();
        if mode & UNSAFE_MODE_MASK != 0 {
            if reuse_requested {
                crate::output::print_warning(&format!(
                    "{} has unsafe permissions {:o}, disabling connection reuse",
                    dir.display(),
                    mode & 0o777
                ));
            }
            return false;
        }
    }

    true
}

/// A running ssh master process and the flags that route through it.
#[derive(Debug)]
pub struct MasterConnection {
    pid: Option<u32>,
    exit_rx: watch::Receiver<bool>,
    cancel: CancellationToken,
    closed: bool,
    flags: Vec<String>,
}

impl MasterConnection {
    /// Start a master connection and wait until its control socket answers.
    ///
    /// The returned flags include the ControlPath routing and must be used
    /// on every subsequent ssh and rsync invocation for the session.
    pub async fn start(
        tools: &ExternalTools,
        base_flags: &[String],
        host: &str,
    ) -> Result<Self, MasterError> {
        let mut flags = base_flags.to_vec();
        flags.extend(ssh::control_path_flags(CONTROL_PATH));

        let mut cmd = ssh::master(&tools.ssh, &flags, host).build();
        cmd.stdin(std::process::Stdio::inherit())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::inherit());

        let mut child = cmd.spawn()?;
        let pid = child.id();

        let (exit_tx, exit_rx) = watch::channel(false);
        tokio::spawn(async move {
            let _ = child.wait().await;
            let _ = exit_tx.send(true);
        });

        let mut conn = Self {
            pid,
            exit_rx,
            cancel: CancellationToken::new(),
            closed: false,
            flags,
        };

        if let Err(e) = conn.wait_ready(tools, host).await {
            conn.close();
            return Err(e);
        }
        Ok(conn)
    }

    /// Flags routing through the master's control socket.
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// Poll `ssh -O check` until the control socket answers.
    ///
    /// Fails fast if the master process exits, which is what happens on
    /// authentication failure or an unreachable host.
    async fn wait_ready(&mut self, tools: &ExternalTools, host: &str) -> Result<(), MasterError> {
        for attempt in 0..READY_MAX_TRIES {
            if *self.exit_rx.borrow() {
                return Err(MasterError::NotRunning);
            }

            let check = check_command(&tools.ssh, &self.flags, host);
            if let Ok(status) = check.run_quiet().await {
                if status.success() {
                    tracing::debug!("master ready after {} attempts", attempt + 1);
                    return Ok(());
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(READY_INTERVAL) => {}
                _ = self.cancel.cancelled() => return Err(MasterError::NotRunning),
                _ = self.exit_rx.changed() => {}
            }
        }
        Err(MasterError::NotReady {
            attempts: READY_MAX_TRIES,
        })
    }

    /// Terminate the master process. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if !*self.exit_rx.borrow() {
            #[cfg(unix)]
            if let Some(pid) = self.pid {
                unsafe {
                    libc::kill(pid as libc::pid_t, libc::SIGTERM);
                }
            }
        }
        self.cancel.cancel();
    }
}

impl Drop for MasterConnection {
    fn drop(&mut self) {
        self.close();
    }
}

fn check_command(ssh_program: &str, flags: &[String], host: &str) -> ExternalCommand {
    ssh::master_check(ssh_program, flags, host)
}
