//! Session lifecycle controller
//!
//! Drives one remote session front to back: resolve the host, pick local
//! and remote ports, optionally establish a shared master connection,
//! provision the server binary, push settings, open the tunnel, wait for
//! the server to answer, hand the user a viewer, then supervise until the
//! tunnel exits or the user interrupts. Shutdown optionally mirrors remote
//! changes back before the master connection is torn down.

use portside_core::error::{PortsideError, SessionError};
use portside_core::invoke::split_flags;

use crate::master::{self, MasterConnection};
use crate::options::{ExternalTools, SessionOptions};
use crate::output::{print_error, print_info, print_success};
use crate::sync::{self, SyncDirection, FORWARD_ORDER, REVERSE_ORDER};
use crate::{bootstrap, port, probe, resolve, tunnel, viewer};

/// Run a full session against `host_token`, working in `dir` on the remote.
pub async fn run_session(
    host_token: &str,
    dir: &str,
    opts: &SessionOptions,
    tools: &ExternalTools,
) -> Result<(), PortsideError> {
    let resolved = resolve::resolve(tools, host_token).await?;
    let host = resolved.host;
    tracing::debug!("resolved {} to {}", host_token, host);

    // Resolver flags come first so user flags can override them.
    let mut flags = resolved.extra_flags;
    flags.extend(split_flags(&opts.ssh_flags));

    let bind_addr = normalize_bind_addr(opts.bind_addr.as_deref())?;
    let remote_port = match opts.remote_port {
        Some(p) => p,
        None => port::allocate()?,
    };
    tracing::debug!("local {} remote port {}", bind_addr, remote_port);

    let reuse = opts.reuse_connection && master::check_credentials_dir(opts.reuse_connection);
    let mut master_conn = None;
    if reuse {
        print_info("establishing shared ssh connection");
        match MasterConnection::start(tools, &flags, &host).await {
            Ok(conn) => {
                flags = conn.flags().to_vec();
                master_conn = Some(conn);
            }
            Err(e) => {
                print_error(&format!(
                    "shared connection failed, continuing without it: {}",
                    e
                ));
            }
        }
    }

    let result = run_connected(&host, dir, &bind_addr, remote_port, &flags, opts, tools).await;

    if let Some(mut conn) = master_conn {
        conn.close();
    }
    result
}

/// Everything that happens once the connection flags are final.
async fn run_connected(
    host: &str,
    dir: &str,
    bind_addr: &str,
    remote_port: u16,
    flags: &[String],
    opts: &SessionOptions,
    tools: &ExternalTools,
) -> Result<(), PortsideError> {
    match &opts.upload_server {
        Some(local_binary) => {
            print_info("uploading server binary");
            bootstrap::upload_server(tools, flags, host, local_binary).await?;
        }
        None => {
            print_info("installing latest server release");
            bootstrap::install_server(tools, flags, host).await?;
        }
    }

    if !opts.skip_sync {
        for dataset in FORWARD_ORDER {
            print_info(&format!("syncing {} to remote", dataset));
            sync::sync_dataset(tools, flags, host, dataset, SyncDirection::Forward).await?;
        }
    }

    let tun = tunnel::start(tools, flags, host, bind_addr, remote_port, dir)?;
    let mut exited = tun.observe_exit();

    let url = format!("http://{}", bind_addr);
    probe::wait_ready(&url, probe::READY_DEADLINE).await?;
    print_success(&format!("session ready at {}", url));

    if !opts.no_open {
        viewer::launch(&url);
    }

    tokio::select! {
        _ = &mut exited => {
            tracing::info!("tunnel exited");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted");
        }
    }
    print_info("shutting down");

    if opts.sync_back && !opts.skip_sync {
        for dataset in REVERSE_ORDER {
            print_info(&format!("syncing {} back from remote", dataset));
            sync::sync_dataset(tools, flags, host, dataset, SyncDirection::Reverse).await?;
        }
    }
    Ok(())
}

/// Normalize a user-supplied bind address into `host:port` form.
///
/// Either side may be omitted: a bare host gets a random port, a bare
/// `:port` binds the loopback interface, and no address at all means both
/// defaults. Bracketless IPv6 addresses are rejected rather than guessed
/// at.
pub fn normalize_bind_addr(addr: Option<&str>) -> Result<String, SessionError> {
    let raw = addr.unwrap_or("");
    let raw = if raw.contains(':') {
        raw.to_string()
    } else {
        format!("{}:", raw)
    };

    let (host_part, port_part) = raw
        .rsplit_once(':')
        .ok_or_else(|| SessionError::InvalidBindAddr(raw.clone()))?;

    if host_part.contains(':') && !host_part.starts_with('[') {
        return Err(SessionError::InvalidBindAddr(raw));
    }

    let host_part = if host_part.is_empty() {
        "127.0.0.1"
    } else {
        host_part
    };

    let port_num = if port_part.is_empty() {
        port::allocate()?
    } else {
        port_part
            .parse::<u16>()
            .map_err(|_| SessionError::InvalidBindAddr(raw.clone()))?
    };

    Ok(format!("{}:{}", host_part, port_num))
}
