//! Remote server provisioning
//!
//! Two strategies put the server binary in place on the remote host: upload
//! a locally built binary, or run a download script remotely that fetches
//! the latest release. Both leave the binary at the same cache path.

use std::path::Path;

use portside_core::error::BootstrapError;
use portside_core::script::{self, SERVER_BINARY_PATH};
use portside_core::{ssh, transfer};

use crate::options::ExternalTools;

/// Upload a local server binary to the remote cache path and mark it
/// executable.
pub async fn upload_server(
    tools: &ExternalTools,
    flags: &[String],
    host: &str,
    local_path: &Path,
) -> Result<(), BootstrapError> {
    if !local_path.is_file() {
        return Err(BootstrapError::NotAFile(local_path.to_path_buf()));
    }

    let src = local_path.to_string_lossy().into_owned();
    let dest = format!("{}:{}", host, SERVER_BINARY_PATH);
    tracing::info!("uploading {} to {}", src, dest);

    let cmd = transfer::mirror(&tools.rsync, &src, &dest, &tools.ssh, flags, &[]);
    let status = cmd.run().await.map_err(|e| BootstrapError::Transfer {
        dest: dest.clone(),
        detail: e.to_string(),
    })?;
    if !status.success() {
        return Err(BootstrapError::Transfer {
            dest,
            detail: format!("rsync exited with {}", status),
        });
    }

    let chmod = ssh::remote_exec(
        &tools.ssh,
        flags,
        host,
        &format!("chmod +x {}", SERVER_BINARY_PATH),
    );
    let rendered = chmod.render();
    let status = chmod.run().await.map_err(|e| BootstrapError::Chmod {
        command: rendered.clone(),
        detail: e.to_string(),
    })?;
    if !status.success() {
        return Err(BootstrapError::Chmod {
            command: rendered,
            detail: format!("ssh exited with {}", status),
        });
    }
    Ok(())
}

/// Run the download script on the remote host.
pub async fn install_server(
    tools: &ExternalTools,
    flags: &[String],
    host: &str,
) -> Result<(), BootstrapError> {
    let body = script::install_script(
        SERVER_BINARY_PATH,
        script::REMOTE_DATA_DIR,
        script::RELEASE_URL,
    );
    tracing::info!("installing latest release on {}", host);

    let cmd = ssh::remote_script(&tools.ssh, flags, host, &body);
    let rendered = cmd.render();
    let status = cmd.run().await.map_err(|e| BootstrapError::Script {
        command: rendered.clone(),
        script: body.clone(),
        detail: e.to_string(),
    })?;
    if !status.success() {
        return Err(BootstrapError::Script {
            command: rendered,
            script: body,
            detail: format!("ssh exited with {}", status),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_rejects_missing_file() {
        let tools = ExternalTools::default();
        let err = upload_server(
            &tools,
            &[],
            "fred@host",
            Path::new("/nonexistent/portside-server"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BootstrapError::NotAFile(_)));
    }

    #[tokio::test]
    async fn test_upload_rejects_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let tools = ExternalTools::default();
        let err = upload_server(&tools, &[], "fred@host", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::NotAFile(_)));
    }

    #[tokio::test]
    async fn test_install_error_carries_script_body() {
        // `false` swallows its arguments and exits nonzero, so the error
        // must reproduce both the command line and the full script.
        let tools = ExternalTools {
            ssh: "false".to_string(),
            ..ExternalTools::default()
        };
        let err = install_server(&tools, &[], "fred@host").await.unwrap_err();
        match err {
            BootstrapError::Script {
                command, script, ..
            } => {
                assert!(command.starts_with("false"));
                assert!(script.contains("set -euxo pipefail"));
                assert!(script.contains("chmod +x"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
