//! Settings and extensions mirroring
//!
//! Two datasets move between the local machine and the remote data
//! directory: user settings and installed extensions. The forward pass runs
//! before the session starts so the remote server sees the local
//! configuration; the optional reverse pass runs at shutdown to capture
//! changes made during the session.

use std::path::PathBuf;

use portside_core::error::{PortsideError, SyncError};
use portside_core::{paths, transfer, ExternalCommand};

use crate::options::ExternalTools;

/// Remote location of the synced settings dataset, trailing slash included
/// so rsync mirrors contents rather than nesting the directory.
pub const REMOTE_SETTINGS_DIR: &str = "~/.local/share/portside-server/User/";

/// Remote location of the synced extensions dataset
pub const REMOTE_EXTENSIONS_DIR: &str = "~/.local/share/portside-server/extensions/";

/// Settings subdirectories that never sync: machine-local caches and logs.
const SETTINGS_EXCLUDES: &[&str] = &["workspaceStorage", "logs", "CachedData"];

/// A syncable dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Settings,
    Extensions,
}

impl Dataset {
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Settings => "settings",
            Dataset::Extensions => "extensions",
        }
    }

    pub fn remote_dir(&self) -> &'static str {
        match self {
            Dataset::Settings => REMOTE_SETTINGS_DIR,
            Dataset::Extensions => REMOTE_EXTENSIONS_DIR,
        }
    }

    pub fn local_dir(&self) -> Result<PathBuf, PortsideError> {
        let dir = match self {
            Dataset::Settings => paths::settings_dir()?,
            Dataset::Extensions => paths::extensions_dir()?,
        };
        Ok(dir)
    }

    pub fn excludes(&self) -> &'static [&'static str] {
        match self {
            Dataset::Settings => SETTINGS_EXCLUDES,
            Dataset::Extensions => &[],
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which way a sync pass moves data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// Local datasets overwrite the remote copies
    Forward,
    /// Remote copies overwrite the local datasets
    Reverse,
}

/// Dataset order for the forward pass.
pub const FORWARD_ORDER: [Dataset; 2] = [Dataset::Settings, Dataset::Extensions];

/// Dataset order for the reverse pass. Extensions first, so an interrupted
/// shutdown loses settings tweaks rather than installed extensions.
pub const REVERSE_ORDER: [Dataset; 2] = [Dataset::Extensions, Dataset::Settings];

/// Assemble the rsync invocation for one dataset in one direction.
///
/// The local directory is created if missing so a first reverse sync onto a
/// fresh machine has somewhere to land.
pub fn plan(
    tools: &ExternalTools,
    ssh_flags: &[String],
    host: &str,
    dataset: Dataset,
    direction: SyncDirection,
) -> Result<ExternalCommand, PortsideError> {
    let local_dir = dataset.local_dir()?;
    paths::ensure_dir(&local_dir)?;

    let local = format!("{}/", local_dir.display());
    let remote = format!("{}:{}", host, dataset.remote_dir());

    let (src, dest) = match direction {
        SyncDirection::Forward => (local, remote),
        SyncDirection::Reverse => (remote, local),
    };

    Ok(transfer::mirror(
        &tools.rsync,
        &src,
        &dest,
        &tools.ssh,
        ssh_flags,
        dataset.excludes(),
    ))
}

/// Run one dataset sync to completion.
pub async fn sync_dataset(
    tools: &ExternalTools,
    ssh_flags: &[String],
    host: &str,
    dataset: Dataset,
    direction: SyncDirection,
) -> Result<(), PortsideError> {
    let cmd = plan(tools, ssh_flags, host, dataset, direction)?;
    let src = cmd.args[cmd.args.len() - 2].clone();
    let dest = cmd.args[cmd.args.len() - 1].clone();

    let started = std::time::Instant::now();
    let status = cmd.run().await.map_err(|e| SyncError::Failed {
        src: src.clone(),
        dest: dest.clone(),
        detail: e.to_string(),
    })?;
    if !status.success() {
        return Err(SyncError::Failed {
            src,
            dest,
            detail: format!("rsync exited with {}", status),
        }
        .into());
    }

    tracing::info!(
        "synced {} {:?} in {:.1}s",
        dataset,
        direction,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use portside_core::paths::{EXTENSIONS_DIR_ENV, SETTINGS_DIR_ENV};
    use tempfile::TempDir;

    #[test]
    fn test_forward_plan_shapes_endpoints() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("User");
        std::env::set_var(SETTINGS_DIR_ENV, &local);

        let tools = ExternalTools::default();
        let cmd = plan(
            &tools,
            &[],
            "fred@host",
            Dataset::Settings,
            SyncDirection::Forward,
        )
        .unwrap();

        std::env::remove_var(SETTINGS_DIR_ENV);

        let src = &cmd.args[cmd.args.len() - 2];
        let dest = &cmd.args[cmd.args.len() - 1];
        assert_eq!(src, &format!("{}/", local.display()));
        assert_eq!(dest, "fred@host:~/.local/share/portside-server/User/");
        assert!(local.is_dir());
    }

    #[test]
    fn test_reverse_plan_swaps_endpoints() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("extensions");
        std::env::set_var(EXTENSIONS_DIR_ENV, &local);

        let tools = ExternalTools::default();
        let cmd = plan(
            &tools,
            &[],
            "fred@host",
            Dataset::Extensions,
            SyncDirection::Reverse,
        )
        .unwrap();

        std::env::remove_var(EXTENSIONS_DIR_ENV);

        let src = &cmd.args[cmd.args.len() - 2];
        let dest = &cmd.args[cmd.args.len() - 1];
        assert_eq!(src, "fred@host:~/.local/share/portside-server/extensions/");
        assert_eq!(dest, &format!("{}/", local.display()));
    }

    #[test]
    fn test_settings_plan_carries_excludes() {
        let dir = TempDir::new().unwrap();
        std::env::set_var(SETTINGS_DIR_ENV, dir.path());

        let tools = ExternalTools::default();
        let cmd = plan(
            &tools,
            &[],
            "fred@host",
            Dataset::Settings,
            SyncDirection::Forward,
        )
        .unwrap();

        std::env::remove_var(SETTINGS_DIR_ENV);

        let rendered = cmd.render();
        assert!(rendered.contains("--exclude=workspaceStorage"));
        assert!(rendered.contains("--exclude=logs"));
        assert!(rendered.contains("--exclude=CachedData"));
    }

    #[test]
    fn test_extensions_plan_has_no_excludes() {
        let dir = TempDir::new().unwrap();
        std::env::set_var(EXTENSIONS_DIR_ENV, dir.path());

        let tools = ExternalTools::default();
        let cmd = plan(
            &tools,
            &[],
            "fred@host",
            Dataset::Extensions,
            SyncDirection::Forward,
        )
        .unwrap();

        std::env::remove_var(EXTENSIONS_DIR_ENV);

        assert!(!cmd.render().contains("--exclude"));
    }

    #[test]
    fn test_reverse_order_restores_extensions_first() {
        assert_eq!(REVERSE_ORDER[0], Dataset::Extensions);
        assert_eq!(REVERSE_ORDER[1], Dataset::Settings);
    }
}
