//! Windows path translation for gitbash environments
//!
//! rsync running under gitbash wants `/c/Users/fred` spellings, not
//! `C:\Users\fred`. The drive-to-mount-point mapping comes from the `mount`
//! command's table. Parsing is a pure function so the logic is testable on
//! every platform; only the `mount` invocation itself is Windows-gated.

use regex::Regex;

/// One row of the mount table: a Windows source path and the POSIX mount
/// point it appears at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    pub src: String,
    pub dest: String,
}

/// Parse `mount` output into mount points.
///
/// gitbash prints lines of the form
/// `C: on /c type ntfs (binary,noacl,posix=0,user,noumount,auto)`.
/// The source may contain spaces (`C:/Program Files/Git on / type ...`),
/// so the match is anchored on the ` on ` and ` type ` separators.
pub fn parse_mount_table(output: &str) -> Vec<MountPoint> {
    let pattern =
        Regex::new(r"(?m)^(?P<src>.+?) on (?P<dest>\S+) type ").expect("mount table pattern");
    pattern
        .captures_iter(output)
        .map(|caps| MountPoint {
            src: caps["src"].replace('\\', "/"),
            dest: caps["dest"].to_string(),
        })
        .collect()
}

/// Translate a Windows path using a parsed mount table.
///
/// The longest matching source prefix wins, so `C:/Program Files/Git`
/// shadows `C:` for paths inside the gitbash installation. Returns `None`
/// when no mount point covers the path.
pub fn translate_with_table(path: &str, table: &[MountPoint]) -> Option<String> {
    let normalized = path.replace('\\', "/");

    let mut best: Option<&MountPoint> = None;
    for mp in table {
        let Some(head) = normalized.get(..mp.src.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(&mp.src) {
            continue;
        }
        let boundary_ok = mp.src.ends_with('/')
            || normalized.len() == mp.src.len()
            || normalized[mp.src.len()..].starts_with('/');
        if boundary_ok && best.map_or(true, |b| mp.src.len() > b.src.len()) {
            best = Some(mp);
        }
    }

    best.map(|mp| {
        let rest = normalized[mp.src.len()..].trim_start_matches('/');
        if rest.is_empty() {
            mp.dest.clone()
        } else if mp.dest.ends_with('/') {
            format!("{}{}", mp.dest, rest)
        } else {
            format!("{}/{}", mp.dest, rest)
        }
    })
}

/// Translate a local path into its gitbash spelling.
///
/// Falls back to the untranslated path when the mount table cannot be read
/// or does not cover the path; a wrong-but-recognizable path in the rsync
/// error beats failing the whole session here.
#[cfg(windows)]
pub fn gitbash_windows_dir(path: &std::path::Path) -> std::path::PathBuf {
    let raw = path.to_string_lossy();
    match std::process::Command::new("mount").output() {
        Ok(output) => {
            let table = parse_mount_table(&String::from_utf8_lossy(&output.stdout));
            match translate_with_table(&raw, &table) {
                Some(translated) => std::path::PathBuf::from(translated),
                None => path.to_path_buf(),
            }
        }
        Err(e) => {
            tracing::warn!("failed to read mount table, using {} as-is: {}", raw, e);
            path.to_path_buf()
        }
    }
}
