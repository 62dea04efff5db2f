//! Mirroring invocation builder
//!
//! Assembles the rsync call used for binary upload and settings/extensions
//! sync. The transport string passed via `-e` must name the same ssh flags as
//! every other invocation in the session, or rsync would bypass an active
//! master connection.

use crate::invoke::{join_flags, ExternalCommand};

/// Build a mirroring invocation from `src` to `dest`.
///
/// `dest` (or `src`, on a reverse run) is a `host:path` endpoint; rsync hands
/// it to the ssh command given in `-e`. Exclude patterns apply to both
/// directions.
pub fn mirror(
    rsync: &str,
    src: &str,
    dest: &str,
    ssh: &str,
    ssh_flags: &[String],
    excludes: &[&str],
) -> ExternalCommand {
    let mut cmd = ExternalCommand::new(rsync);
    for pattern in excludes {
        cmd = cmd.arg(format!("--exclude={}", pattern));
    }
    cmd.arg("-azvr")
        .arg("-e")
        .arg(remote_shell(ssh, ssh_flags))
        // Only update newer files, and sync times to keep things simple.
        .args(["-u", "--times"])
        // Deleting on the receiver is what makes uninstalling an extension
        // locally take effect remotely.
        .arg("--delete")
        .arg("--copy-unsafe-links")
        .arg(src)
        .arg(dest)
}

fn remote_shell(ssh: &str, ssh_flags: &[String]) -> String {
    if ssh_flags.is_empty() {
        ssh.to_string()
    } else {
        format!("{} {}", ssh, join_flags(ssh_flags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_flag_order() {
        let flags = vec!["-p".to_string(), "2222".to_string()];
        let cmd = mirror(
            "rsync",
            "/home/u/.config/App/",
            "host:~/.local/share/app/User/",
            "ssh",
            &flags,
            &["workspaceStorage", "logs"],
        );
        assert_eq!(
            cmd.args,
            [
                "--exclude=workspaceStorage",
                "--exclude=logs",
                "-azvr",
                "-e",
                "ssh -p 2222",
                "-u",
                "--times",
                "--delete",
                "--copy-unsafe-links",
                "/home/u/.config/App/",
                "host:~/.local/share/app/User/",
            ]
        );
    }

    #[test]
    fn test_mirror_no_flags_plain_transport() {
        let cmd = mirror("rsync", "a/", "host:b/", "ssh", &[], &[]);
        let e_pos = cmd.args.iter().position(|a| a == "-e").unwrap();
        assert_eq!(cmd.args[e_pos + 1], "ssh");
    }

    #[test]
    fn test_mirror_quotes_spaced_flag_values() {
        let flags = vec![
            "-o".to_string(),
            "ProxyCommand=ssh -W %h:%p jump".to_string(),
        ];
        let cmd = mirror("rsync", "a/", "host:b/", "ssh", &flags, &[]);
        let e_pos = cmd.args.iter().position(|a| a == "-e").unwrap();
        assert_eq!(
            cmd.args[e_pos + 1],
            "ssh -o 'ProxyCommand=ssh -W %h:%p jump'"
        );
    }
}
