//! Transport invocation builders
//!
//! One builder per kind of ssh call the session makes. All of them are pure
//! functions from flags and host to an [`ExternalCommand`]; nothing here
//! spawns a process.

use crate::invoke::ExternalCommand;

/// Run a command on the remote host.
pub fn remote_exec(ssh: &str, flags: &[String], host: &str, command: &str) -> ExternalCommand {
    ExternalCommand::new(ssh)
        .args(flags.iter().cloned())
        .arg(host)
        .arg(command)
}

/// Pipe a script into a login shell on the remote host.
///
/// The script travels over stdin rather than the argument list, so its size
/// and quoting never interact with the transport's command-line handling.
pub fn remote_script(ssh: &str, flags: &[String], host: &str, script: &str) -> ExternalCommand {
    ExternalCommand::new(ssh)
        .args(flags.iter().cloned())
        .arg(host)
        .arg("/usr/bin/env bash -l")
        .with_stdin(script)
}

/// Start a master connection.
///
/// `-MN` means "start a master socket and don't open a session, just
/// connect". The flags are expected to already carry the ControlPath option.
pub fn master(ssh: &str, flags: &[String], host: &str) -> ExternalCommand {
    ExternalCommand::new(ssh)
        .args(flags.iter().cloned())
        .arg("-MNq")
        .arg(host)
}

/// Ask a running master whether it is ready.
pub fn master_check(ssh: &str, flags: &[String], host: &str) -> ExternalCommand {
    ExternalCommand::new(ssh)
        .args(flags.iter().cloned())
        .args(["-O", "check"])
        .arg(host)
}

/// The flag pair that routes an invocation through a master's control path.
pub fn control_path_flags(control_path: &str) -> Vec<String> {
    vec!["-o".to_string(), format!("ControlPath={}", control_path)]
}

/// Forward a local bind address to a remote port and run the session command.
///
/// `-tt` forces a PTY so the remote server dies with the connection, and
/// `-q` suppresses the login banner that would corrupt the session's output.
pub fn tunnel(
    ssh: &str,
    flags: &[String],
    host: &str,
    bind_addr: &str,
    remote_port: u16,
    remote_command: &str,
) -> ExternalCommand {
    ExternalCommand::new(ssh)
        .args(["-tt", "-q", "-L"])
        .arg(format!("{}:localhost:{}", bind_addr, remote_port))
        .args(flags.iter().cloned())
        .arg(host)
        .arg(remote_command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags() -> Vec<String> {
        vec!["-p".to_string(), "2222".to_string()]
    }

    #[test]
    fn test_remote_exec_shape() {
        let cmd = remote_exec("ssh", &flags(), "foo@host", "chmod +x ~/bin/srv");
        assert_eq!(cmd.program, "ssh");
        assert_eq!(cmd.args, ["-p", "2222", "foo@host", "chmod +x ~/bin/srv"]);
        assert!(cmd.stdin.is_none());
    }

    #[test]
    fn test_remote_script_pipes_stdin() {
        let cmd = remote_script("ssh", &flags(), "host", "echo hi");
        assert_eq!(cmd.args.last().map(String::as_str), Some("/usr/bin/env bash -l"));
        assert_eq!(cmd.stdin.as_deref(), Some("echo hi"));
    }

    #[test]
    fn test_master_flag_placement() {
        let cmd = master("ssh", &flags(), "host");
        assert_eq!(cmd.args, ["-p", "2222", "-MNq", "host"]);
    }

    #[test]
    fn test_master_check_shape() {
        let cmd = master_check("ssh", &flags(), "host");
        assert_eq!(cmd.args, ["-p", "2222", "-O", "check", "host"]);
    }

    #[test]
    fn test_control_path_flags() {
        assert_eq!(
            control_path_flags("~/.ssh/portside-%h-%p-%r"),
            ["-o", "ControlPath=~/.ssh/portside-%h-%p-%r"]
        );
    }

    #[test]
    fn test_tunnel_shape() {
        let cmd = tunnel(
            "ssh",
            &flags(),
            "foo@host",
            "127.0.0.1:8080",
            9090,
            "cd ~; srv",
        );
        assert_eq!(
            cmd.args,
            [
                "-tt",
                "-q",
                "-L",
                "127.0.0.1:8080:localhost:9090",
                "-p",
                "2222",
                "foo@host",
                "cd ~; srv"
            ]
        );
    }
}
