//! Structured external invocations
//!
//! Every external tool call (ssh, rsync, the cloud lookup delegate) is
//! assembled as an [`ExternalCommand`] value before anything runs. This keeps
//! argument lists out of shell string concatenation and lets error messages
//! reproduce the exact command line that failed.

use std::io;
use std::process::{ExitStatus, Output, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};

/// A fully assembled external tool invocation.
///
/// The optional `stdin` payload is piped to the child when the command runs;
/// commands without a payload get a null stdin so a misbehaving tool cannot
/// steal the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    /// Program name or path, resolved through PATH by the OS
    pub program: String,
    /// Argument list, passed through without shell interpretation
    pub args: Vec<String>,
    /// Payload piped to the child's stdin, if any
    pub stdin: Option<String>,
}

impl ExternalCommand {
    /// Create a new invocation of `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Attach a stdin payload.
    pub fn with_stdin(mut self, payload: impl Into<String>) -> Self {
        self.stdin = Some(payload.into());
        self
    }

    /// Render the command line for log and error messages.
    ///
    /// Arguments containing whitespace or quotes are single-quoted so the
    /// rendered line can be pasted into a shell to reproduce the failure.
    pub fn render(&self) -> String {
        let mut line = String::from(&self.program);
        for arg in &self.args {
            line.push(' ');
            line.push_str(&shell_quote(arg));
        }
        line
    }

    /// Build the underlying process command without spawning it.
    pub fn build(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Run to completion with stdout and stderr passed through to the
    /// terminal. Returns the exit status.
    pub async fn run(&self) -> io::Result<ExitStatus> {
        let mut cmd = self.build();
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        if self.stdin.is_some() {
            cmd.stdin(Stdio::piped());
        } else {
            cmd.stdin(Stdio::null());
        }

        let mut child = cmd.spawn()?;
        self.feed_stdin(&mut child).await?;
        child.wait().await
    }

    /// Run to completion capturing stdout and stderr.
    pub async fn capture(&self) -> io::Result<Output> {
        let mut cmd = self.build();
        if self.stdin.is_some() {
            cmd.stdin(Stdio::piped());
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            let mut child = cmd.spawn()?;
            self.feed_stdin(&mut child).await?;
            child.wait_with_output().await
        } else {
            cmd.stdin(Stdio::null());
            cmd.output().await
        }
    }

    /// Run to completion discarding all output.
    pub async fn run_quiet(&self) -> io::Result<ExitStatus> {
        let mut cmd = self.build();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd.status().await
    }

    async fn feed_stdin(&self, child: &mut Child) -> io::Result<()> {
        if let (Some(payload), Some(mut stdin)) = (&self.stdin, child.stdin.take()) {
            stdin.write_all(payload.as_bytes()).await?;
            stdin.shutdown().await?;
        }
        Ok(())
    }
}

/// Split a free-form flag string into arguments, honoring quotes.
///
/// Single quotes preserve everything up to the closing quote. Double quotes
/// allow backslash escapes of `"` and `\`. Outside quotes, a backslash
/// escapes the next character. Unterminated quotes consume the rest of the
/// input rather than failing; flag strings come from the command line, where
/// the user's shell has usually already complained about real imbalances.
pub fn split_flags(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                for q in chars.by_ref() {
                    if q == '\'' {
                        break;
                    }
                    current.push(q);
                }
            }
            '"' => {
                in_word = true;
                while let Some(q) = chars.next() {
                    match q {
                        '"' => break,
                        '\\' => match chars.peek() {
                            Some(&next) if next == '"' || next == '\\' => {
                                current.push(next);
                                chars.next();
                            }
                            _ => current.push('\\'),
                        },
                        _ => current.push(q),
                    }
                }
            }
            '\\' => {
                in_word = true;
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            _ => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }
    words
}

/// Join split flags back into one string, quoting where needed.
///
/// Used for tools that take a whole remote-shell command as a single
/// argument, like rsync's `-e`.
pub fn join_flags(flags: &[String]) -> String {
    flags
        .iter()
        .map(|f| shell_quote(f))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let needs_quoting = arg.is_empty()
        || arg
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '"');
    if !needs_quoting {
        return arg.to_string();
    }
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('\'');
    for c in arg.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_flags_plain() {
        assert_eq!(
            split_flags("-p 2222 -o StrictHostKeyChecking=no"),
            vec!["-p", "2222", "-o", "StrictHostKeyChecking=no"]
        );
    }

    #[test]
    fn test_split_flags_empty() {
        assert!(split_flags("").is_empty());
        assert!(split_flags("   \t ").is_empty());
    }

    #[test]
    fn test_split_flags_double_quotes() {
        assert_eq!(
            split_flags(r#"-o "ControlPath=~/.ssh/control-%h-%p-%r""#),
            vec!["-o", "ControlPath=~/.ssh/control-%h-%p-%r"]
        );
    }

    #[test]
    fn test_split_flags_single_quotes_preserve_spaces() {
        assert_eq!(
            split_flags("-o 'ProxyCommand=ssh -W %h:%p jump'"),
            vec!["-o", "ProxyCommand=ssh -W %h:%p jump"]
        );
    }

    #[test]
    fn test_split_flags_escaped_space() {
        assert_eq!(split_flags(r"a\ b c"), vec!["a b", "c"]);
    }

    #[test]
    fn test_split_flags_adjacent_quoted_segments() {
        assert_eq!(split_flags(r#"foo"bar baz"qux"#), vec!["foobar bazqux"]);
    }

    #[test]
    fn test_split_flags_backslash_in_double_quotes() {
        assert_eq!(split_flags(r#""a\"b""#), vec![r#"a"b"#]);
        assert_eq!(split_flags(r#""a\b""#), vec![r"a\b"]);
    }

    #[test]
    fn test_render_quotes_spaces() {
        let cmd = ExternalCommand::new("ssh")
            .arg("-o")
            .arg("ProxyCommand=ssh -W %h:%p jump")
            .arg("host");
        assert_eq!(
            cmd.render(),
            "ssh -o 'ProxyCommand=ssh -W %h:%p jump' host"
        );
    }

    #[test]
    fn test_render_plain_args_unquoted() {
        let cmd = ExternalCommand::new("rsync").args(["-azvr", "src/", "host:dest/"]);
        assert_eq!(cmd.render(), "rsync -azvr src/ host:dest/");
    }

    #[test]
    fn test_join_flags_roundtrip() {
        let flags = split_flags(r#"-p 2222 -o "ProxyCommand=ssh -W %h:%p jump""#);
        assert_eq!(
            join_flags(&flags),
            "-p 2222 -o 'ProxyCommand=ssh -W %h:%p jump'"
        );
    }

    #[tokio::test]
    async fn test_run_with_stdin_payload() {
        let cmd = ExternalCommand::new("sh")
            .args(["-c", "read line; test \"$line\" = hello"])
            .with_stdin("hello\n");
        let status = cmd.run().await.unwrap();
        assert!(status.success());
    }

    #[tokio::test]
    async fn test_capture_output() {
        let cmd = ExternalCommand::new("echo").arg("ahoy");
        let output = cmd.capture().await.unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "ahoy");
    }

    #[tokio::test]
    async fn test_run_quiet_failure_status() {
        let cmd = ExternalCommand::new("sh").args(["-c", "exit 3"]);
        let status = cmd.run_quiet().await.unwrap();
        assert!(!status.success());
    }
}
