use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_session_flags() {
    Command::cargo_bin("portside")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--skip-sync"))
        .stdout(predicate::str::contains("--sync-back"))
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--upload-server"));
}

#[test]
fn test_version_reports_package_version() {
    Command::cargo_bin("portside")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_host_fails() {
    Command::cargo_bin("portside")
        .unwrap()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no host provided"));
}

#[test]
fn test_unknown_flag_is_rejected() {
    Command::cargo_bin("portside")
        .unwrap()
        .args(["fred@host", "--definitely-not-a-flag"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--definitely-not-a-flag"));
}

#[test]
fn test_quiet_conflicts_with_verbose() {
    Command::cargo_bin("portside")
        .unwrap()
        .args(["fred@host", "-q", "-v"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_bad_remote_port_is_rejected() {
    Command::cargo_bin("portside")
        .unwrap()
        .args(["fred@host", "--remote-port", "notaport"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("remote-port"));
}
