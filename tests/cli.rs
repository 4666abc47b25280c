use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_describes_the_tool() {
    Command::cargo_bin("ghident")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("GitHub"));
}

#[test]
fn rejects_arguments() {
    Command::cargo_bin("ghident")
        .unwrap()
        .arg("switch")
        .assert()
        .failure();
}

#[test]
fn missing_tools_exit_with_status_one() {
    let empty = tempfile::tempdir().unwrap();

    Command::cargo_bin("ghident")
        .unwrap()
        .env("PATH", empty.path())
        .env("NO_COLOR", "1")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("required tool not found on PATH: 'gh'"));
}

#[cfg(unix)]
#[test]
fn missing_git_is_reported_after_gh() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let gh = dir.path().join("gh");
    std::fs::write(&gh, "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::set_permissions(&gh, std::fs::Permissions::from_mode(0o755)).unwrap();

    Command::cargo_bin("ghident")
        .unwrap()
        .env("PATH", dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'git'"));
}
