use assert_cmd::Command;

#[test]
fn test_server_command_available() {
    let mut cmd = Command::cargo_bin("kennwert").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("server"));
}

#[test]
fn test_server_requires_reference_tables() {
    let dir = tempfile::TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("kennwert").unwrap();
    cmd.arg("server").arg("--refs").arg(dir.path()).env_remove("KENNWERT_ENV_VERSION");

    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("environmental.json"));
}
