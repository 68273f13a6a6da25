use crate::fixtures::Workspace;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn kennwert() -> Command {
    let mut cmd = Command::cargo_bin("kennwert").unwrap();
    cmd.env_remove("KENNWERT_REFS")
        .env_remove("KENNWERT_ENV_VERSION")
        .env_remove("KENNWERT_OUT");
    cmd
}

#[test]
fn test_cli_lca_prints_results() {
    let workspace = Workspace::new();

    let mut cmd = kennwert();
    cmd.arg("lca").arg(workspace.batch()).arg("--refs").arg(workspace.refs());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"gwp_absolute\": 230.0"))
        .stdout(predicate::str::contains("\"gwp_per_year\": 4.6"))
        .stdout(predicate::str::contains("material_mapping_not_found"));
}

#[test]
fn test_cli_lca_pinned_version() {
    let workspace = Workspace::new();

    let mut cmd = kennwert();
    cmd.arg("lca")
        .arg(workspace.batch())
        .arg("--refs")
        .arg(workspace.refs())
        .arg("--env-version")
        .arg("2024");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"gwp_absolute\": 460.0"));
}

#[test]
fn test_cli_cost_prints_results() {
    let workspace = Workspace::new();

    let mut cmd = kennwert();
    cmd.arg("cost").arg(workspace.batch()).arg("--refs").arg(workspace.refs());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"total_cost\": 200.0"))
        .stdout(predicate::str::contains("\"total_cost\": 100.0"));
}

#[test]
fn test_cli_lca_out_then_summary() {
    let workspace = Workspace::new();
    let out = workspace.path().join("lca.json");

    let mut cmd = kennwert();
    cmd.arg("lca")
        .arg(workspace.batch())
        .arg("--refs")
        .arg(workspace.refs())
        .arg("--out")
        .arg(&out);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Results written to"));
    assert!(out.exists());

    let mut cmd = kennwert();
    cmd.arg("summary").arg(&out);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("230.000"))
        .stdout(predicate::str::contains("Timber"));
}

#[test]
fn test_cli_run_archives_batch() {
    let workspace = Workspace::new();
    let out_dir = workspace.path().join("out");

    let mut cmd = kennwert();
    cmd.arg("run")
        .arg(workspace.batches())
        .arg("--refs")
        .arg(workspace.refs())
        .arg("--project")
        .arg("tower")
        .arg("--out-dir")
        .arg(&out_dir);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("environmental version 2022"))
        .stdout(predicate::str::contains("300.00"));

    for kind in ["lca", "cost", "combined"] {
        let archived: Vec<_> = fs::read_dir(out_dir.join(kind).join("tower"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(archived.len(), 1, "{} archive", kind);
        assert!(archived[0].starts_with("walls_"));
    }

    let history = fs::read_to_string(out_dir.join("history.jsonl")).unwrap();
    assert_eq!(history.lines().count(), 1);
    assert!(history.contains("\"environmental_version\":\"2022\""));

    let errors = fs::read_to_string(out_dir.join("errors").join("tower.jsonl")).unwrap();
    assert!(errors.contains("Timber"));
}

#[test]
fn test_cli_versions_lists_active() {
    let workspace = Workspace::new();

    let mut cmd = kennwert();
    cmd.arg("versions").arg("--refs").arg(workspace.refs());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2022"))
        .stdout(predicate::str::contains("2024"));
}

#[test]
fn test_cli_unknown_version_fails() {
    let workspace = Workspace::new();

    let mut cmd = kennwert();
    cmd.arg("lca")
        .arg(workspace.batch())
        .arg("--refs")
        .arg(workspace.refs())
        .arg("--env-version")
        .arg("1999");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("1999"));
}

#[test]
fn test_cli_structural_error() {
    let workspace = Workspace::new();
    let batch = workspace.write("broken.json", r#"{"items": []}"#);

    let mut cmd = kennwert();
    cmd.arg("cost").arg(&batch).arg("--refs").arg(workspace.refs());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("missing required field 'elements'"))
        .stderr(predicate::str::contains("help:"));
}

#[test]
fn test_cli_json_error_handling() {
    let workspace = Workspace::new();
    let batch = workspace.write("broken.json", "{\n  \"elements\": [\n    { \"id\": \"E1\", }\n  ]\n}");

    let mut cmd = kennwert();
    cmd.arg("cost").arg(&batch).arg("--refs").arg(workspace.refs());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid JSON"));
}

#[test]
fn test_cli_missing_refs_directory() {
    let workspace = Workspace::new();

    let mut cmd = kennwert();
    cmd.arg("cost")
        .arg(workspace.batch())
        .arg("--refs")
        .arg(workspace.path().join("nowhere"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_cli_run_twice_ignores_own_archives() {
    let workspace = Workspace::new();
    let out_dir = workspace.batches().join("results");

    for _ in 0..2 {
        let mut cmd = kennwert();
        cmd.arg("run")
            .arg(workspace.batches())
            .arg("--refs")
            .arg(workspace.refs())
            .arg("--out-dir")
            .arg(&out_dir);

        cmd.assert()
            .success()
            .stdout(predicate::str::contains("Processing 1 batch file(s)"));
    }

    let history = fs::read_to_string(out_dir.join("history.jsonl")).unwrap();
    assert_eq!(history.lines().count(), 2);
}
