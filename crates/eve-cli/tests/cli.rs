use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use eve_core::MethodRegistry;

fn stage_price_doc(source_root: &Path, zone: &str, prices: &[f64]) {
    let mut points = String::new();
    for (i, price) in prices.iter().enumerate() {
        points.push_str(&format!(
            "<Point><position>{}</position><price.amount>{price}</price.amount></Point>",
            i + 1
        ));
    }
    let xml = format!(
        "<Publication_MarketDocument><TimeSeries>\
         <in_Domain.mRID>{zone}</in_Domain.mRID><out_Domain.mRID>{zone}</out_Domain.mRID>\
         <Period><timeInterval><start>2024-01-01T00:00Z</start><end>2024-01-01T{len:02}:00Z</end></timeInterval>\
         <resolution>PT60M</resolution>{points}</Period>\
         </TimeSeries></Publication_MarketDocument>",
        len = prices.len()
    );
    let dir = source_root.join("prices").join(zone);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("2024-01.xml"), xml).unwrap();
}

fn stage_workspace(root: &Path) {
    let sources = root.join("sources");
    stage_price_doc(&sources, "SE3", &[41.5, 39.9, 55.01]);
    stage_price_doc(&sources, "SYS", &[40.0, 40.0, 40.0]);
    MethodRegistry::current()
        .write(&root.join("method_registry.lock.json"))
        .unwrap();
}

fn eve_cmd(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("eve").unwrap();
    cmd.current_dir(root);
    cmd
}

fn build_args(root: &Path) -> Vec<String> {
    [
        "build",
        "--zones",
        "SE3,SYS",
        "--from",
        "2024",
        "--to",
        "2024",
        "--build-date",
        "2024-02-01",
        "--source-root",
        "sources",
        "--timeseries-root",
        "timeseries",
        "--vault-root",
        "vault",
        "--registry",
    ]
    .iter()
    .map(|s| s.to_string())
    .chain(std::iter::once(
        root.join("method_registry.lock.json").display().to_string(),
    ))
    .collect()
}

#[test]
fn build_then_query_round_trip() {
    let tmp = tempdir().unwrap();
    stage_workspace(tmp.path());

    eve_cmd(tmp.path())
        .args(build_args(tmp.path()))
        .assert()
        .success()
        .stdout(predicate::str::contains("SE3:").and(predicate::str::contains("sealed")));

    assert!(tmp.path().join("timeseries/SE3/2024-01.ndjson").exists());
    assert!(tmp.path().join("timeseries/SE3/manifest.json").exists());
    assert!(tmp.path().join("timeseries/SE3/manifest.sha256").exists());
    assert!(tmp.path().join("vault/dataset_vault.jsonl").exists());

    eve_cmd(tmp.path())
        .args([
            "query",
            "--zone",
            "SE3",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
            "--timeseries-root",
            "timeseries",
            "--vault-root",
            "vault",
            "--registry",
            "method_registry.lock.json",
        ])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("dataset  v2:SE3:20240201")
                .and(predicate::str::contains("bottleneck")),
        );
}

#[test]
fn query_json_envelope_carries_provenance() {
    let tmp = tempdir().unwrap();
    stage_workspace(tmp.path());
    eve_cmd(tmp.path())
        .args(build_args(tmp.path()))
        .assert()
        .success();

    let output = eve_cmd(tmp.path())
        .args([
            "query",
            "--zone",
            "SE3",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
            "--json",
            "--timeseries-root",
            "timeseries",
            "--vault-root",
            "vault",
            "--registry",
            "method_registry.lock.json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let envelope: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(envelope["zone"], "SE3");
    assert_eq!(envelope["spot"]["max"], 55.01);
    assert!(envelope["provenance"]["registry_hash"].is_string());
    assert!(envelope["provenance"]["vault"]["chain_hash"].is_string());
    assert_eq!(envelope["provenance"]["vault"]["event_index"], 1);
    assert!(envelope["rebuild_command"]
        .as_str()
        .unwrap()
        .contains("eve build --zones SE3"));
}

#[test]
fn empty_query_window_fails_with_no_data() {
    let tmp = tempdir().unwrap();
    stage_workspace(tmp.path());
    eve_cmd(tmp.path())
        .args(build_args(tmp.path()))
        .assert()
        .success();

    eve_cmd(tmp.path())
        .args([
            "query",
            "--zone",
            "SE4",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
            "--timeseries-root",
            "timeseries",
            "--vault-root",
            "vault",
            "--registry",
            "method_registry.lock.json",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error: no data for zone SE4"));
}

#[test]
fn missing_registry_lock_is_fatal() {
    let tmp = tempdir().unwrap();
    eve_cmd(tmp.path())
        .args([
            "build",
            "--zones",
            "SE3",
            "--from",
            "2024",
            "--to",
            "2024",
            "--registry",
            "absent.lock.json",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error:").and(predicate::str::contains("registry")));
}

#[test]
fn idempotent_rebuild_does_not_append() {
    let tmp = tempdir().unwrap();
    stage_workspace(tmp.path());
    eve_cmd(tmp.path())
        .args(build_args(tmp.path()))
        .assert()
        .success();
    eve_cmd(tmp.path())
        .args(build_args(tmp.path()))
        .assert()
        .success()
        .stdout(predicate::str::contains("already sealed"));

    let vault = fs::read_to_string(tmp.path().join("vault/dataset_vault.jsonl")).unwrap();
    // One entry per zone, not per run.
    assert_eq!(vault.lines().count(), 2);
}

#[test]
fn golden_suite_passes() {
    Command::cargo_bin("eve")
        .unwrap()
        .arg("golden")
        .assert()
        .success()
        .stdout(predicate::str::contains("golden: all properties hold"));
}
