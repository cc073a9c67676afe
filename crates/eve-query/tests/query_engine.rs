//! Query-engine behavior over staged canonical files and a seeded vault.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;
use tempfile::tempdir;

use eve_canon::row::CanonicalRow;
use eve_core::{EveError, MethodRegistry};
use eve_query::{QueryEngine, CHAIN_BREAK_WARNING, SYSTEM_PRICE_WARNING};
use eve_vault::chain;

fn row(zone: &str, day: u32, hour: u32, spot: Option<f64>) -> CanonicalRow {
    CanonicalRow {
        ts: Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap(),
        zone: zone.into(),
        spot,
        temp: Some(-2.0),
        wind_speed: None,
        solar_rad: None,
        hdd: Some(20.0),
        nuclear_mw: Some(6000.0),
        hydro_mw: Some(2000.0),
        wind_onshore_mw: None,
        wind_offshore_mw: None,
        solar_mw: None,
        gas_mw: None,
        coal_mw: None,
        lignite_mw: None,
        oil_mw: None,
        other_mw: None,
        total_gen_mw: Some(8000.0),
        net_import_mw: Some(-250.0),
        production_co2_g_kwh: Some(4.5),
        consumption_co2_g_kwh: Some(4.5),
        emission_scope: "direct-combustion".into(),
        resolution_source: "PT60M".into(),
        dataset_eve_id: "v2:SE3:20240201".into(),
    }
}

fn write_month(root: &Path, zone: &str, rows: &[CanonicalRow]) {
    let dir = root.join(zone);
    fs::create_dir_all(&dir).unwrap();
    let mut body = String::new();
    for row in rows {
        body.push_str(&row.to_line().unwrap());
    }
    fs::write(dir.join("2024-01.ndjson"), body).unwrap();
}

fn seed_vault(path: &Path) {
    chain::append(
        path,
        &json!({
            "dataset_eve_id": "v2:SE3:20240201",
            "root_hash": "ab".repeat(32),
            "zone": "SE3",
        }),
    )
    .unwrap();
}

#[test]
fn window_filter_stats_and_bottleneck() {
    let dir = tempdir().unwrap();
    let ts_root = dir.path().join("timeseries");
    let vault = dir.path().join("dataset_vault.jsonl");
    seed_vault(&vault);

    let zonal: Vec<CanonicalRow> = vec![
        row("SE3", 1, 0, Some(50.0)),
        row("SE3", 1, 1, Some(60.0)),
        row("SE3", 1, 2, None),
        // Outside the query window.
        row("SE3", 5, 0, Some(500.0)),
    ];
    write_month(&ts_root, "SE3", &zonal);
    let system: Vec<CanonicalRow> = vec![
        {
            let mut r = row("SYS", 1, 0, Some(40.0));
            r.dataset_eve_id = "v2:SYS:20240201".into();
            r
        },
        {
            let mut r = row("SYS", 1, 1, Some(65.0));
            r.dataset_eve_id = "v2:SYS:20240201".into();
            r
        },
    ];
    write_month(&ts_root, "SYS", &system);

    let registry = MethodRegistry::current();
    let engine = QueryEngine::new(&registry, &ts_root, None, &vault);
    let envelope = engine
        .run(
            "SE3",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        )
        .unwrap();

    assert_eq!(envelope.hours, 3);
    assert_eq!(envelope.spot.mean, Some(55.0));
    assert_eq!(envelope.spot.median, Some(55.0));
    assert_eq!(envelope.generation_mix.total_gen_mw, Some(8000.0));

    // Hour 0: 50-40 = +10; hour 1: 60-65 = -5; hour 2 has no zonal price.
    assert!(envelope.bottleneck.available);
    assert_eq!(envelope.bottleneck.hours_positive, 1);
    assert_eq!(envelope.bottleneck.hours_negative, 1);
    assert_eq!(envelope.bottleneck.hours_zero, 0);
    assert_eq!(envelope.bottleneck.mean, Some(2.5));
    assert!(envelope.methodology_warnings.is_empty());

    let vault_block = envelope.provenance.vault.unwrap();
    assert_eq!(vault_block.event_index, 1);
    assert_eq!(vault_block.root_hash, "ab".repeat(32));
    assert_eq!(envelope.provenance.dataset_eve_id, "v2:SE3:20240201");
}

#[test]
fn missing_system_stream_warns_and_flags_unavailable() {
    let dir = tempdir().unwrap();
    let ts_root = dir.path().join("timeseries");
    let vault = dir.path().join("dataset_vault.jsonl");
    seed_vault(&vault);
    write_month(&ts_root, "SE3", &[row("SE3", 1, 0, Some(50.0))]);

    let registry = MethodRegistry::current();
    let engine = QueryEngine::new(&registry, &ts_root, None, &vault);
    let envelope = engine
        .run(
            "SE3",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap();
    assert!(!envelope.bottleneck.available);
    assert_eq!(envelope.methodology_warnings, vec![SYSTEM_PRICE_WARNING]);
}

#[test]
fn empty_window_is_a_no_data_error() {
    let dir = tempdir().unwrap();
    let ts_root = dir.path().join("timeseries");
    let vault = dir.path().join("dataset_vault.jsonl");
    write_month(&ts_root, "SE3", &[row("SE3", 1, 0, Some(50.0))]);

    let registry = MethodRegistry::current();
    let engine = QueryEngine::new(&registry, &ts_root, None, &vault);
    let err = engine
        .run(
            "SE3",
            NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 6, 30).unwrap(),
        )
        .unwrap_err();
    assert!(matches!(err, EveError::NoData { .. }));
}

#[test]
fn broken_chain_withholds_vault_provenance() {
    let dir = tempdir().unwrap();
    let ts_root = dir.path().join("timeseries");
    let vault = dir.path().join("dataset_vault.jsonl");
    seed_vault(&vault);
    chain::append(&vault, &json!({"dataset_eve_id": "v2:SE4:20240201"})).unwrap();
    // Corrupt the first record's payload without touching its hashes.
    let tampered = fs::read_to_string(&vault)
        .unwrap()
        .replacen("SE3", "SEX", 1);
    fs::write(&vault, tampered).unwrap();
    write_month(&ts_root, "SE3", &[row("SE3", 1, 0, Some(50.0))]);

    let registry = MethodRegistry::current();
    let engine = QueryEngine::new(&registry, &ts_root, None, &vault);
    let envelope = engine
        .run(
            "SE3",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap();
    assert!(envelope.provenance.vault.is_none());
    assert!(envelope
        .methodology_warnings
        .iter()
        .any(|w| w == CHAIN_BREAK_WARNING));
}
