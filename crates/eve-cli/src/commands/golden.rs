//! Golden property suite.
//!
//! Stages a synthetic but fully-shaped source tree in a temporary
//! directory, runs the real build/seal/query path over it twice, and
//! checks the universal pipeline properties: determinism, chain linkage,
//! schema lock, timestamp hygiene, CO₂ bounds, flow symmetry, alignment
//! round-trip, LP validity, idempotent re-seal, supersession, and query
//! provenance completeness. The first violation aborts with a non-zero
//! exit; a clean run prints one `ok` line per property.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, Utc};
use walkdir::WalkDir;

use eve_algo::dispatch::{optimize, BatteryParams, DispatchInput, DispatchStatus};
use eve_canon::row::{CanonicalRow, FIELD_COUNT, FIELD_ORDER};
use eve_canon::{build_manifest, write_manifest, Canonicalizer, Manifest};
use eve_core::MethodRegistry;
use eve_io::align::{aggregate, align, expand, SeriesKind, StepSeries};
use eve_io::entsoe::{parse_flow_document, Resolution};
use eve_io::fx::{eur_mwh_to_sek_kwh, FxTable};
use eve_query::{QueryEngine, SYSTEM_PRICE_WARNING};
use eve_vault::dataset::{seal_dataset, SealOutcome};
use eve_vault::report::ReportEvent;
use eve_vault::{chain, seal_report, DATASET_VAULT_FILE, REPORT_VAULT_FILE};

const BUILD_DATE: (i32, u32, u32) = (2024, 3, 1);

pub fn handle() -> Result<()> {
    let workspace = tempfile::tempdir().context("creating golden workspace")?;
    let root = workspace.path();
    let source_root = root.join("sources");
    let timeseries_root = root.join("timeseries");
    let vault_root = root.join("vault");
    let vault_path = vault_root.join(DATASET_VAULT_FILE);

    stage_fixtures(&source_root)?;
    let lock_path = root.join("method_registry.lock.json");
    MethodRegistry::current().write(&lock_path)?;
    let registry = MethodRegistry::load(&lock_path)?;
    let build_date = NaiveDate::from_ymd_opt(BUILD_DATE.0, BUILD_DATE.1, BUILD_DATE.2)
        .ok_or_else(|| anyhow!("bad build date"))?;

    // First full build of both streams.
    let first = build_and_seal(
        &registry,
        &source_root,
        &timeseries_root,
        &vault_path,
        build_date,
        false,
    )?;
    build_zone_only(&registry, &source_root, &timeseries_root, "SYS", build_date)?;

    check_determinism(&registry, &source_root, root, &first, build_date)?;
    check_schema_lock(&timeseries_root)?;
    check_timestamp_hygiene(&timeseries_root)?;
    check_co2_bounds(&timeseries_root)?;
    check_flow_symmetry(&source_root)?;
    check_alignment_round_trip()?;
    check_lp_validity()?;
    check_fx_resolution(&source_root)?;
    check_report_sealing(&source_root, &vault_root, &first)?;
    check_idempotent_reseal(
        &registry,
        &source_root,
        &timeseries_root,
        &vault_path,
        build_date,
    )?;
    check_query_provenance(&registry, &timeseries_root, &source_root, &vault_path)?;
    check_query_warning(&registry, &timeseries_root, &source_root, &vault_path)?;
    check_supersession(
        &registry,
        &source_root,
        &timeseries_root,
        &vault_path,
        build_date,
        &first,
    )?;
    check_chain_linkage(&vault_path)?;

    println!("golden: all properties hold");
    Ok(())
}

fn build_and_seal(
    registry: &MethodRegistry,
    source_root: &Path,
    timeseries_root: &Path,
    vault_path: &Path,
    build_date: NaiveDate,
    force_reseal: bool,
) -> Result<Manifest> {
    let mut canonicalizer = Canonicalizer::new(registry, source_root, timeseries_root);
    let build = canonicalizer.build_zone("SE3", 2024, 2024, build_date)?;
    let zone_dir = timeseries_root.join("SE3");
    let manifest = build_manifest(&zone_dir, &build, registry, Utc::now())?;
    write_manifest(&zone_dir, &manifest)?;
    seal_dataset(vault_path, &manifest, "SE3/manifest.json", force_reseal)?;
    Ok(manifest)
}

fn build_zone_only(
    registry: &MethodRegistry,
    source_root: &Path,
    timeseries_root: &Path,
    zone: &str,
    build_date: NaiveDate,
) -> Result<()> {
    let mut canonicalizer = Canonicalizer::new(registry, source_root, timeseries_root);
    canonicalizer.build_zone(zone, 2024, 2024, build_date)?;
    Ok(())
}

/// Identical sources and registry must reproduce identical bytes.
fn check_determinism(
    registry: &MethodRegistry,
    source_root: &Path,
    workspace: &Path,
    first: &Manifest,
    build_date: NaiveDate,
) -> Result<()> {
    let second_root = workspace.join("timeseries-rebuild");
    let mut canonicalizer = Canonicalizer::new(registry, source_root, &second_root);
    let build = canonicalizer.build_zone("SE3", 2024, 2024, build_date)?;
    let manifest = build_manifest(&second_root.join("SE3"), &build, registry, Utc::now())?;
    if manifest.root_hash != first.root_hash {
        bail!(
            "determinism violated: rebuild root {} != {}",
            manifest.root_hash,
            first.root_hash
        );
    }
    if manifest.files != first.files {
        bail!("determinism violated: per-file hashes differ between builds");
    }
    println!("ok - determinism");
    Ok(())
}

fn emitted_rows(timeseries_root: &Path) -> Result<Vec<(String, CanonicalRow)>> {
    let mut rows = Vec::new();
    for entry in WalkDir::new(timeseries_root) {
        let entry = entry?;
        if entry.path().extension().and_then(|e| e.to_str()) != Some("ndjson") {
            continue;
        }
        let text = fs::read_to_string(entry.path())?;
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            rows.push((line.to_string(), CanonicalRow::from_line(line)?));
        }
    }
    if rows.is_empty() {
        bail!("no canonical rows emitted");
    }
    Ok(rows)
}

/// Exactly 24 fields per row, locked order, on every emitted line.
fn check_schema_lock(timeseries_root: &Path) -> Result<()> {
    for (line, _) in emitted_rows(timeseries_root)? {
        let mut cursor = 0;
        for field in FIELD_ORDER {
            let needle = format!("\"{field}\":");
            match line[cursor..].find(&needle) {
                Some(at) => cursor += at + needle.len(),
                None => bail!("schema lock violated: field {field} missing or out of order"),
            }
        }
        let count = line.matches("\":").count();
        if count != FIELD_COUNT {
            bail!("schema lock violated: {count} fields in a row, expected {FIELD_COUNT}");
        }
    }
    println!("ok - schema lock");
    Ok(())
}

fn check_timestamp_hygiene(timeseries_root: &Path) -> Result<()> {
    for (line, _) in emitted_rows(timeseries_root)? {
        let ts = line
            .split("\"ts\":\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .ok_or_else(|| anyhow!("row without ts field"))?;
        if !ts.ends_with(":00:00Z") {
            bail!("timestamp hygiene violated: {ts}");
        }
    }
    println!("ok - timestamp hygiene");
    Ok(())
}

fn check_co2_bounds(timeseries_root: &Path) -> Result<()> {
    for (_, row) in emitted_rows(timeseries_root)? {
        if let Some(production) = row.production_co2_g_kwh {
            if !(0.0..=1200.0).contains(&production) {
                bail!("production CO2 {production} outside [0, 1200] at {}", row.ts);
            }
        }
        if let Some(consumption) = row.consumption_co2_g_kwh {
            if !(0.0..=1500.0).contains(&consumption) {
                bail!("consumption CO2 {consumption} outside [0, 1500] at {}", row.ts);
            }
        }
    }
    println!("ok - CO2 bounds");
    Ok(())
}

/// Every directed flow series must have its reciprocal in the same run,
/// otherwise net-import computation would be lossy.
fn check_flow_symmetry(source_root: &Path) -> Result<()> {
    let flows_dir = source_root.join("flows").join("2024-01");
    let mut directed: HashSet<(String, String)> = HashSet::new();
    for entry in fs::read_dir(&flows_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("xml") {
            continue;
        }
        for series in parse_flow_document(&fs::read_to_string(&path)?)? {
            directed.insert((series.in_zone, series.out_zone));
        }
    }
    for (in_zone, out_zone) in &directed {
        if !directed.contains(&(out_zone.clone(), in_zone.clone())) {
            bail!("flow symmetry violated: {out_zone}->{in_zone} missing");
        }
    }
    println!("ok - flow symmetry");
    Ok(())
}

fn check_alignment_round_trip() -> Result<()> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow!("bad date"))?
        .and_utc();
    let timestamps: Vec<_> = (0..4).map(|h| start + chrono::Duration::hours(h)).collect();
    let prices = StepSeries::new(
        Resolution::Pt60M,
        timestamps.clone(),
        vec![10.0, 20.0, 30.5, 40.25],
    )?;
    let energy = StepSeries::new(Resolution::Pt60M, timestamps, vec![4.0, 8.0, 2.0, 6.0])?;

    let price_back = aggregate(&expand(&prices, SeriesKind::Price)?, SeriesKind::Price)?;
    if price_back.values != prices.values {
        bail!("price alignment round-trip violated: {:?}", price_back.values);
    }
    let energy_back = aggregate(&expand(&energy, SeriesKind::Energy)?, SeriesKind::Energy)?;
    if energy_back.values != energy.values {
        bail!("energy alignment round-trip violated: {:?}", energy_back.values);
    }
    // Mixed-resolution pairs align onto the price side's step.
    let quarter_prices = expand(&prices, SeriesKind::Price)?;
    let (aligned_price, aligned_energy) = align(&quarter_prices, &energy)?;
    if aligned_price.len() != aligned_energy.len() {
        bail!("align left mismatched lengths");
    }
    println!("ok - alignment round-trip");
    Ok(())
}

/// The locked FX table resolves covered months and hard-errors outside
/// its range.
fn check_fx_resolution(source_root: &Path) -> Result<()> {
    let fx = FxTable::load(&source_root.join("fx_eur_sek.json"))?;
    let rate = fx.rate_for(NaiveDate::from_ymd_opt(2024, 1, 1).ok_or_else(|| anyhow!("bad date"))?)?;
    if (rate - 11.2834).abs() > 1e-9 {
        bail!("FX rate for 2024-01 resolved to {rate}");
    }
    let sek_kwh = eur_mwh_to_sek_kwh(47.43, rate);
    if (sek_kwh - 0.5352).abs() > 5e-4 {
        bail!("EUR/MWh conversion drifted: {sek_kwh}");
    }
    if fx
        .rate_for(NaiveDate::from_ymd_opt(2019, 12, 1).ok_or_else(|| anyhow!("bad date"))?)
        .is_ok()
    {
        bail!("FX table resolved an uncovered month");
    }
    if fx.file_hash().len() != 64 {
        bail!("FX file hash is not a SHA-256 digest");
    }
    println!("ok - FX resolution");
    Ok(())
}

/// Seal a rendered artifact into the report chain and verify linkage and
/// the query-hash identity.
fn check_report_sealing(source_root: &Path, vault_root: &Path, first: &Manifest) -> Result<()> {
    let fx = FxTable::load(&source_root.join("fx_eur_sek.json"))?;
    let rate = fx.rate_for(NaiveDate::from_ymd_opt(2024, 1, 1).ok_or_else(|| anyhow!("bad date"))?)?;
    let artifact = b"<html>januari 2024</html>";
    let event = ReportEvent {
        report_hash: eve_core::hash::sha256_hex(artifact),
        dataset_eve_id: first.dataset_eve_id.clone(),
        root_hash: first.root_hash.clone(),
        query_hash: String::new(),
        zone: "SE3".into(),
        period_start: NaiveDate::from_ymd_opt(2024, 1, 1).ok_or_else(|| anyhow!("bad date"))?,
        period_end: NaiveDate::from_ymd_opt(2024, 1, 31).ok_or_else(|| anyhow!("bad date"))?,
        language: "sv".into(),
        template_version: "t3".into(),
        fx_rate: rate,
        fx_period: "2024-01".into(),
        fx_source: "ecb:monthly".into(),
        fx_file_hash: fx.file_hash().to_string(),
    }
    .with_query_identity("v2");

    let report_path = vault_root.join(REPORT_VAULT_FILE);
    let record = seal_report(&report_path, &event)?;
    if record.event_index != 1 {
        bail!("report chain did not start at index 1");
    }
    let expected = eve_core::hash::query_hash("SE3", "2024-01-01", "2024-01-31", "v2");
    if event.query_hash != expected {
        bail!("query hash identity drifted");
    }
    chain::verify(&report_path)?;
    println!("ok - report sealing");
    Ok(())
}

fn check_lp_validity() -> Result<()> {
    let input = DispatchInput {
        prices: vec![0.50, 0.50, 2.00, 2.00],
        load_kwh: vec![1.0, 1.0, 1.0, 1.0],
        dt_hours: 1.0,
        effect_rate: 0.0,
        battery: BatteryParams {
            capacity_kwh: 2.0,
            max_power_kw: 2.0,
            efficiency: 1.0,
        },
    };
    let result = optimize(&input)?;
    if result.status != DispatchStatus::Optimal {
        bail!("dispatch LP did not report optimal: {:?}", result.status);
    }
    let tol = 1e-4;
    for t in 0..input.load_kwh.len() {
        let balance = result.grid_kwh[t] - result.charge_kwh[t] + result.discharge_kwh[t]
            - input.load_kwh[t];
        if balance.abs() > tol {
            bail!("LP balance violated at interval {t}: {balance}");
        }
        if result.soc_kwh[t] < -tol || result.soc_kwh[t] > input.battery.capacity_kwh + tol {
            bail!("LP SoC bound violated at interval {t}");
        }
        if result.peak_kw + tol < result.grid_kwh[t] / input.dt_hours {
            bail!("LP peak linkage violated at interval {t}");
        }
    }
    let n = input.load_kwh.len();
    if (result.soc_kwh[0] - result.soc_kwh[n]).abs() > tol {
        bail!("LP cycle constraint violated");
    }
    if result.total_cost >= 5.0 {
        bail!("LP arbitrage gained nothing: cost {}", result.total_cost);
    }
    println!("ok - LP validity");
    Ok(())
}

fn check_idempotent_reseal(
    registry: &MethodRegistry,
    source_root: &Path,
    timeseries_root: &Path,
    vault_path: &Path,
    build_date: NaiveDate,
) -> Result<()> {
    let before = chain::read_chain(vault_path)?.len();
    let mut canonicalizer = Canonicalizer::new(registry, source_root, timeseries_root);
    let build = canonicalizer.build_zone("SE3", 2024, 2024, build_date)?;
    let zone_dir = timeseries_root.join("SE3");
    let manifest = build_manifest(&zone_dir, &build, registry, Utc::now())?;
    let outcome = seal_dataset(vault_path, &manifest, "SE3/manifest.json", false)?;
    if !matches!(outcome, SealOutcome::Unchanged(_)) {
        bail!("idempotent re-seal violated: identical rebuild appended an event");
    }
    let after = chain::read_chain(vault_path)?.len();
    if before != after {
        bail!("idempotent re-seal violated: chain grew from {before} to {after}");
    }
    println!("ok - idempotent re-seal");
    Ok(())
}

fn check_query_provenance(
    registry: &MethodRegistry,
    timeseries_root: &Path,
    source_root: &Path,
    vault_path: &Path,
) -> Result<()> {
    let engine = QueryEngine::new(
        registry,
        timeseries_root,
        Some(&source_root.join("flows")),
        vault_path,
    );
    let envelope = engine.run(
        "SE3",
        NaiveDate::from_ymd_opt(2024, 1, 1).ok_or_else(|| anyhow!("bad date"))?,
        NaiveDate::from_ymd_opt(2024, 1, 31).ok_or_else(|| anyhow!("bad date"))?,
    )?;
    let vault = envelope
        .provenance
        .vault
        .as_ref()
        .ok_or_else(|| anyhow!("provenance completeness violated: vault block missing"))?;
    if vault.chain_hash.is_empty() || vault.root_hash.is_empty() {
        bail!("provenance completeness violated: empty vault hashes");
    }
    if envelope.provenance.registry_hash.is_empty()
        || envelope.provenance.dataset_eve_id.is_empty()
    {
        bail!("provenance completeness violated: registry or dataset id missing");
    }
    if !envelope.bottleneck.available {
        bail!("bottleneck should be available when the system stream exists");
    }
    if !envelope.flows.available {
        bail!("flows should be available for the staged window");
    }
    println!("ok - query provenance completeness");
    Ok(())
}

/// A window whose months have no system-price stream must flag the
/// bottleneck as unavailable with a methodology warning.
fn check_query_warning(
    registry: &MethodRegistry,
    timeseries_root: &Path,
    source_root: &Path,
    vault_path: &Path,
) -> Result<()> {
    let engine = QueryEngine::new(
        registry,
        timeseries_root,
        Some(&source_root.join("flows")),
        vault_path,
    );
    let envelope = engine.run(
        "SE3",
        NaiveDate::from_ymd_opt(2024, 2, 1).ok_or_else(|| anyhow!("bad date"))?,
        NaiveDate::from_ymd_opt(2024, 2, 28).ok_or_else(|| anyhow!("bad date"))?,
    )?;
    if envelope.bottleneck.available {
        bail!("bottleneck reported available without a system stream");
    }
    if !envelope
        .methodology_warnings
        .iter()
        .any(|w| w == SYSTEM_PRICE_WARNING)
    {
        bail!("missing system-price methodology warning");
    }
    println!("ok - query warning on absent system stream");
    Ok(())
}

fn check_supersession(
    registry: &MethodRegistry,
    source_root: &Path,
    timeseries_root: &Path,
    vault_path: &Path,
    build_date: NaiveDate,
    first: &Manifest,
) -> Result<()> {
    // Change one source value so the root hash moves.
    stage_price_doc(
        source_root,
        "SE3",
        "2024-02",
        "2024-02-01T00:00Z",
        "2024-02-01T03:00Z",
        &[99.99, 88.88, 77.77],
    )?;
    let manifest = {
        let mut canonicalizer = Canonicalizer::new(registry, source_root, timeseries_root);
        let build = canonicalizer.build_zone("SE3", 2024, 2024, build_date)?;
        let zone_dir = timeseries_root.join("SE3");
        build_manifest(&zone_dir, &build, registry, Utc::now())?
    };
    if manifest.root_hash == first.root_hash {
        bail!("fixture tamper did not change the root hash");
    }

    // Without force: refused, both hashes surfaced.
    match seal_dataset(vault_path, &manifest, "SE3/manifest.json", false) {
        Err(eve_core::EveError::VaultConflict { sealed, computed, .. }) => {
            if sealed != first.root_hash || computed != manifest.root_hash {
                bail!("vault conflict did not surface both hashes");
            }
        }
        other => bail!("changed root hash was not refused: {other:?}"),
    }

    // With force: superseding revision entry.
    let tail_before = chain::tail(vault_path)?
        .ok_or_else(|| anyhow!("empty vault before supersession"))?;
    let outcome = seal_dataset(vault_path, &manifest, "SE3/manifest.json", true)?;
    let record = outcome.record();
    let payload_id = record
        .payload
        .get("dataset_eve_id")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let supersedes = record
        .payload
        .get("supersedes")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    if payload_id != format!("{}_R1", first.dataset_eve_id) {
        bail!("supersession violated: revision id {payload_id}");
    }
    if supersedes != first.dataset_eve_id {
        bail!("supersession violated: supersedes {supersedes}");
    }
    if record.event_index <= tail_before.event_index {
        bail!("supersession violated: event index did not increase");
    }
    println!("ok - supersession");
    Ok(())
}

fn check_chain_linkage(vault_path: &Path) -> Result<()> {
    let count = chain::verify(vault_path)?;
    if count < 2 {
        bail!("chain linkage check needs at least two events, found {count}");
    }
    println!("ok - chain linkage ({count} events)");
    Ok(())
}

// --- fixture staging -------------------------------------------------------

fn stage_fixtures(source_root: &Path) -> Result<()> {
    // January prices for the zone and the system stream, one day hourly.
    let zone_prices: Vec<f64> = (0..24).map(|h| 35.0 + h as f64).collect();
    let sys_prices: Vec<f64> = (0..24).map(|h| 40.0 + (h % 4) as f64).collect();
    stage_price_doc(
        source_root,
        "SE3",
        "2024-01",
        "2024-01-01T00:00Z",
        "2024-01-02T00:00Z",
        &zone_prices,
    )?;
    stage_price_doc(
        source_root,
        "SYS",
        "2024-01",
        "2024-01-01T00:00Z",
        "2024-01-02T00:00Z",
        &sys_prices,
    )?;
    // February prices exist for the zone only (system stream absent).
    stage_price_doc(
        source_root,
        "SE3",
        "2024-02",
        "2024-02-01T00:00Z",
        "2024-02-01T03:00Z",
        &[30.0, 31.0, 32.0],
    )?;

    stage_generation_doc(source_root, "SE3", "2024-01")?;
    stage_flow_doc(source_root, "2024-01")?;
    stage_weather(source_root, "SE3", 2024)?;

    fs::create_dir_all(source_root)?;
    fs::write(
        source_root.join("fx_eur_sek.json"),
        r#"{"2023-12": 11.2895, "2024-01": 11.2834, "2024-02": 11.2176}"#,
    )?;
    Ok(())
}

fn stage_price_doc(
    source_root: &Path,
    zone: &str,
    month: &str,
    start: &str,
    end: &str,
    prices: &[f64],
) -> Result<()> {
    let mut points = String::new();
    for (i, price) in prices.iter().enumerate() {
        points.push_str(&format!(
            "<Point><position>{}</position><price.amount>{price:.2}</price.amount></Point>",
            i + 1
        ));
    }
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <Publication_MarketDocument>\n\
           <TimeSeries>\n\
             <in_Domain.mRID>{zone}</in_Domain.mRID>\n\
             <out_Domain.mRID>{zone}</out_Domain.mRID>\n\
             <Period>\n\
               <timeInterval><start>{start}</start><end>{end}</end></timeInterval>\n\
               <resolution>PT60M</resolution>\n\
               {points}\n\
             </Period>\n\
           </TimeSeries>\n\
         </Publication_MarketDocument>\n"
    );
    let dir = source_root.join("prices").join(zone);
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(format!("{month}.xml")), xml)?;
    Ok(())
}

fn stage_generation_doc(source_root: &Path, zone: &str, month: &str) -> Result<()> {
    let series = |psr: &str, domain_tag: &str, base: f64| {
        let mut points = String::new();
        for i in 0..24 {
            points.push_str(&format!(
                "<Point><position>{}</position><quantity>{:.1}</quantity></Point>",
                i + 1,
                base + i as f64
            ));
        }
        format!(
            "<TimeSeries>\n\
               <{domain_tag}>{zone}</{domain_tag}>\n\
               <MktPSRType><psrType>{psr}</psrType></MktPSRType>\n\
               <Period>\n\
                 <timeInterval><start>2024-01-01T00:00Z</start><end>2024-01-02T00:00Z</end></timeInterval>\n\
                 <resolution>PT60M</resolution>\n\
                 {points}\n\
               </Period>\n\
             </TimeSeries>\n"
        )
    };
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<GL_MarketDocument>\n{}{}{}{}</GL_MarketDocument>\n",
        series("B14", "inBiddingZone_Domain.mRID", 6800.0),
        series("B04", "inBiddingZone_Domain.mRID", 150.0),
        series("B12", "inBiddingZone_Domain.mRID", 2100.0),
        // Pumping consumption, out-domain only: must be excluded.
        series("B10", "outBiddingZone_Domain.mRID", 120.0),
    );
    let dir = source_root.join("generation").join(zone);
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(format!("{month}.xml")), xml)?;
    Ok(())
}

fn stage_flow_doc(source_root: &Path, month: &str) -> Result<()> {
    let series = |in_zone: &str, out_zone: &str, base: f64| {
        let mut points = String::new();
        for i in 0..24 {
            points.push_str(&format!(
                "<Point><position>{}</position><quantity>{:.1}</quantity></Point>",
                i + 1,
                base + (i % 6) as f64 * 10.0
            ));
        }
        format!(
            "<TimeSeries>\n\
               <in_Domain.mRID>{in_zone}</in_Domain.mRID>\n\
               <out_Domain.mRID>{out_zone}</out_Domain.mRID>\n\
               <Period>\n\
                 <timeInterval><start>2024-01-01T00:00Z</start><end>2024-01-02T00:00Z</end></timeInterval>\n\
                 <resolution>PT60M</resolution>\n\
                 {points}\n\
               </Period>\n\
             </TimeSeries>\n"
        )
    };
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Publication_MarketDocument>\n{}{}</Publication_MarketDocument>\n",
        series("SE3", "NO1", 400.0),
        series("NO1", "SE3", 150.0),
    );
    let dir = source_root.join("flows").join(month);
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("SE3_NO1.xml"), xml)?;
    Ok(())
}

fn stage_weather(source_root: &Path, zone: &str, year: i32) -> Result<()> {
    let mut csv = String::from("ts,temp,wind,solar\n");
    for h in 0..24 {
        csv.push_str(&format!(
            "{year}-01-01T{h:02}:00:00Z,{:.1},{:.1},{:.1}\n",
            -5.0 + h as f64 * 0.3,
            4.0 + (h % 5) as f64,
            if (8..16).contains(&h) { 55.0 } else { 0.0 }
        ));
    }
    let dir = source_root.join("weather").join(zone);
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(format!("{year}.csv")), csv)?;
    Ok(())
}
