//! End-to-end canonicalization over a staged source tree.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use tempfile::tempdir;

use eve_canon::row::CanonicalRow;
use eve_canon::{build_manifest, Canonicalizer};
use eve_core::MethodRegistry;

fn stage_price_doc(source_root: &Path, zone: &str, month: &str, prices: &[f64]) {
    let mut points = String::new();
    for (i, price) in prices.iter().enumerate() {
        points.push_str(&format!(
            "<Point><position>{}</position><price.amount>{price}</price.amount></Point>",
            i + 1
        ));
    }
    let xml = format!(
        "<Publication_MarketDocument><TimeSeries>\
         <in_Domain.mRID>{zone}</in_Domain.mRID>\
         <out_Domain.mRID>{zone}</out_Domain.mRID>\
         <Period><timeInterval><start>{month}-01T00:00Z</start><end>{month}-01T{len:02}:00Z</end></timeInterval>\
         <resolution>PT60M</resolution>{points}</Period>\
         </TimeSeries></Publication_MarketDocument>",
        len = prices.len()
    );
    let dir = source_root.join("prices").join(zone);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{month}.xml")), xml).unwrap();
}

fn stage_generation_doc(source_root: &Path, zone: &str, month: &str) {
    // Nuclear and gas in-domain, pumping out-domain (must be excluded).
    let xml = format!(
        "<GL_MarketDocument>\
         <TimeSeries><inBiddingZone_Domain.mRID>{zone}</inBiddingZone_Domain.mRID>\
         <MktPSRType><psrType>B14</psrType></MktPSRType>\
         <Period><timeInterval><start>{month}-01T00:00Z</start><end>{month}-01T02:00Z</end></timeInterval>\
         <resolution>PT60M</resolution>\
         <Point><position>1</position><quantity>1000</quantity></Point>\
         <Point><position>2</position><quantity>1000</quantity></Point></Period></TimeSeries>\
         <TimeSeries><inBiddingZone_Domain.mRID>{zone}</inBiddingZone_Domain.mRID>\
         <MktPSRType><psrType>B04</psrType></MktPSRType>\
         <Period><timeInterval><start>{month}-01T00:00Z</start><end>{month}-01T02:00Z</end></timeInterval>\
         <resolution>PT60M</resolution>\
         <Point><position>1</position><quantity>1000</quantity></Point>\
         <Point><position>2</position><quantity>500</quantity></Point></Period></TimeSeries>\
         <TimeSeries><outBiddingZone_Domain.mRID>{zone}</outBiddingZone_Domain.mRID>\
         <MktPSRType><psrType>B10</psrType></MktPSRType>\
         <Period><timeInterval><start>{month}-01T00:00Z</start><end>{month}-01T02:00Z</end></timeInterval>\
         <resolution>PT60M</resolution>\
         <Point><position>1</position><quantity>500</quantity></Point>\
         <Point><position>2</position><quantity>500</quantity></Point></Period></TimeSeries>\
         </GL_MarketDocument>"
    );
    let dir = source_root.join("generation").join(zone);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{month}.xml")), xml).unwrap();
}

fn stage_flow_doc(source_root: &Path, month: &str) {
    // 300 MW into SE3 from NO1, 100 MW out: net import 200 MW.
    let xml = "<Publication_MarketDocument>\
         <TimeSeries><in_Domain.mRID>SE3</in_Domain.mRID><out_Domain.mRID>NO1</out_Domain.mRID>\
         <Period><timeInterval><start>2024-01-01T00:00Z</start><end>2024-01-01T01:00Z</end></timeInterval>\
         <resolution>PT60M</resolution>\
         <Point><position>1</position><quantity>300</quantity></Point></Period></TimeSeries>\
         <TimeSeries><in_Domain.mRID>NO1</in_Domain.mRID><out_Domain.mRID>SE3</out_Domain.mRID>\
         <Period><timeInterval><start>2024-01-01T00:00Z</start><end>2024-01-01T01:00Z</end></timeInterval>\
         <resolution>PT60M</resolution>\
         <Point><position>1</position><quantity>100</quantity></Point></Period></TimeSeries>\
         </Publication_MarketDocument>";
    let dir = source_root.join("flows").join(month);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("SE3_NO1.xml"), xml).unwrap();
}

fn stage_weather(source_root: &Path, zone: &str) {
    let dir = source_root.join("weather").join(zone);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("2024.csv"),
        "ts,temp,wind,solar\n2024-01-01T00:00:00Z,-4.26,6.0,0.0\n",
    )
    .unwrap();
}

fn read_month_rows(timeseries_root: &Path, zone: &str, month: &str) -> Vec<CanonicalRow> {
    let text = fs::read_to_string(
        timeseries_root
            .join(zone)
            .join(format!("{month}.ndjson")),
    )
    .unwrap();
    text.lines()
        .map(|line| CanonicalRow::from_line(line).unwrap())
        .collect()
}

fn build_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

#[test]
fn month_has_one_row_per_hour_with_nulls_for_absent_sources() {
    let dir = tempdir().unwrap();
    let sources = dir.path().join("sources");
    let out = dir.path().join("timeseries");
    stage_price_doc(&sources, "SE3", "2024-01", &[50.0, 40.0]);

    let registry = MethodRegistry::current();
    let mut canonicalizer = Canonicalizer::new(&registry, &sources, &out);
    let build = canonicalizer
        .build_zone("SE3", 2024, 2024, build_date())
        .unwrap();
    assert_eq!(build.total_rows, 744);
    assert_eq!(build.files, vec!["2024-01.ndjson".to_string()]);

    let rows = read_month_rows(&out, "SE3", "2024-01");
    assert_eq!(rows.len(), 31 * 24);
    assert_eq!(rows[0].spot, Some(50.0));
    assert_eq!(rows[1].spot, Some(40.0));
    // Hour 3 has no price source; the row still exists with nulls.
    assert_eq!(rows[2].spot, None);
    assert_eq!(rows[2].temp, None);
    assert_eq!(rows[2].total_gen_mw, None);
    assert_eq!(rows[0].dataset_eve_id, "v2:SE3:20240101");
    assert_eq!(rows[0].emission_scope, "direct-combustion");
    assert_eq!(rows[0].resolution_source, "PT60M");
}

#[test]
fn generation_emissions_and_net_import_compose() {
    let dir = tempdir().unwrap();
    let sources = dir.path().join("sources");
    let out = dir.path().join("timeseries");
    stage_price_doc(&sources, "SE3", "2024-01", &[50.0]);
    stage_generation_doc(&sources, "SE3", "2024-01");
    stage_flow_doc(&sources, "2024-01");
    stage_weather(&sources, "SE3");

    let registry = MethodRegistry::current();
    let mut canonicalizer = Canonicalizer::new(&registry, &sources, &out);
    canonicalizer
        .build_zone("SE3", 2024, 2024, build_date())
        .unwrap();
    let rows = read_month_rows(&out, "SE3", "2024-01");

    let first = &rows[0];
    assert_eq!(first.nuclear_mw, Some(1000.0));
    assert_eq!(first.gas_mw, Some(1000.0));
    // Pumping series is out-domain: no hydro column.
    assert_eq!(first.hydro_mw, None);
    assert_eq!(first.total_gen_mw, Some(2000.0));
    // 1000 MW gas at 420 + 1000 MW nuclear at 0 over 2000 MW.
    assert_eq!(first.production_co2_g_kwh, Some(210.0));
    assert_eq!(first.net_import_mw, Some(200.0));
    // (210 * 2000 + 250 * 200) / 2200 = 213.64
    assert_eq!(first.consumption_co2_g_kwh, Some(213.64));
    assert_eq!(first.temp, Some(-4.3));
    assert_eq!(first.hdd, Some(22.26));

    // Second hour: gas drops to 500 MW, no flows recorded.
    let second = &rows[1];
    assert_eq!(second.total_gen_mw, Some(1500.0));
    assert_eq!(second.production_co2_g_kwh, Some(140.0));
    assert_eq!(second.net_import_mw, None);
    // No net-import value means no import blending.
    assert_eq!(second.consumption_co2_g_kwh, Some(140.0));
}

#[test]
fn rebuilding_identical_sources_is_byte_identical() {
    let dir = tempdir().unwrap();
    let sources = dir.path().join("sources");
    stage_price_doc(&sources, "SE3", "2024-01", &[50.0, 40.0, 41.55]);
    stage_generation_doc(&sources, "SE3", "2024-01");
    let registry = MethodRegistry::current();

    let mut roots = Vec::new();
    for name in ["one", "two"] {
        let out = dir.path().join(name);
        let mut canonicalizer = Canonicalizer::new(&registry, &sources, &out);
        let build = canonicalizer
            .build_zone("SE3", 2024, 2024, build_date())
            .unwrap();
        let manifest =
            build_manifest(&out.join("SE3"), &build, &registry, chrono::Utc::now()).unwrap();
        roots.push((manifest.root_hash, manifest.files));
    }
    assert_eq!(roots[0], roots[1]);
}

#[test]
fn quarter_hour_prices_aggregate_to_hourly_means() {
    let dir = tempdir().unwrap();
    let sources = dir.path().join("sources");
    let out = dir.path().join("timeseries");
    let xml = "<Publication_MarketDocument><TimeSeries>\
         <in_Domain.mRID>SE3</in_Domain.mRID><out_Domain.mRID>SE3</out_Domain.mRID>\
         <Period><timeInterval><start>2024-01-01T00:00Z</start><end>2024-01-01T01:00Z</end></timeInterval>\
         <resolution>PT15M</resolution>\
         <Point><position>1</position><price.amount>10</price.amount></Point>\
         <Point><position>2</position><price.amount>20</price.amount></Point>\
         <Point><position>3</position><price.amount>30</price.amount></Point>\
         <Point><position>4</position><price.amount>60</price.amount></Point>\
         </Period></TimeSeries></Publication_MarketDocument>";
    let dir_path = sources.join("prices").join("SE3");
    fs::create_dir_all(&dir_path).unwrap();
    fs::write(dir_path.join("2024-01.xml"), xml).unwrap();

    let registry = MethodRegistry::current();
    let mut canonicalizer = Canonicalizer::new(&registry, &sources, &out);
    canonicalizer
        .build_zone("SE3", 2024, 2024, build_date())
        .unwrap();
    let rows = read_month_rows(&out, "SE3", "2024-01");
    assert_eq!(rows[0].spot, Some(30.0));
    assert_eq!(rows[0].resolution_source, "PT15M");
}

#[test]
fn unknown_zone_refuses_to_build() {
    let dir = tempdir().unwrap();
    let registry = MethodRegistry::current();
    let mut canonicalizer =
        Canonicalizer::new(&registry, &dir.path().join("s"), &dir.path().join("t"));
    assert!(canonicalizer
        .build_zone("XX", 2024, 2024, build_date())
        .is_err());
}
