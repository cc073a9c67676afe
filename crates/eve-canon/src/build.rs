//! The canonicalizer: merges per-hour source streams into per-zone
//! per-month NDJSON files with the locked row schema.
//!
//! For every (zone, year, month) in the plan the builder loads day-ahead
//! prices, in-domain generation per PSR type, cross-border flows, and the
//! zone's weather year, then emits one row per hour. Fields fill
//! independently; an absent source never blocks a row, it only leaves
//! nulls behind. Each zone is processed to completion (all months
//! emitted) before manifest creation and vault sealing happen elsewhere.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use tracing::{debug, info, warn};

use eve_core::round::{round1, round2};
use eve_core::{EveError, EveResult, MethodRegistry};
use eve_io::entsoe::{
    parse_flow_document, parse_generation_document, parse_price_document, Resolution,
};
use eve_io::weather::WeatherCache;

use crate::emission;
use crate::row::{CanonicalRow, FuelClass};

/// Source stream identifiers recorded in every manifest.
pub const SOURCE_REFS: [&str; 4] = ["entsoe:A44", "entsoe:A75", "entsoe:A11", "era5:hourly"];

/// Deterministic dataset identity: methodology, zone, UTC build date.
pub fn dataset_id(methodology_version: &str, zone: &str, build_date: NaiveDate) -> String {
    format!("{methodology_version}:{zone}:{}", build_date.format("%Y%m%d"))
}

/// Outcome of canonicalizing one zone.
#[derive(Debug, Clone)]
pub struct ZoneBuild {
    pub zone: String,
    pub dataset_eve_id: String,
    /// Emitted file names relative to the zone directory, ascending.
    pub files: Vec<String>,
    pub total_rows: u64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub source_refs: Vec<String>,
}

pub struct Canonicalizer<'a> {
    registry: &'a MethodRegistry,
    source_root: PathBuf,
    timeseries_root: PathBuf,
    weather: WeatherCache,
}

impl<'a> Canonicalizer<'a> {
    pub fn new(registry: &'a MethodRegistry, source_root: &Path, timeseries_root: &Path) -> Self {
        Canonicalizer {
            registry,
            source_root: source_root.to_path_buf(),
            timeseries_root: timeseries_root.to_path_buf(),
            weather: WeatherCache::new(),
        }
    }

    /// Months whose start lies on or after the registry period start and
    /// not after the build date.
    pub fn plan_months(&self, from_year: i32, to_year: i32, build_date: NaiveDate) -> Vec<(i32, u32)> {
        let mut months = Vec::new();
        for year in from_year..=to_year {
            for month in 1..=12u32 {
                if let Some(start) = NaiveDate::from_ymd_opt(year, month, 1) {
                    if start >= self.registry.period_start && start <= build_date {
                        months.push((year, month));
                    }
                }
            }
        }
        months
    }

    /// Canonicalize one zone across the planned months. The zone-month
    /// files are owned exclusively by this builder for the duration.
    pub fn build_zone(
        &mut self,
        zone: &str,
        from_year: i32,
        to_year: i32,
        build_date: NaiveDate,
    ) -> EveResult<ZoneBuild> {
        self.registry.require_zone(zone)?;
        let months = self.plan_months(from_year, to_year, build_date);
        if months.is_empty() {
            return Err(EveError::Validation(format!(
                "no buildable months for {zone} between {from_year} and {to_year} \
                 (registry period starts {})",
                self.registry.period_start
            )));
        }

        let dataset_eve_id = dataset_id(&self.registry.methodology_version, zone, build_date);
        let zone_dir = self.timeseries_root.join(zone);
        fs::create_dir_all(&zone_dir)?;

        let mut files = Vec::new();
        let mut total_rows = 0u64;
        for &(year, month) in &months {
            let rows = self.build_month(zone, year, month, &dataset_eve_id)?;
            let file_name = format!("{year:04}-{month:02}.ndjson");
            let path = zone_dir.join(&file_name);
            write_rows(&path, &rows)?;
            debug!(zone, file = %file_name, rows = rows.len(), "emitted canonical month");
            total_rows += rows.len() as u64;
            files.push(file_name);
        }
        files.sort();
        info!(zone, months = months.len(), rows = total_rows, "zone canonicalized");

        let (first_year, first_month) = months[0];
        let (last_year, last_month) = months[months.len() - 1];
        Ok(ZoneBuild {
            zone: zone.to_string(),
            dataset_eve_id,
            files,
            total_rows,
            period_start: month_start(first_year, first_month)?,
            period_end: next_month(last_year, last_month)?,
            source_refs: SOURCE_REFS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// One row per hour of the month, fields filled independently.
    fn build_month(
        &mut self,
        zone: &str,
        year: i32,
        month: u32,
        dataset_eve_id: &str,
    ) -> EveResult<Vec<CanonicalRow>> {
        let (prices, native_resolution) = self.load_prices(zone, year, month)?;
        let generation = self.load_generation(zone, year, month)?;
        let net_import = self.load_net_import(zone, year, month)?;
        let weather = self
            .weather
            .hourly(&self.source_root, zone, year)?
            .clone();
        if weather.is_empty() {
            warn!(zone, year, "weather source absent; emitting null weather columns");
        }

        let resolution_source = native_resolution
            .unwrap_or(Resolution::Pt60M)
            .as_str()
            .to_string();
        let import_factor = self.registry.import_factor_g_kwh;

        let mut rows = Vec::new();
        for ts in month_hours(year, month)? {
            let spot = prices.get(&ts).copied().map(round2);
            let rec = weather.get(&ts);
            let temp = rec.and_then(|r| r.temp).map(round1);
            let wind_speed = rec.and_then(|r| r.wind).map(round2);
            let solar_rad = rec.and_then(|r| r.solar).map(round2);
            let hdd = rec
                .and_then(|r| r.temp)
                .map(|t| round2((18.0 - t).max(0.0)));

            // Per-class MW plus the PSR-keyed mix the emission engine needs.
            let mut class_mw: HashMap<FuelClass, f64> = HashMap::new();
            let mut mix: Vec<(String, f64)> = Vec::new();
            for (psr, hours) in &generation {
                if let Some(mw) = hours.get(&ts) {
                    mix.push((psr.clone(), *mw));
                    if let Some(class) = FuelClass::for_psr(psr) {
                        *class_mw.entry(class).or_insert(0.0) += *mw;
                    }
                }
            }
            // Summed in fixed column order so rebuilds are byte-stable.
            let total_gen: Option<f64> = if class_mw.is_empty() {
                None
            } else {
                Some(
                    FuelClass::ALL
                        .iter()
                        .filter_map(|c| class_mw.get(c))
                        .sum(),
                )
            };

            let net = net_import.get(&ts).copied();
            let production = emission::production_intensity(&mix);
            let consumption = emission::consumption_intensity(
                production,
                total_gen.unwrap_or(0.0),
                net.unwrap_or(0.0),
                import_factor,
            );

            let class = |c: FuelClass| class_mw.get(&c).copied().map(round2);
            rows.push(CanonicalRow {
                ts,
                zone: zone.to_string(),
                spot,
                temp,
                wind_speed,
                solar_rad,
                hdd,
                nuclear_mw: class(FuelClass::Nuclear),
                hydro_mw: class(FuelClass::Hydro),
                wind_onshore_mw: class(FuelClass::WindOnshore),
                wind_offshore_mw: class(FuelClass::WindOffshore),
                solar_mw: class(FuelClass::Solar),
                gas_mw: class(FuelClass::Gas),
                coal_mw: class(FuelClass::Coal),
                lignite_mw: class(FuelClass::Lignite),
                oil_mw: class(FuelClass::Oil),
                other_mw: class(FuelClass::Other),
                total_gen_mw: total_gen.map(round2),
                net_import_mw: net.map(round2),
                production_co2_g_kwh: production.map(round2),
                consumption_co2_g_kwh: consumption.map(round2),
                emission_scope: self.registry.emission_scope.clone(),
                resolution_source: resolution_source.clone(),
                dataset_eve_id: dataset_eve_id.to_string(),
            });
        }
        Ok(rows)
    }

    /// Hourly day-ahead prices for the month; quarter-hour periods are
    /// aggregated to hourly means.
    fn load_prices(
        &self,
        zone: &str,
        year: i32,
        month: u32,
    ) -> EveResult<(HashMap<DateTime<Utc>, f64>, Option<Resolution>)> {
        let path = self
            .source_root
            .join("prices")
            .join(zone)
            .join(format!("{year:04}-{month:02}.xml"));
        let Some(xml) = read_optional(&path)? else {
            warn!(zone, year, month, "price source absent for month");
            return Ok((HashMap::new(), None));
        };
        let mut native = None;
        let mut buckets: HashMap<DateTime<Utc>, (f64, u32)> = HashMap::new();
        for series in parse_price_document(&xml)? {
            if series.zone_code != zone {
                continue;
            }
            native.get_or_insert(series.resolution);
            for point in &series.prices {
                let hour = truncate_to_hour(series.timestamp_of(point.position));
                let entry = buckets.entry(hour).or_insert((0.0, 0));
                entry.0 += point.price_eur_mwh;
                entry.1 += 1;
            }
        }
        let hourly = buckets
            .into_iter()
            .map(|(ts, (sum, count))| (ts, sum / count as f64))
            .collect();
        Ok((hourly, native))
    }

    /// In-domain generation per PSR type, hourly means in MW.
    fn load_generation(
        &self,
        zone: &str,
        year: i32,
        month: u32,
    ) -> EveResult<BTreeMap<String, HashMap<DateTime<Utc>, f64>>> {
        let path = self
            .source_root
            .join("generation")
            .join(zone)
            .join(format!("{year:04}-{month:02}.xml"));
        let Some(xml) = read_optional(&path)? else {
            warn!(zone, year, month, "generation source absent for month");
            return Ok(BTreeMap::new());
        };
        // PSR-keyed and ordered: the emission mix must sum in a stable
        // order or rebuilt files could drift in the last bit.
        let mut by_psr: BTreeMap<String, HashMap<DateTime<Utc>, (f64, u32)>> = BTreeMap::new();
        for series in parse_generation_document(&xml)? {
            if series.zone_code != zone || !series.in_domain {
                // Consumption/pumping series carry only an out-domain mRID.
                continue;
            }
            let buckets = by_psr.entry(series.psr_type.clone()).or_default();
            for point in &series.points {
                let hour = truncate_to_hour(series.timestamp_of(point.position));
                let entry = buckets.entry(hour).or_insert((0.0, 0));
                entry.0 += point.quantity_mw;
                entry.1 += 1;
            }
        }
        Ok(by_psr
            .into_iter()
            .map(|(psr, buckets)| {
                let hourly = buckets
                    .into_iter()
                    .map(|(ts, (sum, count))| (ts, sum / count as f64))
                    .collect();
                (psr, hourly)
            })
            .collect())
    }

    /// Net import per hour: Σ inbound − Σ outbound across every
    /// interconnection that involves the zone.
    fn load_net_import(
        &self,
        zone: &str,
        year: i32,
        month: u32,
    ) -> EveResult<HashMap<DateTime<Utc>, f64>> {
        let dir = self
            .source_root
            .join("flows")
            .join(format!("{year:04}-{month:02}"));
        if !dir.is_dir() {
            warn!(zone, year, month, "flow sources absent for month");
            return Ok(HashMap::new());
        }
        let mut entries: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("xml"))
            .collect();
        entries.sort();

        let mut net: HashMap<DateTime<Utc>, f64> = HashMap::new();
        for path in entries {
            let xml = fs::read_to_string(&path)?;
            for series in parse_flow_document(&xml)? {
                let sign = if series.in_zone == zone {
                    1.0
                } else if series.out_zone == zone {
                    -1.0
                } else {
                    continue;
                };
                let mut buckets: HashMap<DateTime<Utc>, (f64, u32)> = HashMap::new();
                for point in &series.points {
                    let hour = truncate_to_hour(series.timestamp_of(point.position));
                    let entry = buckets.entry(hour).or_insert((0.0, 0));
                    entry.0 += point.quantity_mw;
                    entry.1 += 1;
                }
                for (ts, (sum, count)) in buckets {
                    *net.entry(ts).or_insert(0.0) += sign * (sum / count as f64);
                }
            }
        }
        Ok(net)
    }
}

fn write_rows(path: &Path, rows: &[CanonicalRow]) -> EveResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for row in rows {
        writer.write_all(row.to_line()?.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

fn read_optional(path: &Path) -> EveResult<Option<String>> {
    if path.exists() {
        Ok(Some(fs::read_to_string(path)?))
    } else {
        Ok(None)
    }
}

fn truncate_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts - Duration::minutes(ts.minute() as i64) - Duration::seconds(ts.second() as i64)
}

pub fn month_start(year: i32, month: u32) -> EveResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EveError::Validation(format!("invalid month {year}-{month}")))
}

pub fn next_month(year: i32, month: u32) -> EveResult<NaiveDate> {
    if month == 12 {
        month_start(year + 1, 1)
    } else {
        month_start(year, month + 1)
    }
}

/// Every hour of a month, UTC, minute and second zero.
pub fn month_hours(year: i32, month: u32) -> EveResult<Vec<DateTime<Utc>>> {
    let start = month_start(year, month)?
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| EveError::Validation("invalid month start".into()))?
        .and_utc();
    let end = next_month(year, month)?
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| EveError::Validation("invalid month end".into()))?
        .and_utc();
    let mut hours = Vec::new();
    let mut cursor = start;
    while cursor < end {
        hours.push(cursor);
        cursor += Duration::hours(1);
    }
    Ok(hours)
}
