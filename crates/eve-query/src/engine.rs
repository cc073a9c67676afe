//! The deterministic query engine.
//!
//! Reconstructs summary statistics, derived indicators, and a
//! provenance-carrying result envelope from sealed canonical files over a
//! `(zone, from, to)` window. Queries never mutate anything; every number
//! in the envelope is re-derivable by a third party from the same files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use eve_canon::row::CanonicalRow;
use eve_core::{EveError, EveResult, MethodRegistry};
use eve_io::entsoe::{parse_flow_document, FlowSeries};
use eve_vault::chain;
use eve_vault::dataset::latest_entry;

use crate::bottleneck::{bottleneck, BottleneckStats};
use crate::flows::{summarize_flows, FlowSummary};
use crate::stats::{column_stats, mean_of, spot_stats, ColumnStats, SpotStats};

pub const SYSTEM_PRICE_WARNING: &str =
    "system-price stream absent for window; bottleneck indicators unavailable";
pub const CHAIN_BREAK_WARNING: &str =
    "dataset vault chain integrity violation; vault provenance withheld until repaired";

#[derive(Debug, Clone, Serialize)]
pub struct GenerationMix {
    pub nuclear_mw: Option<f64>,
    pub hydro_mw: Option<f64>,
    pub wind_onshore_mw: Option<f64>,
    pub wind_offshore_mw: Option<f64>,
    pub solar_mw: Option<f64>,
    pub gas_mw: Option<f64>,
    pub coal_mw: Option<f64>,
    pub lignite_mw: Option<f64>,
    pub oil_mw: Option<f64>,
    pub other_mw: Option<f64>,
    pub total_gen_mw: Option<f64>,
    pub net_import_mw: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VaultProvenance {
    pub chain_hash: String,
    pub event_index: u64,
    pub root_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Provenance {
    pub dataset_eve_id: String,
    pub methodology_version: String,
    pub emission_scope: String,
    pub registry_hash: String,
    pub vault: Option<VaultProvenance>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryEnvelope {
    pub zone: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub hours: u64,
    pub spot: SpotStats,
    pub temp: ColumnStats,
    pub wind_speed: ColumnStats,
    pub solar_rad: ColumnStats,
    pub hdd: ColumnStats,
    pub generation_mix: GenerationMix,
    pub production_co2: ColumnStats,
    pub consumption_co2: ColumnStats,
    pub bottleneck: BottleneckStats,
    pub flows: FlowSummary,
    pub methodology_warnings: Vec<String>,
    pub provenance: Provenance,
    pub rebuild_command: String,
    pub generated_at_utc: DateTime<Utc>,
}

pub struct QueryEngine<'a> {
    registry: &'a MethodRegistry,
    timeseries_root: PathBuf,
    /// Directory holding monthly flow run directories, when present.
    flows_root: Option<PathBuf>,
    dataset_vault: PathBuf,
}

impl<'a> QueryEngine<'a> {
    pub fn new(
        registry: &'a MethodRegistry,
        timeseries_root: &Path,
        flows_root: Option<&Path>,
        dataset_vault: &Path,
    ) -> Self {
        QueryEngine {
            registry,
            timeseries_root: timeseries_root.to_path_buf(),
            flows_root: flows_root.map(Path::to_path_buf),
            dataset_vault: dataset_vault.to_path_buf(),
        }
    }

    pub fn run(&self, zone: &str, from: NaiveDate, to: NaiveDate) -> EveResult<QueryEnvelope> {
        self.registry.require_zone(zone)?;
        if from > to {
            return Err(EveError::Validation(format!(
                "query window start {from} is after end {to}"
            )));
        }

        let months = overlapping_months(from, to);
        let rows = self.read_rows(zone, &months, from, to)?;
        if rows.is_empty() {
            return Err(EveError::NoData {
                zone: zone.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        debug!(zone, rows = rows.len(), "query window scanned");

        let mut warnings = Vec::new();

        let spot_values: Vec<Option<f64>> = rows.iter().map(|r| r.spot).collect();
        let mix = GenerationMix {
            nuclear_mw: mean_of(&collect(&rows, |r| r.nuclear_mw)),
            hydro_mw: mean_of(&collect(&rows, |r| r.hydro_mw)),
            wind_onshore_mw: mean_of(&collect(&rows, |r| r.wind_onshore_mw)),
            wind_offshore_mw: mean_of(&collect(&rows, |r| r.wind_offshore_mw)),
            solar_mw: mean_of(&collect(&rows, |r| r.solar_mw)),
            gas_mw: mean_of(&collect(&rows, |r| r.gas_mw)),
            coal_mw: mean_of(&collect(&rows, |r| r.coal_mw)),
            lignite_mw: mean_of(&collect(&rows, |r| r.lignite_mw)),
            oil_mw: mean_of(&collect(&rows, |r| r.oil_mw)),
            other_mw: mean_of(&collect(&rows, |r| r.other_mw)),
            total_gen_mw: mean_of(&collect(&rows, |r| r.total_gen_mw)),
            net_import_mw: mean_of(&collect(&rows, |r| r.net_import_mw)),
        };

        let system = self.system_price_lookup(&months, from, to)?;
        let bottleneck_stats = match system {
            Some(lookup) => {
                let zonal: Vec<(DateTime<Utc>, Option<f64>)> =
                    rows.iter().map(|r| (r.ts, r.spot)).collect();
                bottleneck(&zonal, &lookup)
            }
            None => {
                warnings.push(SYSTEM_PRICE_WARNING.to_string());
                BottleneckStats::unavailable()
            }
        };

        let flow_summary = self.flow_summary(zone, &months, from, to)?;

        let dataset_eve_id = rows[0].dataset_eve_id.clone();
        let vault = self.vault_provenance(&dataset_eve_id, &mut warnings)?;

        Ok(QueryEnvelope {
            zone: zone.to_string(),
            from,
            to,
            hours: rows.len() as u64,
            spot: spot_stats(&spot_values),
            temp: column_stats(&collect(&rows, |r| r.temp)),
            wind_speed: column_stats(&collect(&rows, |r| r.wind_speed)),
            solar_rad: column_stats(&collect(&rows, |r| r.solar_rad)),
            hdd: column_stats(&collect(&rows, |r| r.hdd)),
            generation_mix: mix,
            production_co2: column_stats(&collect(&rows, |r| r.production_co2_g_kwh)),
            consumption_co2: column_stats(&collect(&rows, |r| r.consumption_co2_g_kwh)),
            bottleneck: bottleneck_stats,
            flows: flow_summary,
            methodology_warnings: warnings,
            provenance: Provenance {
                dataset_eve_id,
                methodology_version: self.registry.methodology_version.clone(),
                emission_scope: self.registry.emission_scope.clone(),
                registry_hash: self.registry.registry_hash()?,
                vault,
            },
            rebuild_command: format!(
                "eve build --zones {zone} --from {} --to {}",
                from.year(),
                to.year()
            ),
            generated_at_utc: Utc::now(),
        })
    }

    /// Stream the zone's monthly files that overlap the window.
    fn read_rows(
        &self,
        zone: &str,
        months: &[(i32, u32)],
        from: NaiveDate,
        to: NaiveDate,
    ) -> EveResult<Vec<CanonicalRow>> {
        let zone_dir = self.timeseries_root.join(zone);
        let mut rows = Vec::new();
        for &(year, month) in months {
            let path = zone_dir.join(format!("{year:04}-{month:02}.ndjson"));
            if !path.is_file() {
                continue;
            }
            let text = fs::read_to_string(&path)?;
            for line in text.lines().filter(|l| !l.trim().is_empty()) {
                let row = CanonicalRow::from_line(line)?;
                let date = row.ts.date_naive();
                if date >= from && date <= to {
                    rows.push(row);
                }
            }
        }
        Ok(rows)
    }

    /// Hourly system-price lookup for the window, when the stream exists.
    fn system_price_lookup(
        &self,
        months: &[(i32, u32)],
        from: NaiveDate,
        to: NaiveDate,
    ) -> EveResult<Option<HashMap<DateTime<Utc>, f64>>> {
        let system_zone = self.registry.system_price_code.clone();
        let rows = self.read_rows(&system_zone, months, from, to)?;
        let lookup: HashMap<DateTime<Utc>, f64> = rows
            .into_iter()
            .filter_map(|row| row.spot.map(|price| (row.ts, price)))
            .collect();
        // A stream with no priced hours is as absent as a missing file.
        if lookup.is_empty() {
            return Ok(None);
        }
        Ok(Some(lookup))
    }

    /// Decode flow runs for the window's months, when a flows root exists.
    fn flow_summary(
        &self,
        zone: &str,
        months: &[(i32, u32)],
        from: NaiveDate,
        to: NaiveDate,
    ) -> EveResult<FlowSummary> {
        let Some(flows_root) = &self.flows_root else {
            return Ok(FlowSummary::unavailable());
        };
        let mut series: Vec<FlowSeries> = Vec::new();
        for &(year, month) in months {
            let dir = flows_root.join(format!("{year:04}-{month:02}"));
            if !dir.is_dir() {
                continue;
            }
            let mut paths: Vec<PathBuf> = fs::read_dir(&dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("xml"))
                .collect();
            paths.sort();
            for path in paths {
                let xml = fs::read_to_string(&path)?;
                series.extend(parse_flow_document(&xml)?);
            }
        }
        if series.is_empty() {
            return Ok(FlowSummary::unavailable());
        }
        let window_start = from
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| EveError::Validation("invalid window start".into()))?
            .and_utc();
        let window_end = to
            .and_hms_opt(23, 0, 0)
            .ok_or_else(|| EveError::Validation("invalid window end".into()))?
            .and_utc();
        Ok(summarize_flows(&series, zone, window_start, window_end))
    }

    /// Vault tail for the dataset family, after verifying chain linkage.
    /// A broken chain withholds provenance instead of reporting it.
    fn vault_provenance(
        &self,
        dataset_eve_id: &str,
        warnings: &mut Vec<String>,
    ) -> EveResult<Option<VaultProvenance>> {
        match chain::verify(&self.dataset_vault) {
            Ok(_) => {}
            Err(EveError::ChainBreak { index, detail }) => {
                warn!(index, detail = %detail, "dataset vault chain break");
                warnings.push(CHAIN_BREAK_WARNING.to_string());
                return Ok(None);
            }
            Err(other) => return Err(other),
        }
        let Some(record) = latest_entry(&self.dataset_vault, dataset_eve_id)? else {
            return Ok(None);
        };
        let root_hash = record
            .payload
            .get("root_hash")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        Ok(Some(VaultProvenance {
            chain_hash: record.chain_hash,
            event_index: record.event_index,
            root_hash,
        }))
    }
}

fn collect(rows: &[CanonicalRow], field: impl Fn(&CanonicalRow) -> Option<f64>) -> Vec<Option<f64>> {
    rows.iter().map(field).collect()
}

/// Months whose span overlaps `[from, to]`.
pub fn overlapping_months(from: NaiveDate, to: NaiveDate) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let mut year = from.year();
    let mut month = from.month();
    loop {
        months.push((year, month));
        if (year, month) >= (to.year(), to.month()) {
            break;
        }
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    months
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_months_spans_year_boundary() {
        let months = overlapping_months(
            NaiveDate::from_ymd_opt(2023, 11, 15).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
        );
        assert_eq!(months, vec![(2023, 11), (2023, 12), (2024, 1), (2024, 2)]);
    }

    #[test]
    fn single_month_window() {
        let months = overlapping_months(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
        );
        assert_eq!(months, vec![(2024, 1)]);
    }
}
