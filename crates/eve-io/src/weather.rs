//! ERA5 hourly reanalysis extracts, one CSV per zone per year.
//!
//! The loader is cheap enough to run per zone but the canonicalizer visits
//! twelve months per zone, so results are memoized in an explicit
//! [`WeatherCache`] threaded through the build (no global state).

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use eve_core::{EveError, EveResult};

/// One reanalysis hour. Absent columns stay absent; nothing is imputed.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherRecord {
    pub ts: DateTime<Utc>,
    pub temp: Option<f64>,
    pub wind: Option<f64>,
    pub solar: Option<f64>,
}

pub type WeatherYear = HashMap<DateTime<Utc>, WeatherRecord>;

/// Per-(zone, year) memoization of decoded weather files.
#[derive(Debug, Default)]
pub struct WeatherCache {
    loaded: HashMap<(String, i32), WeatherYear>,
}

impl WeatherCache {
    pub fn new() -> Self {
        WeatherCache::default()
    }

    /// Hourly records for a zone-year, loading at most once. A missing
    /// source file yields an empty map; the builder reports the soft
    /// notice, rows are still emitted with nulls.
    pub fn hourly(&mut self, root: &Path, zone: &str, year: i32) -> EveResult<&WeatherYear> {
        let key = (zone.to_string(), year);
        match self.loaded.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let path = weather_path(root, zone, year);
                let records = if path.exists() {
                    load_weather_csv(&path)?
                } else {
                    WeatherYear::new()
                };
                Ok(entry.insert(records))
            }
        }
    }
}

pub fn weather_path(root: &Path, zone: &str, year: i32) -> PathBuf {
    root.join("weather").join(zone).join(format!("{year}.csv"))
}

fn load_weather_csv(path: &Path) -> EveResult<WeatherYear> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|err| EveError::Parse(format!("weather file '{}': {err}", path.display())))?;
    let mut records = WeatherYear::new();
    for row in reader.deserialize() {
        let record: WeatherRecord = row.map_err(|err| {
            EveError::Parse(format!("weather file '{}': {err}", path.display()))
        })?;
        records.insert(record.ts, record);
    }
    Ok(records)
}
