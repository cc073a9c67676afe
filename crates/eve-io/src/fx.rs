//! Locked monthly EUR/SEK exchange-rate table.
//!
//! The table is a JSON map `{ "YYYY-MM": rate }` published once per
//! methodology. It is loaded whole, its file hash is exposed for report
//! sealing, and lookups outside the covered range are hard errors; there
//! is no silent fallback rate.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{Datelike, NaiveDate};

use eve_core::hash::sha256_hex;
use eve_core::{EveError, EveResult};

#[derive(Debug, Clone)]
pub struct FxTable {
    rates: BTreeMap<String, f64>,
    file_hash: String,
}

impl FxTable {
    /// Load the table once; callers thread the loaded value through the
    /// build instead of re-reading the file.
    pub fn load(path: &Path) -> EveResult<Self> {
        let bytes = fs::read(path).map_err(|err| {
            EveError::Config(format!("missing FX table '{}': {err}", path.display()))
        })?;
        let rates: BTreeMap<String, f64> = serde_json::from_slice(&bytes)
            .map_err(|err| EveError::Parse(format!("FX table '{}': {err}", path.display())))?;
        if rates.is_empty() {
            return Err(EveError::Config(format!(
                "FX table '{}' is empty",
                path.display()
            )));
        }
        Ok(FxTable {
            file_hash: sha256_hex(&bytes),
            rates,
        })
    }

    pub fn from_rates(rates: BTreeMap<String, f64>) -> EveResult<Self> {
        let bytes = serde_json::to_vec(&rates)?;
        Ok(FxTable {
            file_hash: sha256_hex(&bytes),
            rates,
        })
    }

    /// SHA-256 of the table file, recorded in every report vault entry.
    pub fn file_hash(&self) -> &str {
        &self.file_hash
    }

    /// First and last covered `YYYY-MM` keys.
    pub fn covered_range(&self) -> String {
        let first = self.rates.keys().next().map(String::as_str).unwrap_or("-");
        let last = self
            .rates
            .keys()
            .next_back()
            .map(String::as_str)
            .unwrap_or("-");
        format!("{first}..{last}")
    }

    /// Rate for the month containing `period_start`.
    pub fn rate_for(&self, period_start: NaiveDate) -> EveResult<f64> {
        let key = month_key(period_start);
        self.rates
            .get(&key)
            .copied()
            .ok_or_else(|| EveError::FxMissing {
                month: key,
                covered: self.covered_range(),
            })
    }
}

pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// EUR/MWh to SEK/kWh at a given monthly rate.
pub fn eur_mwh_to_sek_kwh(eur_mwh: f64, rate: f64) -> f64 {
    eur_mwh * rate / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FxTable {
        let mut rates = BTreeMap::new();
        rates.insert("2023-12".to_string(), 11.2895);
        rates.insert("2024-01".to_string(), 11.2834);
        rates.insert("2024-02".to_string(), 11.2176);
        FxTable::from_rates(rates).unwrap()
    }

    #[test]
    fn resolves_january_2024() {
        let rate = table()
            .rate_for(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .unwrap();
        assert_eq!(rate, 11.2834);
        let sek_kwh = eur_mwh_to_sek_kwh(47.43, rate);
        assert!((sek_kwh - 0.5352).abs() < 5e-4, "got {sek_kwh}");
    }

    #[test]
    fn missing_month_is_a_hard_error() {
        let err = table()
            .rate_for(NaiveDate::from_ymd_opt(2019, 12, 1).unwrap())
            .unwrap_err();
        match err {
            EveError::FxMissing { month, covered } => {
                assert_eq!(month, "2019-12");
                assert_eq!(covered, "2023-12..2024-02");
            }
            other => panic!("expected FxMissing, got {other}"),
        }
    }

    #[test]
    fn file_hash_tracks_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fx_eur_sek.json");
        fs::write(&path, r#"{"2024-01": 11.2834}"#).unwrap();
        let loaded = FxTable::load(&path).unwrap();
        assert_eq!(loaded.file_hash().len(), 64);
        assert_eq!(
            loaded
                .rate_for(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
                .unwrap(),
            11.2834
        );
    }
}
