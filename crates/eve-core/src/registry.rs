//! The locked method registry.
//!
//! A single configuration object pinning the methodology version string,
//! emission-scope string, and factor-table hash. It is immutable after
//! load; changing anything in it requires a new methodology version, which
//! in turn forces new dataset ids. Its own identity is `registry_hash`,
//! the SHA-256 over its stable serialization, and that hash is attached to
//! every query result.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EveError, EveResult};
use crate::factors;
use crate::hash::hash_canonical;

/// Default lock file name, looked up next to the data roots.
pub const LOCK_FILE_NAME: &str = "method_registry.lock.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodRegistry {
    /// Methodology version string, a component of every dataset id.
    pub methodology_version: String,
    /// Locked emission-scope string carried verbatim in every row.
    pub emission_scope: String,
    /// Hash of the compiled emission-factor table; must match the binary.
    pub factor_table_hash: String,
    /// EU-average import intensity used for consumption CO₂, gCO₂/kWh.
    pub import_factor_g_kwh: f64,
    /// Canonical output starts at this date; earlier months are never emitted.
    pub period_start: NaiveDate,
    /// Closed registry of buildable bidding-zone codes.
    pub zones: Vec<String>,
    /// Zone code of the system-price canonical stream.
    pub system_price_code: String,
}

impl MethodRegistry {
    /// Load and validate a lock file. A missing file is a fatal
    /// configuration error; builds refuse to start without one.
    pub fn load(path: &Path) -> EveResult<Self> {
        let text = fs::read_to_string(path).map_err(|err| {
            EveError::Config(format!(
                "missing registry lock file '{}': {err}",
                path.display()
            ))
        })?;
        let registry: MethodRegistry = serde_json::from_str(&text)
            .map_err(|err| EveError::Config(format!("invalid registry lock file: {err}")))?;
        registry.validate()?;
        Ok(registry)
    }

    /// Check the lock against the compiled factor table.
    pub fn validate(&self) -> EveResult<()> {
        let compiled = factors::table_hash();
        if self.factor_table_hash != compiled {
            return Err(EveError::Config(format!(
                "factor table hash mismatch: lock file pins {} but this build carries {compiled}; \
                 a factor change requires a new methodology version",
                self.factor_table_hash
            )));
        }
        if self.zones.is_empty() {
            return Err(EveError::Config("registry lists no zones".into()));
        }
        Ok(())
    }

    pub fn is_known_zone(&self, zone: &str) -> bool {
        self.zones.iter().any(|z| z == zone) || zone == self.system_price_code
    }

    /// Fail fast on zone codes outside the closed registry.
    pub fn require_zone(&self, zone: &str) -> EveResult<()> {
        if self.is_known_zone(zone) {
            Ok(())
        } else {
            Err(EveError::Config(format!(
                "unknown zone code '{zone}'; registry covers {}",
                self.zones.join(", ")
            )))
        }
    }

    /// SHA-256 over the stable serialization of the whole registry.
    pub fn registry_hash(&self) -> EveResult<String> {
        hash_canonical(self)
    }

    /// Write the lock file, pretty-printed. Only used when staging a new
    /// methodology; existing locks are never rewritten in place.
    pub fn write(&self, path: &Path) -> EveResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// The registry shipped with this methodology: Swedish bidding zones
    /// plus the Nordic system-price stream.
    pub fn current() -> Self {
        MethodRegistry {
            methodology_version: "v2".into(),
            emission_scope: "direct-combustion".into(),
            factor_table_hash: factors::table_hash(),
            import_factor_g_kwh: factors::IMPORT_FACTOR_G_KWH,
            period_start: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            zones: vec!["SE1".into(), "SE2".into(), "SE3".into(), "SE4".into()],
            system_price_code: "SYS".into(),
        }
    }
}
