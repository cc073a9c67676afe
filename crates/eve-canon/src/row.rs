//! The locked 24-field canonical row schema (V2).
//!
//! Field order is the declaration order below and is part of the
//! content-addressing surface: rows serialize to one JSON object per line
//! and the bytes are what gets hashed. Reordering, renaming, or adding a
//! field invalidates every sealed dataset and therefore requires a new
//! methodology version.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use eve_core::{EveError, EveResult};

/// Number of fields every canonical row carries, test-enforced.
pub const FIELD_COUNT: usize = 24;

/// Locked field order; serialization must match this exactly.
pub const FIELD_ORDER: [&str; FIELD_COUNT] = [
    "ts",
    "zone",
    "spot",
    "temp",
    "wind_speed",
    "solar_rad",
    "hdd",
    "nuclear_mw",
    "hydro_mw",
    "wind_onshore_mw",
    "wind_offshore_mw",
    "solar_mw",
    "gas_mw",
    "coal_mw",
    "lignite_mw",
    "oil_mw",
    "other_mw",
    "total_gen_mw",
    "net_import_mw",
    "production_co2_g_kwh",
    "consumption_co2_g_kwh",
    "emission_scope",
    "resolution_source",
    "dataset_eve_id",
];

/// One canonical hour for one zone. All numerics arrive pre-rounded (two
/// decimals, temperatures one); missing source values stay `None` and are
/// never imputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRow {
    #[serde(with = "canonical_ts")]
    pub ts: DateTime<Utc>,
    pub zone: String,
    pub spot: Option<f64>,
    pub temp: Option<f64>,
    pub wind_speed: Option<f64>,
    pub solar_rad: Option<f64>,
    pub hdd: Option<f64>,
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
    pub production_co2_g_kwh: Option<f64>,
    pub consumption_co2_g_kwh: Option<f64>,
    pub emission_scope: String,
    pub resolution_source: String,
    pub dataset_eve_id: String,
}

/// UTC instants rendered `%Y-%m-%dT%H:%M:%SZ` with zero-padded fields; the
/// minute component of a canonical row is always `:00:00Z`.
mod canonical_ts {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        let naive = NaiveDateTime::parse_from_str(&text, FORMAT).map_err(serde::de::Error::custom)?;
        Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
    }
}

impl CanonicalRow {
    /// One NDJSON line, newline-terminated.
    pub fn to_line(&self) -> EveResult<String> {
        if self.ts.minute() != 0 || self.ts.second() != 0 {
            return Err(EveError::Validation(format!(
                "canonical timestamp {} is not hour-aligned",
                self.ts
            )));
        }
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    pub fn from_line(line: &str) -> EveResult<Self> {
        Ok(serde_json::from_str(line)?)
    }
}

/// The ten generation columns, in row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuelClass {
    Nuclear,
    Hydro,
    WindOnshore,
    WindOffshore,
    Solar,
    Gas,
    Coal,
    Lignite,
    Oil,
    Other,
}

impl FuelClass {
    pub const ALL: [FuelClass; 10] = [
        FuelClass::Nuclear,
        FuelClass::Hydro,
        FuelClass::WindOnshore,
        FuelClass::WindOffshore,
        FuelClass::Solar,
        FuelClass::Gas,
        FuelClass::Coal,
        FuelClass::Lignite,
        FuelClass::Oil,
        FuelClass::Other,
    ];

    /// Which row column a PSR code lands in.
    pub fn for_psr(psr: &str) -> Option<FuelClass> {
        match psr.to_ascii_uppercase().as_str() {
            "B14" => Some(FuelClass::Nuclear),
            "B10" | "B11" | "B12" => Some(FuelClass::Hydro),
            "B19" => Some(FuelClass::WindOnshore),
            "B18" => Some(FuelClass::WindOffshore),
            "B16" => Some(FuelClass::Solar),
            "B03" | "B04" => Some(FuelClass::Gas),
            "B05" => Some(FuelClass::Coal),
            "B02" | "B08" => Some(FuelClass::Lignite),
            "B06" | "B07" => Some(FuelClass::Oil),
            "B01" | "B09" | "B13" | "B15" | "B17" | "B20" => Some(FuelClass::Other),
            _ => None,
        }
    }
}
