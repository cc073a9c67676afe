//! Locked emission-factor table keyed by ENTSO-E production source (PSR) code.
//!
//! The table is part of the methodology: its hash is recorded in the method
//! registry lock file, so changing any factor requires a new methodology
//! version and therefore new dataset ids.

use crate::hash::sha256_hex;

/// Direct combustion emission factor per PSR code, in gCO₂/kWh.
struct EmissionFactor {
    psr: &'static str,
    label: &'static str,
    g_per_kwh: f64,
}

const EMISSION_FACTORS: &[EmissionFactor] = &[
    EmissionFactor { psr: "B01", label: "Biomass", g_per_kwh: 230.0 },
    EmissionFactor { psr: "B02", label: "Fossil brown coal/lignite", g_per_kwh: 1150.0 },
    EmissionFactor { psr: "B03", label: "Fossil coal-derived gas", g_per_kwh: 660.0 },
    EmissionFactor { psr: "B04", label: "Fossil gas", g_per_kwh: 420.0 },
    EmissionFactor { psr: "B05", label: "Fossil hard coal", g_per_kwh: 980.0 },
    EmissionFactor { psr: "B06", label: "Fossil oil", g_per_kwh: 890.0 },
    EmissionFactor { psr: "B07", label: "Fossil oil shale", g_per_kwh: 1100.0 },
    EmissionFactor { psr: "B08", label: "Fossil peat", g_per_kwh: 1060.0 },
    EmissionFactor { psr: "B09", label: "Geothermal", g_per_kwh: 38.0 },
    EmissionFactor { psr: "B10", label: "Hydro pumped storage", g_per_kwh: 0.0 },
    EmissionFactor { psr: "B11", label: "Hydro run-of-river", g_per_kwh: 0.0 },
    EmissionFactor { psr: "B12", label: "Hydro water reservoir", g_per_kwh: 0.0 },
    EmissionFactor { psr: "B13", label: "Marine", g_per_kwh: 0.0 },
    EmissionFactor { psr: "B14", label: "Nuclear", g_per_kwh: 0.0 },
    EmissionFactor { psr: "B15", label: "Other renewable", g_per_kwh: 0.0 },
    EmissionFactor { psr: "B16", label: "Solar", g_per_kwh: 0.0 },
    EmissionFactor { psr: "B17", label: "Waste", g_per_kwh: 580.0 },
    EmissionFactor { psr: "B18", label: "Wind offshore", g_per_kwh: 0.0 },
    EmissionFactor { psr: "B19", label: "Wind onshore", g_per_kwh: 0.0 },
    EmissionFactor { psr: "B20", label: "Other", g_per_kwh: 700.0 },
];

/// EU-average import intensity used for consumption CO₂ when net imports
/// are positive, in gCO₂/kWh.
pub const IMPORT_FACTOR_G_KWH: f64 = 250.0;

/// Look up the locked factor for a PSR code. PSRs without a factor are
/// skipped by the emission engine, never defaulted.
pub fn factor_for(psr: &str) -> Option<f64> {
    EMISSION_FACTORS
        .iter()
        .find(|f| f.psr.eq_ignore_ascii_case(psr))
        .map(|f| f.g_per_kwh)
}

/// Human-readable label for diagnostics.
pub fn label_for(psr: &str) -> Option<&'static str> {
    EMISSION_FACTORS
        .iter()
        .find(|f| f.psr.eq_ignore_ascii_case(psr))
        .map(|f| f.label)
}

/// Stable hash of the whole table, recorded in the method registry.
///
/// The rendering is one `PSR:value` line per entry in table order with two
/// fixed decimals, plus the import factor.
pub fn table_hash() -> String {
    let mut text = String::new();
    for factor in EMISSION_FACTORS {
        text.push_str(&format!("{}:{:.2}\n", factor.psr, factor.g_per_kwh));
    }
    text.push_str(&format!("IMPORT:{IMPORT_FACTOR_G_KWH:.2}\n"));
    sha256_hex(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_all_psr_codes() {
        for n in 1..=20 {
            let code = format!("B{n:02}");
            assert!(factor_for(&code).is_some(), "missing factor for {code}");
        }
    }

    #[test]
    fn unknown_psr_has_no_factor() {
        assert!(factor_for("B21").is_none());
        assert!(factor_for("A44").is_none());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(factor_for("b04"), factor_for("B04"));
        assert_eq!(label_for("b04"), Some("Fossil gas"));
    }

    #[test]
    fn table_hash_is_stable() {
        assert_eq!(table_hash(), table_hash());
        assert_eq!(table_hash().len(), 64);
    }
}
