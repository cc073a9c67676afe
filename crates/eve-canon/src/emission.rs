//! CO₂ intensity of the hourly generation mix.
//!
//! Production intensity is the factor-weighted average over the in-domain
//! mix; consumption intensity blends in net imports at the locked
//! EU-average factor. PSR codes without a locked factor are skipped, never
//! defaulted.

use eve_core::factors;

/// Weighted-average production intensity in gCO₂/kWh.
///
/// `mix` pairs PSR codes with MW for one hour. Returns `None` when no
/// factored generation is present (denominator ≤ 0).
pub fn production_intensity(mix: &[(String, f64)]) -> Option<f64> {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for (psr, mw) in mix {
        let Some(factor) = factors::factor_for(psr) else {
            continue;
        };
        weighted += mw * factor;
        total += mw;
    }
    if total > 0.0 {
        Some(weighted / total)
    } else {
        None
    }
}

/// Consumption intensity in gCO₂/kWh.
///
/// Exporting hours (net import ≤ 0) consume the local mix unchanged.
/// Importing hours blend the import at `import_factor`:
/// `(prod · gen + import_factor · imp) / (gen + imp)`.
pub fn consumption_intensity(
    production: Option<f64>,
    total_gen_mw: f64,
    net_import_mw: f64,
    import_factor: f64,
) -> Option<f64> {
    if net_import_mw <= 0.0 {
        return production;
    }
    if total_gen_mw <= 0.0 {
        // Everything consumed is imported.
        return Some(import_factor);
    }
    let production = production?;
    Some(
        (production * total_gen_mw + import_factor * net_import_mw)
            / (total_gen_mw + net_import_mw),
    )
}
