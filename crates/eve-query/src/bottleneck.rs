//! Bottleneck spreads: zonal price minus system price, per hour.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use eve_core::round::{self, round2};

/// Sign-classification tolerance in EUR/MWh.
const ZERO_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Serialize)]
pub struct BottleneckStats {
    /// False when the system-price stream is absent for the window.
    pub available: bool,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Spread as a percentage of the system price, hours with a non-zero
    /// system price only.
    pub mean_pct: Option<f64>,
    pub max_pct: Option<f64>,
    pub hours_positive: u64,
    pub hours_negative: u64,
    pub hours_zero: u64,
}

impl BottleneckStats {
    pub fn unavailable() -> Self {
        BottleneckStats {
            available: false,
            mean: None,
            min: None,
            max: None,
            mean_pct: None,
            max_pct: None,
            hours_positive: 0,
            hours_negative: 0,
            hours_zero: 0,
        }
    }
}

/// Compute spreads for every hour that has both a zonal and a system
/// price. `zonal` pairs each hour with the zone's spot value.
pub fn bottleneck(
    zonal: &[(DateTime<Utc>, Option<f64>)],
    system: &HashMap<DateTime<Utc>, f64>,
) -> BottleneckStats {
    let mut spreads = Vec::new();
    let mut pcts = Vec::new();
    let mut positive = 0u64;
    let mut negative = 0u64;
    let mut zero = 0u64;
    for (ts, price) in zonal {
        let (Some(zone_price), Some(sys_price)) = (price, system.get(ts)) else {
            continue;
        };
        let spread = round2(zone_price - sys_price);
        if spread > ZERO_TOLERANCE {
            positive += 1;
        } else if spread < -ZERO_TOLERANCE {
            negative += 1;
        } else {
            zero += 1;
        }
        if sys_price.abs() > f64::EPSILON {
            pcts.push(spread / sys_price * 100.0);
        }
        spreads.push(spread);
    }
    BottleneckStats {
        available: true,
        mean: round::mean(&spreads).map(round2),
        min: round::min(&spreads).map(round2),
        max: round::max(&spreads).map(round2),
        mean_pct: round::mean(&pcts).map(round2),
        max_pct: round::max(&pcts).map(round2),
        hours_positive: positive,
        hours_negative: negative,
        hours_zero: zero,
    }
}
