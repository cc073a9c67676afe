//! Resolution alignment between 15-minute and 60-minute step series.
//!
//! Two explicit conversions exist and nothing else: expanding an hourly
//! series to quarter-hours (replicate prices, divide energy by four) and
//! aggregating quarter-hours to hours (mean prices, sum energy, drop an
//! incomplete trailing chunk). Intermediate arithmetic is double
//! precision; outputs are rounded to two decimals before storage.

use chrono::{DateTime, Duration, Utc};

use eve_core::round::round2;
use eve_core::{EveError, EveResult};

use crate::entsoe::Resolution;

/// Whether values replicate (price-like) or distribute (energy-like)
/// across a step change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Price,
    Energy,
}

/// A paired (values, timestamps) series at a known step length.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSeries {
    pub resolution: Resolution,
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
}

impl StepSeries {
    pub fn new(
        resolution: Resolution,
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<f64>,
    ) -> EveResult<Self> {
        if timestamps.len() != values.len() {
            return Err(EveError::Alignment(format!(
                "series has {} timestamps but {} values",
                timestamps.len(),
                values.len()
            )));
        }
        Ok(StepSeries {
            resolution,
            timestamps,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Expand a 60-minute series to 15 minutes. Input position `i` yields four
/// outputs at `t + {0, 15, 30, 45}` minutes.
pub fn expand(series: &StepSeries, kind: SeriesKind) -> EveResult<StepSeries> {
    if series.resolution != Resolution::Pt60M {
        return Err(EveError::Alignment(
            "expand requires a PT60M input series".into(),
        ));
    }
    let mut timestamps = Vec::with_capacity(series.len() * 4);
    let mut values = Vec::with_capacity(series.len() * 4);
    for (ts, value) in series.timestamps.iter().zip(&series.values) {
        let emitted = match kind {
            SeriesKind::Price => *value,
            SeriesKind::Energy => *value / 4.0,
        };
        for quarter in 0..4 {
            timestamps.push(*ts + Duration::minutes(15 * quarter));
            values.push(round2(emitted));
        }
    }
    StepSeries::new(Resolution::Pt15M, timestamps, values)
}

/// Aggregate a 15-minute series to 60 minutes. Each chunk of four
/// consecutive inputs becomes one output stamped at the chunk start;
/// incomplete trailing chunks are dropped.
pub fn aggregate(series: &StepSeries, kind: SeriesKind) -> EveResult<StepSeries> {
    if series.resolution != Resolution::Pt15M {
        return Err(EveError::Alignment(
            "aggregate requires a PT15M input series".into(),
        ));
    }
    let whole_chunks = series.len() / 4;
    let mut timestamps = Vec::with_capacity(whole_chunks);
    let mut values = Vec::with_capacity(whole_chunks);
    for chunk in 0..whole_chunks {
        let base = chunk * 4;
        let sum: f64 = series.values[base..base + 4].iter().sum();
        let value = match kind {
            SeriesKind::Price => sum / 4.0,
            SeriesKind::Energy => sum,
        };
        timestamps.push(series.timestamps[base]);
        values.push(round2(value));
    }
    StepSeries::new(Resolution::Pt60M, timestamps, values)
}

/// Bring an energy series onto the price series' resolution.
///
/// Same-resolution inputs must already match in length; otherwise the
/// energy side is converted and the post-conversion lengths must match
/// exactly. Any residual mismatch is a hard error for the month.
pub fn align(price: &StepSeries, energy: &StepSeries) -> EveResult<(StepSeries, StepSeries)> {
    let converted = if price.resolution == energy.resolution {
        energy.clone()
    } else {
        match energy.resolution {
            Resolution::Pt60M => expand(energy, SeriesKind::Energy)?,
            Resolution::Pt15M => aggregate(energy, SeriesKind::Energy)?,
        }
    };
    if price.len() != converted.len() {
        return Err(EveError::Alignment(format!(
            "price series has {} steps but energy series has {} after conversion",
            price.len(),
            converted.len()
        )));
    }
    Ok((price.clone(), converted))
}
