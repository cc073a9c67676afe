//! Summary statistics over null-allowed canonical columns.

use serde::Serialize;

use eve_core::round::{self, round2};

/// `{mean, min, max}` over the non-null values of one column. All fields
/// are `null` when the column is missing throughout the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Spot prices additionally report the median.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpotStats {
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub median: Option<f64>,
}

pub fn column_stats(values: &[Option<f64>]) -> ColumnStats {
    let kept = round::present(values);
    ColumnStats {
        mean: round::mean(&kept).map(round2),
        min: round::min(&kept).map(round2),
        max: round::max(&kept).map(round2),
    }
}

pub fn spot_stats(values: &[Option<f64>]) -> SpotStats {
    let kept = round::present(values);
    SpotStats {
        mean: round::mean(&kept).map(round2),
        min: round::min(&kept).map(round2),
        max: round::max(&kept).map(round2),
        median: round::median(&kept).map(round2),
    }
}

/// Arithmetic mean of one MW column, for the generation-mix block.
pub fn mean_of(values: &[Option<f64>]) -> Option<f64> {
    let kept = round::present(values);
    round::mean(&kept).map(round2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_ignore_nulls() {
        let stats = column_stats(&[Some(1.0), None, Some(2.0), Some(6.0)]);
        assert_eq!(stats.mean, Some(3.0));
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(6.0));
    }

    #[test]
    fn missing_only_column_yields_null_fields() {
        let stats = column_stats(&[None, None]);
        assert_eq!(stats, ColumnStats { mean: None, min: None, max: None });
    }

    #[test]
    fn spot_includes_median() {
        let stats = spot_stats(&[Some(10.0), Some(30.0), Some(20.0), None]);
        assert_eq!(stats.median, Some(20.0));
    }

    #[test]
    fn results_are_rounded_to_two_decimals() {
        let stats = column_stats(&[Some(1.0), Some(2.0), Some(2.0)]);
        assert_eq!(stats.mean, Some(1.67));
    }
}
