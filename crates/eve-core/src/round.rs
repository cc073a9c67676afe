//! Centralized numeric rounding and null-stripping aggregation helpers.
//!
//! Every numeric that reaches a canonical file or a query envelope is
//! rounded here, before serialization, never on display. Aggregations strip
//! missing values first and return `None` only when nothing remains.

/// Round to two decimal places (the canonical precision for prices, MW,
/// and CO₂ intensities).
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Round to one decimal place (temperatures).
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Drop the `None`s.
pub fn present(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().copied().flatten().collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Median over a copy of the input; even-length inputs average the two
/// middle elements.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_truncates_and_rounds_up() {
        assert_eq!(round2(47.434_9), 47.43);
        assert_eq!(round2(47.436), 47.44);
        assert_eq!(round2(-3.141_59), -3.14);
        assert_eq!(round2(213.636_36), 213.64);
    }

    #[test]
    fn round1_for_temperatures() {
        assert_eq!(round1(-13.46), -13.5);
        assert_eq!(round1(18.04), 18.0);
    }

    #[test]
    fn aggregations_strip_missing_values() {
        let values = [Some(2.0), None, Some(4.0), None];
        let kept = present(&values);
        assert_eq!(mean(&kept), Some(3.0));
        assert_eq!(min(&kept), Some(2.0));
        assert_eq!(max(&kept), Some(4.0));
    }

    #[test]
    fn all_missing_yields_none() {
        let kept = present(&[None, None]);
        assert_eq!(mean(&kept), None);
        assert_eq!(median(&kept), None);
    }

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }
}
