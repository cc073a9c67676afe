//! Cross-border flow aggregates over a query window.
//!
//! Decoded per-direction point series are converted from MW-per-period to
//! MWh (`mw / steps_per_hour`), aggregated per border for each direction,
//! and summarized as the top borders each way plus the net total.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use eve_core::round::round2;
use eve_io::entsoe::FlowSeries;

const TOP_BORDERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BorderFlow {
    pub border: String,
    pub mwh: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowSummary {
    /// False when no flow runs exist for the window.
    pub available: bool,
    pub top_inbound: Vec<BorderFlow>,
    pub top_outbound: Vec<BorderFlow>,
    pub net_total_mwh: f64,
}

impl FlowSummary {
    pub fn unavailable() -> Self {
        FlowSummary {
            available: false,
            top_inbound: Vec::new(),
            top_outbound: Vec::new(),
            net_total_mwh: 0.0,
        }
    }
}

/// Aggregate decoded flow series for one zone over `[from, to]`.
pub fn summarize_flows(
    series: &[FlowSeries],
    zone: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> FlowSummary {
    let mut inbound: HashMap<String, f64> = HashMap::new();
    let mut outbound: HashMap<String, f64> = HashMap::new();
    let mut seen = false;
    for flow in series {
        let direction_in = flow.in_zone == zone;
        let direction_out = flow.out_zone == zone;
        if !direction_in && !direction_out {
            continue;
        }
        let steps = flow.resolution.steps_per_hour() as f64;
        let border = flow.border();
        for point in &flow.points {
            let ts = flow.timestamp_of(point.position);
            if ts < from || ts > to {
                continue;
            }
            seen = true;
            let mwh = point.quantity_mw / steps;
            if direction_in {
                *inbound.entry(border.clone()).or_insert(0.0) += mwh;
            } else {
                *outbound.entry(border.clone()).or_insert(0.0) += mwh;
            }
        }
    }
    if !seen {
        return FlowSummary::unavailable();
    }
    let total_in: f64 = inbound.values().sum();
    let total_out: f64 = outbound.values().sum();
    FlowSummary {
        available: true,
        top_inbound: top_borders(inbound),
        top_outbound: top_borders(outbound),
        net_total_mwh: round2(total_in - total_out),
    }
}

fn top_borders(totals: HashMap<String, f64>) -> Vec<BorderFlow> {
    let mut flows: Vec<BorderFlow> = totals
        .into_iter()
        .map(|(border, mwh)| BorderFlow {
            border,
            mwh: round2(mwh),
        })
        .collect();
    flows.sort_by(|a, b| {
        b.mwh
            .partial_cmp(&a.mwh)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.border.cmp(&b.border))
    });
    flows.truncate(TOP_BORDERS);
    flows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use eve_io::entsoe::{QuantityPoint, Resolution};

    fn series(in_zone: &str, out_zone: &str, resolution: Resolution, mw: &[f64]) -> FlowSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        FlowSeries {
            in_zone: in_zone.into(),
            out_zone: out_zone.into(),
            period_start: start,
            period_end: start + chrono::Duration::hours(mw.len() as i64),
            resolution,
            points: mw
                .iter()
                .enumerate()
                .map(|(i, q)| QuantityPoint {
                    position: (i + 1) as u32,
                    quantity_mw: *q,
                })
                .collect(),
        }
    }

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 31, 23, 0, 0).unwrap(),
        )
    }

    #[test]
    fn quarter_hour_mw_becomes_mwh() {
        let (from, to) = window();
        // Four quarter-hours of 400 MW = 400 MWh over the hour.
        let summary = summarize_flows(
            &[series("SE3", "NO1", Resolution::Pt15M, &[400.0, 400.0, 400.0, 400.0])],
            "SE3",
            from,
            to,
        );
        assert!(summary.available);
        assert_eq!(summary.top_inbound[0].mwh, 400.0);
        assert_eq!(summary.net_total_mwh, 400.0);
    }

    #[test]
    fn net_total_subtracts_exports() {
        let (from, to) = window();
        let summary = summarize_flows(
            &[
                series("SE3", "NO1", Resolution::Pt60M, &[500.0, 500.0]),
                series("FI", "SE3", Resolution::Pt60M, &[300.0]),
            ],
            "SE3",
            from,
            to,
        );
        assert_eq!(summary.top_inbound[0].border, "NO1-SE3");
        assert_eq!(summary.top_outbound[0].border, "FI-SE3");
        assert_eq!(summary.net_total_mwh, 700.0);
    }

    #[test]
    fn unrelated_borders_are_ignored() {
        let (from, to) = window();
        let summary = summarize_flows(
            &[series("DK1", "NO1", Resolution::Pt60M, &[900.0])],
            "SE3",
            from,
            to,
        );
        assert!(!summary.available);
    }

    #[test]
    fn top_list_is_capped_and_ordered() {
        let (from, to) = window();
        let neighbours = ["NO1", "NO3", "NO4", "FI", "DK1", "DK2"];
        let all: Vec<FlowSeries> = neighbours
            .iter()
            .enumerate()
            .map(|(i, n)| series("SE3", n, Resolution::Pt60M, &[100.0 * (i as f64 + 1.0)]))
            .collect();
        let summary = summarize_flows(&all, "SE3", from, to);
        assert_eq!(summary.top_inbound.len(), TOP_BORDERS);
        assert_eq!(summary.top_inbound[0].mwh, 600.0);
        assert!(summary.top_inbound.windows(2).all(|w| w[0].mwh >= w[1].mwh));
    }
}
