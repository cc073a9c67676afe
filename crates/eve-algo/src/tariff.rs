//! Closed-form tariff composition over a metered interval series.
//!
//! A tariff result decomposes the bill into spot cost, variable grid fee,
//! monthly effect (peak) fee, fixed fee, energy tax, and VAT. Effect fees
//! apply only at month/year scope, using the configured peak rule per
//! month; day/week simulations expose the peak but charge nothing for it.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Serialize;

use eve_core::round::round2;
use eve_core::{EveError, EveResult};
use eve_io::entsoe::Resolution;

/// Simulation scope, which decides whether effect and fixed fees apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffPeriod {
    Day,
    Week,
    Month,
    Year,
}

/// How a month's effective peak kW is derived from its hourly kW series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakRule {
    /// Single highest hour.
    MaxHour,
    /// Mean of the three highest hours.
    Top3HourlyAvg,
    /// Mean of the five highest hours.
    Top5HourlyAvg,
}

impl PeakRule {
    fn take(self) -> usize {
        match self {
            PeakRule::MaxHour => 1,
            PeakRule::Top3HourlyAvg => 3,
            PeakRule::Top5HourlyAvg => 5,
        }
    }
}

/// Grid-contract rates. Variable fees are in öre/kWh as printed on the
/// contract; conversion to SEK happens here.
#[derive(Debug, Clone)]
pub struct TariffRates {
    pub energy_ore_kwh: f64,
    pub tax_ore_kwh: f64,
    pub fixed_month_sek: f64,
    pub effect_sek_kw: f64,
    pub vat_rate: f64,
    pub peak_rule: PeakRule,
}

/// Metered consumption with aligned spot prices.
#[derive(Debug, Clone)]
pub struct TariffInput {
    pub timestamps: Vec<DateTime<Utc>>,
    pub load_kwh: Vec<f64>,
    pub price_sek_kwh: Vec<f64>,
    pub resolution: Resolution,
    pub period: TariffPeriod,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthPeak {
    /// `YYYY-MM`, UTC.
    pub month: String,
    pub peak_kw: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TariffResult {
    pub total_kwh: f64,
    pub spot_cost: f64,
    pub energy_fee: f64,
    pub effect_fee: f64,
    pub fixed_fee: f64,
    pub tax: f64,
    pub subtotal: f64,
    pub vat: f64,
    pub total: f64,
    /// Highest hourly draw over the whole simulation, charged or not.
    pub peak_kw: f64,
    pub monthly_peaks: Vec<MonthPeak>,
}

/// Compose the tariff breakdown for one simulation.
pub fn compute(input: &TariffInput, rates: &TariffRates) -> EveResult<TariffResult> {
    if input.timestamps.len() != input.load_kwh.len()
        || input.load_kwh.len() != input.price_sek_kwh.len()
    {
        return Err(EveError::Validation(format!(
            "tariff input lengths differ: {} timestamps, {} load, {} prices",
            input.timestamps.len(),
            input.load_kwh.len(),
            input.price_sek_kwh.len()
        )));
    }
    if input.load_kwh.is_empty() {
        return Err(EveError::Validation("tariff input is empty".into()));
    }

    let total_kwh: f64 = input.load_kwh.iter().sum();
    let spot_cost: f64 = input
        .load_kwh
        .iter()
        .zip(&input.price_sek_kwh)
        .map(|(l, p)| l * p)
        .sum();
    let energy_fee = total_kwh * rates.energy_ore_kwh / 100.0;
    let tax = total_kwh * rates.tax_ore_kwh / 100.0;

    let hourly_kw = hourly_kw_series(input);
    let peak_kw = hourly_kw
        .values()
        .copied()
        .fold(0.0, f64::max);

    let by_month = group_by_month(&hourly_kw);
    let monthly_peaks: Vec<MonthPeak> = by_month
        .into_iter()
        .map(|(month, mut hours)| {
            hours.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
            let take = rates.peak_rule.take().min(hours.len());
            let peak = hours[..take].iter().sum::<f64>() / take as f64;
            MonthPeak {
                month,
                peak_kw: round2(peak),
            }
        })
        .collect();

    let charges_apply = matches!(input.period, TariffPeriod::Month | TariffPeriod::Year);
    let effect_fee = if charges_apply {
        monthly_peaks
            .iter()
            .map(|m| m.peak_kw * rates.effect_sek_kw)
            .sum()
    } else {
        0.0
    };
    let fixed_fee = match input.period {
        TariffPeriod::Month => rates.fixed_month_sek,
        TariffPeriod::Year => rates.fixed_month_sek * 12.0,
        TariffPeriod::Day | TariffPeriod::Week => 0.0,
    };

    let subtotal = spot_cost + energy_fee + effect_fee + fixed_fee + tax;
    let vat = subtotal * rates.vat_rate;
    Ok(TariffResult {
        total_kwh: round2(total_kwh),
        spot_cost: round2(spot_cost),
        energy_fee: round2(energy_fee),
        effect_fee: round2(effect_fee),
        fixed_fee: round2(fixed_fee),
        tax: round2(tax),
        subtotal: round2(subtotal),
        vat: round2(vat),
        total: round2(subtotal + vat),
        peak_kw: round2(peak_kw),
        monthly_peaks,
    })
}

/// Hourly kW: at native 60M the kWh value is the kW; at 15M the four
/// quarter-hour kWh values of each hour sum to it.
fn hourly_kw_series(input: &TariffInput) -> BTreeMap<DateTime<Utc>, f64> {
    let mut hours: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
    for (ts, kwh) in input.timestamps.iter().zip(&input.load_kwh) {
        let hour = *ts
            - chrono::Duration::minutes(ts.minute() as i64)
            - chrono::Duration::seconds(ts.second() as i64);
        match input.resolution {
            Resolution::Pt60M => {
                hours.insert(hour, *kwh);
            }
            Resolution::Pt15M => {
                *hours.entry(hour).or_insert(0.0) += *kwh;
            }
        }
    }
    hours
}

fn group_by_month(hourly_kw: &BTreeMap<DateTime<Utc>, f64>) -> BTreeMap<String, Vec<f64>> {
    let mut months: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (ts, kw) in hourly_kw {
        let key = format!("{:04}-{:02}", ts.year(), ts.month());
        months.entry(key).or_default().push(*kw);
    }
    months
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn rates() -> TariffRates {
        TariffRates {
            energy_ore_kwh: 28.0,
            tax_ore_kwh: 36.0,
            fixed_month_sek: 450.0,
            effect_sek_kw: 100.0,
            vat_rate: 0.25,
            peak_rule: PeakRule::Top3HourlyAvg,
        }
    }

    fn constant_month_input(period: TariffPeriod) -> TariffInput {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let hours = 28 * 24;
        TariffInput {
            timestamps: (0..hours).map(|h| start + Duration::hours(h)).collect(),
            load_kwh: vec![10.0; hours as usize],
            price_sek_kwh: vec![0.50; hours as usize],
            resolution: Resolution::Pt60M,
            period,
        }
    }

    #[test]
    fn constant_month_breakdown() {
        let result = compute(&constant_month_input(TariffPeriod::Month), &rates()).unwrap();
        assert_eq!(result.total_kwh, 6720.0);
        assert_eq!(result.spot_cost, 3360.0);
        assert_eq!(result.energy_fee, 1881.60);
        assert_eq!(result.effect_fee, 1000.0);
        assert_eq!(result.fixed_fee, 450.0);
        assert_eq!(result.tax, 2419.20);
        assert_eq!(result.peak_kw, 10.0);
        assert_eq!(result.vat, round2(result.subtotal * 0.25));
        assert_eq!(result.total, round2(result.subtotal + result.vat));
    }

    #[test]
    fn day_period_reports_but_never_charges_the_peak() {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let input = TariffInput {
            timestamps: (0..24).map(|h| start + Duration::hours(h)).collect(),
            load_kwh: vec![10.0; 24],
            price_sek_kwh: vec![0.50; 24],
            resolution: Resolution::Pt60M,
            period: TariffPeriod::Day,
        };
        let result = compute(&input, &rates()).unwrap();
        assert_eq!(result.effect_fee, 0.0);
        assert_eq!(result.fixed_fee, 0.0);
        assert_eq!(result.peak_kw, 10.0);
    }

    #[test]
    fn year_period_charges_twelve_fixed_fees() {
        let result = compute(&constant_month_input(TariffPeriod::Year), &rates()).unwrap();
        assert_eq!(result.fixed_fee, 5400.0);
    }

    #[test]
    fn top3_rule_averages_the_three_highest_hours() {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let mut load = vec![1.0; 24];
        load[6] = 9.0;
        load[7] = 7.0;
        load[8] = 5.0;
        let input = TariffInput {
            timestamps: (0..24).map(|h| start + Duration::hours(h)).collect(),
            load_kwh: load,
            price_sek_kwh: vec![0.0; 24],
            resolution: Resolution::Pt60M,
            period: TariffPeriod::Month,
        };
        let result = compute(&input, &rates()).unwrap();
        assert_eq!(result.monthly_peaks.len(), 1);
        assert_eq!(result.monthly_peaks[0].peak_kw, 7.0);
        assert_eq!(result.effect_fee, 700.0);
    }

    #[test]
    fn quarter_hour_load_sums_into_hourly_kw() {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let input = TariffInput {
            timestamps: (0..8).map(|q| start + Duration::minutes(15 * q)).collect(),
            load_kwh: vec![2.5; 8],
            price_sek_kwh: vec![0.50; 8],
            resolution: Resolution::Pt15M,
            period: TariffPeriod::Month,
        };
        let result = compute(&input, &rates()).unwrap();
        // Two hours of 4 x 2.5 kWh = 10 kW each.
        assert_eq!(result.peak_kw, 10.0);
        assert_eq!(result.total_kwh, 20.0);
    }

    #[test]
    fn peaks_span_multiple_months() {
        let jan = Utc.with_ymd_and_hms(2024, 1, 31, 22, 0, 0).unwrap();
        let input = TariffInput {
            timestamps: (0..4).map(|h| jan + Duration::hours(h)).collect(),
            load_kwh: vec![4.0, 6.0, 3.0, 8.0],
            price_sek_kwh: vec![0.0; 4],
            resolution: Resolution::Pt60M,
            period: TariffPeriod::Year,
        };
        let result = compute(&input, &rates()).unwrap();
        assert_eq!(result.monthly_peaks.len(), 2);
        assert_eq!(result.monthly_peaks[0].month, "2024-01");
        assert_eq!(result.monthly_peaks[0].peak_kw, 5.0);
        assert_eq!(result.monthly_peaks[1].peak_kw, round2((3.0 + 8.0) / 2.0));
    }
}
