//! Tariff simulation with and without a battery.
//!
//! The only consumer of the dispatch LP: a simulation runs the optimizer
//! over the metered load, then prices both the raw and the optimized
//! schedules through the tariff engine, so the caller sees the bill
//! delta the battery would produce. A non-optimal dispatch status falls
//! back to the raw schedule, which makes the delta zero rather than
//! failing the simulation.

use serde::Serialize;

use eve_core::round::round2;
use eve_core::EveResult;

use crate::dispatch::{optimize, BatteryParams, DispatchInput, DispatchStatus};
use crate::tariff::{compute, TariffInput, TariffRates, TariffResult};

/// One battery-vs-baseline comparison.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub dispatch_status: DispatchStatus,
    pub baseline: TariffResult,
    pub with_battery: TariffResult,
    /// `baseline.total - with_battery.total`, SEK.
    pub saving: f64,
    pub peak_before_kw: f64,
    pub peak_after_kw: f64,
}

/// Price the metered load as-is and re-price the LP-optimized grid
/// schedule under the same tariff.
pub fn simulate_battery(
    input: &TariffInput,
    rates: &TariffRates,
    battery: &BatteryParams,
) -> EveResult<SimulationResult> {
    let baseline = compute(input, rates)?;

    let dt_hours = match input.resolution {
        eve_io::entsoe::Resolution::Pt60M => 1.0,
        eve_io::entsoe::Resolution::Pt15M => 0.25,
    };
    let dispatch_input = DispatchInput {
        prices: input.price_sek_kwh.clone(),
        load_kwh: input.load_kwh.clone(),
        dt_hours,
        effect_rate: rates.effect_sek_kw,
        battery: battery.clone(),
    };
    let dispatch = optimize(&dispatch_input)?;

    let optimized = TariffInput {
        timestamps: input.timestamps.clone(),
        load_kwh: dispatch.grid_kwh.clone(),
        price_sek_kwh: input.price_sek_kwh.clone(),
        resolution: input.resolution,
        period: input.period,
    };
    let with_battery = compute(&optimized, rates)?;

    Ok(SimulationResult {
        dispatch_status: dispatch.status,
        saving: round2(baseline.total - with_battery.total),
        peak_before_kw: baseline.peak_kw,
        peak_after_kw: with_battery.peak_kw,
        baseline,
        with_battery,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariff::{PeakRule, TariffPeriod};
    use chrono::{Duration, TimeZone, Utc};
    use eve_io::entsoe::Resolution;

    fn rates(effect: f64) -> TariffRates {
        TariffRates {
            energy_ore_kwh: 28.0,
            tax_ore_kwh: 36.0,
            fixed_month_sek: 0.0,
            effect_sek_kw: effect,
            vat_rate: 0.25,
            peak_rule: PeakRule::MaxHour,
        }
    }

    fn input(load: Vec<f64>, prices: Vec<f64>) -> TariffInput {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        TariffInput {
            timestamps: (0..load.len() as i64)
                .map(|h| start + Duration::hours(h))
                .collect(),
            load_kwh: load,
            price_sek_kwh: prices,
            resolution: Resolution::Pt60M,
            period: TariffPeriod::Month,
        }
    }

    #[test]
    fn arbitrage_battery_lowers_the_bill() {
        let sim = simulate_battery(
            &input(vec![1.0; 4], vec![0.50, 0.50, 2.00, 2.00]),
            &rates(0.0),
            &BatteryParams {
                capacity_kwh: 2.0,
                max_power_kw: 2.0,
                efficiency: 1.0,
            },
        )
        .unwrap();
        assert_eq!(sim.dispatch_status, DispatchStatus::Optimal);
        assert!(sim.saving > 0.0, "expected a saving, got {}", sim.saving);
        assert!(sim.with_battery.total < sim.baseline.total);
    }

    #[test]
    fn peak_shaving_battery_cuts_the_effect_fee() {
        let mut load = vec![1.0; 8];
        load[4] = 5.0;
        let sim = simulate_battery(
            &input(load, vec![1.0; 8]),
            &rates(100.0),
            &BatteryParams {
                capacity_kwh: 4.0,
                max_power_kw: 3.0,
                efficiency: 0.95,
            },
        )
        .unwrap();
        assert!(sim.peak_after_kw < sim.peak_before_kw);
        assert!(sim.with_battery.effect_fee < sim.baseline.effect_fee);
    }

    #[test]
    fn zero_battery_is_a_no_op() {
        let sim = simulate_battery(
            &input(vec![2.0; 4], vec![1.0; 4]),
            &rates(50.0),
            &BatteryParams {
                capacity_kwh: 0.0,
                max_power_kw: 0.0,
                efficiency: 1.0,
            },
        )
        .unwrap();
        assert!(sim.saving.abs() < 0.01);
        assert_eq!(sim.peak_before_kw, sim.peak_after_kw);
    }
}
