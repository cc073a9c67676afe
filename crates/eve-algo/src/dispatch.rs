//! # Battery dispatch optimization
//!
//! Cost-minimizing linear program for a battery behind the meter: choose
//! per-interval grid draw, charge, and discharge so that spot-energy cost
//! plus the peak-power charge is minimal, subject to state-of-charge
//! dynamics and equipment limits.
//!
//! ## Formulation
//!
//! ```text
//! minimize    Σ_t spot_t · grid_t  +  effect_rate · peak
//!
//! subject to  grid_t − charge_t + discharge_t = load_t            (balance)
//!             soc_{t+1} − soc_t − η·charge_t + (1/η)·discharge_t = 0
//!             soc_0 = soc_N                                       (cycle)
//!             peak − grid_t / Δt ≥ 0                              (peak link)
//!             0 ≤ soc_t ≤ capacity
//!             0 ≤ charge_t, discharge_t ≤ max_kw · Δt
//!             grid_t ≥ 0, peak ≥ 0
//! ```
//!
//! This is a pure LP with a guaranteed global optimum on feasible
//! inputs; no integer variables. Simultaneous charge and discharge is
//! never optimal under positive prices and the round-trip loss, so it is
//! not excluded explicitly.
//!
//! Solved with the Clarabel interior-point backend through the `good_lp`
//! abstraction. On infeasibility or solver failure the caller receives a
//! passthrough result equal to the raw load with a status flag; the
//! caller decides what to do with it.

use good_lp::solvers::clarabel::clarabel;
use good_lp::{
    constraint, variable, variables, Expression, ResolutionError, Solution, SolverModel, Variable,
};
use serde::Serialize;
use tracing::debug;

use eve_core::{EveError, EveResult};

/// Battery nameplate parameters.
#[derive(Debug, Clone)]
pub struct BatteryParams {
    /// Usable storage capacity in kWh.
    pub capacity_kwh: f64,
    /// Charge/discharge power limit in kW.
    pub max_power_kw: f64,
    /// One-way efficiency η in (0, 1].
    pub efficiency: f64,
}

/// One dispatch problem: aligned per-interval prices and load.
#[derive(Debug, Clone)]
pub struct DispatchInput {
    /// Spot price per interval, SEK/kWh.
    pub prices: Vec<f64>,
    /// Metered load per interval, kWh.
    pub load_kwh: Vec<f64>,
    /// Interval length in hours.
    pub dt_hours: f64,
    /// Peak-power charge in SEK/kW on the maximum grid draw.
    pub effect_rate: f64,
    pub battery: BatteryParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Optimal,
    Infeasible,
    Error,
}

/// Optimal (or passthrough) dispatch schedule.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub status: DispatchStatus,
    /// Grid draw per interval, kWh.
    pub grid_kwh: Vec<f64>,
    pub charge_kwh: Vec<f64>,
    pub discharge_kwh: Vec<f64>,
    /// State of charge at interval boundaries, kWh; length N+1.
    pub soc_kwh: Vec<f64>,
    /// Peak grid power, kW.
    pub peak_kw: f64,
    /// Objective value: spot cost plus peak charge, SEK.
    pub total_cost: f64,
}

impl DispatchInput {
    fn validate(&self) -> EveResult<()> {
        if self.prices.len() != self.load_kwh.len() {
            return Err(EveError::Validation(format!(
                "dispatch input has {} prices but {} load intervals",
                self.prices.len(),
                self.load_kwh.len()
            )));
        }
        if self.prices.is_empty() {
            return Err(EveError::Validation("dispatch input is empty".into()));
        }
        if self.dt_hours <= 0.0 {
            return Err(EveError::Validation("interval length must be positive".into()));
        }
        if !(self.battery.efficiency > 0.0 && self.battery.efficiency <= 1.0) {
            return Err(EveError::Validation(format!(
                "efficiency {} outside (0, 1]",
                self.battery.efficiency
            )));
        }
        Ok(())
    }

    /// The no-battery schedule: grid equals load, used as the fallback
    /// and as the comparison baseline.
    pub fn passthrough(&self, status: DispatchStatus) -> DispatchResult {
        let peak_kw = self
            .load_kwh
            .iter()
            .map(|kwh| kwh / self.dt_hours)
            .fold(0.0, f64::max);
        let spot_cost: f64 = self
            .prices
            .iter()
            .zip(&self.load_kwh)
            .map(|(p, l)| p * l)
            .sum();
        DispatchResult {
            status,
            grid_kwh: self.load_kwh.clone(),
            charge_kwh: vec![0.0; self.load_kwh.len()],
            discharge_kwh: vec![0.0; self.load_kwh.len()],
            soc_kwh: vec![0.0; self.load_kwh.len() + 1],
            peak_kw,
            total_cost: spot_cost + self.effect_rate * peak_kw,
        }
    }
}

/// Solve the dispatch LP. Infeasibility and solver failures degrade to a
/// passthrough result instead of erroring; malformed inputs are errors.
pub fn optimize(input: &DispatchInput) -> EveResult<DispatchResult> {
    input.validate()?;
    match solve_lp(input) {
        Ok(result) => Ok(result),
        Err(ResolutionError::Infeasible) => {
            debug!("dispatch LP infeasible; returning passthrough schedule");
            Ok(input.passthrough(DispatchStatus::Infeasible))
        }
        Err(err) => {
            debug!("dispatch LP solver failure: {err:?}");
            Ok(input.passthrough(DispatchStatus::Error))
        }
    }
}

fn solve_lp(input: &DispatchInput) -> Result<DispatchResult, ResolutionError> {
    let n = input.load_kwh.len();
    let dt = input.dt_hours;
    let eta = input.battery.efficiency;
    let max_step_kwh = input.battery.max_power_kw * dt;

    let mut vars = variables!();
    let grid: Vec<Variable> = (0..n).map(|_| vars.add(variable().min(0.0))).collect();
    let charge: Vec<Variable> = (0..n)
        .map(|_| vars.add(variable().min(0.0).max(max_step_kwh)))
        .collect();
    let discharge: Vec<Variable> = (0..n)
        .map(|_| vars.add(variable().min(0.0).max(max_step_kwh)))
        .collect();
    let soc: Vec<Variable> = (0..=n)
        .map(|_| vars.add(variable().min(0.0).max(input.battery.capacity_kwh)))
        .collect();
    let peak = vars.add(variable().min(0.0));

    let cost_expr = grid
        .iter()
        .zip(&input.prices)
        .fold(Expression::from(0.0), |acc, (g, price)| acc + *price * *g)
        + input.effect_rate * peak;

    let mut problem = vars.minimise(cost_expr).using(clarabel);

    for t in 0..n {
        // Balance: grid - charge + discharge = load.
        problem = problem.with(constraint!(
            grid[t] - charge[t] + discharge[t] == input.load_kwh[t]
        ));
        // SoC dynamics with one-way efficiency both directions.
        problem = problem.with(constraint!(
            soc[t + 1] - soc[t] - eta * charge[t] + (1.0 / eta) * discharge[t] == 0.0
        ));
        // Peak linkage: peak >= grid / dt.
        problem = problem.with(constraint!(peak - grid[t] * (1.0 / dt) >= 0.0));
    }
    // Cycle constraint: end where we started.
    problem = problem.with(constraint!(soc[0] - soc[n] == 0.0));

    let solution = problem.solve()?;

    let grid_kwh: Vec<f64> = grid.iter().map(|v| solution.value(*v)).collect();
    let peak_kw = solution.value(peak);
    let spot_cost: f64 = grid_kwh
        .iter()
        .zip(&input.prices)
        .map(|(g, p)| g * p)
        .sum();
    Ok(DispatchResult {
        status: DispatchStatus::Optimal,
        grid_kwh,
        charge_kwh: charge.iter().map(|v| solution.value(*v)).collect(),
        discharge_kwh: discharge.iter().map(|v| solution.value(*v)).collect(),
        soc_kwh: soc.iter().map(|v| solution.value(*v)).collect(),
        peak_kw,
        total_cost: spot_cost + input.effect_rate * peak_kw,
    })
}
