//! # eve-algo: Dispatch optimization and tariff composition
//!
//! The battery dispatch LP (the pipeline's single non-trivial numerical
//! kernel) and the closed-form tariff engine that consumes its schedules.

pub mod dispatch;
pub mod simulate;
pub mod tariff;

pub use dispatch::{optimize, BatteryParams, DispatchInput, DispatchResult, DispatchStatus};
pub use simulate::{simulate_battery, SimulationResult};
pub use tariff::{compute, PeakRule, TariffInput, TariffPeriod, TariffRates, TariffResult};
