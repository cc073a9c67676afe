//! # eve-query: Deterministic reconstruction over sealed canonical files
//!
//! Summary statistics, bottleneck spreads, and cross-border flow
//! aggregates over a `(zone, from, to)` window, wrapped in an envelope
//! that carries dataset, chain, and registry provenance plus a rebuild
//! command for external reproduction.

pub mod bottleneck;
pub mod engine;
pub mod flows;
pub mod stats;

pub use bottleneck::BottleneckStats;
pub use engine::{QueryEngine, QueryEnvelope, CHAIN_BREAK_WARNING, SYSTEM_PRICE_WARNING};
pub use flows::FlowSummary;
pub use stats::{ColumnStats, SpotStats};
