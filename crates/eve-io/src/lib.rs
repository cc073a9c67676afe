//! # eve-io: Source-format decoders and resolution alignment
//!
//! Decodes the public source streams the pipeline canonicalizes (ENTSO-E
//! publication documents for day-ahead prices, aggregated generation, and
//! cross-border flows; ERA5 weather extracts; the locked ECB FX table;
//! parliamentary records) into typed in-memory records, and converts
//! between 15-minute and 60-minute step series under the explicit
//! expand/aggregate rules.
//!
//! The decoders read bytes handed to them; fetching and retry logic live
//! outside the evidence core.

pub mod align;
pub mod entsoe;
pub mod fx;
pub mod parliament;
pub mod weather;

pub use align::{aggregate, align, expand, SeriesKind, StepSeries};
pub use entsoe::{
    parse_flow_document, parse_generation_document, parse_price_document, FlowSeries,
    GenerationSeries, PriceSeries, Resolution,
};
pub use fx::FxTable;
pub use weather::WeatherCache;
