//! # eve-docs: Parliamentary document pipeline
//!
//! Deterministic energy-topic classification and rule-driven
//! statement-to-decision linking. Both run over decoded parliamentary
//! records and produce reproducible tags and edges that the document
//! pipeline seals through the same vault as the timeseries data.

pub mod linker;
pub mod pipeline;
pub mod topics;

pub use linker::{DecisionNode, DecisionRegistry, Link, LinkRule, Linker};
pub use pipeline::DocsBuild;
pub use topics::{classify, Classification, Confidence, TopicRule, TopicTag};
