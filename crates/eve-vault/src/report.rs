//! The report WORM chain: seals rendered evidence artifacts.
//!
//! A report entry binds the rendered artifact's content hash to the
//! dataset identity it was computed from, the query identity, and the
//! presentation and FX provenance needed to re-render it. Entries are
//! append-only and never updated; re-rendering a report appends again.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use eve_core::hash::query_hash;
use eve_core::EveResult;

use crate::chain::{self, ChainRecord};

/// Payload of one report vault event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEvent {
    /// SHA-256 of the rendered artifact bytes.
    pub report_hash: String,
    pub dataset_eve_id: String,
    pub root_hash: String,
    /// Identity of the computation: `H(zone|from|to|methodology_version)`.
    pub query_hash: String,
    pub zone: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub language: String,
    pub template_version: String,
    pub fx_rate: f64,
    pub fx_period: String,
    pub fx_source: String,
    pub fx_file_hash: String,
}

impl ReportEvent {
    /// Derive the query hash from the computation identity fields.
    pub fn with_query_identity(mut self, methodology_version: &str) -> Self {
        self.query_hash = query_hash(
            &self.zone,
            &self.period_start.to_string(),
            &self.period_end.to_string(),
            methodology_version,
        );
        self
    }
}

/// Append a report event to the report chain (separate file from the
/// dataset chain, same linkage rules).
pub fn seal_report(vault_path: &Path, event: &ReportEvent) -> EveResult<ChainRecord> {
    let record = chain::append(vault_path, event)?;
    info!(
        report = %event.report_hash,
        dataset = %event.dataset_eve_id,
        index = record.event_index,
        "report sealed"
    );
    Ok(record)
}
