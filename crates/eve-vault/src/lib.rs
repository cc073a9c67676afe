//! # eve-vault: Append-only hash-chained evidence logs
//!
//! Two separate WORM chains share one linkage mechanism: the dataset
//! chain seals canonical-build manifests (with idempotent re-runs and
//! forced supersession), the report chain seals rendered artifacts with
//! their query and FX provenance. Chains are single-writer JSONL files;
//! every line is a fully-linked, canonically-serialized record.

pub mod chain;
pub mod dataset;
pub mod report;

pub use chain::{append, read_chain, tail, verify, ChainRecord};
pub use dataset::{latest_entry, seal_dataset, DatasetEvent, SealOutcome};
pub use report::{seal_report, ReportEvent};

/// Default dataset-chain file name under the vault root.
pub const DATASET_VAULT_FILE: &str = "dataset_vault.jsonl";
/// Default report-chain file name under the vault root.
pub const REPORT_VAULT_FILE: &str = "report_vault.jsonl";
