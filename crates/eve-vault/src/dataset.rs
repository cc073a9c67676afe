//! The dataset WORM chain: sealing rules and supersession.
//!
//! A seal is idempotent for identical data, refuses silently-changed data,
//! and supersedes explicitly-changed data. The superseded entry stays in
//! the chain as a historical truth; nothing is ever rewritten.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use eve_canon::Manifest;
use eve_core::{EveError, EveResult};

use crate::chain::{self, ChainRecord};

/// Payload of one dataset vault event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetEvent {
    pub dataset_eve_id: String,
    pub root_hash: String,
    pub manifest_path: String,
    pub methodology_version: String,
    pub emission_scope: String,
    pub zone: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub source_refs: Vec<String>,
    /// Back-reference to the dataset id this entry supersedes; `null` for
    /// first seals. Serialized always, the hashing surface is fixed.
    pub supersedes: Option<String>,
}

/// What a seal attempt did.
#[derive(Debug)]
pub enum SealOutcome {
    /// A new event was appended.
    Appended(ChainRecord),
    /// The dataset was already sealed with the same root hash; no event.
    Unchanged(ChainRecord),
}

impl SealOutcome {
    pub fn record(&self) -> &ChainRecord {
        match self {
            SealOutcome::Appended(record) | SealOutcome::Unchanged(record) => record,
        }
    }
}

fn base_id(dataset_eve_id: &str) -> &str {
    match dataset_eve_id.rfind("_R") {
        Some(pos) if dataset_eve_id[pos + 2..].chars().all(|c| c.is_ascii_digit()) => {
            &dataset_eve_id[..pos]
        }
        _ => dataset_eve_id,
    }
}

fn payload_id(record: &ChainRecord) -> Option<&str> {
    record.payload.get("dataset_eve_id").and_then(|v| v.as_str())
}

fn payload_root(record: &ChainRecord) -> Option<&str> {
    record.payload.get("root_hash").and_then(|v| v.as_str())
}

/// All entries belonging to a dataset id family (the base id and its
/// `_R{n}` revisions), chain order.
pub fn family_entries(vault_path: &Path, dataset_eve_id: &str) -> EveResult<Vec<ChainRecord>> {
    let base = base_id(dataset_eve_id).to_string();
    Ok(chain::read_chain(vault_path)?
        .into_iter()
        .filter(|record| payload_id(record).map(base_id) == Some(base.as_str()))
        .collect())
}

/// Latest vault entry for a dataset id family, used by query provenance.
pub fn latest_entry(vault_path: &Path, dataset_eve_id: &str) -> EveResult<Option<ChainRecord>> {
    Ok(family_entries(vault_path, dataset_eve_id)?.into_iter().last())
}

/// Seal a finished zone build into the dataset chain.
///
/// * no prior entry for the id: append;
/// * prior entry with the same root hash: no-op (idempotent re-run);
/// * prior entry with a different root hash and `force_reseal`: append a
///   revision-suffixed entry whose `supersedes` names the original id;
/// * otherwise: refuse, surfacing both hashes.
pub fn seal_dataset(
    vault_path: &Path,
    manifest: &Manifest,
    manifest_path: &str,
    force_reseal: bool,
) -> EveResult<SealOutcome> {
    let family = family_entries(vault_path, &manifest.dataset_eve_id)?;
    let mut event = DatasetEvent {
        dataset_eve_id: manifest.dataset_eve_id.clone(),
        root_hash: manifest.root_hash.clone(),
        manifest_path: manifest_path.to_string(),
        methodology_version: manifest.methodology_version.clone(),
        emission_scope: manifest.emission_scope.clone(),
        zone: manifest.zone.clone(),
        period_start: manifest.period_start,
        period_end: manifest.period_end,
        source_refs: manifest.source_refs.clone(),
        supersedes: None,
    };

    let Some(latest) = family.last() else {
        let record = chain::append(vault_path, &event)?;
        info!(
            dataset = %event.dataset_eve_id,
            index = record.event_index,
            "dataset sealed"
        );
        return Ok(SealOutcome::Appended(record));
    };

    let sealed_root = payload_root(latest).unwrap_or_default().to_string();
    if sealed_root == manifest.root_hash {
        return Ok(SealOutcome::Unchanged(latest.clone()));
    }
    if !force_reseal {
        return Err(EveError::VaultConflict {
            dataset_eve_id: manifest.dataset_eve_id.clone(),
            sealed: sealed_root,
            computed: manifest.root_hash.clone(),
        });
    }

    let original = base_id(&manifest.dataset_eve_id).to_string();
    event.dataset_eve_id = format!("{original}_R{}", family.len());
    event.supersedes = Some(original);
    let record = chain::append(vault_path, &event)?;
    info!(
        dataset = %event.dataset_eve_id,
        supersedes = event.supersedes.as_deref().unwrap_or(""),
        index = record.event_index,
        "dataset resealed"
    );
    Ok(SealOutcome::Appended(record))
}
