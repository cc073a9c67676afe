//! The hash-chained append-only log both vaults are built on.
//!
//! The file is JSON-per-line. Each line is the canonical (sorted-key)
//! serialization of the chain fields merged with the event payload:
//!
//! * `event_index`: 1-based, monotonic, assigned at append time from the
//!   current tail;
//! * `prev_hash`: the previous record's `chain_hash`, `null` for index 1;
//! * `event_hash`: SHA-256 over the canonical payload serialization;
//! * `chain_hash`: SHA-256 over `prev_hash_or_empty || event_hash`.
//!
//! Appends are single-writer; the caller guarantees exclusivity per §5 of
//! the build contract. Readers tail-read and tolerate concurrent appends
//! by re-reading the last line. Chains are never edited; a broken link is
//! a catastrophic invariant violation surfaced as [`EveError::ChainBreak`].

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use eve_core::hash::{canonical_json, sha256_hex};
use eve_core::{EveError, EveResult};

const CHAIN_KEYS: [&str; 4] = ["event_index", "prev_hash", "event_hash", "chain_hash"];

/// One fully-linked record: payload plus chain fields.
#[derive(Debug, Clone)]
pub struct ChainRecord {
    pub event_index: u64,
    pub prev_hash: Option<String>,
    pub event_hash: String,
    pub chain_hash: String,
    pub payload: Value,
}

impl ChainRecord {
    /// The serialized line that gets appended (and hashed by auditors).
    pub fn to_line(&self) -> EveResult<String> {
        let Value::Object(payload) = &self.payload else {
            return Err(EveError::Validation(
                "chain payload must be a JSON object".into(),
            ));
        };
        let mut merged = Map::new();
        for (key, value) in payload {
            if CHAIN_KEYS.contains(&key.as_str()) {
                return Err(EveError::Validation(format!(
                    "payload key '{key}' collides with a chain field"
                )));
            }
            merged.insert(key.clone(), value.clone());
        }
        merged.insert("event_index".into(), Value::from(self.event_index));
        merged.insert(
            "prev_hash".into(),
            self.prev_hash.clone().map(Value::from).unwrap_or(Value::Null),
        );
        merged.insert("event_hash".into(), Value::from(self.event_hash.clone()));
        merged.insert("chain_hash".into(), Value::from(self.chain_hash.clone()));
        Ok(canonical_json(&Value::Object(merged))?)
    }

    fn from_line(line: &str, lineno: usize) -> EveResult<Self> {
        let value: Value = serde_json::from_str(line).map_err(|err| {
            EveError::Parse(format!("vault line {}: {err}", lineno + 1))
        })?;
        let Value::Object(mut map) = value else {
            return Err(EveError::Parse(format!(
                "vault line {} is not an object",
                lineno + 1
            )));
        };
        let event_index = map
            .remove("event_index")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| EveError::Parse(format!("vault line {} lacks event_index", lineno + 1)))?;
        let prev_hash = match map.remove("prev_hash") {
            Some(Value::String(s)) => Some(s),
            Some(Value::Null) | None => None,
            Some(other) => {
                return Err(EveError::Parse(format!(
                    "vault line {}: bad prev_hash {other}",
                    lineno + 1
                )))
            }
        };
        let event_hash = map
            .remove("event_hash")
            .and_then(|v| v.as_str().map(String::from))
            .ok_or_else(|| EveError::Parse(format!("vault line {} lacks event_hash", lineno + 1)))?;
        let chain_hash = map
            .remove("chain_hash")
            .and_then(|v| v.as_str().map(String::from))
            .ok_or_else(|| EveError::Parse(format!("vault line {} lacks chain_hash", lineno + 1)))?;
        Ok(ChainRecord {
            event_index,
            prev_hash,
            event_hash,
            chain_hash,
            payload: Value::Object(map),
        })
    }
}

/// Hash of a payload, the first half of the chain link.
pub fn event_hash<T: Serialize>(payload: &T) -> EveResult<String> {
    Ok(sha256_hex(canonical_json(payload)?.as_bytes()))
}

/// `H(prev_hash_or_empty || event_hash)`.
pub fn chain_hash(prev_hash: Option<&str>, event_hash: &str) -> String {
    let mut input = String::new();
    if let Some(prev) = prev_hash {
        input.push_str(prev);
    }
    input.push_str(event_hash);
    sha256_hex(input.as_bytes())
}

/// Read the whole chain. A missing file is an empty chain.
pub fn read_chain(path: &Path) -> EveResult<Vec<ChainRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path)?;
    let mut records = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        records.push(ChainRecord::from_line(line, lineno)?);
    }
    Ok(records)
}

/// The current tail record, re-read on every call.
pub fn tail(path: &Path) -> EveResult<Option<ChainRecord>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    match text.lines().filter(|l| !l.trim().is_empty()).last() {
        Some(line) => Ok(Some(ChainRecord::from_line(line, 0)?)),
        None => Ok(None),
    }
}

/// Append one event. Atomic per event: the tail is read, hashes are
/// computed, and a single fully-serialized line is written and flushed.
pub fn append<T: Serialize>(path: &Path, payload: &T) -> EveResult<ChainRecord> {
    let previous = tail(path)?;
    let (event_index, prev_hash) = match &previous {
        Some(prev) => (prev.event_index + 1, Some(prev.chain_hash.clone())),
        None => (1, None),
    };
    let payload_value = serde_json::to_value(payload)?;
    let event_hash = event_hash(&payload_value)?;
    let chain = chain_hash(prev_hash.as_deref(), &event_hash);
    let record = ChainRecord {
        event_index,
        prev_hash,
        event_hash,
        chain_hash: chain,
        payload: payload_value,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut line = record.to_line()?;
    line.push('\n');
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.flush()?;
    Ok(record)
}

/// Re-derive every hash and check linkage. Returns the record count.
pub fn verify(path: &Path) -> EveResult<u64> {
    let records = read_chain(path)?;
    let mut previous: Option<&ChainRecord> = None;
    for record in &records {
        let expected_event = event_hash(&record.payload)?;
        if record.event_hash != expected_event {
            return Err(EveError::ChainBreak {
                index: record.event_index,
                detail: format!(
                    "event_hash {} does not match payload hash {expected_event}",
                    record.event_hash
                ),
            });
        }
        let expected_chain = chain_hash(record.prev_hash.as_deref(), &record.event_hash);
        if record.chain_hash != expected_chain {
            return Err(EveError::ChainBreak {
                index: record.event_index,
                detail: format!(
                    "chain_hash {} does not match {expected_chain}",
                    record.chain_hash
                ),
            });
        }
        match previous {
            None => {
                if record.event_index != 1 || record.prev_hash.is_some() {
                    return Err(EveError::ChainBreak {
                        index: record.event_index,
                        detail: "first record must have index 1 and null prev_hash".into(),
                    });
                }
            }
            Some(prev) => {
                if record.event_index != prev.event_index + 1 {
                    return Err(EveError::ChainBreak {
                        index: record.event_index,
                        detail: format!("index gap after {}", prev.event_index),
                    });
                }
                if record.prev_hash.as_deref() != Some(prev.chain_hash.as_str()) {
                    return Err(EveError::ChainBreak {
                        index: record.event_index,
                        detail: format!(
                            "prev_hash does not equal chain_hash of event {}",
                            prev.event_index
                        ),
                    });
                }
            }
        }
        previous = Some(record);
    }
    Ok(records.len() as u64)
}
