//! Parliamentary source records: documents and chamber speeches.
//!
//! Records arrive as newline-delimited JSON with an explicit
//! `record_type` discriminator per source family. Decoding is strict on
//! shape but lenient on extra fields the upstream archive may grow.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use eve_core::{EveError, EveResult};

/// A parliamentary document: motion, proposition, committee report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParliamentDocument {
    /// Upstream document id, e.g. `2023/24:NU14`.
    pub doc_id: String,
    pub title: String,
    pub doc_type: String,
    /// Responsible committee abbreviation, e.g. `NU`.
    pub committee: Option<String>,
    /// Budget expenditure areas the document touches.
    #[serde(default)]
    pub expenditure_areas: Vec<u32>,
    pub date: NaiveDate,
    /// True when the document entered the corpus via keyword search rather
    /// than a committee or expenditure feed.
    #[serde(default)]
    pub from_search: bool,
}

/// One chamber statement tied to a debate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Speech {
    pub speech_id: String,
    pub speaker: Option<String>,
    pub date: NaiveDate,
    pub text: String,
    /// Document ids the protocol metadata attaches to the statement.
    #[serde(default)]
    pub document_refs: Vec<String>,
}

/// Tagged union over the parliamentary source families.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "record_type", rename_all = "snake_case")]
pub enum ParliamentRecord {
    Document(ParliamentDocument),
    Speech(Speech),
}

/// Read an NDJSON archive of parliamentary records.
pub fn load_records(path: &Path) -> EveResult<Vec<ParliamentRecord>> {
    let text = fs::read_to_string(path)?;
    let mut records = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: ParliamentRecord = serde_json::from_str(line).map_err(|err| {
            EveError::Parse(format!(
                "{}:{}: bad parliament record: {err}",
                path.display(),
                lineno + 1
            ))
        })?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tagged_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.ndjson");
        fs::write(
            &path,
            concat!(
                r#"{"record_type":"document","doc_id":"2023/24:NU14","title":"Energipolitikens inriktning","doc_type":"bet","committee":"NU","expenditure_areas":[21],"date":"2024-03-12"}"#,
                "\n",
                r#"{"record_type":"speech","speech_id":"s-2024-03-12-07","speaker":"Anf. 7","date":"2024-03-12","text":"Herr talman! Se betänkande 2023/24:NU14.","document_refs":[]}"#,
                "\n",
            ),
        )
        .unwrap();
        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        match &records[0] {
            ParliamentRecord::Document(doc) => {
                assert_eq!(doc.committee.as_deref(), Some("NU"));
                assert_eq!(doc.expenditure_areas, vec![21]);
                assert!(!doc.from_search);
            }
            other => panic!("expected document, got {other:?}"),
        }
        match &records[1] {
            ParliamentRecord::Speech(speech) => {
                assert!(speech.text.contains("NU14"));
            }
            other => panic!("expected speech, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_record_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.ndjson");
        fs::write(&path, r#"{"record_type":"ballot","id":"x"}"#).unwrap();
        assert!(matches!(load_records(&path), Err(EveError::Parse(_))));
    }
}
