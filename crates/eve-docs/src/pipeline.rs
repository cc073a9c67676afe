//! The document pipeline: classify a corpus, link statements, and emit
//! deterministic NDJSON artifacts.
//!
//! Output files are sorted by stable keys and byte-identical across
//! re-runs over the same corpus, so the same manifest-and-seal machinery
//! that protects the timeseries can seal a document build: hash the
//! emitted files in filename order and append the result to the dataset
//! chain.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use eve_core::EveResult;
use eve_io::parliament::{load_records, ParliamentDocument, ParliamentRecord, Speech};

use crate::linker::{DecisionNode, DecisionRegistry, Link, Linker};
use crate::topics::{classify, Classification};

pub const TOPICS_FILE: &str = "topics.ndjson";
pub const LINKS_FILE: &str = "links.ndjson";

/// One classified document, as serialized into `topics.ndjson`.
#[derive(Debug, Serialize)]
struct TopicRow<'a> {
    doc_id: &'a str,
    title: &'a str,
    #[serde(flatten)]
    classification: &'a Classification,
}

/// Outcome of one document-pipeline run.
#[derive(Debug)]
pub struct DocsBuild {
    /// Emitted file names relative to the output directory, ascending.
    pub files: Vec<String>,
    pub documents: usize,
    pub energy_related: usize,
    pub weak: usize,
    pub links: usize,
}

/// Derive the decision node for an energy-related document. The node id
/// is the document id itself: upstream ids are already unique and keeping
/// them verbatim makes edges externally checkable.
fn decision_node(doc: &ParliamentDocument) -> DecisionNode {
    let short_id = doc.doc_id.rsplit(':').next().map(String::from);
    DecisionNode {
        node_id: doc.doc_id.clone(),
        doc_id: doc.doc_id.clone(),
        short_id,
        title: doc.title.clone(),
    }
}

/// Run the full pipeline over an NDJSON corpus file.
pub fn run(corpus: &Path, out_dir: &Path) -> EveResult<DocsBuild> {
    let records = load_records(corpus)?;
    let mut documents: Vec<ParliamentDocument> = Vec::new();
    let mut speeches: Vec<Speech> = Vec::new();
    for record in records {
        match record {
            ParliamentRecord::Document(doc) => documents.push(doc),
            ParliamentRecord::Speech(speech) => speeches.push(speech),
        }
    }
    documents.sort_by(|a, b| a.doc_id.cmp(&b.doc_id));
    speeches.sort_by(|a, b| a.speech_id.cmp(&b.speech_id));

    let classifications: Vec<(ParliamentDocument, Classification)> = documents
        .into_iter()
        .map(|doc| {
            let classification = classify(&doc);
            (doc, classification)
        })
        .collect();

    let registry = DecisionRegistry::new(
        classifications
            .iter()
            .filter(|(_, c)| c.energy_related)
            .map(|(doc, _)| decision_node(doc))
            .collect(),
    );
    let linker = Linker::new()?;
    let mut links: Vec<Link> = Vec::new();
    for speech in &speeches {
        links.extend(linker.link_statement(speech, &registry));
    }

    fs::create_dir_all(out_dir)?;
    write_topics(&out_dir.join(TOPICS_FILE), &classifications)?;
    write_links(&out_dir.join(LINKS_FILE), &links)?;

    Ok(DocsBuild {
        files: vec![LINKS_FILE.to_string(), TOPICS_FILE.to_string()],
        documents: classifications.len(),
        energy_related: classifications
            .iter()
            .filter(|(_, c)| c.energy_related)
            .count(),
        weak: classifications.iter().filter(|(_, c)| c.weak).count(),
        links: links.len(),
    })
}

fn write_topics(
    path: &PathBuf,
    classifications: &[(ParliamentDocument, Classification)],
) -> EveResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for (doc, classification) in classifications {
        let row = TopicRow {
            doc_id: &doc.doc_id,
            title: &doc.title,
            classification,
        };
        let mut line = serde_json::to_string(&row)?;
        line.push('\n');
        writer.write_all(line.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

fn write_links(path: &PathBuf, links: &[Link]) -> EveResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for link in links {
        let mut line = serde_json::to_string(link)?;
        line.push('\n');
        writer.write_all(line.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}
