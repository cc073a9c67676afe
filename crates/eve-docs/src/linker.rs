//! Rule-driven edges from chamber statements to decision nodes.
//!
//! Rules run in precedence order; a (statement, node) pair is linked at
//! most once, by the highest-precedence rule that found it. Every edge
//! records the triggering rule and the matched text fragment, and gets a
//! deterministic 16-hex link id so re-running the linker over the same
//! corpus yields byte-identical edge sets.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::Serialize;

use eve_core::hash::short_hash;
use eve_core::{EveError, EveResult};
use eve_io::parliament::Speech;

/// Shared-token threshold for the co-occurrence rule.
const MIN_SHARED_TOKENS: usize = 3;
/// Keyword tokens shorter than this are discarded before comparison.
const MIN_TOKEN_LEN: usize = 4;
/// Upper bound on edges emitted per statement across all rules.
const MAX_LINKS_PER_STATEMENT: usize = 5;

/// Fixed stoplist applied to statement and title tokens alike.
const STOPWORDS: &[&str] = &[
    "och", "att", "det", "som", "för", "med", "den", "till", "har", "inte", "om", "ett",
    "men", "var", "sig", "från", "vid", "kan", "ska", "skulle", "också", "eller", "vara",
    "denna", "detta", "dessa", "vill", "efter", "under", "genom", "herr", "fru", "talman",
    "anförande", "regeringen", "riksdagen",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkRule {
    /// Statement metadata carries the document id directly.
    ExplicitReference,
    /// Full document-id pattern found in the statement text.
    DocIdPattern,
    /// Committee-abbreviation + number found in the statement text.
    ShortIdPattern,
    /// Statute-number references; reserved, never emitted yet.
    StatuteReference,
    /// Shared-keyword co-occurrence between text and title.
    KeywordCooccurrence,
}

impl LinkRule {
    pub fn id(self) -> &'static str {
        match self {
            LinkRule::ExplicitReference => "explicit_ref",
            LinkRule::DocIdPattern => "doc_id_pattern",
            LinkRule::ShortIdPattern => "short_id_pattern",
            LinkRule::StatuteReference => "statute_ref",
            LinkRule::KeywordCooccurrence => "keyword_cooccur",
        }
    }
}

/// A decision a statement can be linked to.
#[derive(Debug, Clone)]
pub struct DecisionNode {
    pub node_id: String,
    /// Full upstream id, e.g. `2023/24:NU14`.
    pub doc_id: String,
    /// Committee abbreviation + serial, e.g. `NU14`.
    pub short_id: Option<String>,
    pub title: String,
}

/// Lookup structure over the decision nodes of a corpus.
pub struct DecisionRegistry {
    nodes: Vec<DecisionNode>,
    by_doc_id: HashMap<String, usize>,
    by_short_id: HashMap<String, usize>,
}

impl DecisionRegistry {
    pub fn new(nodes: Vec<DecisionNode>) -> Self {
        let mut by_doc_id = HashMap::new();
        let mut by_short_id = HashMap::new();
        for (index, node) in nodes.iter().enumerate() {
            by_doc_id.insert(node.doc_id.clone(), index);
            if let Some(short) = &node.short_id {
                by_short_id.insert(short.clone(), index);
            }
        }
        DecisionRegistry {
            nodes,
            by_doc_id,
            by_short_id,
        }
    }

    pub fn nodes(&self) -> &[DecisionNode] {
        &self.nodes
    }
}

/// One deterministic statement-to-decision edge.
#[derive(Debug, Clone, Serialize)]
pub struct Link {
    pub link_id: String,
    pub statement_id: String,
    pub decision_node_id: String,
    pub rule: LinkRule,
    pub matched_fragment: String,
}

pub struct Linker {
    doc_id_pattern: Regex,
    short_id_pattern: Regex,
}

impl Linker {
    pub fn new() -> EveResult<Self> {
        Ok(Linker {
            doc_id_pattern: Regex::new(r"\b(\d{4}/\d{2}:[A-Za-zÅÄÖåäö]{1,4}\d{1,3})\b")
                .map_err(|err| EveError::Config(format!("doc-id pattern: {err}")))?,
            short_id_pattern: Regex::new(r"\b([A-ZÅÄÖ]{2,4}) ?(\d{1,3})\b")
                .map_err(|err| EveError::Config(format!("short-id pattern: {err}")))?,
        })
    }

    /// Link one statement against the registry. Rules run in precedence
    /// order; duplicates across rules are suppressed.
    pub fn link_statement(&self, speech: &Speech, registry: &DecisionRegistry) -> Vec<Link> {
        let mut links: Vec<Link> = Vec::new();
        let mut linked: HashSet<String> = HashSet::new();

        let mut push = |links: &mut Vec<Link>,
                        linked: &mut HashSet<String>,
                        node: &DecisionNode,
                        rule: LinkRule,
                        fragment: &str| {
            if links.len() >= MAX_LINKS_PER_STATEMENT {
                return;
            }
            if !linked.insert(node.node_id.clone()) {
                return;
            }
            links.push(Link {
                link_id: link_id(&speech.speech_id, &node.node_id, rule),
                statement_id: speech.speech_id.clone(),
                decision_node_id: node.node_id.clone(),
                rule,
                matched_fragment: fragment.to_string(),
            });
        };

        // Rule 1: explicit identifier references in metadata.
        for doc_ref in &speech.document_refs {
            if let Some(&index) = registry.by_doc_id.get(doc_ref) {
                push(
                    &mut links,
                    &mut linked,
                    &registry.nodes[index],
                    LinkRule::ExplicitReference,
                    doc_ref,
                );
            }
        }

        // Rule 2: full document-id patterns in the text.
        for capture in self.doc_id_pattern.captures_iter(&speech.text) {
            let matched = &capture[1];
            if let Some(&index) = registry.by_doc_id.get(matched) {
                push(
                    &mut links,
                    &mut linked,
                    &registry.nodes[index],
                    LinkRule::DocIdPattern,
                    matched,
                );
            }
        }

        // Rule 3: short committee-abbreviation ids in the text.
        for capture in self.short_id_pattern.captures_iter(&speech.text) {
            let key = format!("{}{}", &capture[1], &capture[2]);
            if let Some(&index) = registry.by_short_id.get(&key) {
                push(
                    &mut links,
                    &mut linked,
                    &registry.nodes[index],
                    LinkRule::ShortIdPattern,
                    &capture[0],
                );
            }
        }

        // Rule 4 (statute references) is reserved in the rule order.

        // Rule 5: shared-keyword co-occurrence against node titles.
        let statement_tokens = keyword_tokens(&speech.text);
        for node in &registry.nodes {
            if links.len() >= MAX_LINKS_PER_STATEMENT {
                break;
            }
            let title_tokens = keyword_tokens(&node.title);
            let shared: Vec<&String> = title_tokens
                .iter()
                .filter(|t| statement_tokens.contains(*t))
                .collect();
            if shared.len() >= MIN_SHARED_TOKENS {
                let mut fragment: Vec<String> =
                    shared.iter().map(|s| s.to_string()).collect();
                fragment.sort();
                push(
                    &mut links,
                    &mut linked,
                    node,
                    LinkRule::KeywordCooccurrence,
                    &fragment.join(" "),
                );
            }
        }

        links
    }
}

/// `SHA-256(statement_id | decision_node_id | rule_id)[:16]`.
pub fn link_id(statement_id: &str, decision_node_id: &str, rule: LinkRule) -> String {
    short_hash(
        &format!("{statement_id}|{decision_node_id}|{}", rule.id()),
        16,
    )
}

fn keyword_tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .filter(|t| !STOPWORDS.contains(t))
        .map(String::from)
        .collect()
}
