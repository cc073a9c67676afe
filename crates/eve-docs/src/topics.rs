//! Deterministic energy-topic classification of parliamentary documents.
//!
//! A fixed rule set is evaluated in precedence order and every positive
//! match is accumulated; each rule emits a tag and a confidence band. A
//! document is energy-related iff at least one rule matched, and *weak*
//! iff the search-origin marker is the only match.

use serde::Serialize;

use eve_io::parliament::ParliamentDocument;

/// Committee whose responsibility alone marks a document as energy policy.
const ENERGY_COMMITTEES: &[&str] = &["NU"];

/// Committees accepted only when a title keyword also matched.
const CONDITIONAL_COMMITTEES: &[&str] = &["MJU", "FiU", "SkU", "TU"];

/// Budget expenditure area 21 is energy.
const ENERGY_EXPENDITURE_AREAS: &[u32] = &[21];

/// Closed primary keyword list. Short entries match whole tokens only;
/// entries of five letters or more also match as compound prefixes
/// (`energi` matches `energipolitiken`).
const PRIMARY_KEYWORDS: &[&str] = &[
    "el",
    "energi",
    "elnät",
    "elpris",
    "elmarknad",
    "elcertifikat",
    "kärnkraft",
    "vindkraft",
    "solenergi",
    "vattenkraft",
    "effektskatt",
];

/// Extended keywords, accepted only alongside a secondary signal.
const EXTENDED_KEYWORDS: &[&str] = &[
    "klimat",
    "bränsle",
    "drivmedel",
    "fjärrvärme",
    "laddinfrastruktur",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicRule {
    Committee,
    ExpenditureArea,
    PrimaryKeyword,
    ExtendedKeyword,
    ConditionalCommittee,
    SearchOrigin,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicTag {
    pub tag: String,
    pub rule: TopicRule,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub energy_related: bool,
    /// True when only the search-origin marker matched.
    pub weak: bool,
    pub tags: Vec<TopicTag>,
}

fn title_tokens(title: &str) -> Vec<String> {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn keyword_matches(tokens: &[String], keyword: &str) -> bool {
    tokens.iter().any(|token| {
        token == keyword || (keyword.chars().count() >= 5 && token.starts_with(keyword))
    })
}

/// Classify one document. Rules run in precedence order; all positive
/// matches accumulate.
pub fn classify(doc: &ParliamentDocument) -> Classification {
    let tokens = title_tokens(&doc.title);
    let mut tags: Vec<TopicTag> = Vec::new();

    if let Some(committee) = doc.committee.as_deref() {
        if ENERGY_COMMITTEES.contains(&committee) {
            tags.push(TopicTag {
                tag: format!("committee:{committee}"),
                rule: TopicRule::Committee,
                confidence: Confidence::High,
            });
        }
    }

    for area in &doc.expenditure_areas {
        if ENERGY_EXPENDITURE_AREAS.contains(area) {
            tags.push(TopicTag {
                tag: format!("expenditure:UO{area}"),
                rule: TopicRule::ExpenditureArea,
                confidence: Confidence::High,
            });
        }
    }

    let mut keyword_matched = false;
    for keyword in PRIMARY_KEYWORDS {
        if keyword_matches(&tokens, keyword) {
            keyword_matched = true;
            tags.push(TopicTag {
                tag: (*keyword).to_string(),
                rule: TopicRule::PrimaryKeyword,
                confidence: Confidence::High,
            });
        }
    }

    // Extended keywords need a secondary signal: any prior rule match.
    let secondary_signal = !tags.is_empty();
    if secondary_signal {
        for keyword in EXTENDED_KEYWORDS {
            if keyword_matches(&tokens, keyword) {
                keyword_matched = true;
                tags.push(TopicTag {
                    tag: (*keyword).to_string(),
                    rule: TopicRule::ExtendedKeyword,
                    confidence: Confidence::Medium,
                });
            }
        }
    }

    // Conditional committees count only when a keyword already matched.
    if keyword_matched {
        if let Some(committee) = doc.committee.as_deref() {
            if CONDITIONAL_COMMITTEES.contains(&committee) {
                tags.push(TopicTag {
                    tag: format!("committee:{committee}"),
                    rule: TopicRule::ConditionalCommittee,
                    confidence: Confidence::Medium,
                });
            }
        }
    }

    if doc.from_search {
        tags.push(TopicTag {
            tag: "search-origin".to_string(),
            rule: TopicRule::SearchOrigin,
            confidence: Confidence::Low,
        });
    }

    let weak = tags.len() == 1 && tags[0].rule == TopicRule::SearchOrigin;
    Classification {
        energy_related: !tags.is_empty(),
        weak,
        tags,
    }
}
