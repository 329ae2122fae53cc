//! C7 — Natural-Language Interpreter (spec §4.7).
//!
//! Pure function, no I/O — the same small-deterministic-helper idiom the
//! teacher favors for `validation.rs`'s `normalize_path`/`expand_home`
//! rather than a stateful parser object.

use crate::intent::{AccessPurpose, Intent, OrganizePurpose, Purpose, RemovePurpose, Target, UpdatePurpose};
use serde::Serialize;

const MIN_CONFIDENCE: f32 = 0.5;

/// Verb keyword → intent-kind/purpose rule table, spec §4.7 step 2.
const RULES: &[(&[&str], Purpose)] = &[
    (&["read", "show", "display", "open"], Purpose::Access(AccessPurpose::Read)),
    (&["preview"], Purpose::Access(AccessPurpose::Preview)),
    (&["create", "make", "write", "add"], Purpose::Update(UpdatePurpose::Create)),
    (&["append"], Purpose::Update(UpdatePurpose::Append)),
    (&["overwrite", "replace"], Purpose::Update(UpdatePurpose::Overwrite)),
    (&["find", "search", "locate", "look"], Purpose::Discover(crate::intent::DiscoverPurpose::SearchSemantic)),
    (&["list", "ls"], Purpose::Discover(crate::intent::DiscoverPurpose::List)),
    (&["delete", "remove", "rm"], Purpose::Remove(RemovePurpose::DeleteFile)),
    (&["move", "rename"], Purpose::Organize(OrganizePurpose::Move)),
    (&["copy"], Purpose::Organize(OrganizePurpose::Copy)),
    (&["organize", "group"], Purpose::Organize(OrganizePurpose::CreateDirectory)),
];

/// Result of [`interpret`]: a structured intent guess plus confidence and,
/// when confidence is too low to act on, up to three alternative guesses.
#[derive(Debug, Clone, Serialize)]
pub struct Interpretation {
    pub success: bool,
    pub intent: Option<Intent>,
    pub confidence: f32,
    pub alternatives: Vec<String>,
}

/// Tokenize a free-text query into normalized keyword-style tokens, reused
/// by [`crate::search`] so NL-derived and directly-submitted semantic
/// queries tokenize identically (spec §8 determinism property).
#[must_use]
pub fn tokenize_query(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(str::to_string)
        .collect()
}

fn extract_target(text: &str, matched_verbs: &[&str]) -> Target {
    if let Some(start) = text.find('"') {
        if let Some(end) = text[start + 1..].find('"') {
            let quoted = &text[start + 1..start + 1 + end];
            return Target {
                path: Some(quoted.to_string()),
                pattern: None,
                semantic_query: None,
            };
        }
    }

    let remainder: String = text
        .split_whitespace()
        .filter(|word| !matched_verbs.contains(&word.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ");

    if remainder.is_empty() {
        Target {
            path: None,
            pattern: None,
            semantic_query: None,
        }
    } else {
        Target {
            path: None,
            pattern: None,
            semantic_query: Some(remainder),
        }
    }
}

/// Deterministically map `text` to a structured [`Intent`] with a
/// confidence score, per spec §4.7's five-step algorithm.
#[must_use]
pub fn interpret(text: &str) -> Interpretation {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();

    let mut matches: Vec<(&'static [&'static str], Purpose, &'static str)> = Vec::new();
    for (verbs, purpose) in RULES {
        for verb in *verbs {
            if words.contains(verb) {
                matches.push((verbs, purpose.clone(), verb));
                break;
            }
        }
    }

    if matches.is_empty() {
        return Interpretation {
            success: false,
            intent: None,
            confidence: 0.0,
            alternatives: vec![
                "try a verb like read, create, find, delete, or move".to_string(),
            ],
        };
    }

    let matched_verb_words: Vec<&str> = matches.iter().map(|(_, _, v)| *v).collect();
    let (_, purpose, _) = matches[0].clone();
    let target = extract_target(text, &matched_verb_words);

    let ambiguous_alternatives = matches.len().saturating_sub(1);
    let confidence = (0.9 - 0.15 * ambiguous_alternatives as f32).max(0.0);

    let intent = Intent {
        purpose,
        target,
        source: None,
        destination: None,
        content: None,
        options: Default::default(),
    };

    if confidence < MIN_CONFIDENCE {
        let alternatives = matches
            .iter()
            .take(3)
            .map(|(_, purpose, verb)| format!("'{verb}' suggests {purpose:?}"))
            .collect();
        return Interpretation {
            success: false,
            intent: Some(intent),
            confidence,
            alternatives,
        };
    }

    Interpretation {
        success: true,
        intent: Some(intent),
        confidence,
        alternatives: Vec::new(),
    }
}
