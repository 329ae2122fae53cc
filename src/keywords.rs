//! C2 — Keyword Extractor (spec §4.2).
//!
//! No teacher module extracts keywords; this follows the teacher's
//! "stream bytes, derive small metadata" idiom seen in `read_file.rs`
//! (MIME sniffing via `mime_guess`) and `get_file_info.rs` (streaming line
//! counts), generalized into a bounded, deterministic token bag.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

const MIN_TOKEN_LEN: usize = 3;
const MAX_TOKEN_LEN: usize = 32;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was",
        "one", "our", "out", "day", "get", "has", "him", "his", "how", "man", "new", "now",
        "old", "see", "two", "way", "who", "boy", "did", "its", "let", "put", "say", "she",
        "too", "use", "that", "with", "have", "this", "will", "your", "from", "they", "know",
        "want", "been", "good", "much", "some", "time", "very", "when", "come", "here", "just",
        "like", "long", "make", "many", "over", "such", "take", "than", "them", "well", "were",
    ]
    .into_iter()
    .collect()
});

/// Split a filename stem on camelCase, kebab-case, and snake_case
/// boundaries, the way the teacher's callers already expect filenames to
/// carry semantic tokens (see `read_file.rs`'s MIME-by-extension dispatch,
/// which treats the filename as carrying type information).
fn split_stem(stem: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in stem.chars() {
        if ch == '-' || ch == '_' || ch == '.' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase();
        current.push(ch.to_ascii_lowercase());
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= MIN_TOKEN_LEN && t.len() <= MAX_TOKEN_LEN)
        .filter(|t| !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Returns true if `bytes`' leading 4 KiB contains a null byte, the same
/// binary-sniffing heuristic the teacher applies to MIME essence strings
/// in `read_file.rs`'s `is_image_mime`, generalized to raw content.
#[must_use]
pub fn looks_binary(bytes: &[u8]) -> bool {
    let probe_len = bytes.len().min(4096);
    bytes[..probe_len].contains(&0)
}

/// Extract a bounded, deterministic multiset of normalized keywords from
/// file content and filename, per spec §4.2's six-step algorithm.
#[must_use]
pub fn extract(bytes: &[u8], filename: &str, max_keywords: usize) -> Vec<String> {
    let stem_tokens = filename
        .rsplit_once('/')
        .map_or(filename, |(_, name)| name)
        .rsplit_once('.')
        .map_or(filename, |(stem, _)| stem);
    let filename_keywords = split_stem(stem_tokens);

    if looks_binary(bytes) {
        return cap_by_frequency(filename_keywords, max_keywords);
    }

    let text = String::from_utf8_lossy(bytes);
    let content_tokens = tokenize(&text);
    let mut capped = cap_by_frequency(content_tokens, max_keywords);

    // Filename tokens are appended after the content cap, not recompeted
    // against it, so they survive even when content alone already fills
    // `max_keywords` (spec §4.2 steps 5-6).
    for kw in filename_keywords {
        if !capped.contains(&kw) {
            capped.push(kw);
        }
    }
    capped
}

/// Keep the top `max` tokens by frequency, ties broken by first-occurrence
/// order — spec §4.2 step 5.
fn cap_by_frequency(tokens: Vec<String>, max: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for token in &tokens {
        let entry = counts.entry(token.as_str()).or_insert(0);
        if *entry == 0 {
            first_seen.push(token.as_str());
        }
        *entry += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = first_seen
        .iter()
        .enumerate()
        .map(|(order, tok)| (*tok, counts[tok], order))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(max)
        .map(|(tok, _, _)| tok.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_deterministic_keywords() {
        let a = extract(b"authentication jwt authentication flow", "auth.rs", 64);
        let b = extract(b"authentication jwt authentication flow", "auth.rs", 64);
        assert_eq!(a, b);
        assert!(a.contains(&"authentication".to_string()));
    }

    #[test]
    fn binary_falls_back_to_filename() {
        let bytes = [0u8, 1, 2, 3, 0, 5];
        let tokens = extract(&bytes, "secretKeyStore.bin", 64);
        assert!(tokens.contains(&"secret".to_string()));
        assert!(tokens.contains(&"key".to_string()));
        assert!(tokens.contains(&"store".to_string()));
    }

    #[test]
    fn drops_stop_words_and_short_tokens() {
        let tokens = extract(b"the and for a to it authentication", "x.txt", 64);
        assert!(!tokens.contains(&"the".to_string()));
        assert!(!tokens.contains(&"a".to_string()));
    }

    #[test]
    fn caps_keyword_count() {
        let content: String = (0..100).map(|i| format!("token{i} ")).collect();
        let tokens = extract(content.as_bytes(), "f.txt", 10);
        assert_eq!(tokens.len(), 10);
    }

    #[test]
    fn filename_keywords_survive_a_full_content_cap() {
        // Content alone already yields 100 distinct tokens, well past the
        // cap of 10, so every content token ties at frequency 1. The
        // filename-derived token must still appear rather than losing that
        // tie and being dropped.
        let content: String = (0..100).map(|i| format!("token{i} ")).collect();
        let tokens = extract(content.as_bytes(), "report.txt", 10);
        assert_eq!(tokens.len(), 11);
        assert!(tokens.contains(&"report".to_string()));
    }
}
