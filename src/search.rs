//! C5 — Search / Scorer (spec §4.5).
//!
//! Glob matching via `globset` and content matching via `regex` — both
//! already teacher dependencies, previously wired into the vendored
//! ripgrep CLI layer this crate drops (see DESIGN.md). Here they're used
//! directly against the Index Store's candidate set instead of spawning a
//! ripgrep process.

use crate::index::{FileEntry, IndexStore};
use globset::GlobBuilder;
use std::cmp::Ordering;
use std::path::Path;

/// One ranked search hit (spec §4.5 contract).
#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchHit {
    pub path: String,
    pub score: f32,
    pub snippet: Option<String>,
}

fn sort_hits(hits: &mut Vec<SearchHit>) {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.path.len().cmp(&b.path.len()))
            .then_with(|| a.path.cmp(&b.path))
    });
}

/// `find`: glob match over indexed paths. `*` matches within a segment,
/// `**` matches across segments.
#[must_use]
pub fn find_glob(store: &IndexStore, pattern: &str) -> Vec<SearchHit> {
    let Ok(glob) = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
    else {
        return Vec::new();
    };
    let matcher = glob.compile_matcher();
    let mut hits: Vec<SearchHit> = store
        .snapshot()
        .entries
        .values()
        .filter(|e| !e.is_directory && matcher.is_match(&e.path))
        .map(|e| SearchHit {
            path: e.path.clone(),
            score: 1.0,
            snippet: None,
        })
        .collect();
    sort_hits(&mut hits);
    hits
}

/// `search_content`: restrict to keyword candidates, then verify on disk
/// with a regex (falls back to plain substring if the pattern doesn't
/// compile as a regex), per spec §4.5.
pub async fn search_content(
    store: &IndexStore,
    root: &Path,
    query: &str,
    read_cap: usize,
) -> Vec<SearchHit> {
    let query_tokens = crate::nl::tokenize_query(query);
    let candidates = if query_tokens.is_empty() {
        store.all_paths().into_iter().collect()
    } else {
        store.query_by_keywords(&query_tokens)
    };

    let pattern = regex::Regex::new(query)
        .unwrap_or_else(|_| regex::Regex::new(&regex::escape(query)).expect("escaped literal"));

    let mut hits = Vec::new();
    for rel in candidates {
        let Some(entry) = store.get(&rel) else {
            continue;
        };
        if entry.is_directory {
            continue;
        }
        let absolute = root.join(&rel);
        let Ok(bytes) = tokio::fs::read(&absolute).await else {
            continue;
        };
        let probe_len = bytes.len().min(read_cap);
        let text = String::from_utf8_lossy(&bytes[..probe_len]);
        if let Some(m) = pattern.find(&text) {
            let snippet = snippet_around(&text, m.start(), m.end());
            hits.push(SearchHit {
                path: rel,
                score: 1.0,
                snippet: Some(snippet),
            });
        }
    }
    sort_hits(&mut hits);
    hits
}

fn snippet_around(text: &str, start: usize, end: usize) -> String {
    let ctx = 40;
    let from = text[..start].char_indices().rev().nth(ctx).map_or(0, |(i, _)| i);
    let to = text[end..]
        .char_indices()
        .nth(ctx)
        .map_or(text.len(), |(i, _)| end + i);
    text[from..to].to_string()
}

/// `search_semantic`: score each candidate by keyword overlap with a
/// filename bonus, clamp to `[0,1]`, filter by `threshold`, cap at
/// `max_results` — spec §4.5's scoring formula.
#[must_use]
pub fn search_semantic(
    store: &IndexStore,
    semantic_query: &str,
    threshold: f32,
    max_results: usize,
) -> Vec<SearchHit> {
    let query_tokens = crate::nl::tokenize_query(semantic_query);
    if query_tokens.is_empty() {
        return Vec::new();
    }
    let denom = query_tokens.len().max(1) as f32;

    let snapshot = store.snapshot();
    let mut hits: Vec<SearchHit> = snapshot
        .entries
        .values()
        .filter(|e| !e.is_directory)
        .filter_map(|entry| score_entry(entry, &query_tokens, denom))
        .filter(|hit| hit.score >= threshold)
        .collect();

    sort_hits(&mut hits);
    hits.truncate(max_results);
    hits
}

fn score_entry(entry: &FileEntry, query_tokens: &[String], denom: f32) -> Option<SearchHit> {
    let overlap = query_tokens
        .iter()
        .filter(|t| entry.keywords.iter().any(|k| k == *t))
        .count() as f32;
    if overlap == 0.0 {
        return None;
    }
    let mut score = overlap / denom;

    let filename = entry.path.rsplit('/').next().unwrap_or(&entry.path);
    let filename_lower = filename.to_lowercase();
    if query_tokens.iter().any(|t| filename_lower.contains(t.as_str())) {
        score += 0.1;
    }
    score = score.clamp(0.0, 1.0);

    Some(SearchHit {
        path: entry.path.clone(),
        score,
        snippet: None,
    })
}

/// `search_integrated`: union of content and semantic search, deduplicated
/// by path, scored by the max of the two — spec §4.5.
pub async fn search_integrated(
    store: &IndexStore,
    root: &Path,
    query: &str,
    threshold: f32,
    max_results: usize,
    read_cap: usize,
) -> Vec<SearchHit> {
    let content_hits = search_content(store, root, query, read_cap).await;
    let semantic_hits = search_semantic(store, query, threshold, max_results);

    let mut merged: std::collections::HashMap<String, SearchHit> = std::collections::HashMap::new();
    for hit in content_hits.into_iter().chain(semantic_hits) {
        merged
            .entry(hit.path.clone())
            .and_modify(|existing| {
                if hit.score > existing.score {
                    existing.score = hit.score;
                    existing.snippet = hit.snippet.clone().or(existing.snippet.clone());
                }
            })
            .or_insert(hit);
    }
    let mut hits: Vec<SearchHit> = merged.into_values().collect();
    sort_hits(&mut hits);
    hits.truncate(max_results);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::index::IndexStore;
    use crate::indexer::{index, CancellationToken};

    async fn seeded_store(tmp: &std::path::Path) -> (IndexStore, EngineConfig) {
        tokio::fs::write(
            tmp.join("auth.rs"),
            b"fn authenticate() { /* jwt token flow */ }",
        )
        .await
        .unwrap();
        tokio::fs::write(tmp.join("billing.rs"), b"fn charge_card() { /* stripe */ }")
            .await
            .unwrap();
        let config = EngineConfig::new(tmp.to_path_buf());
        let store = IndexStore::load(tmp, &config.index_file_name).await;
        index(tmp, &store, &config, &CancellationToken::new())
            .await
            .unwrap();
        (store, config)
    }

    #[tokio::test]
    async fn semantic_search_ranks_overlap_descending() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, config) = seeded_store(tmp.path()).await;
        let hits = search_semantic(&store, "user authentication jwt flow", config.semantic_threshold, config.max_results);
        assert!(!hits.is_empty());
        assert_eq!(hits[0].path, "auth.rs");
    }

    #[tokio::test]
    async fn glob_find_matches_segment_wildcard() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, _) = seeded_store(tmp.path()).await;
        let hits = find_glob(&store, "*.rs");
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn content_search_finds_substring() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, config) = seeded_store(tmp.path()).await;
        let hits = search_content(&store, tmp.path(), "stripe", config.read_cap_bytes).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "billing.rs");
    }

    #[tokio::test]
    async fn determinism_of_scoring() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, config) = seeded_store(tmp.path()).await;
        let a = search_semantic(&store, "authentication flow", config.semantic_threshold, config.max_results);
        let b = search_semantic(&store, "authentication flow", config.semantic_threshold, config.max_results);
        assert_eq!(
            a.iter().map(|h| &h.path).collect::<Vec<_>>(),
            b.iter().map(|h| &h.path).collect::<Vec<_>>()
        );
    }
}
