//! C6 — Error-Recovery Engine (spec §4.6).
//!
//! Levenshtein distance is hand-rolled rather than pulled from a crate —
//! the same "small hand-written text algorithm" idiom the teacher uses for
//! UTF-8-boundary-safe line counting in `edit_block/mod.rs`'s
//! `count_lines_before_index`.

use crate::index::IndexStore;
use crate::intent::{ErrorSuggestion, SuggestionKind};
use std::path::Path;

/// Classic O(nm) edit-distance DP table.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for i in 1..=a.len() {
        let mut prev_diag = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let temp = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev_diag
            } else {
                1 + prev_diag.min(row[j]).min(row[j - 1])
            };
            prev_diag = temp;
        }
    }
    row[b.len()]
}

async fn sibling_names(dir: &Path) -> Vec<String> {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return Vec::new();
    };
    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        names.push(entry.file_name().to_string_lossy().into_owned());
        if names.len() >= 20 {
            break;
        }
    }
    names
}

/// Walk upward from `path` to find the deepest existing ancestor, per spec
/// §4.6 rule 3.
async fn deepest_existing_ancestor(path: &Path, root: &Path) -> Option<std::path::PathBuf> {
    let mut current = path.to_path_buf();
    while current.pop() {
        if !current.starts_with(root) && current != root {
            break;
        }
        if tokio::fs::metadata(&current).await.is_ok() {
            return Some(current);
        }
        if current == root {
            break;
        }
    }
    None
}

/// Build up to `limit` suggestions for a `FILE_NOT_FOUND` failure at
/// `missing_path` (absolute, within `root`), per spec §4.6.
pub async fn suggest_for_missing_path(
    store: &IndexStore,
    root: &Path,
    missing_path: &Path,
    limit: usize,
) -> Vec<ErrorSuggestion> {
    let mut suggestions = Vec::new();
    let basename = missing_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let parent = missing_path.parent();
    let parent_exists = match parent {
        Some(p) => tokio::fs::metadata(p).await.is_ok(),
        None => false,
    };

    if parent_exists {
        let parent = parent.unwrap();
        let siblings = sibling_names(parent).await;
        if !siblings.is_empty() {
            suggestions.push(ErrorSuggestion {
                kind: SuggestionKind::DirectoryListing,
                description: format!("Listing of {}", parent.display()),
                payload: serde_json::json!({ "siblings": siblings }),
                confidence: 0.5,
            });
        }

        let max_distance = basename.chars().count().div_ceil(4).max(2);
        let mut scored: Vec<(String, usize)> = siblings
            .iter()
            .map(|s| (s.clone(), levenshtein(&basename, s)))
            .filter(|(_, d)| *d <= max_distance)
            .collect();
        scored.sort_by_key(|(_, d)| *d);
        if !scored.is_empty() {
            let len = basename.chars().count().max(1) as f32;
            let payload = scored
                .iter()
                .map(|(name, dist)| {
                    serde_json::json!({
                        "name": name,
                        "distance": dist,
                        "confidence": 1.0 - (*dist as f32 / len),
                    })
                })
                .collect::<Vec<_>>();
            let top_confidence = 1.0 - (scored[0].1 as f32 / len);
            suggestions.push(ErrorSuggestion {
                kind: SuggestionKind::SimilarFiles,
                description: "Similarly named files nearby".to_string(),
                payload: serde_json::json!(payload),
                confidence: top_confidence.clamp(0.0, 1.0),
            });
        }

        if let Some(sibling_ext_match) = find_alternative_extension(&basename, &siblings) {
            suggestions.push(ErrorSuggestion {
                kind: SuggestionKind::AlternativePath,
                description: format!("Found a file with a different extension: {sibling_ext_match}"),
                payload: serde_json::json!({ "alternative": sibling_ext_match }),
                confidence: 0.6,
            });
        }
    } else if let Some(ancestor) = deepest_existing_ancestor(missing_path, root).await {
        suggestions.push(ErrorSuggestion {
            kind: SuggestionKind::ParentDirectory,
            description: format!("Deepest existing ancestor: {}", ancestor.display()),
            payload: serde_json::json!({ "ancestor": ancestor.to_string_lossy() }),
            confidence: 0.4,
        });
    }

    let elsewhere: Vec<String> = store
        .all_paths()
        .into_iter()
        .filter(|p| p.rsplit('/').next() == Some(basename.as_str()))
        .take(10)
        .collect();
    if !elsewhere.is_empty() {
        suggestions.push(ErrorSuggestion {
            kind: SuggestionKind::SearchResults,
            description: format!("'{basename}' exists elsewhere under the root"),
            payload: serde_json::json!({ "locations": elsewhere }),
            confidence: 0.7,
        });
    }

    suggestions.truncate(limit);
    suggestions
}

fn find_alternative_extension(basename: &str, siblings: &[String]) -> Option<String> {
    let stem = basename.rsplit_once('.').map_or(basename, |(s, _)| s);
    siblings
        .iter()
        .find(|s| {
            s.rsplit_once('.').map(|(sib_stem, _)| sib_stem) == Some(stem) && **s != basename
        })
        .cloned()
}

/// Suggestion for an empty discovery result: split the query into tokens
/// and suggest each as a broader search, per spec §4.6 "Empty discovery".
#[must_use]
pub fn suggest_for_empty_discovery(query: &str, limit: usize) -> Vec<ErrorSuggestion> {
    let tokens = crate::nl::tokenize_query(query);
    if tokens.is_empty() {
        return Vec::new();
    }
    let payload = serde_json::json!({ "broader_terms": tokens });
    vec![ErrorSuggestion {
        kind: SuggestionKind::SearchResults,
        description: "No matches; consider a broader search using individual terms".to_string(),
        payload,
        confidence: 0.3,
    }]
    .into_iter()
    .take(limit)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_basic_cases() {
        assert_eq!(levenshtein("guide.md", "guide.mdd"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[tokio::test]
    async fn suggests_similar_file_for_typo() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(tmp.path().join("docs")).await.unwrap();
        tokio::fs::write(tmp.path().join("docs/guide.md"), b"content")
            .await
            .unwrap();

        let config = crate::config::EngineConfig::new(tmp.path().to_path_buf());
        let store = IndexStore::load(tmp.path(), &config.index_file_name).await;

        let missing = tmp.path().join("docs/guide.mdd");
        let suggestions = suggest_for_missing_path(&store, tmp.path(), &missing, 5).await;
        let similar = suggestions
            .iter()
            .find(|s| s.kind == SuggestionKind::SimilarFiles)
            .expect("expected a similar_files suggestion");
        assert!(similar.confidence >= 0.75);
    }
}
