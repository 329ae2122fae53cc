//! C4 — Indexer (spec §4.4).
//!
//! The explicit `(dir, depth)` queue, visited-realpath cycle guard, and
//! skip-with-warning-on-error idiom are grounded on the bulk indexer
//! reference (`da514a03_jijiezzhou-silo…apps-mcp-server-src-indexer.rs`):
//! a stack-based walk that tallies scanned/skipped/errored counts into a
//! summary struct rather than aborting on the first bad entry. Directory
//! listing uses `tokio::fs::read_dir` directly rather than the teacher's
//! `ignore` crate: spec §4.4's depth/cycle/blocked-segment rules are
//! bespoke enough (mid-path blocked segments, explicit depth counting,
//! realpath cycle detection) that driving them by hand is clearer than
//! bending `ignore`'s gitignore-oriented walker to fit — see DESIGN.md.

use crate::config::EngineConfig;
use crate::index::{FileEntry, IndexStore};
use crate::keywords;
use crate::path_guard::normalize_relative;
use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hasher;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Statistics returned by a full index run, the same "tally instead of
/// abort" shape as the reference indexer's `IndexSummary`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStatistics {
    pub files_indexed: u64,
    pub directories_indexed: u64,
    pub files_skipped_unchanged: u64,
    pub files_metadata_only: u64,
    pub errors: u64,
    pub pruned: u64,
}

/// Cooperative cancellation flag shared between the caller and a long-running
/// walk, per spec §5 "Cancellation and timeouts".
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

fn content_hash(bytes: &[u8]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    hasher.write(bytes);
    hasher.finish()
}

async fn mtime_ms(metadata: &std::fs::Metadata) -> i64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Walk `root` breadth-first up to `config.max_index_depth`, inserting or
/// updating entries in `store`, then prune stale entries and persist.
///
/// # Errors
/// Only top-level I/O failures reading `root` itself are surfaced; per-file
/// and per-directory errors are tallied into [`IndexStatistics::errors`]
/// and the walk continues over the reachable subset (spec §4.4 "Failure
/// semantics").
pub async fn index(
    root: &Path,
    store: &IndexStore,
    config: &EngineConfig,
    cancel: &CancellationToken,
) -> std::io::Result<IndexStatistics> {
    let stats = walk(root, store, config, cancel).await?;
    if let Err(e) = store.persist().await {
        log::warn!("failed to persist index snapshot: {e}");
    }
    Ok(stats)
}

/// Walk `root` and populate `store`, without persisting. Shared by
/// [`index`] (which persists afterward) and [`scan_ephemeral`] (which
/// never does, for non-default-root scans that must not touch the Index
/// Store's on-disk snapshot — spec §4.9).
async fn walk(
    root: &Path,
    store: &IndexStore,
    config: &EngineConfig,
    cancel: &CancellationToken,
) -> std::io::Result<IndexStatistics> {
    let mut stats = IndexStatistics::default();
    let mut visited_real = HashSet::new();
    let mut keep = HashSet::new();
    let mut queue: Vec<(PathBuf, u32)> = vec![(root.to_path_buf(), 0)];

    while let Some((dir, depth)) = queue.pop() {
        if cancel.is_cancelled() {
            break;
        }
        if depth > config.max_index_depth {
            continue;
        }

        let real_dir = match tokio::fs::canonicalize(&dir).await {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping unreadable directory {}: {e}", dir.display());
                stats.errors += 1;
                continue;
            }
        };
        if !visited_real.insert(real_dir) {
            continue; // symlink cycle
        }

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping unreadable directory {}: {e}", dir.display());
                stats.errors += 1;
                continue;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(e)) => e,
                Ok(None) => break,
                Err(e) => {
                    log::warn!("error walking {}: {e}", dir.display());
                    stats.errors += 1;
                    break;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            if config
                .blocked_path_segments
                .iter()
                .any(|b| b.eq_ignore_ascii_case(&name))
            {
                continue;
            }

            let file_type = match entry.file_type().await {
                Ok(ft) => ft,
                Err(e) => {
                    log::warn!("skipping entry {name} in {}: {e}", dir.display());
                    stats.errors += 1;
                    continue;
                }
            };

            let child_depth = depth + 1;
            if child_depth > config.max_index_depth {
                // Indexing stops exactly at `max_index_depth`: this entry is
                // one level past it and is neither indexed nor walked.
                continue;
            }

            let path = entry.path();
            let rel = normalize_relative(path.strip_prefix(root).unwrap_or(&path));

            if file_type.is_dir() {
                queue.push((path, child_depth));
                keep.insert(rel.clone());
                store.put(FileEntry {
                    path: rel,
                    size_bytes: 0,
                    mtime_ms: 0,
                    content_hash: 0,
                    keywords: Vec::new(),
                    extension: String::new(),
                    is_directory: true,
                });
                stats.directories_indexed += 1;
                continue;
            }

            match index_one_file(&path, &rel, store, config).await {
                Ok(FileOutcome::Indexed) => stats.files_indexed += 1,
                Ok(FileOutcome::Unchanged) => stats.files_skipped_unchanged += 1,
                Ok(FileOutcome::MetadataOnly) => stats.files_metadata_only += 1,
                Err(e) => {
                    log::warn!("skipping file {}: {e}", path.display());
                    stats.errors += 1;
                    continue;
                }
            }
            keep.insert(rel);
        }
    }

    store.prune_except(&keep);
    stats.pruned = store
        .all_paths()
        .len()
        .saturating_sub(keep.len()) as u64;

    Ok(stats)
}

/// Build a throwaway Index Store by walking `root` directly, for intents
/// whose effective root differs from the engine's default root. Spec §4.9:
/// such roots must not consult or mutate the default root's Index Store, so
/// discover/search purposes fall back to this in-memory, never-persisted
/// scan instead.
#[must_use]
pub async fn scan_ephemeral(root: &Path, config: &EngineConfig) -> IndexStore {
    let store = IndexStore::in_memory(root, &config.index_file_name);
    let cancel = CancellationToken::new();
    if let Err(e) = walk(root, &store, config, &cancel).await {
        log::warn!("on-disk scan of {} failed: {e}", root.display());
    }
    store
}

enum FileOutcome {
    Indexed,
    Unchanged,
    MetadataOnly,
}

async fn index_one_file(
    path: &Path,
    rel: &str,
    store: &IndexStore,
    config: &EngineConfig,
) -> std::io::Result<FileOutcome> {
    let metadata = tokio::fs::metadata(path).await?;
    let size = metadata.len();
    let mtime = mtime_ms(&metadata).await;
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if size > config.max_file_size {
        store.put(FileEntry {
            path: rel.to_string(),
            size_bytes: size,
            mtime_ms: mtime,
            content_hash: 0,
            keywords: Vec::new(),
            extension,
            is_directory: false,
        });
        return Ok(FileOutcome::MetadataOnly);
    }

    if let Some(existing) = store.get(rel)
        && existing.mtime_ms == mtime
        && existing.size_bytes == size
    {
        return Ok(FileOutcome::Unchanged);
    }

    let read_len = size.min(config.read_cap_bytes as u64) as usize;
    let bytes = read_prefix(path, read_len).await?;
    let hash = content_hash(&bytes);
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let kws = keywords::extract(&bytes, &filename, config.max_keywords_per_file);

    store.put(FileEntry {
        path: rel.to_string(),
        size_bytes: size,
        mtime_ms: mtime,
        content_hash: hash,
        keywords: kws,
        extension,
        is_directory: false,
    });
    Ok(FileOutcome::Indexed)
}

async fn read_prefix(path: &Path, cap: usize) -> std::io::Result<Vec<u8>> {
    use tokio::io::AsyncReadExt;
    let mut file = tokio::fs::File::open(path).await?;
    let mut buf = vec![0u8; cap];
    let mut total = 0;
    loop {
        let n = file.read(&mut buf[total..]).await?;
        if n == 0 {
            break;
        }
        total += n;
        if total >= cap {
            break;
        }
    }
    buf.truncate(total);
    Ok(buf)
}

/// Incrementally reindex a single path after a targeted write/delete,
/// avoiding a full tree walk for the common case of a single-file mutation
/// (spec §4.4 `incremental_update`).
pub async fn incremental_update(
    root: &Path,
    rel_path: &str,
    store: &IndexStore,
    config: &EngineConfig,
) {
    let absolute = root.join(rel_path);
    match tokio::fs::metadata(&absolute).await {
        Ok(meta) if meta.is_file() => {
            if let Err(e) = index_one_file(&absolute, rel_path, store, config).await {
                log::warn!("incremental reindex failed for {rel_path}: {e}");
            }
        }
        Ok(meta) if meta.is_dir() => {
            store.put(FileEntry {
                path: rel_path.to_string(),
                size_bytes: 0,
                mtime_ms: 0,
                content_hash: 0,
                keywords: Vec::new(),
                extension: String::new(),
                is_directory: true,
            });
        }
        _ => store.remove(rel_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn indexes_files_and_prunes_deleted() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::write(tmp.path().join("a.txt"), b"authentication jwt flow")
            .await
            .unwrap();
        let config = EngineConfig::new(tmp.path().to_path_buf());
        let store = IndexStore::load(tmp.path(), &config.index_file_name).await;
        let cancel = CancellationToken::new();

        let stats = index(tmp.path(), &store, &config, &cancel).await.unwrap();
        assert_eq!(stats.files_indexed, 1);
        assert!(store.get("a.txt").is_some());

        tokio::fs::remove_file(tmp.path().join("a.txt")).await.unwrap();
        let stats2 = index(tmp.path(), &store, &config, &cancel).await.unwrap();
        assert_eq!(stats2.pruned, 1);
        assert!(store.get("a.txt").is_none());
    }

    #[tokio::test]
    async fn respects_max_depth() {
        let tmp = tempfile::tempdir().unwrap();
        // root(0)/d0(1)/d1(2)/d2(3)/leaf.txt
        let deep = tmp.path().join("d0").join("d1").join("d2");
        tokio::fs::create_dir_all(&deep).await.unwrap();
        tokio::fs::write(deep.join("leaf.txt"), b"leaf").await.unwrap();

        let mut config = EngineConfig::new(tmp.path().to_path_buf());
        config.max_index_depth = 1;
        let store = IndexStore::load(tmp.path(), &config.index_file_name).await;
        let cancel = CancellationToken::new();
        index(tmp.path(), &store, &config, &cancel).await.unwrap();

        // d0 sits at depth 1, exactly at max_index_depth, so it is indexed.
        // d0/d1 sits at depth 2, one past the bound, so it and everything
        // beneath it are never indexed or walked.
        assert!(store.get("d0").is_some());
        assert!(store.get("d0/d1").is_none());
        assert!(store.get("d0/d1/d2").is_none());
        assert!(store.get("d0/d1/d2/leaf.txt").is_none());
    }

    #[tokio::test]
    async fn skips_blocked_segment_subtree() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::create_dir_all(tmp.path().join("src/node_modules/pkg"))
            .await
            .unwrap();
        tokio::fs::write(tmp.path().join("src/node_modules/pkg/x.js"), b"x")
            .await
            .unwrap();
        tokio::fs::write(tmp.path().join("src/main.rs"), b"fn main() {}")
            .await
            .unwrap();

        let config = EngineConfig::new(tmp.path().to_path_buf());
        let store = IndexStore::load(tmp.path(), &config.index_file_name).await;
        let cancel = CancellationToken::new();
        index(tmp.path(), &store, &config, &cancel).await.unwrap();

        assert!(store.get("src/main.rs").is_some());
        assert!(store.get("src/node_modules/pkg/x.js").is_none());
    }
}
