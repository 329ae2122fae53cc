//! C8 — Intent Executor (spec §4.8).
//!
//! The `Accepted → Validated → Dispatched → Executed → Indexed → Assembled
//! → Recovered? → Returned` state machine. Each purpose's body is grounded
//! directly on the corresponding teacher tool file — see DESIGN.md for the
//! full per-purpose mapping (`read_file.rs`, `write_file.rs`,
//! `edit_block.rs`, `list_directory.rs`, `move_file.rs`,
//! `create_directory.rs`, `delete_file.rs`, `delete_directory.rs`,
//! `get_file_info.rs`).

use crate::config::{DEFAULT_SUGGESTION_LIMIT, EngineConfig};
use crate::error::{EngineError, EngineResult, ErrorCode};
use crate::index::IndexStore;
use crate::indexer;
use crate::intent::{
    AccessPurpose, DiscoverPurpose, FileDescriptor, Intent, IntentResult, OrganizePurpose,
    Purpose, RemovePurpose, UpdatePurpose,
};
use crate::path_guard::{self, GuardedOp};
use crate::rate_limit::RateLimiter;
use crate::recovery;
use crate::search;
use crate::workdir;
use base64::Engine as _;
use mime_guess::from_path;
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex as AsyncMutex;

/// Per-path advisory lock map, held from *Validated* through *Indexed* for
/// write intents (spec §5 "Ordering guarantees").
#[derive(Clone, Default)]
pub struct PathLocks {
    locks: Arc<SyncMutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>>,
}

impl PathLocks {
    fn get(&self, path: &Path) -> Arc<AsyncMutex<()>> {
        self.locks
            .lock()
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

/// Everything the executor needs to resolve one intent against the
/// default root's engine state.
pub struct ExecutorContext<'a> {
    pub config: &'a EngineConfig,
    pub default_root: &'a Path,
    pub store: &'a IndexStore,
    pub rate_limiter: &'a RateLimiter,
    pub locks: &'a PathLocks,
}

/// Execute one [`Intent`] end to end, producing a flat [`IntentResult`]
/// (spec §4.8). Never returns a Rust error: every fault is folded into the
/// result record per spec §7's propagation policy.
pub async fn execute(intent: &Intent, ctx: &ExecutorContext<'_>) -> IntentResult {
    let started = Instant::now();

    // *Accepted*
    let root = workdir::effective_root(intent, ctx.default_root);
    let rate_key = format!(
        "{}:{}",
        root.display(),
        intent
            .target
            .path
            .as_deref()
            .or(intent.target.pattern.as_deref())
            .or(intent.target.semantic_query.as_deref())
            .unwrap_or("")
    );
    if !ctx.rate_limiter.try_acquire(&rate_key) {
        let cfg = ctx.rate_limiter.config().cloned();
        let (max_requests, window_ms) = cfg.map_or((0, 0), |c| (c.max_requests, c.window_ms));
        return assemble_failure(
            EngineError::RateLimited {
                key: rate_key,
                max_requests,
                window_ms,
            },
            intent,
            ctx,
            &root,
            started,
        )
        .await;
    }

    let is_default = workdir::is_default_root(&root, ctx.default_root);

    // *Dispatched* / *Executed* / *Indexed*
    let dispatch_result = dispatch(intent, ctx, &root, is_default).await;

    // *Assembled* / *Recovered?* / *Returned*
    match dispatch_result {
        Ok(mut result) => {
            result.set_metadata("execution_time_ms", started.elapsed().as_millis() as u64);
            result.set_metadata("operation_type", format!("{:?}", intent.purpose));
            let is_empty_discovery = matches!(intent.purpose, Purpose::Discover(_))
                && result.total_found == Some(0);
            if is_empty_discovery {
                let query = intent
                    .target
                    .semantic_query
                    .as_deref()
                    .or(intent.target.pattern.as_deref())
                    .unwrap_or("");
                let suggestions =
                    recovery::suggest_for_empty_discovery(query, DEFAULT_SUGGESTION_LIMIT);
                result = result.with_suggestions(suggestions);
            }
            result
        }
        Err(e) => assemble_failure(e, intent, ctx, &root, started).await,
    }
}

async fn assemble_failure(
    err: EngineError,
    intent: &Intent,
    ctx: &ExecutorContext<'_>,
    root: &Path,
    started: Instant,
) -> IntentResult {
    let code = err.code();
    let mut result = IntentResult::failure(err.to_string(), code);
    result.set_metadata("execution_time_ms", started.elapsed().as_millis() as u64);
    result.set_metadata("operation_type", format!("{:?}", intent.purpose));

    if code.is_recoverable()
        && let Some(path) = intent.target.path.as_deref()
    {
        let candidate = root.join(path);
        let suggestions = recovery::suggest_for_missing_path(
            ctx.store,
            root,
            &candidate,
            DEFAULT_SUGGESTION_LIMIT,
        )
        .await;
        result = result.with_suggestions(suggestions);
    }
    result
}

async fn dispatch(
    intent: &Intent,
    ctx: &ExecutorContext<'_>,
    root: &Path,
    is_default: bool,
) -> EngineResult<IntentResult> {
    match intent.purpose {
        Purpose::Access(p) => access(p, intent, ctx, root).await,
        Purpose::Update(p) => update(p, intent, ctx, root, is_default).await,
        Purpose::Discover(p) => discover(p, intent, ctx, root, is_default).await,
        Purpose::Organize(p) => organize(p, intent, ctx, root, is_default).await,
        Purpose::Remove(p) => remove(p, intent, ctx, root, is_default).await,
    }
}

fn target_path(intent: &Intent) -> EngineResult<&str> {
    intent
        .target
        .path
        .as_deref()
        .ok_or_else(|| EngineError::InvalidPath("intent target is missing a path".to_string()))
}

/// Classify an I/O fault against an already-validated path, per spec §7's
/// error table: a missing file is `FILE_NOT_FOUND` (recoverable), a real OS
/// permission fault is the distinct non-recoverable `PERMISSION_DENIED`, and
/// anything else folds into `INTERNAL` rather than being misreported as a
/// missing file.
fn classify_io_error(err: std::io::Error, path: &Path) -> EngineError {
    match err.kind() {
        std::io::ErrorKind::NotFound => EngineError::FileNotFound(path.to_path_buf()),
        std::io::ErrorKind::PermissionDenied => {
            EngineError::PermissionDenied(path.display().to_string())
        }
        _ => EngineError::Io(err),
    }
}

async fn maybe_reindex(is_default: bool, root: &Path, rel: &str, ctx: &ExecutorContext<'_>) {
    if is_default {
        indexer::incremental_update(root, rel, ctx.store, ctx.config).await;
        if let Err(e) = ctx.store.persist().await {
            log::warn!("failed to persist index after mutation: {e}");
        }
    }
}

// ============================================================================
// Access/* — grounded on read_file.rs, get_file_info.rs
// ============================================================================

async fn access(
    purpose: AccessPurpose,
    intent: &Intent,
    ctx: &ExecutorContext<'_>,
    root: &Path,
) -> EngineResult<IntentResult> {
    let path = target_path(intent)?;
    let valid = path_guard::validate(path, root, ctx.config, GuardedOp::Read).await?;

    match purpose {
        AccessPurpose::VerifyExists => {
            let exists = tokio::fs::metadata(&valid).await.is_ok();
            let mut result = IntentResult::ok();
            result.exists = Some(exists);
            result.path = Some(path.to_string());
            Ok(result)
        }
        AccessPurpose::Metadata => {
            let stats = tokio::fs::metadata(&valid)
                .await
                .map_err(|e| classify_io_error(e, &valid))?;
            let mut result = IntentResult::ok();
            result.path = Some(path.to_string());
            result.set_metadata("size", stats.len());
            result.set_metadata("is_directory", stats.is_dir());
            if let Ok(modified) = stats.modified() {
                result.set_metadata("modified", format!("{modified:?}"));
            }
            Ok(result)
        }
        AccessPurpose::Read => {
            let stats = tokio::fs::metadata(&valid)
                .await
                .map_err(|e| classify_io_error(e, &valid))?;
            if stats.len() > ctx.config.max_file_size {
                return Err(EngineError::FileTooLarge {
                    size: stats.len(),
                    limit: ctx.config.max_file_size,
                });
            }
            let bytes = tokio::fs::read(&valid)
                .await
                .map_err(|e| classify_io_error(e, &valid))?;

            let mime = from_path(&valid).first_or_octet_stream();
            let is_binary = mime.type_() != mime_guess::mime::TEXT && crate::keywords::looks_binary(&bytes);

            let mut result = IntentResult::ok();
            result.exists = Some(true);
            result.path = Some(path.to_string());
            result.content = Some(if is_binary {
                base64::engine::general_purpose::STANDARD.encode(&bytes)
            } else {
                String::from_utf8_lossy(&bytes).into_owned()
            });
            result.set_metadata("size", stats.len());
            result.set_metadata("encoding", if is_binary { "base64" } else { "utf8" });
            if let Ok(modified) = stats.modified() {
                result.set_metadata("modified", format!("{modified:?}"));
            }
            Ok(result)
        }
        AccessPurpose::Preview => {
            let n = intent.option_u64("lines").unwrap_or(20) as usize;
            let file = tokio::fs::File::open(&valid)
                .await
                .map_err(|e| classify_io_error(e, &valid))?;
            use tokio::io::{AsyncBufReadExt, BufReader};
            let mut lines_stream = BufReader::new(file).lines();
            let mut collected = Vec::with_capacity(n);
            while collected.len() < n {
                match lines_stream.next_line().await? {
                    Some(line) => collected.push(line),
                    None => break,
                }
            }
            let mut result = IntentResult::ok();
            result.path = Some(path.to_string());
            result.preview = Some(collected.join("\n"));
            result.set_metadata("lines_shown", collected.len());
            Ok(result)
        }
        AccessPurpose::CreateOrGet => {
            if tokio::fs::metadata(&valid).await.is_ok() {
                let bytes = tokio::fs::read(&valid).await?;
                let mut result = IntentResult::ok();
                result.exists = Some(true);
                result.created = Some(false);
                result.path = Some(path.to_string());
                result.content = Some(String::from_utf8_lossy(&bytes).into_owned());
                Ok(result)
            } else {
                if let Some(parent) = valid.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                let content = intent.content.clone().unwrap_or_default();
                atomic_write(&valid, content.as_bytes()).await?;
                let mut result = IntentResult::ok();
                result.exists = Some(true);
                result.created = Some(true);
                result.path = Some(path.to_string());
                result.bytes_written = Some(content.len() as u64);
                Ok(result)
            }
        }
    }
}

// ============================================================================
// Update/* — grounded on write_file.rs, edit_block.rs
// ============================================================================

async fn update(
    purpose: UpdatePurpose,
    intent: &Intent,
    ctx: &ExecutorContext<'_>,
    root: &Path,
    is_default: bool,
) -> EngineResult<IntentResult> {
    let path = target_path(intent)?;
    let content = intent.content.clone().unwrap_or_default();
    let valid = path_guard::validate(
        path,
        root,
        ctx.config,
        GuardedOp::Write {
            content_len: Some(content.len() as u64),
        },
    )
    .await?;

    let lock = ctx.locks.get(&valid);
    let _guard = lock.lock().await;

    let create_path = intent.option_bool("create_path").unwrap_or(false);
    let rel = path_guard::normalize_relative(valid.strip_prefix(root).unwrap_or(&valid));
    let mut dirs_created: Option<String> = None;

    if !create_path
        && let Some(parent) = valid.parent()
        && tokio::fs::metadata(parent).await.is_err()
    {
        return Err(EngineError::ParentNotFound(parent.to_path_buf()));
    }

    let bytes_written = match purpose {
        UpdatePurpose::Create => {
            if tokio::fs::metadata(&valid).await.is_ok() {
                return Err(EngineError::AlreadyExists(valid.clone()));
            }
            if create_path && let Some(parent) = valid.parent() {
                tokio::fs::create_dir_all(parent).await?;
                dirs_created = parent
                    .strip_prefix(root)
                    .ok()
                    .map(|p| path_guard::normalize_relative(p))
                    .filter(|p| !p.is_empty());
            }
            atomic_write(&valid, content.as_bytes()).await?;
            content.len() as u64
        }
        UpdatePurpose::Append => {
            if create_path && let Some(parent) = valid.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            use tokio::io::AsyncWriteExt;
            let mut file = tokio::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(&valid)
                .await?;
            file.write_all(content.as_bytes()).await?;
            content.len() as u64
        }
        UpdatePurpose::Overwrite => {
            if intent.option_bool("backup").unwrap_or(false)
                && tokio::fs::metadata(&valid).await.is_ok()
            {
                let backup_path = append_suffix(&valid, ".backup");
                tokio::fs::copy(&valid, &backup_path).await?;
            }
            atomic_write(&valid, content.as_bytes()).await?;
            content.len() as u64
        }
        UpdatePurpose::Merge => {
            let mut existing = tokio::fs::read_to_string(&valid)
                .await
                .unwrap_or_default();
            if !existing.is_empty() && !existing.ends_with('\n') {
                existing.push('\n');
            }
            existing.push_str(&content);
            tokio::fs::write(&valid, &existing).await?;
            existing.len() as u64
        }
        UpdatePurpose::Patch => {
            let old_string = intent
                .option_str("old_string")
                .ok_or_else(|| EngineError::InvalidPath("patch requires old_string".to_string()))?;
            let new_string = intent.option_str("new_string").unwrap_or("");
            let existing = tokio::fs::read_to_string(&valid)
                .await
                .map_err(|e| classify_io_error(e, &valid))?;
            if !existing.contains(old_string) {
                return Err(EngineError::InvalidPath(format!(
                    "old_string not found in {}",
                    valid.display()
                )));
            }
            let patched = existing.replacen(old_string, new_string, 1);
            tokio::fs::write(&valid, &patched).await?;
            patched.len() as u64
        }
    };

    maybe_reindex(is_default, root, &rel, ctx).await;

    let mut result = IntentResult::ok();
    result.created = Some(matches!(purpose, UpdatePurpose::Create));
    result.path = Some(path.to_string());
    result.bytes_written = Some(bytes_written);
    if let Some(dirs) = dirs_created {
        result.set_metadata("dirs_created", dirs);
    }
    Ok(result)
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}

/// Write-temp-then-rename, the same durable-write idiom the teacher uses
/// in `write_file.rs`/`edit_block.rs` — spec §4.8 "Update/create: atomic
/// write".
async fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let tmp_path = append_suffix(path, ".tmp");
    tokio::fs::write(&tmp_path, content).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

// ============================================================================
// Discover/* — grounded on list_directory.rs, search module
// ============================================================================

async fn discover(
    purpose: DiscoverPurpose,
    intent: &Intent,
    ctx: &ExecutorContext<'_>,
    root: &Path,
    is_default: bool,
) -> EngineResult<IntentResult> {
    let started = Instant::now();
    match purpose {
        DiscoverPurpose::List => {
            let path = intent.target.path.as_deref().unwrap_or(".");
            let valid = path_guard::validate(path, root, ctx.config, GuardedOp::Stat).await?;
            let mut read = tokio::fs::read_dir(&valid)
                .await
                .map_err(|e| classify_io_error(e, &valid))?;
            let mut files = Vec::new();
            while let Some(entry) = read.next_entry().await? {
                let meta = entry.metadata().await?;
                let name = entry.file_name().to_string_lossy().into_owned();
                let item_count = if meta.is_dir() {
                    let mut rd = tokio::fs::read_dir(entry.path()).await.ok();
                    let mut count = 0usize;
                    if let Some(rd) = rd.as_mut() {
                        while let Ok(Some(_)) = rd.next_entry().await {
                            count += 1;
                        }
                    }
                    Some(count)
                } else {
                    None
                };
                files.push(FileDescriptor {
                    path: name,
                    entry_type: if meta.is_dir() { "directory" } else { "file" }.to_string(),
                    size: if meta.is_dir() { None } else { Some(meta.len()) },
                    item_count,
                    relevance_score: None,
                    snippet: None,
                });
            }
            files.sort_by(|a, b| a.path.cmp(&b.path));
            let mut result = IntentResult::ok();
            result.total_found = Some(files.len());
            result.files = Some(files);
            result.search_time_ms = Some(started.elapsed().as_millis() as u64);
            Ok(result)
        }
        DiscoverPurpose::Find => {
            let pattern = intent
                .target
                .pattern
                .as_deref()
                .ok_or_else(|| EngineError::InvalidPath("find requires a pattern".to_string()))?;
            let ephemeral = scan_if_not_default(is_default, root, ctx).await;
            let store = ephemeral.as_ref().unwrap_or(ctx.store);
            let hits = search::find_glob(store, pattern);
            Ok(hits_to_result(hits, started))
        }
        DiscoverPurpose::SearchContent => {
            let query = intent
                .target
                .semantic_query
                .as_deref()
                .or(intent.target.pattern.as_deref())
                .ok_or_else(|| EngineError::InvalidPath("search_content requires a query".to_string()))?;
            let ephemeral = scan_if_not_default(is_default, root, ctx).await;
            let store = ephemeral.as_ref().unwrap_or(ctx.store);
            let hits = search::search_content(store, root, query, ctx.config.read_cap_bytes).await;
            Ok(hits_to_result(hits, started))
        }
        DiscoverPurpose::SearchSemantic => {
            let query = intent
                .target
                .semantic_query
                .as_deref()
                .ok_or_else(|| EngineError::InvalidPath("search_semantic requires a query".to_string()))?;
            let threshold = intent.option_f32("threshold").unwrap_or(ctx.config.semantic_threshold);
            let max_results = intent
                .option_u64("max_results")
                .map_or(ctx.config.max_results, |v| v as usize);
            let ephemeral = scan_if_not_default(is_default, root, ctx).await;
            let store = ephemeral.as_ref().unwrap_or(ctx.store);
            let hits = search::search_semantic(store, query, threshold, max_results);
            Ok(hits_to_result(hits, started))
        }
        DiscoverPurpose::SearchIntegrated => {
            let query = intent
                .target
                .semantic_query
                .as_deref()
                .ok_or_else(|| EngineError::InvalidPath("search_integrated requires a query".to_string()))?;
            let threshold = intent.option_f32("threshold").unwrap_or(ctx.config.semantic_threshold);
            let max_results = intent
                .option_u64("max_results")
                .map_or(ctx.config.max_results, |v| v as usize);
            let ephemeral = scan_if_not_default(is_default, root, ctx).await;
            let store = ephemeral.as_ref().unwrap_or(ctx.store);
            let hits = search::search_integrated(
                store,
                root,
                query,
                threshold,
                max_results,
                ctx.config.read_cap_bytes,
            )
            .await;
            Ok(hits_to_result(hits, started))
        }
    }
}

/// Non-default roots never consult or mutate the default root's Index Store
/// (spec §4.9): instead of querying `ctx.store`, build a throwaway store by
/// scanning `root` directly, and hand that back for the scorer to use in
/// place of the default store. `None` for the default root, where `ctx.store`
/// (kept current by incremental reindexing on every mutation) is used as-is.
async fn scan_if_not_default(
    is_default: bool,
    root: &Path,
    ctx: &ExecutorContext<'_>,
) -> Option<IndexStore> {
    if is_default {
        None
    } else {
        Some(indexer::scan_ephemeral(root, ctx.config).await)
    }
}

fn hits_to_result(hits: Vec<search::SearchHit>, started: Instant) -> IntentResult {
    let total = hits.len();
    let files = hits
        .into_iter()
        .map(|h| FileDescriptor {
            path: h.path,
            entry_type: "file".to_string(),
            size: None,
            item_count: None,
            relevance_score: Some(h.score),
            snippet: h.snippet,
        })
        .collect();
    let mut result = IntentResult::ok();
    result.files = Some(files);
    result.total_found = Some(total);
    result.search_time_ms = Some(started.elapsed().as_millis() as u64);
    result
}

// ============================================================================
// Organize/* — grounded on create_directory.rs, move_file.rs
// ============================================================================

async fn organize(
    purpose: OrganizePurpose,
    intent: &Intent,
    ctx: &ExecutorContext<'_>,
    root: &Path,
    is_default: bool,
) -> EngineResult<IntentResult> {
    match purpose {
        OrganizePurpose::CreateDirectory => {
            let path = target_path(intent)?;
            let valid = path_guard::validate(path, root, ctx.config, GuardedOp::Stat).await?;
            tokio::fs::create_dir_all(&valid).await?;
            let rel = path_guard::normalize_relative(valid.strip_prefix(root).unwrap_or(&valid));
            maybe_reindex(is_default, root, &rel, ctx).await;
            let mut result = IntentResult::ok();
            result.created = Some(true);
            result.path = Some(path.to_string());
            Ok(result)
        }
        OrganizePurpose::Move | OrganizePurpose::Copy => {
            let source = intent
                .source
                .as_deref()
                .ok_or_else(|| EngineError::InvalidPath("organize requires a source".to_string()))?;
            let destination = intent
                .destination
                .as_deref()
                .ok_or_else(|| EngineError::InvalidPath("organize requires a destination".to_string()))?;
            let valid_source = path_guard::validate(source, root, ctx.config, GuardedOp::Read).await?;
            let valid_dest = path_guard::validate(
                destination,
                root,
                ctx.config,
                GuardedOp::Write { content_len: None },
            )
            .await?;

            if let Some(parent) = valid_dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            if purpose == OrganizePurpose::Move {
                if tokio::fs::rename(&valid_source, &valid_dest).await.is_err() {
                    // cross-device: copy-then-delete with rollback on partial failure
                    tokio::fs::copy(&valid_source, &valid_dest).await?;
                    if let Err(e) = tokio::fs::remove_file(&valid_source).await {
                        let _ = tokio::fs::remove_file(&valid_dest).await;
                        return Err(EngineError::Io(e));
                    }
                }
                let rel_source =
                    path_guard::normalize_relative(valid_source.strip_prefix(root).unwrap_or(&valid_source));
                maybe_reindex(is_default, root, &rel_source, ctx).await;
            } else {
                tokio::fs::copy(&valid_source, &valid_dest).await?;
            }

            let rel_dest =
                path_guard::normalize_relative(valid_dest.strip_prefix(root).unwrap_or(&valid_dest));
            maybe_reindex(is_default, root, &rel_dest, ctx).await;

            let mut result = IntentResult::ok();
            result.path = Some(destination.to_string());
            result.set_metadata("source", source);
            result.set_metadata("destination", destination);
            Ok(result)
        }
    }
}

// ============================================================================
// Remove/* — grounded on delete_file.rs, delete_directory.rs
// ============================================================================

async fn remove(
    purpose: RemovePurpose,
    intent: &Intent,
    ctx: &ExecutorContext<'_>,
    root: &Path,
    is_default: bool,
) -> EngineResult<IntentResult> {
    let path = target_path(intent)?;
    let valid = path_guard::validate(path, root, ctx.config, GuardedOp::Stat).await?;

    let root_real = tokio::fs::canonicalize(root).await.unwrap_or_else(|_| root.to_path_buf());
    if valid == root_real {
        return Err(EngineError::InvalidPath(
            "refusing to remove the engine root".to_string(),
        ));
    }

    match purpose {
        RemovePurpose::DeleteFile => {
            let meta = tokio::fs::metadata(&valid)
                .await
                .map_err(|e| classify_io_error(e, &valid))?;
            if !meta.is_file() {
                return Err(EngineError::InvalidPath(format!(
                    "{} is not a file",
                    valid.display()
                )));
            }
            tokio::fs::remove_file(&valid).await?;
        }
        RemovePurpose::DeleteDirectory => {
            let meta = tokio::fs::metadata(&valid)
                .await
                .map_err(|e| classify_io_error(e, &valid))?;
            if !meta.is_dir() {
                return Err(EngineError::InvalidPath(format!(
                    "{} is not a directory",
                    valid.display()
                )));
            }
            let mut entries = tokio::fs::read_dir(&valid).await?;
            let non_empty = entries.next_entry().await?.is_some();
            let recursive = intent.option_bool("recursive").unwrap_or(false);
            if non_empty && !recursive {
                return Err(EngineError::InvalidPath(
                    "directory is not empty; pass options.recursive=true".to_string(),
                ));
            }
            if recursive {
                tokio::fs::remove_dir_all(&valid).await?;
            } else {
                tokio::fs::remove_dir(&valid).await?;
            }
        }
    }

    let rel = path_guard::normalize_relative(valid.strip_prefix(root).unwrap_or(&valid));
    if is_default {
        ctx.store.remove(&rel);
        if let Err(e) = ctx.store.persist().await {
            log::warn!("failed to persist index after removal: {e}");
        }
    }

    let mut result = IntentResult::ok();
    result.path = Some(path.to_string());
    Ok(result)
}
