//! C1 — Path Guard (spec §4.1).
//!
//! Generalizes the teacher's `validation.rs` (`validate_path`,
//! `is_path_allowed`, `expand_home`, `normalize_path`) from an
//! allow/deny-list directory check into full root containment plus blocked
//! segment, extension, and size policy enforcement.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use std::path::{Path, PathBuf};

/// What the caller intends to do with the validated path; governs which
/// policy checks apply (extension/size checks only matter for read/write).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedOp {
    Read,
    Write { content_len: Option<u64> },
    Stat,
}

/// Expand a leading `~` to the user's home directory, same idiom as the
/// teacher's `expand_home`.
fn expand_home(path: &str) -> String {
    if (path.starts_with("~/") || path == "~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(&path[1..]).to_string_lossy().into_owned();
    }
    path.to_string()
}

/// Normalize a path string to forward slashes with no leading slash and no
/// `..` components, per spec §3's `FileEntry.path` invariant.
#[must_use]
pub fn normalize_relative(path: &Path) -> String {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            std::path::Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            std::path::Component::ParentDir => {
                parts.pop();
            }
            _ => {}
        }
    }
    parts.join("/")
}

fn segment_blocked(path: &Path, blocked: &std::collections::HashSet<String>) -> Option<PathBuf> {
    for component in path.components() {
        if let std::path::Component::Normal(part) = component {
            let name = part.to_string_lossy();
            if blocked.iter().any(|b| b.eq_ignore_ascii_case(&name)) {
                return Some(PathBuf::from(name.as_ref()));
            }
        }
    }
    None
}

/// Validate `input_path` against `config` and return the canonicalized
/// absolute path, joined against `effective_root`.
///
/// # Errors
/// Returns [`EngineError::InvalidPath`], [`EngineError::PathOutsideRoot`],
/// [`EngineError::BlockedPath`], [`EngineError::DisallowedExtension`], or
/// [`EngineError::FileTooLarge`] per spec §4.1's algorithm.
pub async fn validate(
    input_path: &str,
    effective_root: &Path,
    config: &EngineConfig,
    op: GuardedOp,
) -> EngineResult<PathBuf> {
    if input_path.is_empty() || input_path.contains('\0') {
        return Err(EngineError::InvalidPath(input_path.to_string()));
    }
    #[cfg(not(windows))]
    if input_path.len() >= 2 && input_path.as_bytes()[1] == b':' {
        return Err(EngineError::InvalidPath(format!(
            "drive-letter path on a POSIX root: {input_path}"
        )));
    }

    let expanded = expand_home(input_path);
    let candidate = Path::new(&expanded);
    let absolute = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        effective_root.join(candidate)
    };

    let normalized = normalize_relative_to_root(&absolute, effective_root)?;

    // Realpath-resolve what we can; tolerate non-existent targets (for
    // create-type writes) by resolving the deepest existing ancestor and
    // reattaching the remaining suffix.
    let realpath = canonicalize_best_effort(&absolute).await;

    let root_real = tokio::fs::canonicalize(effective_root)
        .await
        .unwrap_or_else(|_| effective_root.to_path_buf());

    if !realpath.starts_with(&root_real) {
        return Err(EngineError::PathOutsideRoot(realpath));
    }

    if let Some(blocked) = segment_blocked(&normalized, &config.blocked_path_segments) {
        return Err(EngineError::BlockedPath(blocked));
    }

    if matches!(op, GuardedOp::Read | GuardedOp::Write { .. })
        && let Some(allowed) = &config.allowed_extensions
    {
        let ext = absolute
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !allowed.contains(&ext) {
            return Err(EngineError::DisallowedExtension(ext));
        }
    }

    if let GuardedOp::Write {
        content_len: Some(len),
    } = op
        && len > config.max_file_size
    {
        return Err(EngineError::FileTooLarge {
            size: len,
            limit: config.max_file_size,
        });
    }

    Ok(realpath)
}

/// Resolve symlinks on `path`, falling back to the deepest existing
/// ancestor joined with the non-existent suffix — the teacher's
/// `validate_path` does the analogous "fall back to absolute path" dance
/// for paths that don't exist yet (create-type operations).
async fn canonicalize_best_effort(path: &Path) -> PathBuf {
    if let Ok(real) = tokio::fs::canonicalize(path).await {
        return real;
    }
    let mut missing = Vec::new();
    let mut current = path.to_path_buf();
    loop {
        if let Ok(real) = tokio::fs::canonicalize(&current).await {
            let mut result = real;
            for part in missing.into_iter().rev() {
                result.push(part);
            }
            return result;
        }
        match current.file_name().map(PathBuf::from) {
            Some(name) => {
                missing.push(name);
                if !current.pop() {
                    break;
                }
            }
            None => break,
        }
    }
    path.to_path_buf()
}

fn normalize_relative_to_root(absolute: &Path, root: &Path) -> EngineResult<PathBuf> {
    match absolute.strip_prefix(root) {
        Ok(rel) => Ok(root.join(normalize_relative(rel))),
        Err(_) => Err(EngineError::PathOutsideRoot(absolute.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_traversal_outside_root() {
        let tmp = tempfile::tempdir().unwrap();
        let config = EngineConfig::new(tmp.path().to_path_buf());
        let err = validate("../../etc/passwd", tmp.path(), &config, GuardedOp::Read)
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::PathOutsideRoot);
    }

    #[tokio::test]
    async fn rejects_blocked_segment() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(tmp.path().join("node_modules"))
            .await
            .unwrap();
        let config = EngineConfig::new(tmp.path().to_path_buf());
        let err = validate(
            "node_modules/x/y.js",
            tmp.path(),
            &config,
            GuardedOp::Read,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::BlockedPath);
    }

    #[tokio::test]
    async fn allows_new_file_under_root() {
        let tmp = tempfile::tempdir().unwrap();
        let config = EngineConfig::new(tmp.path().to_path_buf());
        let result = validate(
            "notes/todo.md",
            tmp.path(),
            &config,
            GuardedOp::Write {
                content_len: Some(6),
            },
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn rejects_oversized_write() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = EngineConfig::new(tmp.path().to_path_buf());
        config.max_file_size = 4;
        let err = validate(
            "big.txt",
            tmp.path(),
            &config,
            GuardedOp::Write {
                content_len: Some(100),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::FileTooLarge);
    }
}
