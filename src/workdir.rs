//! C9 — Working-Directory Multiplexer (spec §4.9).
//!
//! Generalizes the teacher's `client_pwd: Option<&Path>` parameter
//! (threaded through `validate_path` in `validation.rs`) into a first-class
//! effective-root resolution step the executor consults before every
//! dispatch.

use crate::intent::Intent;
use std::path::{Path, PathBuf};

/// `effective_root = intent.working_directory ?? engine.default_root`.
#[must_use]
pub fn effective_root(intent: &Intent, default_root: &Path) -> PathBuf {
    intent
        .working_directory()
        .unwrap_or_else(|| default_root.to_path_buf())
}

/// Whether `root` is the engine's default root — governs whether the Index
/// Store is consulted/mutated (spec §4.9).
#[must_use]
pub fn is_default_root(root: &Path, default_root: &Path) -> bool {
    root == default_root
}
