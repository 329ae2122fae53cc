//! Construction-time configuration (spec §6 "Configuration (enumerated)").
//!
//! Mirrors the shape of the teacher's `kodegen_config_manager::ServerConfig`
//! (consumed throughout `validation.rs`) but is owned directly by this crate
//! since that crate lives outside the pack.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_MAX_INDEX_DEPTH: u32 = 10;
pub const DEFAULT_MAX_KEYWORDS_PER_FILE: usize = 64;
pub const DEFAULT_READ_CAP_BYTES: usize = 262_144;
pub const DEFAULT_SEMANTIC_THRESHOLD: f32 = 0.3;
pub const DEFAULT_MAX_RESULTS: usize = 50;
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Sliding-window rate limit (spec §4.10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_ms: u64,
}

/// Immutable per-engine-instance security policy (spec §3 `SecurityPolicy`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Absolute canonical root. Required.
    pub root: PathBuf,
    pub allowed_extensions: Option<HashSet<String>>,
    pub blocked_path_segments: HashSet<String>,
    pub max_file_size: u64,
    pub max_index_depth: u32,
    pub max_keywords_per_file: usize,
    pub read_cap_bytes: usize,
    pub rate_limit: Option<RateLimitConfig>,
    pub semantic_threshold: f32,
    pub max_results: usize,
    /// Default index snapshot file name, relative to `root`.
    pub index_file_name: String,
}

impl EngineConfig {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            allowed_extensions: None,
            blocked_path_segments: default_blocked_segments(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_index_depth: DEFAULT_MAX_INDEX_DEPTH,
            max_keywords_per_file: DEFAULT_MAX_KEYWORDS_PER_FILE,
            read_cap_bytes: DEFAULT_READ_CAP_BYTES,
            rate_limit: None,
            semantic_threshold: DEFAULT_SEMANTIC_THRESHOLD,
            max_results: DEFAULT_MAX_RESULTS,
            index_file_name: ".packfs-index.json".to_string(),
        }
    }
}

fn default_blocked_segments() -> HashSet<String> {
    [".git", "node_modules", ".packfs-index.json"]
        .into_iter()
        .map(str::to_string)
        .collect()
}
