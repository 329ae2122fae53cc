//! Intent/Result data model (spec §3, §6 "Intent contract").
//!
//! Tagged variants implemented as sealed enums (spec §9 "Variant kinds
//! instead of subclasses"); the executor's dispatch in [`crate::executor`]
//! exhaustively matches every [`Purpose`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessPurpose {
    Read,
    Preview,
    Metadata,
    VerifyExists,
    CreateOrGet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdatePurpose {
    Create,
    Append,
    Overwrite,
    Merge,
    Patch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoverPurpose {
    List,
    Find,
    SearchContent,
    SearchSemantic,
    SearchIntegrated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrganizePurpose {
    CreateDirectory,
    Move,
    Copy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovePurpose {
    DeleteFile,
    DeleteDirectory,
}

/// The five intent kinds, each parameterized by its own purpose enum —
/// spec §3 `Intent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Purpose {
    Access(AccessPurpose),
    Update(UpdatePurpose),
    Discover(DiscoverPurpose),
    Organize(OrganizePurpose),
    Remove(RemovePurpose),
}

/// A target carries at least one of `path`, `pattern`, or `semantic_query`
/// — spec §3.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Target {
    pub path: Option<String>,
    pub pattern: Option<String>,
    pub semantic_query: Option<String>,
}

impl Target {
    #[must_use]
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            pattern: None,
            semantic_query: None,
        }
    }

    #[must_use]
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self {
            path: None,
            pattern: Some(pattern.into()),
            semantic_query: None,
        }
    }

    #[must_use]
    pub fn semantic(query: impl Into<String>) -> Self {
        Self {
            path: None,
            pattern: None,
            semantic_query: Some(query.into()),
        }
    }
}

/// Per-call options/preferences (spec §6 "Per-call options"). Stored as a
/// permissive JSON-like map so new option keys don't require an intent
/// schema migration, mirroring how the teacher's tool args (e.g.
/// `FsWriteFileArgs`) are plain structs but consumed field-by-field rather
/// than matched exhaustively.
pub type Options = HashMap<String, serde_json::Value>;

/// A structured request submitted to the engine (spec §3 `Intent`,
/// §6 "Intent contract").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub purpose: Purpose,
    #[serde(default)]
    pub target: Target,
    /// `Organize::{Move,Copy}` source path; unused by other purposes.
    #[serde(default)]
    pub source: Option<String>,
    /// `Organize::{Move,Copy}` destination path; unused by other purposes.
    #[serde(default)]
    pub destination: Option<String>,
    /// `Update::*` payload content.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub options: Options,
}

impl Intent {
    #[must_use]
    pub fn new(purpose: Purpose, target: Target) -> Self {
        Self {
            purpose,
            target,
            source: None,
            destination: None,
            content: None,
            options: Options::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    #[must_use]
    pub fn with_source_destination(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self.destination = Some(destination.into());
        self
    }

    /// Per-call working-directory override, read from `options.working_directory`
    /// — spec §4.9.
    #[must_use]
    pub fn working_directory(&self) -> Option<std::path::PathBuf> {
        self.options
            .get("working_directory")
            .and_then(|v| v.as_str())
            .map(std::path::PathBuf::from)
    }

    #[must_use]
    pub fn option_bool(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(|v| v.as_bool())
    }

    #[must_use]
    pub fn option_u64(&self, key: &str) -> Option<u64> {
        self.options.get(key).and_then(|v| v.as_u64())
    }

    #[must_use]
    pub fn option_i64(&self, key: &str) -> Option<i64> {
        self.options.get(key).and_then(|v| v.as_i64())
    }

    #[must_use]
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    #[must_use]
    pub fn option_f32(&self, key: &str) -> Option<f32> {
        self.options.get(key).and_then(|v| v.as_f64()).map(|f| f as f32)
    }
}

/// One additive recovery record (spec §3 `ErrorSuggestion`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorSuggestion {
    pub kind: SuggestionKind,
    pub description: String,
    pub payload: serde_json::Value,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    DirectoryListing,
    SimilarFiles,
    ParentDirectory,
    AlternativePath,
    SearchResults,
}

/// A flat file descriptor used inside `Result.files` (spec §3, §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub size: Option<u64>,
    pub item_count: Option<usize>,
    pub relevance_score: Option<f32>,
    pub snippet: Option<String>,
}

/// The flat result record every intent produces (spec §3 `Result`).
///
/// Invariant: no field here is nested under a key named `data` — every
/// operational datum is a direct top-level field, enforced structurally by
/// this type having no `data: serde_json::Value` catch-all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_written: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_found: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<ErrorSuggestion>>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<crate::error::ErrorCode>,
}

impl IntentResult {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn failure(error: impl Into<String>, code: crate::error::ErrorCode) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            code: Some(code),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_suggestions(mut self, suggestions: Vec<ErrorSuggestion>) -> Self {
        if !suggestions.is_empty() {
            self.suggestions = Some(suggestions);
        }
        self
    }

    pub fn set_metadata(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }
}
