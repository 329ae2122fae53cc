//! On-disk index snapshot format (spec §6 "On-disk formats").
//!
//! A self-describing JSON document the reader must tolerate unknown fields
//! in, and treat missing mandatory fields as "rebuild from scratch" — spec
//! §6 and §9's Open Question on persistence location. This crate's default
//! file name is `.packfs-index.json`, configurable via
//! [`crate::config::EngineConfig::index_file_name`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// One indexed file or directory (spec §3 `FileEntry`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub size_bytes: u64,
    pub mtime_ms: i64,
    pub content_hash: u64,
    pub keywords: Vec<String>,
    pub extension: String,
    pub is_directory: bool,
}

/// Immutable, versioned view of the index at a point in time (spec §3
/// `IndexSnapshot`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub root: PathBuf,
    pub version: u64,
    pub entries: HashMap<String, FileEntry>,
    pub keyword_index: HashMap<String, std::collections::HashSet<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IndexSnapshot {
    #[must_use]
    pub fn empty(root: PathBuf) -> Self {
        let now = Utc::now();
        Self {
            root,
            version: 0,
            entries: HashMap::new(),
            keyword_index: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Insert or replace an entry, reindexing its keywords and bumping
    /// `version` — spec §8 invariant 4 (monotonic version).
    pub fn put(&mut self, entry: FileEntry) {
        if let Some(old) = self.entries.get(&entry.path) {
            self.unindex_keywords(&old.path.clone(), &old.keywords.clone());
        }
        for keyword in &entry.keywords {
            self.keyword_index
                .entry(keyword.clone())
                .or_default()
                .insert(entry.path.clone());
        }
        self.entries.insert(entry.path.clone(), entry);
        self.version += 1;
        self.updated_at = Utc::now();
    }

    /// Remove an entry by path if present, bumping `version`.
    pub fn remove(&mut self, path: &str) {
        if let Some(old) = self.entries.remove(path) {
            self.unindex_keywords(path, &old.keywords);
            self.version += 1;
            self.updated_at = Utc::now();
        }
    }

    fn unindex_keywords(&mut self, path: &str, keywords: &[String]) {
        for keyword in keywords {
            if let Some(set) = self.keyword_index.get_mut(keyword) {
                set.remove(path);
                if set.is_empty() {
                    self.keyword_index.remove(keyword);
                }
            }
        }
    }
}

/// On-disk document shape. Deliberately permissive on read (`#[serde(default)]`
/// on every optional field) so unknown/missing fields degrade to an empty
/// snapshot instead of a hard parse error, per spec §6.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDocument {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    root: PathBuf,
    #[serde(default)]
    entries: Vec<FileEntry>,
    #[serde(default)]
    keyword_index: Vec<KeywordEntry>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    snapshot_version: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct KeywordEntry {
    token: String,
    paths: Vec<String>,
}

pub fn encode(snapshot: &IndexSnapshot) -> Vec<u8> {
    let doc = SnapshotDocument {
        version: SNAPSHOT_SCHEMA_VERSION,
        root: snapshot.root.clone(),
        entries: snapshot.entries.values().cloned().collect(),
        keyword_index: snapshot
            .keyword_index
            .iter()
            .map(|(token, paths)| KeywordEntry {
                token: token.clone(),
                paths: paths.iter().cloned().collect(),
            })
            .collect(),
        created_at: Some(snapshot.created_at),
        updated_at: Some(snapshot.updated_at),
        snapshot_version: snapshot.version,
    };
    serde_json::to_vec_pretty(&doc).unwrap_or_default()
}

pub fn decode(bytes: &[u8], root_fallback: &std::path::Path) -> anyhow::Result<IndexSnapshot> {
    let doc: SnapshotDocument = serde_json::from_slice(bytes)?;
    if doc.version != SNAPSHOT_SCHEMA_VERSION {
        anyhow::bail!("unsupported snapshot schema version {}", doc.version);
    }
    let mut snapshot = IndexSnapshot::empty(if doc.root.as_os_str().is_empty() {
        root_fallback.to_path_buf()
    } else {
        doc.root
    });
    snapshot.created_at = doc.created_at.unwrap_or(snapshot.created_at);
    snapshot.updated_at = doc.updated_at.unwrap_or(snapshot.updated_at);
    for entry in doc.entries {
        snapshot.entries.insert(entry.path.clone(), entry);
    }
    for kw in doc.keyword_index {
        snapshot
            .keyword_index
            .insert(kw.token, kw.paths.into_iter().collect());
    }
    snapshot.version = doc.snapshot_version;
    Ok(snapshot)
}
