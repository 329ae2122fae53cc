//! Top-level `Engine` facade (spec §6 "Intent contract").
//!
//! The sole collaborator-facing entry point: wires the Path Guard, Index
//! Store, Indexer, Rate Limiter, and Intent Executor into one owned handle,
//! the same "one struct owns every subsystem" shape as the teacher's
//! top-level server state (`ServerConfig` plus the search manager it hands
//! to every tool call).

use crate::config::EngineConfig;
use crate::executor::{self, ExecutorContext, PathLocks};
use crate::index::IndexStore;
use crate::indexer::{self, CancellationToken};
use crate::intent::{Intent, IntentResult};
use crate::rate_limit::RateLimiter;
use std::path::PathBuf;

/// Owns every subsystem needed to execute intents against one default root.
///
/// Cloning is intentionally not derived: collaborators share one `Engine`
/// behind an `Arc` rather than constructing independent copies of the Index
/// Store and rate limiter, since both hold state that must stay singular
/// per root.
pub struct Engine {
    config: EngineConfig,
    store: IndexStore,
    rate_limiter: RateLimiter,
    locks: PathLocks,
}

impl Engine {
    /// Construct an engine for `config.root` without indexing. Call
    /// [`Engine::initialize`] before serving intents that depend on the
    /// Index Store (discover/search purposes), or accept that they'll see
    /// an empty index until the first mutation populates it incrementally.
    pub async fn new(config: EngineConfig) -> Self {
        let store = IndexStore::load(&config.root, &config.index_file_name).await;
        let rate_limiter = RateLimiter::new(config.rate_limit.clone());
        Self {
            config,
            store,
            rate_limiter,
            locks: PathLocks::default(),
        }
    }

    /// Run a full index walk over the default root, per spec §5
    /// "Startup/shutdown contract": eager full index before serving
    /// discover/search intents.
    pub async fn initialize(&self) -> std::io::Result<indexer::IndexStatistics> {
        let cancel = CancellationToken::new();
        indexer::index(&self.config.root, &self.store, &self.config, &cancel).await
    }

    /// Flush the Index Store snapshot to disk. Safe to call multiple times;
    /// idempotent if nothing changed since the last persist.
    pub async fn shutdown(&self) -> std::io::Result<()> {
        self.store.persist().await
    }

    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.config.root
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute one [`Intent`] end to end (spec §4.8's state machine),
    /// producing a flat [`IntentResult`] that never panics and never
    /// propagates a Rust error.
    pub async fn execute(&self, intent: &Intent) -> IntentResult {
        let ctx = ExecutorContext {
            config: &self.config,
            default_root: &self.config.root,
            store: &self.store,
            rate_limiter: &self.rate_limiter,
            locks: &self.locks,
        };
        executor::execute(intent, &ctx).await
    }

    /// Convenience constructor: `root` becomes both the filesystem root and
    /// the default working directory.
    pub async fn for_root(root: impl Into<PathBuf>) -> Self {
        Self::new(EngineConfig::new(root.into())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{AccessPurpose, Purpose, Target, UpdatePurpose};

    #[tokio::test]
    async fn create_then_read_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = Engine::for_root(tmp.path()).await;
        engine.initialize().await.unwrap();

        let create = Intent::new(Purpose::Update(UpdatePurpose::Create), Target::path("note.txt"))
            .with_content("hello world");
        let create_result = engine.execute(&create).await;
        assert!(create_result.success, "{:?}", create_result.error);

        let read = Intent::new(Purpose::Access(AccessPurpose::Read), Target::path("note.txt"));
        let read_result = engine.execute(&read).await;
        assert!(read_result.success);
        assert_eq!(read_result.content.as_deref(), Some("hello world"));
    }

    #[tokio::test]
    async fn read_missing_file_yields_failure_with_code() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = Engine::for_root(tmp.path()).await;
        engine.initialize().await.unwrap();

        let read = Intent::new(Purpose::Access(AccessPurpose::Read), Target::path("missing.txt"));
        let result = engine.execute(&read).await;
        assert!(!result.success);
        assert_eq!(result.code, Some(crate::error::ErrorCode::FileNotFound));
    }

    /// Demonstrates the `search_semantic` + `move` composition spec.md §9
    /// leaves as an unspecified `organize/group_semantic` extension: group
    /// files matching a semantic query into a directory, one `Organize::Move`
    /// per search hit, with no dedicated grouping purpose required.
    #[tokio::test]
    async fn semantic_search_then_move_groups_matching_files() {
        use crate::intent::{DiscoverPurpose, OrganizePurpose};

        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::write(
            tmp.path().join("auth_service.rs"),
            b"fn authenticate() { /* jwt session token */ }",
        )
        .await
        .unwrap();
        tokio::fs::write(tmp.path().join("billing.rs"), b"fn charge_card() {}")
            .await
            .unwrap();
        let engine = Engine::for_root(tmp.path()).await;
        engine.initialize().await.unwrap();

        let mkdir = Intent::new(
            Purpose::Organize(OrganizePurpose::CreateDirectory),
            Target::path("auth_related"),
        );
        assert!(engine.execute(&mkdir).await.success);

        let search = Intent::new(
            Purpose::Discover(DiscoverPurpose::SearchSemantic),
            Target::semantic("authentication session token"),
        );
        let hits = engine.execute(&search).await.files.unwrap_or_default();
        assert_eq!(hits.iter().map(|f| f.path.as_str()).collect::<Vec<_>>(), vec!["auth_service.rs"]);

        for hit in &hits {
            let destination = format!("auth_related/{}", hit.path);
            let mv = Intent::new(Purpose::Organize(OrganizePurpose::Move), Target::default())
                .with_source_destination(hit.path.clone(), destination);
            assert!(engine.execute(&mv).await.success);
        }

        let verify = Intent::new(
            Purpose::Access(AccessPurpose::VerifyExists),
            Target::path("auth_related/auth_service.rs"),
        );
        assert_eq!(engine.execute(&verify).await.exists, Some(true));
    }
}
