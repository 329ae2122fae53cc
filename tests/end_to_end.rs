//! End-to-end scenarios against the public [`Engine`] API.

use packfs_engine::config::EngineConfig;
use packfs_engine::engine::Engine;
use packfs_engine::intent::{
    AccessPurpose, DiscoverPurpose, Intent, OrganizePurpose, Purpose, RemovePurpose, Target,
    UpdatePurpose,
};
use std::collections::HashMap;

async fn engine_over(dir: &std::path::Path) -> Engine {
    // Surface the engine's `log` output when these tests run with
    // `RUST_LOG` set; harmless and idempotent across the many tests in
    // this file that call `engine_over`.
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = Engine::new(EngineConfig::new(dir.to_path_buf())).await;
    engine.initialize().await.unwrap();
    engine
}

#[tokio::test]
async fn read_with_typo_yields_similar_file_suggestion() {
    let tmp = tempfile::tempdir().unwrap();
    tokio::fs::create_dir(tmp.path().join("docs")).await.unwrap();
    tokio::fs::write(tmp.path().join("docs/readme.md"), b"project overview")
        .await
        .unwrap();
    let engine = engine_over(tmp.path()).await;

    let intent = Intent::new(
        Purpose::Access(AccessPurpose::Read),
        Target::path("docs/readme.mdd"),
    );
    let result = engine.execute(&intent).await;

    assert!(!result.success);
    assert_eq!(result.code, Some(packfs_engine::ErrorCode::FileNotFound));
    let suggestions = result.suggestions.expect("expected suggestions");
    assert!(suggestions
        .iter()
        .any(|s| s.kind == packfs_engine::intent::SuggestionKind::SimilarFiles));
}

#[tokio::test]
async fn create_new_file_round_trips_through_read() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine_over(tmp.path()).await;

    let create = Intent::new(
        Purpose::Update(UpdatePurpose::Create),
        Target::path("reports/q1.txt"),
    )
    .with_content("revenue up 12%");
    let mut options = HashMap::new();
    options.insert("create_path".to_string(), serde_json::json!(true));
    let create = create.with_options(options);

    let create_result = engine.execute(&create).await;
    assert!(create_result.success, "{:?}", create_result.error);
    assert_eq!(create_result.created, Some(true));

    let read = Intent::new(
        Purpose::Access(AccessPurpose::Read),
        Target::path("reports/q1.txt"),
    );
    let read_result = engine.execute(&read).await;
    assert!(read_result.success);
    assert_eq!(read_result.content.as_deref(), Some("revenue up 12%"));
}

#[tokio::test]
async fn semantic_search_ranks_best_match_first() {
    let tmp = tempfile::tempdir().unwrap();
    tokio::fs::write(
        tmp.path().join("auth_service.rs"),
        b"fn authenticate_user() { /* jwt token validation */ }",
    )
    .await
    .unwrap();
    tokio::fs::write(
        tmp.path().join("billing_service.rs"),
        b"fn charge_credit_card() { /* stripe integration */ }",
    )
    .await
    .unwrap();
    let engine = engine_over(tmp.path()).await;

    let intent = Intent::new(
        Purpose::Discover(DiscoverPurpose::SearchSemantic),
        Target::semantic("user authentication jwt token"),
    );
    let result = engine.execute(&intent).await;

    assert!(result.success);
    let files = result.files.expect("expected files");
    assert!(!files.is_empty());
    assert_eq!(files[0].path, "auth_service.rs");
}

#[tokio::test]
async fn blocked_path_segment_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    tokio::fs::create_dir_all(tmp.path().join("node_modules/pkg"))
        .await
        .unwrap();
    tokio::fs::write(tmp.path().join("node_modules/pkg/index.js"), b"module.exports = {}")
        .await
        .unwrap();
    let engine = engine_over(tmp.path()).await;

    let intent = Intent::new(
        Purpose::Access(AccessPurpose::Read),
        Target::path("node_modules/pkg/index.js"),
    );
    let result = engine.execute(&intent).await;

    assert!(!result.success);
    assert_eq!(result.code, Some(packfs_engine::ErrorCode::BlockedPath));
}

#[tokio::test]
async fn dynamic_working_directory_is_isolated_from_default_root() {
    let default_root = tempfile::tempdir().unwrap();
    let other_root = tempfile::tempdir().unwrap();
    tokio::fs::write(other_root.path().join("secret.txt"), b"only in other root")
        .await
        .unwrap();
    let engine = engine_over(default_root.path()).await;

    let mut options = HashMap::new();
    options.insert(
        "working_directory".to_string(),
        serde_json::json!(other_root.path().to_string_lossy()),
    );
    let intent = Intent::new(
        Purpose::Access(AccessPurpose::Read),
        Target::path("secret.txt"),
    )
    .with_options(options);

    let result = engine.execute(&intent).await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.content.as_deref(), Some("only in other root"));

    // default root's index was never touched by the other-root read.
    assert!(engine.execute(
        &Intent::new(
            Purpose::Access(AccessPurpose::VerifyExists),
            Target::path("secret.txt"),
        )
    )
    .await
    .exists
    .is_some());
}

#[tokio::test]
async fn search_under_working_directory_override_scans_the_override_root_not_the_default() {
    let default_root = tempfile::tempdir().unwrap();
    let other_root = tempfile::tempdir().unwrap();
    // Only the default root is indexed by `engine_over`'s `initialize()`.
    // A file that exists solely under `other_root`, with content matching
    // a query, must still be found when overridden there: the default
    // root's Index Store has no entry for it at all.
    tokio::fs::write(
        other_root.path().join("auth_service.rs"),
        b"fn authenticate() { /* jwt session token */ }",
    )
    .await
    .unwrap();
    tokio::fs::write(
        default_root.path().join("billing.rs"),
        b"fn charge_card() {}",
    )
    .await
    .unwrap();
    let engine = engine_over(default_root.path()).await;

    let mut options = HashMap::new();
    options.insert(
        "working_directory".to_string(),
        serde_json::json!(other_root.path().to_string_lossy()),
    );
    let intent = Intent::new(
        Purpose::Discover(DiscoverPurpose::SearchSemantic),
        Target::semantic("authentication session token"),
    )
    .with_options(options);

    let result = engine.execute(&intent).await;
    assert!(result.success, "{:?}", result.error);
    let hits = result.files.unwrap_or_default();
    assert_eq!(
        hits.iter().map(|f| f.path.as_str()).collect::<Vec<_>>(),
        vec!["auth_service.rs"]
    );
}

#[tokio::test]
async fn natural_language_interpretation_drives_a_real_search() {
    let tmp = tempfile::tempdir().unwrap();
    tokio::fs::write(
        tmp.path().join("config.yaml"),
        b"database configuration settings",
    )
    .await
    .unwrap();
    let engine = engine_over(tmp.path()).await;

    let interpretation = packfs_engine::nl::interpret("find all configuration files");
    assert!(interpretation.success);
    assert!(interpretation.confidence >= 0.7);

    let intent = interpretation.intent.expect("expected a structured intent");
    let result = engine.execute(&intent).await;
    assert!(result.success);
    let files = result.files.unwrap_or_default();
    assert!(files.iter().any(|f| f.path == "config.yaml"));
}

#[tokio::test]
async fn move_then_delete_directory_composition() {
    let tmp = tempfile::tempdir().unwrap();
    tokio::fs::create_dir(tmp.path().join("inbox")).await.unwrap();
    tokio::fs::write(tmp.path().join("inbox/draft.txt"), b"draft content")
        .await
        .unwrap();
    let engine = engine_over(tmp.path()).await;

    let organize = Intent::new(Purpose::Organize(OrganizePurpose::CreateDirectory), Target::path("archive"));
    assert!(engine.execute(&organize).await.success);

    let mv = Intent::new(Purpose::Organize(OrganizePurpose::Move), Target::default())
        .with_source_destination("inbox/draft.txt", "archive/draft.txt");
    let mv_result = engine.execute(&mv).await;
    assert!(mv_result.success, "{:?}", mv_result.error);

    let verify_gone = Intent::new(Purpose::Access(AccessPurpose::VerifyExists), Target::path("inbox/draft.txt"));
    assert_eq!(engine.execute(&verify_gone).await.exists, Some(false));

    let mut options = HashMap::new();
    options.insert("recursive".to_string(), serde_json::json!(true));
    let remove = Intent::new(Purpose::Remove(RemovePurpose::DeleteDirectory), Target::path("archive"))
        .with_options(options);
    let remove_result = engine.execute(&remove).await;
    assert!(remove_result.success, "{:?}", remove_result.error);
}
