//! Semantic filesystem engine: intent-based file access for automated
//! agents.
//!
//! Collaborators submit an [`Intent`](intent::Intent) describing *what*
//! they want done — not *how* to do it — and receive a flat
//! [`IntentResult`](intent::IntentResult) back from [`Engine::execute`].
//! The engine owns a persistent keyword index, a natural-language
//! interpreter for free-text requests, and an error-recovery layer that
//! attaches actionable suggestions to failures instead of bare error codes.
//!
//! This crate never installs a global logger; embed it and call
//! `env_logger::init()` (or your own `log::Log` implementation) from the
//! binary that owns `main`.

pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod index;
pub mod indexer;
pub mod intent;
pub mod keywords;
pub mod nl;
pub mod path_guard;
pub mod rate_limit;
pub mod recovery;
pub mod search;
pub mod workdir;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, EngineResult, ErrorCode};
pub use intent::{Intent, IntentResult, Purpose, Target};
