//! Versioned narrative world engine with an AI game master.
//!
//! This crate provides:
//! - Live world containers (game state, entity graph, transcript)
//! - Immutable world snapshots and an append-only commit log with
//!   fork (branch tags) and restore (time travel)
//! - A narrative engine gateway backed by Claude, with an offline fallback
//! - `GameSession`, which ties them together
//!
//! # Quick Start
//!
//! ```ignore
//! use tta_core::{GameSession, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = GameSession::new(SessionConfig::new().offline());
//!
//!     let response = session.submit("attack the goblin").await?;
//!     println!("{}", response.narrative);
//!
//!     let first = session.commits().iter().next().map(|c| c.hash.to_string());
//!     if let Some(hash) = first {
//!         session.restore(&hash)?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod commit_log;
pub mod engine;
pub mod genesis;
pub mod session;
pub mod snapshot;
pub mod testing;
pub mod world;

// Primary public API
pub use commit_log::{Commit, CommitHash, CommitLog, RestoreOutcome};
pub use engine::{
    select_engine, ClaudeEngine, EngineConfig, EngineRequest, EngineResponse, NarrativeEngine,
    NodeDelta, NodeRef, OfflineEngine,
};
pub use session::{GameSession, PendingCommand, Response, SessionConfig, SessionError};
pub use snapshot::WorldSnapshot;
pub use testing::{ScriptedEngine, TestHarness};
pub use world::{EntityFilter, EntityLink, EntityNode, GameState, LogEntry, LogType, NodeType, World};
