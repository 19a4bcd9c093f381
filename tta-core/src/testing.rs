//! Testing utilities for the narrative engine.
//!
//! This module provides tools for integration testing:
//! - `ScriptedEngine` for deterministic testing without API calls
//! - `TestHarness` for scripted play scenarios
//! - Assertion helpers for verifying commit history and world state

use crate::commit_log::Commit;
use crate::engine::{EngineRequest, EngineResponse, NarrativeEngine};
use crate::session::{GameSession, Response, SessionConfig, SessionError};
use crate::world::{LogEntry, World};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Narrative returned once the script runs dry.
pub const EXHAUSTED_NARRATIVE: &str = "The engine has no more scripted responses.";

#[derive(Debug, Default)]
struct Script {
    responses: VecDeque<EngineResponse>,
    requests: Vec<EngineRequest>,
}

/// An engine that returns scripted responses in order.
///
/// Clones share the same script, so a test can keep a handle after the
/// session takes ownership of the boxed engine.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    script: Arc<Mutex<Script>>,
}

impl ScriptedEngine {
    /// Create an engine with scripted responses.
    pub fn new(responses: Vec<EngineResponse>) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                responses: responses.into(),
                requests: Vec::new(),
            })),
        }
    }

    /// Add a response to the queue.
    pub fn queue_response(&self, response: EngineResponse) {
        self.lock().responses.push_back(response);
    }

    /// Every request seen so far, oldest first.
    pub fn requests(&self) -> Vec<EngineRequest> {
        self.lock().requests.clone()
    }

    /// Number of scripted responses not yet returned.
    pub fn remaining(&self) -> usize {
        self.lock().responses.len()
    }

    /// Record the request and pop the next response.
    pub fn next_response(&self, request: &EngineRequest) -> EngineResponse {
        let mut script = self.lock();
        script.requests.push(request.clone());
        script
            .responses
            .pop_front()
            .unwrap_or_else(|| EngineResponse::new(EXHAUSTED_NARRATIVE, ""))
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl NarrativeEngine for ScriptedEngine {
    async fn run(&mut self, request: &EngineRequest) -> EngineResponse {
        self.next_response(request)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Test harness for running play scenarios on the genesis world.
pub struct TestHarness {
    /// The session under test.
    pub session: GameSession,
    /// Handle on the session's engine script.
    pub engine: ScriptedEngine,
}

impl TestHarness {
    /// Create a harness on the genesis world with an empty script.
    pub fn new() -> Self {
        let engine = ScriptedEngine::default();
        let session = GameSession::with_engine(
            SessionConfig::new().with_seed(0),
            Box::new(engine.clone()),
        );
        Self { session, engine }
    }

    /// Queue a narrative-only response.
    pub fn expect_narrative(&mut self, text: impl Into<String>) -> &mut Self {
        self.engine.queue_response(EngineResponse::new(text, ""));
        self
    }

    /// Queue a full response.
    pub fn expect_response(&mut self, response: EngineResponse) -> &mut Self {
        self.engine.queue_response(response);
        self
    }

    /// Send a command through the full begin/resolve/finish cycle.
    pub fn input(&mut self, text: &str) -> Result<Response, SessionError> {
        let pending = self.session.begin_command(text)?;
        let response = self.engine.next_response(pending.request());
        Ok(self.session.finish_command(pending, response))
    }

    /// Current player HP as (current, max).
    pub fn player_hp(&self) -> (i32, i32) {
        let state = self.session.state();
        (state.hp, state.max_hp)
    }

    pub fn world(&self) -> &World {
        self.session.world()
    }

    pub fn commit_count(&self) -> usize {
        self.session.commits().len()
    }

    pub fn active_commit(&self) -> Option<&Commit> {
        self.session.commits().active()
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.session.graph().contains(id)
    }

    /// Get the last transcript entry.
    pub fn last_log(&self) -> Option<&LogEntry> {
        self.session.transcript().last()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert that exactly one commit is active and it is the one expected.
#[track_caller]
pub fn assert_active(harness: &TestHarness, hash: &str) {
    let commits = harness.session.commits();
    assert_eq!(
        commits.active_count(),
        1,
        "Expected exactly one active commit, found {}",
        commits.active_count()
    );
    let active = commits.active().map(|c| c.hash.as_str());
    assert_eq!(active, Some(hash), "Expected commit {hash} to be active");
}

/// Assert the commit log has the expected length.
#[track_caller]
pub fn assert_commit_count(harness: &TestHarness, expected: usize) {
    let actual = harness.commit_count();
    assert_eq!(actual, expected, "Expected {expected} commits, got {actual}");
}

/// Assert player HP is at expected values.
#[track_caller]
pub fn assert_hp(harness: &TestHarness, current: i32, max: i32) {
    let (actual_current, actual_max) = harness.player_hp();
    assert_eq!(
        (actual_current, actual_max),
        (current, max),
        "Expected HP {current}/{max}, got {actual_current}/{actual_max}"
    );
}

/// Assert the graph contains a node.
#[track_caller]
pub fn assert_has_node(harness: &TestHarness, id: &str) {
    assert!(harness.has_node(id), "Expected node '{id}' to exist");
}

/// Assert the graph does NOT contain a node.
#[track_caller]
pub fn assert_no_node(harness: &TestHarness, id: &str) {
    assert!(!harness.has_node(id), "Expected node '{id}' to NOT exist");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NodeDelta;
    use crate::world::{EntityLink, LogType, NodeType, StateUpdate};

    #[test]
    fn test_scripted_narrative() {
        let mut harness = TestHarness::new();
        harness.expect_narrative("Leaves rustle overhead.");

        let response = harness.input("listen").unwrap();

        assert_eq!(response.narrative, "Leaves rustle overhead.");
        assert_eq!(response.commit_message, "Action: listen");
        assert_eq!(harness.last_log().unwrap().kind, LogType::Neural);
        assert_commit_count(&harness, 3);
        assert_active(&harness, response.commit.as_str());
    }

    #[test]
    fn test_scripted_damage_and_discovery() {
        let mut harness = TestHarness::new();
        harness.expect_response(
            EngineResponse::new("An arrow grazes you.", "> python3 src/skills/combat.py")
                .with_state_updates(StateUpdate::hp(14))
                .with_node(NodeDelta::new("archer", "Goblin Archer", NodeType::Character))
                .with_link(EntityLink::new("archer", "player", "HATES"))
                .with_commit_message("Event: Ambush"),
        );

        let response = harness.input("walk deeper").unwrap();

        assert_hp(&harness, 14, 20);
        assert_has_node(&harness, "archer");
        assert_eq!(response.commit_message, "Event: Ambush");
        assert_eq!(harness.active_commit().unwrap().message, "Event: Ambush");
    }

    #[test]
    fn test_engine_records_requests() {
        let mut harness = TestHarness::new();
        harness.expect_narrative("One.").expect_narrative("Two.");

        harness.input("first").unwrap();
        harness.input("second").unwrap();

        let requests = harness.engine.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].command, "second");
        // The second request sees the first turn's narrative
        assert!(requests[1]
            .transcript_history
            .iter()
            .any(|e| e.content == "One."));
        assert_eq!(harness.engine.remaining(), 0);
    }

    #[test]
    fn test_exhausted_script() {
        let mut harness = TestHarness::new();
        let response = harness.input("anything").unwrap();
        assert_eq!(response.narrative, EXHAUSTED_NARRATIVE);
    }

    #[test]
    fn test_delete_assertions() {
        let mut harness = TestHarness::new();
        harness.session.delete_node("item1").unwrap();
        assert_no_node(&harness, "item1");
        assert_commit_count(&harness, 3);
    }
}
