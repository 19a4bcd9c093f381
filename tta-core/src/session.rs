//! GameSession - the primary public API for play.
//!
//! A session owns the live world, the project files, the commit history
//! and the narrative engine. Every observable change to the world ends in
//! a commit; restoring an old commit replaces the live world wholesale.

use crate::commit_log::{Commit, CommitHash, CommitLog, RestoreOutcome};
use crate::engine::{
    select_engine, EngineConfig, EngineRequest, EngineResponse, NarrativeEngine, NodeRef,
};
use crate::genesis::{genesis_commits, genesis_files, genesis_world, DEFAULT_BRANCH};
use crate::world::{EntityNode, GameState, GraphStore, LogEntry, NodeType, ProjectFiles, Transcript, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Where engine-proposed nodes without a position are placed.
const SPAWN_CENTER: (f64, f64) = (200.0, 150.0);
const SPAWN_JITTER: f64 = 50.0;
const MANUAL_JITTER: f64 = 20.0;

/// Errors from GameSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("A command is already being processed")]
    Busy,

    #[error("Command is empty")]
    EmptyCommand,

    #[error("No entity with id '{0}'")]
    NodeNotFound(String),

    #[error("No commit matches '{0}'")]
    CommitNotFound(String),

    #[error("No file with id '{0}'")]
    FileNotFound(String),

    #[error("Invalid entity data: {0}")]
    InvalidEdit(String),
}

/// Configuration for creating a new game session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Branch the session starts on.
    pub branch: String,

    /// Narrative engine settings.
    pub engine: EngineConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the starting branch name.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Set the engine configuration.
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Seed every random choice the session makes.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.engine.seed = Some(seed);
        self
    }

    /// Force the offline engine.
    pub fn offline(mut self) -> Self {
        self.engine.offline = true;
        self
    }
}

/// A command that has been echoed and is waiting for the engine.
#[derive(Debug, Clone)]
pub struct PendingCommand {
    command: String,
    request: EngineRequest,
}

impl PendingCommand {
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The request to hand to the engine.
    pub fn request(&self) -> &EngineRequest {
        &self.request
    }
}

/// Outcome of a player command.
#[derive(Debug, Clone)]
pub struct Response {
    /// The narrative text from the engine.
    pub narrative: String,

    /// Full symbolic trace (may be empty).
    pub trace: String,

    /// The commit recording the new world.
    pub commit: CommitHash,

    /// Message of that commit.
    pub commit_message: String,

    /// Ids of nodes the engine added.
    pub new_nodes: Vec<String>,
}

/// A play session.
///
/// This is the main entry point for gameplay. It manages:
/// - The live world (state, entity graph, transcript)
/// - The commit history and the current branch
/// - The narrative engine
pub struct GameSession {
    world: World,
    files: ProjectFiles,
    commits: CommitLog,
    branch: String,
    loading: bool,
    last_trace: Option<String>,
    engine: Box<dyn NarrativeEngine>,
    rng: StdRng,
}

impl GameSession {
    /// Create a session on the genesis world, choosing the engine from the
    /// environment and configuration.
    pub fn new(config: SessionConfig) -> Self {
        let engine = select_engine(&config.engine);
        Self::with_engine(config, engine)
    }

    /// Create a session on the genesis world with a given engine.
    pub fn with_engine(config: SessionConfig, engine: Box<dyn NarrativeEngine>) -> Self {
        let world = genesis_world();
        let commits = genesis_commits(&world.snapshot(), &config.branch);
        Self::with_world(config, engine, world, genesis_files(), commits)
    }

    /// Create a session from pre-built parts.
    pub fn with_world(
        config: SessionConfig,
        engine: Box<dyn NarrativeEngine>,
        world: World,
        files: ProjectFiles,
        commits: CommitLog,
    ) -> Self {
        let rng = match config.engine.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        info!(branch = %config.branch, engine = engine.name(), "session started");
        Self {
            world,
            files,
            commits,
            branch: config.branch,
            loading: false,
            last_trace: None,
            engine,
            rng,
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Process a player command end to end.
    pub async fn submit(&mut self, command: &str) -> Result<Response, SessionError> {
        let pending = self.begin_command(command)?;
        let response = self.resolve(&pending).await;
        Ok(self.finish_command(pending, response))
    }

    /// Echo the command into the transcript, mark the session loading and
    /// capture the engine request from the live world.
    pub fn begin_command(&mut self, command: &str) -> Result<PendingCommand, SessionError> {
        if self.loading {
            return Err(SessionError::Busy);
        }
        let command = command.trim();
        if command.is_empty() {
            return Err(SessionError::EmptyCommand);
        }

        self.world.transcript.push(LogEntry::user(command));
        self.loading = true;

        let request = EngineRequest {
            command: command.to_string(),
            game_state: self.world.state.clone(),
            graph_node_labels: self.world.graph.labels(),
            graph_nodes: self.world.graph.nodes().iter().map(NodeRef::from).collect(),
            file_context: self.files.context(),
            transcript_history: self.world.transcript.entries().to_vec(),
        };
        debug!(command, "command started");
        Ok(PendingCommand {
            command: command.to_string(),
            request,
        })
    }

    /// Ask the engine about a pending command.
    pub async fn resolve(&mut self, pending: &PendingCommand) -> EngineResponse {
        self.engine.run(&pending.request).await
    }

    /// Apply the engine's deltas and commit the result.
    pub fn finish_command(&mut self, pending: PendingCommand, response: EngineResponse) -> Response {
        if let Some(ref update) = response.state_updates {
            self.world.state.apply(update);
        }

        let mut new_nodes = Vec::with_capacity(response.new_nodes.len());
        for delta in response.new_nodes {
            let x = placed(delta.x, SPAWN_CENTER.0, SPAWN_JITTER, &mut self.rng);
            let y = placed(delta.y, SPAWN_CENTER.1, SPAWN_JITTER, &mut self.rng);
            let id = delta.id.clone();
            if self.world.graph.add_node(delta.into_node(x, y)) {
                new_nodes.push(id);
            } else {
                warn!(id = %id, "engine proposed a node id that already exists, skipped");
            }
        }
        for link in response.new_links {
            self.world.graph.add_link(link);
        }

        if !response.trace.is_empty() {
            let first_line = response.trace.lines().next().unwrap_or_default();
            self.world
                .transcript
                .push(LogEntry::symbolic(format!("[EXEC] {first_line}...")));
            self.last_trace = Some(response.trace.clone());
        }
        self.world
            .transcript
            .push(LogEntry::neural(response.narrative.clone()));

        let message = response
            .commit_message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Action: {}", pending.command));
        let commit = self.commit(message.clone()).hash.clone();
        self.loading = false;

        Response {
            narrative: response.narrative,
            trace: response.trace,
            commit,
            commit_message: message,
            new_nodes,
        }
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Switch to a new branch, recording the unchanged world under it.
    ///
    /// A blank or missing name gets a generated `fork-<n>` name.
    pub fn fork(&mut self, name: Option<&str>) -> Result<&Commit, SessionError> {
        self.ensure_idle()?;
        let branch = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => format!("fork-{}", self.rng.gen_range(0..1000)),
        };
        info!(from = %self.branch, to = %branch, "forked");
        self.branch = branch.clone();
        Ok(self.commits.fork(self.world.snapshot(), branch))
    }

    /// Time travel to a commit by full hash or unique prefix.
    ///
    /// Commits without a snapshot are skipped silently. The current branch
    /// is left as it is.
    pub fn restore(&mut self, hash: &str) -> Result<RestoreOutcome, SessionError> {
        self.ensure_idle()?;
        let index = self
            .commits
            .position(hash)
            .ok_or_else(|| SessionError::CommitNotFound(hash.to_string()))?;
        let Some(snapshot) = self.commits.activate(index).cloned() else {
            return Ok(RestoreOutcome::Skipped);
        };

        self.world.restore(&snapshot);
        if let Some(commit) = self.commits.at(index) {
            info!(hash = %commit.hash, message = %commit.message, "restored");
            self.world.transcript.push(LogEntry::system(format!(
                ">>> TIME TRAVEL INITIATED. Reverted reality to commit {}.",
                commit.hash.short()
            )));
        }
        Ok(RestoreOutcome::Restored)
    }

    // ========================================================================
    // Manual edits
    // ========================================================================

    /// Insert a blank entity near the center of the graph.
    pub fn create_node(&mut self) -> Result<String, SessionError> {
        self.ensure_idle()?;
        let id = format!("ent_{}", &Uuid::new_v4().simple().to_string()[..12]);
        let x = SPAWN_CENTER.0 + self.rng.gen_range(-MANUAL_JITTER..MANUAL_JITTER);
        let y = SPAWN_CENTER.1 + self.rng.gen_range(-MANUAL_JITTER..MANUAL_JITTER);
        self.world
            .graph
            .add_node(EntityNode::new(id.clone(), "New Entity", NodeType::Item).at(x, y));

        self.world
            .transcript
            .push(LogEntry::system(format!("[DB] Inserted new row '{id}'.")));
        self.commit(format!("DB: Insert {id}"));
        Ok(id)
    }

    /// Delete an entity and every link touching it.
    pub fn delete_node(&mut self, id: &str) -> Result<usize, SessionError> {
        self.ensure_idle()?;
        let (_, dropped) = self
            .world
            .graph
            .remove_node(id)
            .ok_or_else(|| SessionError::NodeNotFound(id.to_string()))?;

        self.world.transcript.push(LogEntry::system(format!(
            "[DB] Deleted row '{id}'. Cascading delete to {dropped} links."
        )));
        self.commit(format!("DB: Delete {id}"));
        Ok(dropped)
    }

    /// Replace an entity's data with a JSON object given as text.
    pub fn patch_entity(&mut self, id: &str, text: &str) -> Result<(), SessionError> {
        self.ensure_idle()?;
        if !self.world.graph.contains(id) {
            return Err(SessionError::NodeNotFound(id.to_string()));
        }
        let data = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(SessionError::InvalidEdit(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
            Err(e) => return Err(SessionError::InvalidEdit(e.to_string())),
        };

        self.world.graph.set_data(id, data);
        self.world.transcript.push(LogEntry::system(format!(
            "[ARCHITECT] Manual override on Entity '{id}'. Data patched."
        )));
        self.commit(format!("Manual Edit: Entity {id}"));
        Ok(())
    }

    /// Overwrite a project file. Files are not versioned.
    pub fn save_file(&mut self, id: &str, content: &str) -> Result<(), SessionError> {
        if self.files.save(id, content) {
            debug!(file = id, "file saved");
            Ok(())
        } else {
            Err(SessionError::FileNotFound(id.to_string()))
        }
    }

    fn commit(&mut self, message: String) -> &Commit {
        self.commits
            .append(self.world.snapshot(), message, self.branch.clone())
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.loading {
            Err(SessionError::Busy)
        } else {
            Ok(())
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn state(&self) -> &GameState {
        &self.world.state
    }

    pub fn graph(&self) -> &GraphStore {
        &self.world.graph
    }

    pub fn transcript(&self) -> &Transcript {
        &self.world.transcript
    }

    pub fn files(&self) -> &ProjectFiles {
        &self.files
    }

    pub fn commits(&self) -> &CommitLog {
        &self.commits
    }

    pub fn current_branch(&self) -> &str {
        &self.branch
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Full trace of the most recent engine response that had one.
    pub fn last_trace(&self) -> Option<&str> {
        self.last_trace.as_deref()
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }
}

/// Keep a usable coordinate, or scatter around `center`. Zero counts as unset.
fn placed(coord: Option<f64>, center: f64, jitter: f64, rng: &mut StdRng) -> f64 {
    match coord {
        Some(c) if c != 0.0 => c,
        _ => center + rng.gen_range(-jitter..jitter),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{NodeDelta, OfflineEngine};
    use crate::world::{EntityLink, LogType, StateUpdate};

    fn session() -> GameSession {
        GameSession::with_engine(
            SessionConfig::new().with_seed(3),
            Box::new(OfflineEngine::with_seed(3)),
        )
    }

    #[test]
    fn test_new_session_starts_from_genesis() {
        let session = session();
        assert_eq!(session.commits().len(), 2);
        assert_eq!(session.current_branch(), "main");
        assert_eq!(session.transcript().len(), 2);
        assert!(!session.is_loading());
        assert!(session.last_trace().is_none());
        assert_eq!(session.engine_name(), "offline");
    }

    #[test]
    fn test_begin_command_echoes_and_locks() {
        let mut session = session();
        let pending = session.begin_command("  look around ").unwrap();

        assert_eq!(pending.command(), "look around");
        assert!(session.is_loading());
        let last = session.transcript().last().unwrap();
        assert_eq!(last.kind, LogType::User);
        assert_eq!(last.content, "look around");
        // The request sees the echo
        assert_eq!(
            pending.request().transcript_history.last().map(|e| e.content.as_str()),
            Some("look around")
        );
        assert!(pending.request().file_context.contains("combat.py"));

        assert!(matches!(session.begin_command("attack"), Err(SessionError::Busy)));
        assert!(matches!(session.fork(None), Err(SessionError::Busy)));
    }

    #[test]
    fn test_blank_command_rejected_without_side_effects() {
        let mut session = session();
        assert!(matches!(session.begin_command("   "), Err(SessionError::EmptyCommand)));
        assert_eq!(session.transcript().len(), 2);
        assert!(!session.is_loading());
    }

    #[test]
    fn test_finish_applies_deltas_in_order() {
        let mut session = session();
        let pending = session.begin_command("search the camp").unwrap();
        let response = EngineResponse::new("You find a map.", "> python3 scan.py\n[INFO] ok")
            .with_state_updates(StateUpdate::hp(17))
            .with_node(NodeDelta::new("camp", "Goblin Camp", NodeType::Location))
            .with_node(NodeDelta::new("map2", "Torn Map", NodeType::Item).at(10.0, 0.0))
            .with_link(EntityLink::new("player", "camp", "KNOWS"));

        let result = session.finish_command(pending, response);

        assert_eq!(session.state().hp, 17);
        assert_eq!(session.state().location, "Dark Forest (Edge)");
        assert_eq!(result.new_nodes, vec!["camp", "map2"]);

        let camp = session.graph().node("camp").unwrap();
        assert!((150.0..250.0).contains(&camp.x));
        assert!((100.0..200.0).contains(&camp.y));
        let map = session.graph().node("map2").unwrap();
        assert_eq!(map.x, 10.0);
        assert!((100.0..200.0).contains(&map.y));
        assert_eq!(session.graph().links().len(), 5);

        let tail: Vec<_> = session.transcript().recent(3).iter().map(|e| e.kind).collect();
        assert_eq!(tail, vec![LogType::User, LogType::Symbolic, LogType::Neural]);
        assert_eq!(
            session.transcript().recent(2)[0].content,
            "[EXEC] > python3 scan.py..."
        );
        assert_eq!(session.last_trace(), Some("> python3 scan.py\n[INFO] ok"));

        assert_eq!(result.commit_message, "Action: search the camp");
        assert_eq!(session.commits().active().unwrap().hash, result.commit);
        assert!(!session.is_loading());
    }

    #[test]
    fn test_empty_trace_skips_symbolic_entry() {
        let mut session = session();
        let pending = session.begin_command("breathe").unwrap();
        session.finish_command(pending, EngineResponse::new("You breathe.", ""));

        let tail: Vec<_> = session.transcript().recent(2).iter().map(|e| e.kind).collect();
        assert_eq!(tail, vec![LogType::User, LogType::Neural]);
        assert!(session.last_trace().is_none());
    }

    #[test]
    fn test_fork_names() {
        let mut session = session();
        let branch = session.fork(Some("scouting")).unwrap().branch.clone();
        assert_eq!(branch, "scouting");
        assert_eq!(session.current_branch(), "scouting");

        let generated = session.fork(Some("  ")).unwrap().branch.clone();
        let n: u32 = generated.strip_prefix("fork-").unwrap().parse().unwrap();
        assert!(n < 1000);
        assert_eq!(session.commits().len(), 4);
    }

    #[test]
    fn test_restore_unknown_commit() {
        let mut session = session();
        assert!(matches!(
            session.restore("zzzzzzz"),
            Err(SessionError::CommitNotFound(_))
        ));
    }

    #[test]
    fn test_restore_skips_commit_without_snapshot() {
        let world = genesis_world();
        let commits = CommitLog::from_commits(vec![
            Commit::new("bare", "main").with_hash(CommitHash::from_raw("bare000")),
            Commit::new("full", "main")
                .with_hash(CommitHash::from_raw("full000"))
                .with_snapshot(world.snapshot()),
        ]);
        let mut session = GameSession::with_world(
            SessionConfig::new(),
            Box::new(OfflineEngine::with_seed(0)),
            world,
            genesis_files(),
            commits,
        );

        let before = session.world().clone();
        assert_eq!(session.restore("bare000").unwrap(), RestoreOutcome::Skipped);
        assert_eq!(session.world(), &before);
        assert_eq!(session.commits().active().unwrap().message, "full");
    }

    #[test]
    fn test_manual_create_and_delete() {
        let mut session = session();
        let id = session.create_node().unwrap();
        assert!(id.starts_with("ent_"));

        let node = session.graph().node(&id).unwrap();
        assert_eq!(node.label, "New Entity");
        assert_eq!(node.kind, NodeType::Item);
        assert!((180.0..220.0).contains(&node.x));
        assert!(node.data.is_empty());
        assert_eq!(
            session.transcript().last().unwrap().content,
            format!("[DB] Inserted new row '{id}'.")
        );
        assert_eq!(session.commits().active().unwrap().message, format!("DB: Insert {id}"));

        let dropped = session.delete_node("npc1").unwrap();
        assert_eq!(dropped, 2);
        assert_eq!(
            session.transcript().last().unwrap().content,
            "[DB] Deleted row 'npc1'. Cascading delete to 2 links."
        );
        assert_eq!(session.commits().len(), 4);

        assert!(matches!(
            session.delete_node("npc1"),
            Err(SessionError::NodeNotFound(_))
        ));
        assert_eq!(session.commits().len(), 4);
    }

    #[test]
    fn test_patch_entity() {
        let mut session = session();
        session
            .patch_entity("npc1", r#"{"hp": 3, "ac": 12, "weapon": "Shortbow"}"#)
            .unwrap();
        assert_eq!(session.graph().node("npc1").unwrap().data["hp"], 3);
        assert_eq!(
            session.transcript().last().unwrap().content,
            "[ARCHITECT] Manual override on Entity 'npc1'. Data patched."
        );
        assert_eq!(
            session.commits().active().unwrap().message,
            "Manual Edit: Entity npc1"
        );
    }

    #[test]
    fn test_invalid_patch_mutates_nothing() {
        let mut session = session();
        let before = session.world().clone();

        for text in ["{not json", "[1, 2]", "42"] {
            assert!(matches!(
                session.patch_entity("npc1", text),
                Err(SessionError::InvalidEdit(_))
            ));
        }
        assert!(matches!(
            session.patch_entity("ghost", "{}"),
            Err(SessionError::NodeNotFound(_))
        ));
        assert_eq!(session.world(), &before);
        assert_eq!(session.commits().len(), 2);
    }

    #[test]
    fn test_save_file_does_not_commit() {
        let mut session = session();
        session.save_file("dice_py", "def d20(): return 20").unwrap();
        assert!(session.files().context().contains("def d20(): return 20"));
        assert_eq!(session.commits().len(), 2);
        assert!(matches!(
            session.save_file("specs", "folder"),
            Err(SessionError::FileNotFound(_))
        ));
    }
}
