//! Narrative engine gateway.
//!
//! The session hands an [`EngineRequest`] describing the live world to a
//! [`NarrativeEngine`] and gets an [`EngineResponse`] back. Engines never
//! fail from the caller's point of view: transport and parse problems are
//! folded into a degraded response that still narrates something.

mod anthropic;
mod offline;

pub use anthropic::ClaudeEngine;
pub use offline::OfflineEngine;

use crate::world::{EntityLink, EntityNode, GameState, LogEntry, NodeType, StateUpdate};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Narrative shown when the backend could not be reached or understood.
pub const DEGRADED_NARRATIVE: &str =
    "The engine stutters. A connection to the Neural Plane (API) failed.";

/// Errors an engine may hit internally before degrading.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("transport failure: {0}")]
    Transport(#[from] claude::Error),

    #[error("malformed engine payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("no JSON object in engine reply")]
    MissingJson,
}

/// Everything the engine sees about the world for one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRequest {
    pub command: String,
    pub game_state: GameState,
    pub graph_node_labels: Vec<String>,
    /// Ids the engine may link new nodes to.
    #[serde(default)]
    pub graph_nodes: Vec<NodeRef>,
    pub file_context: String,
    pub transcript_history: Vec<LogEntry>,
}

/// Id and label of a node already in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: String,
    pub label: String,
}

impl From<&EntityNode> for NodeRef {
    fn from(node: &EntityNode) -> Self {
        Self {
            id: node.id.clone(),
            label: node.label.clone(),
        }
    }
}

/// A node proposed by the engine. Position and data are optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDelta {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl NodeDelta {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: NodeType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            x: None,
            y: None,
            data: None,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Materialize into a graph node at the given position.
    pub fn into_node(self, x: f64, y: f64) -> EntityNode {
        EntityNode {
            id: self.id,
            label: self.label,
            kind: self.kind,
            x,
            y,
            data: self.data.unwrap_or_default(),
        }
    }
}

/// The engine's verdict on one command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineResponse {
    pub narrative: String,
    pub trace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_updates: Option<StateUpdate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_nodes: Vec<NodeDelta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_links: Vec<EntityLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
}

impl EngineResponse {
    pub fn new(narrative: impl Into<String>, trace: impl Into<String>) -> Self {
        Self {
            narrative: narrative.into(),
            trace: trace.into(),
            ..Self::default()
        }
    }

    /// The response used when the backend failed.
    pub fn degraded(error: &EngineError) -> Self {
        Self::new(DEGRADED_NARRATIVE, format!("[ERROR] {error}"))
    }

    pub fn with_state_updates(mut self, update: StateUpdate) -> Self {
        self.state_updates = Some(update);
        self
    }

    pub fn with_node(mut self, node: NodeDelta) -> Self {
        self.new_nodes.push(node);
        self
    }

    pub fn with_link(mut self, link: EntityLink) -> Self {
        self.new_links.push(link);
        self
    }

    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = Some(message.into());
        self
    }
}

/// A backend that turns a player command into narrative and world deltas.
#[async_trait]
pub trait NarrativeEngine: Send {
    /// Resolve one command. Must not fail; degrade instead.
    async fn run(&mut self, request: &EngineRequest) -> EngineResponse;

    /// Short name for status displays and logs.
    fn name(&self) -> &str;
}

/// Configuration for the narrative engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The model to use (defaults to the client's model).
    pub model: Option<String>,

    /// Maximum tokens for responses.
    pub max_tokens: usize,

    /// Temperature for generation.
    pub temperature: Option<f32>,

    /// Upper bound on one backend call.
    pub timeout: Duration,

    /// Use the offline engine even when an API key is available.
    pub offline: bool,

    /// Seed for the offline engine's dice.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 4096,
            temperature: Some(0.8),
            timeout: Duration::from_secs(120),
            offline: false,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Pick the Claude engine when an API key is configured, else run offline.
pub fn select_engine(config: &EngineConfig) -> Box<dyn NarrativeEngine> {
    if config.offline {
        info!("offline mode forced, using offline engine");
        return Box::new(offline_engine(config));
    }
    engine_for_key(config, claude::api_key_from_env())
}

fn engine_for_key(
    config: &EngineConfig,
    api_key: Result<String, claude::Error>,
) -> Box<dyn NarrativeEngine> {
    match api_key
        .map_err(EngineError::from)
        .and_then(|key| ClaudeEngine::with_key(key, config))
    {
        Ok(engine) => {
            info!(model = engine.model(), "using Claude engine");
            Box::new(engine)
        }
        Err(e) => {
            info!(reason = %e, "no Claude client available, using offline engine");
            Box::new(offline_engine(config))
        }
    }
}

fn offline_engine(config: &EngineConfig) -> OfflineEngine {
    match config.seed {
        Some(seed) => OfflineEngine::with_seed(seed),
        None => OfflineEngine::new(),
    }
}
