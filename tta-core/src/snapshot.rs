//! Immutable point-in-time copies of the world.

use crate::world::{EntityLink, EntityNode, GameState, LogEntry};
use serde::{Deserialize, Serialize};

/// Game state, graph and transcript frozen at one instant.
///
/// A snapshot is never mutated after construction; every commit owns its
/// own deep copy, even when the content equals an earlier snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSnapshot {
    game_state: GameState,
    nodes: Vec<EntityNode>,
    links: Vec<EntityLink>,
    logs: Vec<LogEntry>,
}

impl WorldSnapshot {
    pub fn new(
        game_state: GameState,
        nodes: Vec<EntityNode>,
        links: Vec<EntityLink>,
        logs: Vec<LogEntry>,
    ) -> Self {
        Self {
            game_state,
            nodes,
            links,
            logs,
        }
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    pub fn nodes(&self) -> &[EntityNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[EntityLink] {
        &self.links
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }
}
