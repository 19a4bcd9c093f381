//! Live world state.
//!
//! The three containers every snapshot captures (game state, entity graph,
//! transcript) plus the project file tree the engine reads as context.

mod files;
mod graph;
mod state;
mod transcript;

pub use files::{FileKind, FileNode, ProjectFiles};
pub use graph::{EntityFilter, EntityLink, EntityNode, GraphStore, NodeType};
pub use state::{GameState, StateUpdate};
pub use transcript::{LogEntry, LogType, Transcript};

use crate::snapshot::WorldSnapshot;

/// The mutable world a session plays in.
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    pub state: GameState,
    pub graph: GraphStore,
    pub transcript: Transcript,
}

impl World {
    pub fn new(state: GameState, graph: GraphStore, transcript: Transcript) -> Self {
        Self {
            state,
            graph,
            transcript,
        }
    }

    /// Deep-copy the current containers into an immutable snapshot.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::new(
            self.state.clone(),
            self.graph.nodes().to_vec(),
            self.graph.links().to_vec(),
            self.transcript.entries().to_vec(),
        )
    }

    /// Build a live world from a snapshot's contents.
    pub fn from_snapshot(snapshot: &WorldSnapshot) -> Self {
        Self {
            state: snapshot.game_state().clone(),
            graph: GraphStore::from_parts(snapshot.nodes().to_vec(), snapshot.links().to_vec()),
            transcript: Transcript::from_entries(snapshot.logs().to_vec()),
        }
    }

    /// Replace all three containers wholesale.
    pub fn restore(&mut self, snapshot: &WorldSnapshot) {
        *self = Self::from_snapshot(snapshot);
    }
}
