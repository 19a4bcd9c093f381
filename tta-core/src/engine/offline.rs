//! Keyword-driven engine used when no API key is configured.

use super::{EngineRequest, EngineResponse, NarrativeEngine, NodeDelta};
use crate::world::{EntityLink, NodeType};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

/// Chance threshold: a roll above this hits.
const HIT_THRESHOLD: f64 = 0.4;

/// Canned outcomes for attack, look and everything else.
pub struct OfflineEngine {
    rng: StdRng,
}

impl OfflineEngine {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible dice for tests and `--seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Resolve a command without any I/O.
    pub fn resolve(&mut self, command: &str) -> EngineResponse {
        let lower = command.to_lowercase();
        if lower.contains("attack") {
            self.attack()
        } else if lower.contains("look") {
            perceive()
        } else {
            hesitate(command)
        }
    }

    fn attack(&mut self) -> EngineResponse {
        let hit = self.rng.gen::<f64>() > HIT_THRESHOLD;
        let (narrative, roll, outcome) = if hit {
            (
                "Your blade finds purchase in the creature's hide. It screeches in recoil.",
                "HIT",
                "Hit",
            )
        } else {
            (
                "You lunge, but the creature is faster. Your weapon strikes only air.",
                "MISS",
                "Miss",
            )
        };
        EngineResponse::new(
            narrative,
            format!("> python3 src/skills/combat.py --target=enemy\n[INFO] Rolling d20... {roll}"),
        )
        .with_commit_message(format!("Action: Attack ({outcome})"))
    }
}

impl Default for OfflineEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn perceive() -> EngineResponse {
    // One id for both the node and the link that points at it
    let id = format!("gen_{}", &Uuid::new_v4().simple().to_string()[..12]);
    EngineResponse::new(
        "You perceive details previously hidden in the shadows.",
        "> python3 src/skills/query_lore.py --scan\n[INFO] Found 1 new entity.",
    )
    .with_node(NodeDelta::new(id.clone(), "Hidden Rune", NodeType::Item).at(250.0, 250.0))
    .with_link(EntityLink::new("player", id, "SEES"))
    .with_commit_message("Action: Perception Check")
}

fn hesitate(command: &str) -> EngineResponse {
    EngineResponse::new(
        "You hesitate, considering your next move.",
        format!("> python3 src/skills/parse_intent.py \"{command}\"\n[WARN] Intent unclear."),
    )
    .with_commit_message("Action: Wait")
}

#[async_trait]
impl NarrativeEngine for OfflineEngine {
    async fn run(&mut self, request: &EngineRequest) -> EngineResponse {
        self.resolve(&request.command)
    }

    fn name(&self) -> &str {
        "offline"
    }
}
