//! The starting world: a rogue at the edge of the Dark Forest.

use crate::commit_log::{Commit, CommitHash, CommitLog};
use crate::snapshot::WorldSnapshot;
use crate::world::{
    EntityLink, EntityNode, FileNode, GameState, GraphStore, LogEntry, NodeType, ProjectFiles,
    Transcript, World,
};

/// Branch every new session starts on.
pub const DEFAULT_BRANCH: &str = "main";

/// Initial player status.
pub fn genesis_state() -> GameState {
    GameState::new(20, 20, "Dark Forest (Edge)").with_inventory(["Rations", "Torches (3)", "Map"])
}

/// Initial entity graph.
pub fn genesis_graph() -> GraphStore {
    GraphStore::from_parts(
        vec![
            EntityNode::new("player", "Player", NodeType::Character)
                .at(200.0, 150.0)
                .with_attr("class", "Rogue")
                .with_attr("level", 1),
            EntityNode::new("loc1", "Dark Forest", NodeType::Location)
                .at(100.0, 100.0)
                .with_attr("dangerLevel", "High")
                .with_attr("ambience", "Spooky"),
            EntityNode::new("npc1", "Goblin Scout", NodeType::Character)
                .at(300.0, 100.0)
                .with_attr("hp", 7)
                .with_attr("ac", 12)
                .with_attr("weapon", "Shortbow"),
            EntityNode::new("item1", "Rusty Dagger", NodeType::Item)
                .at(250.0, 200.0)
                .with_attr("damage", "1d4")
                .with_attr("value", 2),
        ],
        vec![
            EntityLink::new("player", "loc1", "LOCATED_AT"),
            EntityLink::new("npc1", "loc1", "GUARDS"),
            EntityLink::new("player", "item1", "OWNS"),
            EntityLink::new("npc1", "player", "HATES"),
        ],
    )
}

/// Opening transcript.
pub fn genesis_transcript() -> Transcript {
    Transcript::from_entries(vec![
        LogEntry::system(
            "System Initialized. Neuro-Symbolic Engine Active.\nLoad \"src/skills/combat.py\" to review logic.",
        )
        .with_id("init"),
        LogEntry::neural(
            "You stand at the edge of the Dark Forest. A Goblin Scout watches you from the shadows.",
        )
        .with_id("intro"),
    ])
}

pub fn genesis_world() -> World {
    World::new(genesis_state(), genesis_graph(), genesis_transcript())
}

/// Seed history: two commits on `branch` sharing the genesis snapshot,
/// the second one active.
pub fn genesis_commits(snapshot: &WorldSnapshot, branch: &str) -> CommitLog {
    CommitLog::from_commits(vec![
        Commit::new("Init: World Generation", branch)
            .with_hash(CommitHash::from_raw("a1b2c3d"))
            .with_timestamp("10:00:00")
            .with_snapshot(snapshot.clone()),
        Commit::new("Event: Entered Forest", branch)
            .with_hash(CommitHash::from_raw("e5f6g7h"))
            .with_timestamp("10:05:22")
            .with_snapshot(snapshot.clone())
            .activated(),
    ])
}

/// Rules, specs and skill sources the engine reads as context.
pub fn genesis_files() -> ProjectFiles {
    ProjectFiles::new(vec![
        FileNode::file(
            "system_prompt",
            "system_prompt.md",
            "# System Axioms\n\n1. Dolt is Truth.\n2. Neo4j is Knowledge.\n3. Python is Logic.",
        ),
        FileNode::folder(
            "specs",
            "specs",
            vec![
                FileNode::file(
                    "ontology",
                    "ontology.md",
                    "# Core Ontology\n\n## Entities\n- **Character**: { hp, ac, str, dex }\n- **Location**: { description, exits }",
                ),
                FileNode::file(
                    "mechanics",
                    "mechanics.md",
                    "# Combat Rules\n\n1. Roll d20.\n2. If roll > Target AC (12), HIT.\n3. Damage = 1d6 + STR_MOD (2).",
                ),
            ],
        ),
        FileNode::folder(
            "src",
            "src",
            vec![FileNode::folder(
                "skills",
                "skills",
                vec![
                    FileNode::file("combat_py", "combat.py", COMBAT_PY),
                    FileNode::file("dice_py", "dice.py", DICE_PY),
                ],
            )],
        ),
    ])
}

const COMBAT_PY: &str = r#"def attack(target_id: str):
    print(f"initiating combat with {target_id}")
    roll = dice.d20()
    print(f"Rolled: {roll}")
    if roll > 12:
        dmg = dice.d6() + 2
        return {"result": "HIT", "damage": dmg}
    else:
        return {"result": "MISS", "damage": 0}"#;

const DICE_PY: &str = r#"import random

def d20():
    return random.randint(1, 20)

def d6():
    return random.randint(1, 6)"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_world_contents() {
        let world = genesis_world();
        assert_eq!(world.state.hp, 20);
        assert_eq!(world.state.inventory.len(), 3);
        assert_eq!(world.graph.nodes().len(), 4);
        assert_eq!(world.graph.links().len(), 4);
        assert_eq!(world.transcript.len(), 2);
        assert_eq!(world.graph.node("npc1").unwrap().data["ac"], 12);
    }

    #[test]
    fn test_genesis_commits() {
        let snapshot = genesis_world().snapshot();
        let log = genesis_commits(&snapshot, DEFAULT_BRANCH);

        assert_eq!(log.len(), 2);
        assert_eq!(log.active().unwrap().message, "Event: Entered Forest");
        assert_eq!(log.active_count(), 1);
        assert!(log.iter().all(|c| c.snapshot.as_ref() == Some(&snapshot)));
        assert_eq!(log.get("a1b2c3d").unwrap().timestamp, "10:00:00");
    }

    #[test]
    fn test_genesis_files_feed_context() {
        let context = genesis_files().context();
        for name in ["system_prompt.md", "ontology.md", "mechanics.md", "combat.py", "dice.py"] {
            assert!(context.contains(&format!("--- START OF FILE {name} ---")));
        }
    }
}
