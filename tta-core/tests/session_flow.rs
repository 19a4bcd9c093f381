//! End-to-end session scenarios using the offline engine.

use tta_core::commit_log::RestoreOutcome;
use tta_core::testing::{
    assert_active, assert_commit_count, assert_hp, assert_no_node, TestHarness,
};
use tta_core::world::{EntityLink, LogType, NodeType, StateUpdate};
use tta_core::{
    EngineResponse, GameSession, NodeDelta, OfflineEngine, SessionConfig, SessionError,
};

fn offline_session(seed: u64) -> GameSession {
    GameSession::with_engine(
        SessionConfig::new().with_seed(seed),
        Box::new(OfflineEngine::with_seed(seed)),
    )
}

#[tokio::test]
async fn test_attack_goblin_from_genesis() {
    let mut session = offline_session(11);
    assert_eq!((session.state().hp, session.state().max_hp), (20, 20));
    assert_eq!(session.graph().nodes().len(), 4);
    assert_eq!(session.graph().links().len(), 4);
    assert_eq!(session.transcript().len(), 2);

    let state_before = session.state().clone();
    let commits_before = session.commits().len();
    let prior = session.commits().active().unwrap().hash.clone();

    let response = session.submit("attack goblin").await.unwrap();

    assert_eq!(session.commits().len(), commits_before + 1);
    assert_eq!(session.state(), &state_before);
    assert_eq!(session.transcript().len(), 5);

    let kinds: Vec<_> = session.transcript().recent(3).iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![LogType::User, LogType::Symbolic, LogType::Neural]);
    assert_eq!(
        session.transcript().recent(2)[0].content,
        "[EXEC] > python3 src/skills/combat.py --target=enemy..."
    );

    let commits = session.commits();
    let newest = commits.tail().unwrap();
    assert!(newest.active);
    assert_eq!(newest.hash, response.commit);
    assert!(response.commit_message.starts_with("Action: Attack ("));
    assert!(!commits.get(prior.as_str()).unwrap().active);
    assert_eq!(commits.active_count(), 1);
    assert!(!session.is_loading());
}

#[test]
fn test_fork_leaves_world_untouched() {
    let mut harness = TestHarness::new();
    harness.expect_response(
        EngineResponse::new("You bleed.", "> dmg").with_state_updates(StateUpdate::hp(12)),
    );
    harness.input("step on a trap").unwrap();

    let before = harness.world().clone();
    let pre_fork_snapshot = harness.world().snapshot();
    let len = harness.commit_count();

    let commit = harness.session.fork(Some("fork-42")).unwrap().clone();

    assert_eq!(harness.session.current_branch(), "fork-42");
    assert_commit_count(&harness, len + 1);
    assert_eq!(commit.branch, "fork-42");
    assert_eq!(commit.snapshot.as_ref(), Some(&pre_fork_snapshot));
    assert_active(&harness, commit.hash.as_str());
    assert_eq!(harness.world(), &before);

    // Later commits carry the new tag
    harness.expect_narrative("Quiet.");
    let response = harness.input("rest").unwrap();
    let tagged = harness.session.commits().get(response.commit.as_str()).unwrap();
    assert_eq!(tagged.branch, "fork-42");
}

#[test]
fn test_time_travel_round_trip() {
    let mut harness = TestHarness::new();
    let genesis_hash = harness.session.commits().tail().unwrap().hash.to_string();
    let genesis = harness.world().clone();

    harness.expect_response(
        EngineResponse::new("A blade bites.", "> hit")
            .with_state_updates(StateUpdate::hp(9))
            .with_link(EntityLink::new("player", "npc1", "FIGHTS")),
    );
    harness.input("charge").unwrap();
    harness.session.delete_node("item1").unwrap();
    assert_hp(&harness, 9, 20);
    let len = harness.commit_count();

    let outcome = harness.session.restore(&genesis_hash).unwrap();

    assert_eq!(outcome, RestoreOutcome::Restored);
    assert_commit_count(&harness, len);
    assert_active(&harness, &genesis_hash);
    assert_eq!(harness.world().state, genesis.state);
    assert_eq!(harness.world().graph, genesis.graph);
    assert_eq!(harness.world().transcript.len(), genesis.transcript.len() + 1);
    assert_eq!(
        harness.last_log().unwrap().content,
        ">>> TIME TRAVEL INITIATED. Reverted reality to commit e5f6g7h."
    );

    // Playing on after a restore appends after the tail, not after the target
    harness.expect_narrative("Again.");
    let response = harness.input("look again").unwrap();
    assert_commit_count(&harness, len + 1);
    assert_eq!(
        harness.session.commits().tail().unwrap().hash,
        response.commit
    );
}

#[test]
fn test_restore_by_prefix() {
    let mut harness = TestHarness::new();
    harness.expect_narrative("One.");
    let first = harness.input("one").unwrap().commit;
    harness.expect_narrative("Two.");
    harness.input("two").unwrap();

    harness.session.restore(&first.as_str()[..8]).unwrap();
    assert_active(&harness, first.as_str());

    assert!(matches!(
        harness.session.restore("e5"),
        Err(SessionError::CommitNotFound(_))
    ));
}

#[test]
fn test_cascade_delete_through_session() {
    let mut harness = TestHarness::new();
    let links_before = harness.world().graph.links().to_vec();

    let dropped = harness.session.delete_node("player").unwrap();

    // player touches LOCATED_AT, OWNS and HATES
    assert_eq!(dropped, 3);
    let remaining = harness.world().graph.links();
    assert_eq!(remaining.len(), links_before.len() - 3);
    assert_eq!(remaining, &[EntityLink::new("npc1", "loc1", "GUARDS")]);
    assert_eq!(
        harness.active_commit().unwrap().message,
        "DB: Delete player"
    );
}

#[test]
fn test_engine_node_reusing_an_id_is_skipped() {
    let mut harness = TestHarness::new();
    harness.expect_response(
        EngineResponse::new("A second goblin steps out.", "")
            .with_node(NodeDelta::new("npc1", "Goblin Twin", NodeType::Character))
            .with_node(NodeDelta::new("npc2", "Goblin Archer", NodeType::Character))
            .with_link(EntityLink::new("npc2", "npc1", "FOLLOWS")),
    );

    let response = harness.input("wait").unwrap();

    assert_eq!(response.new_nodes, vec!["npc2"]);
    let graph = &harness.world().graph;
    assert_eq!(graph.nodes().iter().filter(|n| n.id == "npc1").count(), 1);
    assert_eq!(graph.node("npc1").unwrap().label, "Goblin Scout");

    // The cascade leaves no twin behind
    harness.session.delete_node("npc1").unwrap();
    assert_no_node(&harness, "npc1");
    assert!(harness
        .world()
        .graph
        .links()
        .iter()
        .all(|l| !l.touches("npc1")));
}

#[tokio::test]
async fn test_look_adds_linked_rune() {
    let mut session = offline_session(5);
    let response = session.submit("look around").await.unwrap();

    assert_eq!(response.commit_message, "Action: Perception Check");
    assert_eq!(response.new_nodes.len(), 1);
    let rune_id = &response.new_nodes[0];
    let rune = session.graph().node(rune_id).unwrap();
    assert_eq!(rune.label, "Hidden Rune");
    assert_eq!((rune.x, rune.y), (250.0, 250.0));
    assert!(session
        .graph()
        .links()
        .contains(&EntityLink::new("player", rune_id.clone(), "SEES")));
}

#[tokio::test]
async fn test_unknown_command_waits() {
    let mut session = offline_session(5);
    let response = session.submit("sing a song").await.unwrap();
    assert_eq!(response.commit_message, "Action: Wait");
    assert_eq!(
        session.last_trace(),
        Some("> python3 src/skills/parse_intent.py \"sing a song\"\n[WARN] Intent unclear.")
    );
}

#[test]
fn test_busy_while_command_outstanding() {
    let mut harness = TestHarness::new();
    let pending = harness.session.begin_command("wait").unwrap();

    assert!(matches!(
        harness.session.begin_command("attack"),
        Err(SessionError::Busy)
    ));
    assert!(matches!(
        harness.session.restore("a1b2c3d"),
        Err(SessionError::Busy)
    ));

    harness
        .session
        .finish_command(pending, EngineResponse::new("Time passes.", ""));
    assert!(!harness.session.is_loading());
    assert!(harness.session.begin_command("attack").is_ok());
}

#[test]
fn test_invalid_edit_keeps_history() {
    let mut harness = TestHarness::new();
    let len = harness.commit_count();

    let err = harness.session.patch_entity("npc1", "{\"hp\": ").unwrap_err();
    assert!(matches!(err, SessionError::InvalidEdit(_)));
    assert_commit_count(&harness, len);

    harness.session.patch_entity("npc1", "{\"hp\": 1}").unwrap();
    assert_commit_count(&harness, len + 1);
    assert_eq!(harness.world().graph.node("npc1").unwrap().data["hp"], 1);
}
