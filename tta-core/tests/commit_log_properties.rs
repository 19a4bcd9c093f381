//! Property tests for the commit log.
//!
//! These tests use `proptest` to drive a session through random sequences
//! of commands, forks, restores and manual edits, and verify the history
//! invariants after every step.

use proptest::prelude::*;
use tta_core::engine::NodeDelta;
use tta_core::testing::TestHarness;
use tta_core::world::{LogType, NodeType, StateUpdate};
use tta_core::{EngineResponse, RestoreOutcome};

/// Operations we can perform on a session.
#[derive(Debug, Clone)]
enum SessionOp {
    Command { hp: Option<i32>, discover: bool },
    Fork(Option<u16>),
    Restore(usize),
    CreateNode,
    DeleteNode(usize),
    Patch(usize, i64),
}

fn session_op_strategy() -> impl Strategy<Value = SessionOp> {
    prop_oneof![
        (proptest::option::of(0..30i32), any::<bool>())
            .prop_map(|(hp, discover)| SessionOp::Command { hp, discover }),
        proptest::option::of(0..500u16).prop_map(SessionOp::Fork),
        (0..64usize).prop_map(SessionOp::Restore),
        Just(SessionOp::CreateNode),
        (0..16usize).prop_map(SessionOp::DeleteNode),
        (0..16usize, any::<i64>()).prop_map(|(i, v)| SessionOp::Patch(i, v)),
    ]
}

fn apply(harness: &mut TestHarness, op: &SessionOp, step: usize) {
    let before = harness.commit_count();
    match op {
        SessionOp::Command { hp, discover } => {
            let mut response = EngineResponse::new(format!("Turn {step}."), "> tick");
            if let Some(hp) = hp {
                response = response.with_state_updates(StateUpdate::hp(*hp));
            }
            if *discover {
                response = response.with_node(NodeDelta::new(
                    format!("found_{step}"),
                    "Relic",
                    NodeType::Item,
                ));
            }
            harness.expect_response(response);
            harness.input(&format!("act {step}")).unwrap();
            assert_eq!(harness.commit_count(), before + 1);
        }
        SessionOp::Fork(name) => {
            let name = name.map(|n| format!("b{n}"));
            harness.session.fork(name.as_deref()).unwrap();
            assert_eq!(harness.commit_count(), before + 1);
        }
        SessionOp::Restore(i) => {
            let index = i % before;
            let hash = harness
                .session
                .commits()
                .iter()
                .nth(index)
                .map(|c| c.hash.to_string())
                .unwrap();
            let outcome = harness.session.restore(&hash).unwrap();
            assert_eq!(outcome, RestoreOutcome::Restored);
            assert_eq!(harness.commit_count(), before);
            assert_eq!(
                harness.session.commits().active().map(|c| c.hash.to_string()),
                Some(hash)
            );
        }
        SessionOp::CreateNode => {
            harness.session.create_node().unwrap();
            assert_eq!(harness.commit_count(), before + 1);
        }
        SessionOp::DeleteNode(i) => {
            let nodes = harness.session.graph().nodes();
            if nodes.is_empty() {
                return;
            }
            let id = nodes[i % nodes.len()].id.clone();
            harness.session.delete_node(&id).unwrap();
            assert!(harness
                .session
                .graph()
                .links()
                .iter()
                .all(|l| l.source != id && l.target != id));
            assert_eq!(harness.commit_count(), before + 1);
        }
        SessionOp::Patch(i, value) => {
            let nodes = harness.session.graph().nodes();
            if nodes.is_empty() {
                return;
            }
            let id = nodes[i % nodes.len()].id.clone();
            harness
                .session
                .patch_entity(&id, &format!("{{\"value\": {value}}}"))
                .unwrap();
            assert_eq!(harness.commit_count(), before + 1);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn random_ops_keep_exactly_one_active(ops in prop::collection::vec(session_op_strategy(), 1..40)) {
        let mut harness = TestHarness::new();

        for (step, op) in ops.iter().enumerate() {
            apply(&mut harness, op, step);

            let commits = harness.session.commits();
            prop_assert_eq!(commits.active_count(), 1);
            prop_assert!(!harness.session.is_loading());
        }
    }

    #[test]
    fn commits_own_independent_snapshots(ops in prop::collection::vec(session_op_strategy(), 1..25)) {
        let mut harness = TestHarness::new();
        let genesis = harness.session.commits().iter().next().and_then(|c| c.snapshot.clone()).unwrap();

        for (step, op) in ops.iter().enumerate() {
            apply(&mut harness, op, step);
        }

        // Nothing that happened afterwards touched the first commit
        let first = harness.session.commits().iter().next().and_then(|c| c.snapshot.clone()).unwrap();
        prop_assert_eq!(first, genesis);
    }

    #[test]
    fn restore_is_idempotent(ops in prop::collection::vec(session_op_strategy(), 1..20), pick in 0..64usize) {
        let mut harness = TestHarness::new();
        for (step, op) in ops.iter().enumerate() {
            apply(&mut harness, op, step);
        }

        let commits = harness.session.commits();
        let hash = commits.iter().nth(pick % commits.len()).map(|c| c.hash.to_string()).unwrap();

        harness.session.restore(&hash).unwrap();
        let once = harness.session.world().clone();
        harness.session.restore(&hash).unwrap();
        let twice = harness.session.world().clone();

        prop_assert_eq!(&once.state, &twice.state);
        prop_assert_eq!(&once.graph, &twice.graph);
        // Only the time travel marker is duplicated
        prop_assert_eq!(twice.transcript.len(), once.transcript.len());
        let last = twice.transcript.last().unwrap();
        prop_assert_eq!(last.kind, LogType::System);
        prop_assert!(last.content.starts_with(">>> TIME TRAVEL INITIATED."));
    }
}
