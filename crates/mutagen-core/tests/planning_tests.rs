use mutagen_core::{Ledger, MutagenError, Mutation, MutationStatus, Planner};
use mutagen_test_utils::{
    script_mutation, script_mutation_with_body, scripts, seeded_ledger, state, RecordingTarget,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn planned_states(planner: &Planner, ledger: &Ledger) -> Vec<String> {
    planner
        .plan(ledger)
        .unwrap()
        .mutations()
        .iter()
        .map(|m| m.state().to_string())
        .collect()
}

#[test]
fn plans_only_newer_mutations() {
    let ledger = seeded_ledger(&[("201502011200", MutationStatus::Success)]);
    let planner = Planner::new(scripts(&["201502011210", "201502011200"]));

    assert_eq!(planned_states(&planner, &ledger), vec!["201502011210"]);

    let target = RecordingTarget::new();
    let result = planner.plan(&ledger).unwrap().execute(&target);
    assert!(result.is_complete());
    assert_eq!(ledger.current_state().unwrap(), state("201502011210"));
}

#[test]
fn second_run_plans_nothing() {
    let ledger = Ledger::in_memory();
    let target = RecordingTarget::new();
    let tokens = ["201501010001", "201501010002", "201501010003"];

    let first = Planner::new(scripts(&tokens)).plan(&ledger).unwrap();
    assert_eq!(first.mutations().len(), 3);
    assert!(first.execute(&target).is_complete());

    let second = Planner::new(scripts(&tokens)).plan(&ledger).unwrap();
    assert!(second.is_empty());
}

#[test]
fn missing_record_names_both_states() {
    let ledger = seeded_ledger(&[("201501010002", MutationStatus::Success)]);
    let planner = Planner::new(scripts(&["201501010001", "201501010002"]));

    match planner.plan(&ledger) {
        Err(MutagenError::MissingLedgerRecord { state: s, current }) => {
            assert_eq!(s, state("201501010001"));
            assert_eq!(current, state("201501010002"));
        }
        other => panic!("expected missing record error, got {other:?}"),
    }
}

#[test]
fn failed_row_blocks_until_repaired() {
    let ledger = seeded_ledger(&[("201501010002", MutationStatus::Failed)]);
    let planner = Planner::new(scripts(&["201501010002"]));

    let err = planner.plan(&ledger).unwrap_err();
    assert!(matches!(err, MutagenError::FailedPriorMutation { ref state, .. } if state.as_str() == "201501010002"));
    assert!(err.is_planning_error());

    let removed = ledger.repair().unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(planned_states(&planner, &ledger), vec!["201501010002"]);
}

#[test]
fn edited_mutation_is_detected() {
    let ledger = Ledger::in_memory();
    let target = RecordingTarget::new();

    let original = vec![script_mutation("201501010001")];
    assert!(Planner::new(original).plan(&ledger).unwrap().execute(&target).is_complete());

    let edited = vec![script_mutation_with_body("201501010001", "STMT edited;")];
    let err = Planner::new(edited).plan(&ledger).unwrap_err();
    assert!(matches!(err, MutagenError::ChecksumMismatch { ref state, .. } if state.as_str() == "201501010001"));
}

#[test]
fn duplicates_abort_before_any_write() {
    let ledger = Ledger::in_memory();
    let planner = Planner::new(vec![
        script_mutation("201501010001"),
        script_mutation_with_body("201501010001", "STMT other;"),
        script_mutation("201501010002"),
    ]);

    match planner.plan(&ledger) {
        Err(MutagenError::DuplicateState { states }) => {
            assert_eq!(states, vec![state("201501010001")]);
        }
        other => panic!("expected duplicate state error, got {other:?}"),
    }
    assert!(ledger.rows().unwrap().is_empty());
}

#[test]
fn baseline_history_is_verified_by_checksum() {
    let ledger = seeded_ledger(&[
        ("201501010001", MutationStatus::BeforeBaseline),
        ("201501010002", MutationStatus::Baseline),
    ]);
    let planner = Planner::new(scripts(&["201501010001", "201501010002", "201501010003"]));
    assert_eq!(planned_states(&planner, &ledger), vec!["201501010003"]);
}

#[test]
fn sentinel_token_cannot_name_a_mutation() {
    let err = Mutation::script("M000000000000_Init_1.sql", b"STMT init;").unwrap_err();
    assert!(matches!(err, MutagenError::Configuration(_)));

    let ledger = Ledger::in_memory();
    let plan = Planner::new(scripts(&["000000000001"])).plan(&ledger).unwrap();
    assert_eq!(plan.mutations().len(), 1);
}

proptest! {
    #[test]
    fn prop_plan_is_strictly_ascending(
        numbers in proptest::collection::btree_set(1u64..1_000_000_000_000, 1..24)
    ) {
        let tokens: Vec<String> = numbers.iter().rev().map(|n| format!("{n:012}")).collect();
        let refs: Vec<&str> = tokens.iter().map(String::as_str).collect();

        let ledger = Ledger::in_memory();
        let plan = Planner::new(scripts(&refs)).plan(&ledger).unwrap();
        let states: Vec<_> = plan.mutations().iter().map(|m| m.state().clone()).collect();

        prop_assert_eq!(states.len(), numbers.len());
        prop_assert!(states.windows(2).all(|w| w[0] < w[1]));

        let target = RecordingTarget::new();
        let result = plan.execute(&target);
        let executed: Vec<String> = target
            .statements()
            .iter()
            .map(|s| s.trim_start_matches("STMT ").trim_end_matches(';').to_string())
            .collect();
        let mut sorted = tokens.clone();
        sorted.sort();
        prop_assert!(result.is_complete());
        prop_assert_eq!(executed, sorted);
    }
}
