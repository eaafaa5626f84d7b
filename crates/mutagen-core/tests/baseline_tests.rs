use mutagen_core::{baseline, Checksum, Ledger, LedgerError, MutagenError, MutationStatus, Planner};
use mutagen_test_utils::{ledger_statuses, scripts, seeded_ledger, state, RecordingTarget};
use pretty_assertions::assert_eq;

#[test]
fn baseline_between_mutations_writes_synthetic_row() {
    let ledger = Ledger::in_memory();
    let discovered = || scripts(&["201502011200", "201502011210", "201502011225", "201502011230"]);

    let report = baseline(&ledger, discovered(), &state("201502011224")).unwrap();
    assert!(report.synthetic);
    assert_eq!(report.version, state("201502011224"));

    assert_eq!(
        ledger_statuses(&ledger),
        vec![
            ("201502011200".to_string(), MutationStatus::BeforeBaseline),
            ("201502011210".to_string(), MutationStatus::BeforeBaseline),
            ("201502011224".to_string(), MutationStatus::Baseline),
        ]
    );
    let synthetic = ledger.get(&state("201502011224")).unwrap().unwrap();
    assert_eq!(synthetic.resource_name, "");
    assert_eq!(synthetic.checksum, Checksum::empty());
    assert_eq!(ledger.current_state().unwrap(), state("201502011224"));

    let plan = Planner::new(discovered()).plan(&ledger).unwrap();
    let pending: Vec<_> = plan.mutations().iter().map(|m| m.state().to_string()).collect();
    assert_eq!(pending, vec!["201502011225", "201502011230"]);

    let target = RecordingTarget::new();
    assert!(plan.execute(&target).is_complete());
    assert_eq!(
        target.statements(),
        vec!["STMT 201502011225;", "STMT 201502011230;"]
    );
}

#[test]
fn baseline_refuses_non_empty_ledger() {
    let ledger = seeded_ledger(&[("201502011200", MutationStatus::Success)]);
    let err = baseline(&ledger, scripts(&["201502011210"]), &state("201502011210")).unwrap_err();

    assert!(matches!(
        err,
        MutagenError::LedgerUnavailable(LedgerError::NotEmpty { rows: 1 })
    ));
    assert_eq!(ledger.rows().unwrap().len(), 1);
}

#[test]
fn baseline_beyond_every_mutation_leaves_nothing_pending() {
    let ledger = Ledger::in_memory();
    let tokens = ["201502011200", "201502011210"];
    baseline(&ledger, scripts(&tokens), &state("201601010000")).unwrap();

    assert!(Planner::new(scripts(&tokens)).plan(&ledger).unwrap().is_empty());
}
