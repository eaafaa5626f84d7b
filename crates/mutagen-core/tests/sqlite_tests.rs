#![cfg(feature = "sqlite")]

use mutagen_core::{
    discover, Mutagen, MutagenConfig, MutagenError, MutationRegistry, MutationStatus, SqliteStore,
};
use mutagen_test_utils::{state, write_script};
use pretty_assertions::assert_eq;
use std::path::Path;

fn config(dir: &Path) -> MutagenConfig {
    MutagenConfig::new()
        .with_location(dir.join("mutations"))
        .with_database(dir.join("app.db"))
}

fn setup() -> (tempfile::TempDir, MutagenConfig) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("mutations")).unwrap();
    let config = config(dir.path());
    (dir, config)
}

#[test]
fn migrates_scripts_into_sqlite() {
    let (_dir, config) = setup();
    write_script(
        &config.location,
        "201501010001",
        "CreateUsers",
        "-- users table\nCREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);\n",
    );
    write_script(
        &config.location,
        "201501010002",
        "SeedUsers",
        "INSERT INTO users (name) VALUES ('a'); INSERT INTO users (name) VALUES ('b');\n",
    );

    let mutagen = Mutagen::open(&config).unwrap();
    let mutations = discover(&config.location, &MutationRegistry::new()).unwrap();
    let result = mutagen.migrate(mutations).unwrap();
    assert!(result.is_complete());
    assert_eq!(result.completed().len(), 2);
    drop(mutagen);

    let store = SqliteStore::open(&config.database).unwrap();
    assert_eq!(store.query_count("SELECT COUNT(*) FROM users").unwrap(), 2);

    let mutagen = Mutagen::open(&config).unwrap();
    let info = mutagen.info().unwrap();
    assert_eq!(info.all().len(), 2);
    assert_eq!(info.current().unwrap().state, state("201501010002"));
    assert!(info.render_table().contains("M201501010002_SeedUsers_1.sql"));
}

#[test]
fn broken_script_is_recorded_and_repairable() {
    let (_dir, config) = setup();
    write_script(&config.location, "201501010001", "CreateUsers", "CREATE TABLE users (id INTEGER);");
    write_script(&config.location, "201501010002", "Broken", "INSERT INTO missing VALUES (1);");

    let mutagen = Mutagen::open(&config).unwrap();
    let discovered = || discover(&config.location, &MutationRegistry::new()).unwrap();

    let result = mutagen.migrate(discovered()).unwrap();
    assert!(!result.is_complete());
    assert_eq!(mutagen.info().unwrap().failed().unwrap().state, state("201501010002"));

    assert!(matches!(
        mutagen.migrate(discovered()),
        Err(MutagenError::FailedPriorMutation { .. })
    ));

    write_script(
        &config.location,
        "201501010002",
        "Broken",
        "INSERT INTO users VALUES (1);",
    );
    let removed = mutagen.repair().unwrap();
    assert_eq!(removed.len(), 1);

    let result = mutagen.migrate(discovered()).unwrap();
    assert!(result.is_complete());
    assert_eq!(mutagen.current_state().unwrap(), state("201501010002"));
}

#[test]
fn baseline_then_clean() {
    let (_dir, config) = setup();
    write_script(&config.location, "201502011200", "Old", "SELECT 1;");
    write_script(&config.location, "201502011230", "New", "CREATE TABLE fresh (id INTEGER);");

    let mutagen = Mutagen::open(&config).unwrap();
    let discovered = || discover(&config.location, &MutationRegistry::new()).unwrap();

    let report = mutagen.baseline(discovered(), &state("201502011224")).unwrap();
    assert_eq!(report.rows.len(), 2);
    let statuses: Vec<_> = mutagen.info().unwrap().all().iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![MutationStatus::BeforeBaseline, MutationStatus::Baseline]
    );

    let result = mutagen.migrate(discovered()).unwrap();
    assert_eq!(result.completed().len(), 1);

    mutagen.clean().unwrap();
    assert!(mutagen.info().unwrap().is_empty());
    assert!(mutagen.current_state().unwrap().is_initial());
}
