//! `mutagen` command-line tool

mod logging;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use mutagen_core::{
    discover, MigrationResult, Mutagen, MutagenConfig, MutagenError, MutationRegistry, State,
    DEFAULT_CONFIG_FILE,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn cli() -> Command {
    Command::new("mutagen")
        .version(mutagen_core::VERSION)
        .about("Versioned schema and data migrations")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (defaults to mutagen.toml when present)"),
        )
        .arg(
            Arg::new("location")
                .long("location")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory containing mutation scripts"),
        )
        .arg(
            Arg::new("database")
                .long("database")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Database holding the ledger"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("migrate")
                .about("Apply pending mutations")
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Only list the pending mutations"),
                ),
        )
        .subcommand(
            Command::new("baseline")
                .about("Adopt an existing database at a version without running anything")
                .arg(
                    Arg::new("target-version")
                        .value_name("VERSION")
                        .value_parser(value_parser!(State))
                        .help("12-digit version token (defaults to baseline_version)"),
                ),
        )
        .subcommand(Command::new("clean").about("Drop the version ledger"))
        .subcommand(
            Command::new("info").about("Show the version ledger").arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Output as JSON"),
            ),
        )
        .subcommand(Command::new("repair").about("Delete failed ledger rows"))
}

/// Load the configuration file, then apply command-line overrides
fn load_config(matches: &ArgMatches) -> anyhow::Result<MutagenConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => MutagenConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => MutagenConfig::load(DEFAULT_CONFIG_FILE)?,
        None => MutagenConfig::new(),
    };

    if let Some(location) = matches.get_one::<PathBuf>("location") {
        config = config.with_location(location);
    }
    if let Some(database) = matches.get_one::<PathBuf>("database") {
        config = config.with_database(database);
    }
    config.validate()?;
    Ok(config)
}

fn run(matches: &ArgMatches) -> anyhow::Result<ExitCode> {
    let config = load_config(matches)?;

    let verbose = matches.get_count("verbose");
    logging::init(
        logging::level_for(verbose, &config.log_level),
        matches.get_flag("log-json"),
    );

    let mutagen = Mutagen::open(&config)
        .with_context(|| format!("cannot open database {}", config.database.display()))?;
    let registry = MutationRegistry::new();

    match matches.subcommand() {
        Some(("migrate", args)) => {
            let mutations = discover(&config.location, &registry)?;
            if args.get_flag("dry-run") {
                let plan = mutagen.plan(mutations)?;
                if plan.is_empty() {
                    println!("Database is up to date");
                }
                for mutation in plan.mutations() {
                    println!("pending {mutation}");
                }
                return Ok(ExitCode::SUCCESS);
            }

            let result = mutagen.migrate(mutations)?;
            Ok(report_migration(&result))
        }
        Some(("baseline", args)) => {
            let version = match args.get_one::<State>("target-version") {
                Some(version) => version.clone(),
                None => config.baseline_state()?.ok_or_else(|| {
                    MutagenError::configuration(
                        "no baseline version given and baseline_version is not configured",
                    )
                })?,
            };
            let mutations = discover(&config.location, &registry)?;
            let report = mutagen.baseline(mutations, &version)?;
            println!(
                "Baselined at {} ({} row(s) written)",
                report.version,
                report.rows.len()
            );
            Ok(ExitCode::SUCCESS)
        }
        Some(("clean", _)) => {
            mutagen.clean()?;
            println!("Ledger dropped");
            Ok(ExitCode::SUCCESS)
        }
        Some(("info", args)) => {
            let info = mutagen.info()?;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print!("{}", info.render_table());
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(("repair", _)) => {
            let removed = mutagen.repair()?;
            println!("Removed {} failed row(s)", removed.len());
            for row in &removed {
                println!("  {} {}", row.state, row.resource_name);
            }
            Ok(ExitCode::SUCCESS)
        }
        _ => Ok(ExitCode::SUCCESS),
    }
}

fn report_migration(result: &MigrationResult) -> ExitCode {
    for mutation in result.completed() {
        tracing::info!(state = %mutation.state(), "completed {mutation}");
    }
    for mutation in result.remaining() {
        tracing::warn!(state = %mutation.state(), "remaining {mutation}");
    }

    match result.error() {
        None => {
            println!("Applied {} mutation(s)", result.completed().len());
            ExitCode::SUCCESS
        }
        Some(err) => {
            eprintln!(
                "Migration halted after {} mutation(s), {} remaining: {err}",
                result.completed().len(),
                result.remaining().len()
            );
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    match run(&matches) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
