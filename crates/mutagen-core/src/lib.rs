//! Mutagen Core
//!
//! Versioned schema and data migrations: discovers mutations, plans the
//! pending ones against a persistent version ledger, executes them in order
//! and records every attempt.
//!
//! # Core Concepts
//!
//! - [`State`]: 12-digit version token; lexicographic order is version order
//! - [`Mutation`]: one versioned change, a script or a registered callback
//! - [`Ledger`]: the `Version` table recording every attempt
//! - [`Planner`] / [`Plan`]: classify mutations and run the pending ones
//! - [`Mutagen`]: orchestrator serializing runs behind one lock
//!
//! # Example
//!
//! ```rust,ignore
//! use mutagen_core::{discover, Mutagen, MutagenConfig, MutationRegistry};
//!
//! let config = MutagenConfig::load("mutagen.toml")?;
//! let mutagen = Mutagen::open(&config)?;
//! let mutations = discover(&config.location, &MutationRegistry::new())?;
//!
//! let result = mutagen.migrate(mutations)?;
//! println!("applied {} mutation(s)", result.completed().len());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod baseline;
mod checksum;
mod config;
mod coordinator;
mod discovery;
mod error;
mod info;
mod ledger;
mod mutagen;
mod mutation;
mod plan;
mod planner;
mod registry;
mod resource;
mod script;
#[cfg(feature = "sqlite")]
mod sqlite;
mod state;
mod target;

pub use baseline::{baseline, BaselineReport};
pub use checksum::Checksum;
pub use config::{MutagenConfig, DEFAULT_CONFIG_FILE};
pub use coordinator::Coordinator;
pub use discovery::discover;
pub use error::{LedgerError, MutagenError};
pub use info::MigrationInfo;
pub use ledger::{Ledger, LedgerBackend, LedgerRow, MemoryLedger, MutationStatus};
pub use mutagen::Mutagen;
pub use mutation::{Mutation, MutationAction, MutationContext, MutationFn};
pub use plan::{MigrationResult, Plan};
pub use planner::Planner;
pub use registry::MutationRegistry;
pub use resource::{ResourceKind, ResourceName};
pub use script::split_statements;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
pub use state::{State, STATE_WIDTH};
pub use target::Target;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
