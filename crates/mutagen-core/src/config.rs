//! Configuration
//!
//! Loaded from a TOML file and overridden field by field by the caller
//! (typically from command-line flags).
//!
//! ```toml
//! location = "mutations"
//! database = "app.db"
//! baseline_version = "201502011224"
//! log_level = "info"
//! ```

use crate::error::MutagenError;
use crate::state::State;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default name of the configuration file
pub const DEFAULT_CONFIG_FILE: &str = "mutagen.toml";

/// Mutagen configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MutagenConfig {
    /// Directory mutation scripts are discovered in
    pub location: PathBuf,
    /// Database holding the ledger and receiving script statements
    pub database: PathBuf,
    /// Version `baseline` adopts when none is given explicitly
    pub baseline_version: Option<String>,
    /// Default log filter
    pub log_level: String,
}

impl MutagenConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from a TOML file
    ///
    /// # Errors
    /// Returns a configuration error when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MutagenError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            MutagenError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
            .map_err(|e| MutagenError::configuration(format!("{}: {e}", path.display())))
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns a configuration error on malformed TOML or unknown keys.
    pub fn from_toml(text: &str) -> Result<Self, MutagenError> {
        toml::from_str(text).map_err(|e| MutagenError::configuration(e.to_string()))
    }

    /// With mutation location
    #[inline]
    #[must_use]
    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = location.into();
        self
    }

    /// With database path
    #[inline]
    #[must_use]
    pub fn with_database(mut self, database: impl Into<PathBuf>) -> Self {
        self.database = database.into();
        self
    }

    /// With baseline version
    #[inline]
    #[must_use]
    pub fn with_baseline_version(mut self, version: impl Into<String>) -> Self {
        self.baseline_version = Some(version.into());
        self
    }

    /// With log level
    #[inline]
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Parsed baseline version, if configured
    ///
    /// # Errors
    /// Returns a configuration error for a malformed token.
    pub fn baseline_state(&self) -> Result<Option<State>, MutagenError> {
        self.baseline_version.as_deref().map(State::parse).transpose()
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    /// Returns a configuration error for an empty location or database path,
    /// or a malformed baseline version.
    pub fn validate(&self) -> Result<(), MutagenError> {
        if self.location.as_os_str().is_empty() {
            return Err(MutagenError::configuration("location must not be empty"));
        }
        if self.database.as_os_str().is_empty() {
            return Err(MutagenError::configuration("database must not be empty"));
        }
        self.baseline_state()?;
        Ok(())
    }
}

impl Default for MutagenConfig {
    fn default() -> Self {
        Self {
            location: PathBuf::from("mutations"),
            database: PathBuf::from("mutagen.db"),
            baseline_version: None,
            log_level: "info".to_string(),
        }
    }
}
