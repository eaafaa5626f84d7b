//! Version tokens
//!
//! Provides [`State`], the fixed-width token that totally orders mutations.
//! Tokens are compared as plain strings; the fixed width makes that ordering
//! agree with chronological order.

use crate::error::MutagenError;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Number of digits in a state token (`YYYYMMDDHHMM`)
pub const STATE_WIDTH: usize = 12;

/// A sortable version token, e.g. `201502011225`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct State(String);

impl State {
    /// Parse and validate a token
    ///
    /// # Errors
    /// Returns a configuration error unless the token is exactly
    /// [`STATE_WIDTH`] ASCII digits. The all-zero token is reserved for
    /// [`State::initial`] and rejected as well.
    pub fn parse(token: &str) -> Result<Self, MutagenError> {
        if token.len() != STATE_WIDTH || !token.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MutagenError::configuration(format!(
                "malformed state token \"{token}\": expected {STATE_WIDTH} digits"
            )));
        }
        if token.bytes().all(|b| b == b'0') {
            return Err(MutagenError::configuration(format!(
                "state token \"{token}\" is reserved for the empty ledger"
            )));
        }
        Ok(Self(token.to_string()))
    }

    /// Sentinel below every real token, used for an empty ledger
    #[inline]
    #[must_use]
    pub fn initial() -> Self {
        Self("0".repeat(STATE_WIDTH))
    }

    /// Whether this is the empty-ledger sentinel
    #[inline]
    #[must_use]
    pub fn is_initial(&self) -> bool {
        self.0.bytes().all(|b| b == b'0')
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for State {
    type Err = MutagenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for State {
    type Error = MutagenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<State> for String {
    fn from(state: State) -> Self {
        state.0
    }
}

impl AsRef<str> for State {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
