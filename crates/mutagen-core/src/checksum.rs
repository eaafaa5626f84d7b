//! Content checksums used for drift detection

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{self, Display, Formatter};

/// Hex-encoded SHA-256 of a mutation's source bytes
///
/// Stored in the ledger when a mutation is attempted and compared on every
/// later planning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    /// Compute the checksum of raw content
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Self(hex::encode(digest))
    }

    /// Wrap a checksum read back from the ledger
    #[inline]
    #[must_use]
    pub fn from_recorded(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Empty checksum of a synthetic baseline row
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self(String::new())
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
