//! Resource naming convention
//!
//! Every mutation is identified by a resource name of the form
//! `M<DATETIME>_<Title>_<Issue>.<ext>`, e.g.
//! `M201502011225_UpdateTableTest_1111.cqlsh.txt`. The datetime is the
//! mutation's [`State`].

use crate::error::MutagenError;
use crate::state::State;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{self, Display, Formatter};
use std::path::Path;

static RESOURCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^M(\d{12})_([\w\-]+)_([A-Za-z0-9\-]+)\.(cqlsh\.txt|sql|cql|rs)$")
        .expect("resource name pattern is a valid regex")
});

/// How a resource's mutation is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Statement script read from disk (`.sql`, `.cql`, `.cqlsh.txt`)
    Script,
    /// Callback registered by the embedding application (`.rs`)
    Programmatic,
}

/// A validated resource name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceName {
    name: String,
    state: State,
    title: String,
    issue: String,
    kind: ResourceKind,
}

impl ResourceName {
    /// Parse a resource name or path; only the final path component is kept
    ///
    /// # Errors
    /// Returns a configuration error when the name does not follow the
    /// convention or uses an unknown extension.
    pub fn parse(resource: &str) -> Result<Self, MutagenError> {
        let name = Path::new(resource)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                MutagenError::configuration(format!("resource \"{resource}\" has no file name"))
            })?;

        let caps = RESOURCE_PATTERN.captures(name).ok_or_else(|| {
            MutagenError::configuration(format!(
                "wrong name for mutation resource \"{resource}\": expected M<DATETIME>_<Title>_<Issue>.<sql|cql|cqlsh.txt|rs>"
            ))
        })?;

        let kind = match &caps[4] {
            "rs" => ResourceKind::Programmatic,
            _ => ResourceKind::Script,
        };

        Ok(Self {
            name: name.to_string(),
            state: State::parse(&caps[1])?,
            title: caps[2].to_string(),
            issue: caps[3].to_string(),
            kind,
        })
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    #[must_use]
    pub fn issue(&self) -> &str {
        &self.issue
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl Display for ResourceName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_script_name() {
        let name = ResourceName::parse("M201502011225_UpdateTableTest_1111.cqlsh.txt").unwrap();
        assert_eq!(name.state().as_str(), "201502011225");
        assert_eq!(name.title(), "UpdateTableTest");
        assert_eq!(name.issue(), "1111");
        assert_eq!(name.kind(), ResourceKind::Script);
    }

    #[test]
    fn keeps_only_file_name() {
        let name = ResourceName::parse("mutations/tests/M201501010003_CreateTableTest_1000.sql")
            .unwrap();
        assert_eq!(name.as_str(), "M201501010003_CreateTableTest_1000.sql");
    }

    #[test]
    fn title_may_contain_underscores() {
        let name = ResourceName::parse("M201501010001_Create_Users-Table_ISSUE-7.cql").unwrap();
        assert_eq!(name.title(), "Create_Users-Table");
        assert_eq!(name.issue(), "ISSUE-7");
    }

    #[test]
    fn programmatic_extension() {
        let name = ResourceName::parse("M201508011200_CreateTableTest_1000.rs").unwrap();
        assert_eq!(name.kind(), ResourceKind::Programmatic);
    }

    #[test]
    fn rejects_bad_names() {
        for bad in [
            "201501010001_NoMarker_1.sql",
            "M20150101000_ShortToken_1.sql",
            "M201501010001_NoIssue.sql",
            "M201501010001_Title_1.txt",
            "M000000000000_Init_1.sql",
            "M201501010001_Title_1.java",
        ] {
            assert!(
                matches!(ResourceName::parse(bad), Err(MutagenError::Configuration(_))),
                "{bad} should be rejected"
            );
        }
    }
}
