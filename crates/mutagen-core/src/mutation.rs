//! Mutations
//!
//! A [`Mutation`] is one discrete change unit bound to exactly one
//! [`State`]. It is immutable once discovered: its checksum is fixed from
//! the content it was built from, so editing the source after it ran is
//! detected on the next planning pass.

use crate::checksum::Checksum;
use crate::coordinator::Coordinator;
use crate::error::MutagenError;
use crate::ledger::Ledger;
use crate::resource::{ResourceKind, ResourceName};
use crate::script::split_statements;
use crate::state::State;
use crate::target::Target;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Callback signature of a programmatic mutation
pub type MutationFn = dyn Fn(&MutationContext<'_>) -> anyhow::Result<()> + Send + Sync;

/// What applying a mutation does
#[derive(Clone)]
pub enum MutationAction {
    /// Statements executed in order against the target
    Script(Vec<String>),
    /// Application-provided callback
    Callback(Arc<MutationFn>),
}

impl fmt::Debug for MutationAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script(statements) => f.debug_tuple("Script").field(&statements.len()).finish(),
            Self::Callback(_) => f.write_str("Callback"),
        }
    }
}

/// One versioned change unit
#[derive(Debug, Clone)]
pub struct Mutation {
    resource: ResourceName,
    checksum: Checksum,
    action: MutationAction,
}

impl Mutation {
    /// Script mutation from a resource name and its raw bytes
    ///
    /// # Errors
    /// Returns a configuration error when the name is malformed, is not a
    /// script resource, or the content is not UTF-8.
    pub fn script(resource: &str, content: &[u8]) -> Result<Self, MutagenError> {
        let resource = ResourceName::parse(resource)?;
        if resource.kind() != ResourceKind::Script {
            return Err(MutagenError::configuration(format!(
                "resource \"{resource}\" is not a script"
            )));
        }
        let text = std::str::from_utf8(content).map_err(|e| {
            MutagenError::configuration(format!("resource \"{resource}\" is not UTF-8: {e}"))
        })?;

        Ok(Self {
            checksum: Checksum::compute(content),
            action: MutationAction::Script(split_statements(text)),
            resource,
        })
    }

    /// Programmatic mutation; `source` is hashed for drift detection
    ///
    /// # Errors
    /// Returns a configuration error when the name is malformed.
    pub fn callback<F>(resource: &str, source: &str, f: F) -> Result<Self, MutagenError>
    where
        F: Fn(&MutationContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Ok(Self {
            resource: ResourceName::parse(resource)?,
            checksum: Checksum::compute(source.as_bytes()),
            action: MutationAction::Callback(Arc::new(f)),
        })
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &State {
        self.resource.state()
    }

    #[inline]
    #[must_use]
    pub fn resource_name(&self) -> &str {
        self.resource.as_str()
    }

    #[inline]
    #[must_use]
    pub fn resource(&self) -> &ResourceName {
        &self.resource
    }

    #[inline]
    #[must_use]
    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    #[inline]
    #[must_use]
    pub fn action(&self) -> &MutationAction {
        &self.action
    }

    /// Perform the mutation's side effects
    ///
    /// Runs once; there is no retry.
    ///
    /// # Errors
    /// Returns the first fault raised by the target or the callback.
    pub fn apply(&self, ctx: &MutationContext<'_>) -> anyhow::Result<()> {
        match &self.action {
            MutationAction::Script(statements) => {
                ctx.info(&format!("executing mutation {}", self.state()));
                for statement in statements {
                    ctx.debug(&format!("executing statement \"{statement}\""));
                    if let Err(err) = ctx.execute(statement) {
                        ctx.error(&format!("statement \"{statement}\" failed: {err:#}"));
                        return Err(err.context(format!("executing statement \"{statement}\"")));
                    }
                }
                ctx.info(&format!("done executing mutation {}", self.state()));
                Ok(())
            }
            MutationAction::Callback(f) => f(ctx),
        }
    }
}

impl Display for Mutation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}[state={}]", self.resource, self.state())
    }
}

/// What a running mutation can see
pub struct MutationContext<'a> {
    state: &'a State,
    target: &'a dyn Target,
    coordinator: Coordinator<'a>,
}

impl<'a> MutationContext<'a> {
    #[must_use]
    pub fn new(state: &'a State, target: &'a dyn Target, ledger: &'a Ledger) -> Self {
        Self {
            state,
            target,
            coordinator: Coordinator::new(ledger),
        }
    }

    /// State of the running mutation
    #[inline]
    #[must_use]
    pub fn state(&self) -> &State {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> &dyn Target {
        self.target
    }

    /// Run one statement against the target
    ///
    /// # Errors
    /// Returns the target's fault.
    #[inline]
    pub fn execute(&self, statement: &str) -> anyhow::Result<()> {
        self.target.execute(statement)
    }

    #[inline]
    #[must_use]
    pub fn coordinator(&self) -> &Coordinator<'a> {
        &self.coordinator
    }

    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &'a Ledger {
        self.coordinator.ledger()
    }

    pub fn info(&self, message: &str) {
        tracing::info!(state = %self.state, "{message}");
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!(state = %self.state, "{message}");
    }

    pub fn error(&self, message: &str) {
        tracing::error!(state = %self.state, "{message}");
    }
}
