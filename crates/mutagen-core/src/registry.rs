//! Registry of programmatic mutations
//!
//! Programmatic mutations are registered explicitly by the embedding
//! application at start-up instead of being located at runtime.

use crate::error::MutagenError;
use crate::mutation::{Mutation, MutationContext};
use crate::resource::ResourceKind;
use crate::state::State;
use std::collections::BTreeMap;

/// Explicit map from state to programmatic mutation
#[derive(Debug, Default, Clone)]
pub struct MutationRegistry {
    mutations: BTreeMap<State, Mutation>,
}

impl MutationRegistry {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback under `resource` (e.g. `M201508011200_CreateTable_1000.rs`)
    ///
    /// `source` is the text the checksum is derived from; pass the callback's
    /// source (`include_str!`) or any content that changes when it does.
    ///
    /// # Errors
    /// Returns a configuration error for a malformed or non-`.rs` name and a
    /// duplicate-state error when the state is already registered.
    pub fn register<F>(&mut self, resource: &str, source: &str, f: F) -> Result<&mut Self, MutagenError>
    where
        F: Fn(&MutationContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mutation = Mutation::callback(resource, source, f)?;
        if mutation.resource().kind() != ResourceKind::Programmatic {
            return Err(MutagenError::configuration(format!(
                "programmatic mutation \"{resource}\" must use the .rs extension"
            )));
        }
        if self.mutations.contains_key(mutation.state()) {
            return Err(MutagenError::DuplicateState {
                states: vec![mutation.state().clone()],
            });
        }
        tracing::debug!(state = %mutation.state(), resource, "registered mutation");
        self.mutations.insert(mutation.state().clone(), mutation);
        Ok(self)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, state: &State) -> bool {
        self.mutations.contains_key(state)
    }

    /// Registered mutations in ascending state order
    #[must_use]
    pub fn mutations(&self) -> Vec<Mutation> {
        self.mutations.values().cloned().collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}
