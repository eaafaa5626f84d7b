//! Mutation discovery
//!
//! Collects script mutations from a directory tree and merges them with the
//! programmatic mutations of a [`MutationRegistry`].

use crate::error::MutagenError;
use crate::mutation::Mutation;
use crate::registry::MutationRegistry;
use crate::resource::{ResourceKind, ResourceName};
use std::path::{Path, PathBuf};

/// Discover every mutation under `location` plus those in `registry`
///
/// Subdirectories are searched; entries starting with `.` are skipped. A
/// `.rs` file is the source of a programmatic mutation and must have a
/// registered callback for its state.
///
/// # Errors
/// Returns a configuration error when the location is missing, a file name
/// breaks the naming convention, or nothing at all is found.
pub fn discover(location: &Path, registry: &MutationRegistry) -> Result<Vec<Mutation>, MutagenError> {
    if !location.is_dir() {
        return Err(MutagenError::configuration(format!(
            "could not find mutations on path \"{}\"",
            location.display()
        )));
    }

    let mut files = Vec::new();
    collect_files(location, &mut files)?;
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut mutations = Vec::new();
    for path in files {
        let shown = path.display().to_string();
        let resource = ResourceName::parse(&shown)?;

        match resource.kind() {
            ResourceKind::Script => {
                tracing::info!(resource = %shown, "found mutation resource");
                let content = std::fs::read(&path).map_err(|e| {
                    MutagenError::configuration(format!("cannot read \"{shown}\": {e}"))
                })?;
                mutations.push(Mutation::script(&shown, &content)?);
            }
            ResourceKind::Programmatic => {
                if !registry.contains(resource.state()) {
                    return Err(MutagenError::configuration(format!(
                        "source \"{shown}\" has no registered mutation for state {}",
                        resource.state()
                    )));
                }
            }
        }
    }

    mutations.extend(registry.mutations());

    if mutations.is_empty() {
        return Err(MutagenError::configuration(format!(
            "no mutations found on path \"{}\"",
            location.display()
        )));
    }

    tracing::debug!(count = mutations.len(), "discovered mutations");
    Ok(mutations)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), MutagenError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        MutagenError::configuration(format!("cannot list \"{}\": {e}", dir.display()))
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            MutagenError::configuration(format!("cannot list \"{}\": {e}", dir.display()))
        })?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        // Symlinked directories are not followed; symlinked files are.
        let file_type = entry.file_type().map_err(|e| {
            MutagenError::configuration(format!("cannot stat \"{}\": {e}", entry.path().display()))
        })?;
        let path = entry.path();
        if file_type.is_dir() {
            collect_files(&path, files)?;
        } else if file_type.is_file() || path.is_file() {
            files.push(path);
        } else {
            tracing::debug!(path = %path.display(), "skipping non-file entry");
        }
    }
    Ok(())
}
