//! Per-client exercise exclusions loader.
//!
//! The exclusions file is a JSON object mapping client ids to the exercise ids
//! that client must never be given (injuries, dislikes, missing mobility).

use crate::Result;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Exclusions file format
type ExclusionsFile = HashMap<String, Vec<String>>;

/// Load the exclusion set for one client
///
/// A missing file, an unreadable or malformed file, or an unknown client all
/// yield an empty set: generation then simply runs without exclusions.
pub fn load_client_exclusions(path: &Path, client_id: &str) -> Result<BTreeSet<String>> {
    if !path.exists() {
        tracing::debug!("No exclusions file found at {:?}", path);
        return Ok(BTreeSet::new());
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(
                "Failed to read exclusions at {:?}: {}. Ignoring exclusions.",
                path,
                e
            );
            return Ok(BTreeSet::new());
        }
    };

    let file: ExclusionsFile = match serde_json::from_str(&contents) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(
                "Failed to parse exclusions at {:?}: {}. Ignoring exclusions.",
                path,
                e
            );
            return Ok(BTreeSet::new());
        }
    };

    let exclusions: BTreeSet<String> = file
        .get(client_id)
        .into_iter()
        .flatten()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    tracing::info!(
        "Loaded {} exclusions for client '{}'",
        exclusions.len(),
        client_id
    );

    Ok(exclusions)
}
