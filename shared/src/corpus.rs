//! Loading of the policy corpus and the citizen profile table.
//!
//! Both files are optional. A missing file yields an empty collection and a
//! warning; a present but malformed file is an error.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::models::{CitizenProfile, PolicyDocument, ProfileTable};
use crate::Result;

/// Load the ordered policy corpus.
pub fn load_policies(path: &Path) -> Result<Vec<PolicyDocument>> {
    let policies: Vec<PolicyDocument> = load_json_array(path)?;
    info!(path = %path.display(), count = policies.len(), "Loaded policy corpus");
    Ok(policies)
}

/// Load the citizen profile table.
pub fn load_profiles(path: &Path) -> Result<ProfileTable> {
    let profiles: Vec<CitizenProfile> = load_json_array(path)?;
    info!(path = %path.display(), count = profiles.len(), "Loaded citizen profiles");
    Ok(ProfileTable::new(profiles))
}

fn load_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(serde_json::from_str(&contents)?),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "File not found, continuing with an empty collection");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}
