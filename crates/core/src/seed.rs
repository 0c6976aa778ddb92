//! Static phenotype list used to bootstrap an empty organization.

use crate::error::{CoreError, Result};
use phenoflow_protocol::{NewPhenotype, RepositoryMeta};
use std::collections::HashSet;
use std::path::Path;

pub fn load_seed(path: &Path) -> Result<Vec<NewPhenotype>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| CoreError::Config(format!("reading seed {}: {err}", path.display())))?;
    parse_seed(&raw)
        .map_err(|err| CoreError::Config(format!("parsing seed {}: {err}", path.display())))
}

pub fn parse_seed(raw: &str) -> serde_json::Result<Vec<NewPhenotype>> {
    serde_json::from_str(raw)
}

/// Seed entries whose name, ignoring case, is neither in the organization
/// nor repeated earlier in the seed.
pub fn pending<'a>(seed: &'a [NewPhenotype], existing: &[RepositoryMeta]) -> Vec<&'a NewPhenotype> {
    let mut taken: HashSet<String> = existing
        .iter()
        .map(|repo| repo.name.to_lowercase())
        .collect();
    seed.iter()
        .filter(|phenotype| taken.insert(phenotype.name.to_lowercase()))
        .collect()
}
