//! Request bodies accepted by the HTTP surface.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct PhenotypeQuery {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StepRequest {
    pub repo: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StepDescriptionUpdate {
    pub repo: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FileLocator {
    pub repo: String,
    pub path: String,
}

/// A file to write; `content` is base64.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NewFile {
    pub repo: String,
    pub path: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PhenotypeFile {
    pub path: String,
    pub content: String,
}

/// Body of `POST /phenotype`, also the record shape of the seed file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NewPhenotype {
    pub name: String,
    pub about: String,
    #[serde(default)]
    pub files: Vec<PhenotypeFile>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DescriptionUpdate {
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AuthorClaim {
    pub author: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BulkDelete {
    pub author: String,
    #[serde(default)]
    pub repos: Vec<String>,
}
