use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod requests;

pub use requests::{
    AuthorClaim, BulkDelete, DescriptionUpdate, FileLocator, NewFile, NewPhenotype, PhenotypeFile,
    PhenotypeQuery, StepDescriptionUpdate, StepRequest,
};

/// Node kind as reported by the content store listing.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Dir,
    Symlink,
    Submodule,
}

/// A file or directory inside a phenotype repository.
///
/// Fields the server does not interpret are kept in `extra` so the store's
/// metadata passes through the HTTP surface untouched.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Base64 body, only present when a single file was fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentEntry {
    pub fn file(name: impl Into<String>, path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            sha: sha.into(),
            size: 0,
            node_type: NodeType::File,
            content: None,
            encoding: None,
            extra: Map::new(),
        }
    }

    pub fn dir(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            node_type: NodeType::Dir,
            ..Self::file(name, path, String::new())
        }
    }

    pub fn is_directory(&self) -> bool {
        self.node_type == NodeType::Dir
    }
}

/// Result of a get-file-or-directory call.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Contents {
    Directory(Vec<ContentEntry>),
    File(ContentEntry),
}

impl Contents {
    pub fn into_file(self) -> Option<ContentEntry> {
        match self {
            Self::File(entry) => Some(entry),
            Self::Directory(_) => None,
        }
    }

    pub fn into_listing(self) -> Vec<ContentEntry> {
        match self {
            Self::Directory(entries) => entries,
            Self::File(entry) => vec![entry],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RepositoryMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RepositoryMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            full_name: None,
            description: None,
            private: false,
            extra: Map::new(),
        }
    }
}

/// One entry of a repository's commit history, newest first.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub sha: String,
    pub message: String,
    pub author_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NewRepository {
    pub name: String,
    pub description: String,
    pub private: bool,
    pub has_issues: bool,
    pub has_projects: bool,
    pub has_wiki: bool,
}

impl NewRepository {
    pub fn public(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            private: false,
            has_issues: true,
            has_projects: true,
            has_wiki: true,
        }
    }
}

/// Create or overwrite a file. `sha` must carry the current version token
/// when the path already exists.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FileWrite {
    pub message: String,
    pub committer: Committer,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FileDelete {
    pub message: String,
    pub committer: Committer,
    pub sha: String,
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}
