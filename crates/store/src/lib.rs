//! # Phenoflow Store
//!
//! The remote content store seen by the rest of the server: one repository
//! per phenotype, files addressed by path and guarded by version tokens,
//! and a read-only commit history.
//!
//! ```text
//! ContentStore (trait)
//!     │
//!     ├──> GitHubStore   REST client, one bounded call per operation
//!     │
//!     └──> MemoryStore   in-process store with the same token rules
//! ```

mod config;
mod error;
mod github;
mod memory;

pub use config::{StoreConfig, API_VERSION, DEFAULT_API_URL, DEFAULT_TIMEOUT};
pub use error::{Result, StoreError};
pub use github::GitHubStore;
pub use memory::{MemoryStore, StoreOp};

use async_trait::async_trait;
use phenoflow_protocol::{
    CommitRecord, ContentEntry, Contents, FileDelete, FileWrite, NewRepository, RepositoryMeta,
};

/// Operations the server consumes from the hosted content store.
///
/// Mutating file calls carry the caller's version token; a stale token is
/// reported as [`StoreError::Conflict`] and never retried.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn create_repository(&self, repository: &NewRepository) -> Result<RepositoryMeta>;

    async fn delete_repository(&self, name: &str) -> Result<()>;

    async fn get_repository(&self, name: &str) -> Result<RepositoryMeta>;

    async fn list_repositories(&self) -> Result<Vec<RepositoryMeta>>;

    /// File or directory at `path`; an empty path lists the repository root.
    async fn get_contents(&self, repo: &str, path: &str) -> Result<Contents>;

    async fn get_readme(&self, repo: &str) -> Result<ContentEntry>;

    /// Returns the new version token of the written file.
    async fn put_file(&self, repo: &str, path: &str, write: &FileWrite) -> Result<String>;

    async fn delete_file(&self, repo: &str, path: &str, delete: &FileDelete) -> Result<()>;

    /// Commit history, newest first.
    async fn list_commits(&self, repo: &str) -> Result<Vec<CommitRecord>>;

    async fn rate_limit(&self) -> Result<serde_json::Value>;
}
