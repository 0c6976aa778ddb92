use crate::documents::README_COMMIT_MESSAGE;
use crate::error::{CoreError, Result};
use phenoflow_store::ContentStore;

/// Decides authorship by replaying commit history: the author of a
/// phenotype is whoever made the initial README commit. Names are compared
/// exactly; there is no identity beyond the committer name.
pub struct AuthorGate<'a> {
    store: &'a dyn ContentStore,
}

impl<'a> AuthorGate<'a> {
    pub fn new(store: &'a dyn ContentStore) -> Self {
        Self { store }
    }

    pub async fn is_author(&self, repo: &str, author: &str) -> Result<bool> {
        if author.is_empty() {
            return Ok(false);
        }
        let commits = self.store.list_commits(repo).await?;
        Ok(commits
            .iter()
            .any(|commit| commit.message == README_COMMIT_MESSAGE && commit.author_name == author))
    }

    /// Fails with `Unauthorized` unless `author` created `repo`.
    pub async fn authorize(&self, repo: &str, author: &str) -> Result<()> {
        if self.is_author(repo, author).await? {
            Ok(())
        } else {
            Err(CoreError::Unauthorized {
                repo: repo.to_string(),
                author: author.to_string(),
            })
        }
    }
}
