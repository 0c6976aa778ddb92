use crate::error::Result;
use phenoflow_protocol::ContentEntry;
use phenoflow_store::ContentStore;
use std::collections::{HashSet, VecDeque};

/// Flattens a repository tree into its files.
///
/// Directories are expanded breadth-first through the store; each directory
/// path is fetched at most once, so a listing that points back at an
/// ancestor cannot loop. The first store failure aborts the walk.
pub struct ContentTreeWalker<'a> {
    store: &'a dyn ContentStore,
}

impl<'a> ContentTreeWalker<'a> {
    pub fn new(store: &'a dyn ContentStore) -> Self {
        Self { store }
    }

    /// Every file of `repo`, starting from the root listing.
    pub async fn walk_repository(&self, repo: &str) -> Result<Vec<ContentEntry>> {
        let root = self.store.get_contents(repo, "").await?.into_listing();
        self.walk(repo, root).await
    }

    pub async fn walk(&self, repo: &str, root: Vec<ContentEntry>) -> Result<Vec<ContentEntry>> {
        let mut queue: VecDeque<ContentEntry> = root.into();
        let mut visited = HashSet::new();
        let mut seen_files = HashSet::new();
        let mut files = Vec::new();

        while let Some(entry) = queue.pop_front() {
            if !entry.is_directory() {
                if seen_files.insert(entry.path.clone()) {
                    files.push(entry);
                }
                continue;
            }
            if !visited.insert(entry.path.clone()) {
                continue;
            }
            log::debug!("walking {repo}/{}", entry.path);
            let children = self
                .store
                .get_contents(repo, &entry.path)
                .await?
                .into_listing();
            queue.extend(children);
        }

        Ok(files)
    }
}
