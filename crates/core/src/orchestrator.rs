use crate::documents::{
    created_message, deleted_message, render_readme, repository_description, updated_message,
    LICENSE_COMMIT_MESSAGE, LICENSE_PATH, LICENSE_TEXT, README_COMMIT_MESSAGE, README_PATH,
};
use crate::error::{CoreError, Result};
use crate::gate::AuthorGate;
use phenoflow_locator::codec;
use phenoflow_protocol::{
    BulkDelete, Committer, FileDelete, FileLocator, FileWrite, NewFile, NewPhenotype,
    NewRepository, RepositoryMeta,
};
use phenoflow_store::ContentStore;
use std::collections::HashSet;

/// Undo action registered by a completed step.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Compensation {
    DeleteRepository(String),
    DeleteFile {
        repo: String,
        path: String,
        sha: String,
    },
}

/// Compensation log for one multi-step operation. Dropping it without
/// `unwind` keeps everything that was done.
struct Saga<'a> {
    store: &'a dyn ContentStore,
    committer: &'a Committer,
    compensations: Vec<Compensation>,
}

impl<'a> Saga<'a> {
    fn new(store: &'a dyn ContentStore, committer: &'a Committer) -> Self {
        Self {
            store,
            committer,
            compensations: Vec::new(),
        }
    }

    fn register(&mut self, compensation: Compensation) {
        self.compensations.push(compensation);
    }

    /// Runs compensations newest first. Their failures are logged; the
    /// caller still reports the error that triggered the unwind.
    async fn unwind(self) {
        for compensation in self.compensations.into_iter().rev() {
            let outcome = match &compensation {
                Compensation::DeleteRepository(name) => self.store.delete_repository(name).await,
                Compensation::DeleteFile { repo, path, sha } => {
                    let delete = FileDelete {
                        message: deleted_message(path),
                        committer: self.committer.clone(),
                        sha: sha.clone(),
                    };
                    self.store.delete_file(repo, path, &delete).await
                }
            };
            match outcome {
                Ok(()) => log::info!("Compensated: {compensation:?}"),
                Err(err) => log::warn!("Compensation {compensation:?} failed: {err}"),
            }
        }
    }
}

/// Multi-call mutations: phenotype creation, file writes and deletions,
/// single and bulk.
pub struct PhenotypeOrchestrator<'a> {
    store: &'a dyn ContentStore,
    committer: &'a Committer,
}

impl<'a> PhenotypeOrchestrator<'a> {
    pub fn new(store: &'a dyn ContentStore, committer: &'a Committer) -> Self {
        Self { store, committer }
    }

    fn write(&self, message: String, content: String, sha: Option<String>) -> FileWrite {
        FileWrite {
            message,
            committer: self.committer.clone(),
            content,
            sha,
        }
    }

    /// Repository, README, LICENSE, then the supplied files in order. A
    /// failure after the repository exists deletes it again.
    pub async fn create(&self, phenotype: &NewPhenotype) -> Result<RepositoryMeta> {
        let name = phenotype.name.trim();
        if name.is_empty() {
            return Err(CoreError::invalid_request("phenotype name is empty"));
        }

        let repository = NewRepository::public(
            name,
            repository_description(name, &self.committer.name),
        );
        let meta = self.store.create_repository(&repository).await?;
        let mut saga = Saga::new(self.store, self.committer);
        saga.register(Compensation::DeleteRepository(name.to_string()));

        match self.populate(name, phenotype).await {
            Ok(()) => {
                log::info!("Created {name} phenotype");
                Ok(meta)
            }
            Err(err) => {
                log::error!("Creating {name} failed, rolling back: {err}");
                saga.unwind().await;
                Err(err)
            }
        }
    }

    async fn populate(&self, name: &str, phenotype: &NewPhenotype) -> Result<()> {
        let readme = render_readme(name, &phenotype.about);
        self.store
            .put_file(
                name,
                README_PATH,
                &self.write(README_COMMIT_MESSAGE.to_string(), codec::to_base64(readme), None),
            )
            .await?;
        self.store
            .put_file(
                name,
                LICENSE_PATH,
                &self.write(LICENSE_COMMIT_MESSAGE.to_string(), codec::to_base64(LICENSE_TEXT), None),
            )
            .await?;
        for file in &phenotype.files {
            self.store
                .put_file(
                    name,
                    &file.path,
                    &self.write(created_message(&file.path), file.content.clone(), None),
                )
                .await?;
        }
        Ok(())
    }

    /// Creates phenotypes in order and stops at the first failure. Earlier
    /// phenotypes stay; the failing one is rolled back by [`Self::create`].
    pub async fn create_many(&self, phenotypes: &[NewPhenotype]) -> Result<Vec<RepositoryMeta>> {
        let mut created = Vec::with_capacity(phenotypes.len());
        for phenotype in phenotypes {
            created.push(self.create(phenotype).await?);
        }
        Ok(created)
    }

    /// Writes a new file; `content` is base64. Returns its version token.
    pub async fn create_file(&self, file: &NewFile) -> Result<String> {
        let sha = self
            .store
            .put_file(
                &file.repo,
                &file.path,
                &self.write(created_message(&file.path), file.content.clone(), None),
            )
            .await?;
        log::info!("Created {}/{} file", file.repo, file.path);
        Ok(sha)
    }

    /// All-or-nothing: files written before a failure are deleted again.
    pub async fn create_files(&self, files: &[NewFile]) -> Result<()> {
        let mut saga = Saga::new(self.store, self.committer);
        for file in files {
            match self.create_file(file).await {
                Ok(sha) => saga.register(Compensation::DeleteFile {
                    repo: file.repo.clone(),
                    path: file.path.clone(),
                    sha,
                }),
                Err(err) => {
                    saga.unwind().await;
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Overwrites an existing file with the version token fetched just before.
    pub async fn update_file(&self, file: &NewFile) -> Result<String> {
        let current = self.current_file_sha(&file.repo, &file.path).await?;
        let sha = self
            .store
            .put_file(
                &file.repo,
                &file.path,
                &self.write(updated_message(&file.path), file.content.clone(), Some(current)),
            )
            .await?;
        log::info!("Updated {}/{} file", file.repo, file.path);
        Ok(sha)
    }

    pub async fn delete_file(&self, file: &FileLocator) -> Result<()> {
        let sha = self.current_file_sha(&file.repo, &file.path).await?;
        let delete = FileDelete {
            message: deleted_message(&file.path),
            committer: self.committer.clone(),
            sha,
        };
        self.store.delete_file(&file.repo, &file.path, &delete).await?;
        log::info!("Deleted {}/{} file", file.repo, file.path);
        Ok(())
    }

    /// Deletes in order, stopping at the first failure.
    pub async fn delete_files(&self, files: &[FileLocator]) -> Result<()> {
        for file in files {
            self.delete_file(file).await?;
        }
        Ok(())
    }

    async fn current_file_sha(&self, repo: &str, path: &str) -> Result<String> {
        self.store
            .get_contents(repo, path)
            .await?
            .into_file()
            .map(|entry| entry.sha)
            .ok_or_else(|| CoreError::invalid_request(format!("{repo}/{path} is a directory")))
    }

    pub async fn delete_phenotype(&self, name: &str, author: &str) -> Result<()> {
        AuthorGate::new(self.store).authorize(name, author).await?;
        self.store.delete_repository(name).await?;
        log::info!("Deleted {name} phenotype");
        Ok(())
    }

    /// Deletes the named phenotypes, or every phenotype when none are named.
    /// Names repeated in any case count once. Every target is authorized
    /// before the first deletion.
    pub async fn delete_phenotypes(&self, request: &BulkDelete) -> Result<Vec<String>> {
        let targets = if request.repos.is_empty() {
            self.store
                .list_repositories()
                .await?
                .into_iter()
                .map(|repo| repo.name)
                .collect::<Vec<_>>()
        } else {
            let mut names = Vec::with_capacity(request.repos.len());
            let mut seen = HashSet::new();
            for name in &request.repos {
                let canonical = self.store.get_repository(name).await?.name;
                if seen.insert(canonical.to_lowercase()) {
                    names.push(canonical);
                }
            }
            names
        };

        let gate = AuthorGate::new(self.store);
        for name in &targets {
            gate.authorize(name, &request.author).await?;
        }
        for name in &targets {
            self.store.delete_repository(name).await?;
            log::info!("Deleted {name} phenotype");
        }
        Ok(targets)
    }

    /// Deletes every repository of the organization not named in `keep`.
    /// Returns the listing taken before deleting.
    pub async fn delete_all(&self, keep: &[String]) -> Result<Vec<RepositoryMeta>> {
        let repositories = self.store.list_repositories().await?;
        for repo in &repositories {
            if keep.iter().any(|kept| *kept == repo.name) {
                continue;
            }
            self.store.delete_repository(&repo.name).await?;
            log::info!("Deleted {} phenotype", repo.name);
        }
        Ok(repositories)
    }
}
