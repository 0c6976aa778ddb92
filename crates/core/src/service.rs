use crate::documents::{read_description, write_description, DESCRIPTION_COMMIT_MESSAGE};
use crate::error::{CoreError, Result};
use crate::gate::AuthorGate;
use crate::orchestrator::PhenotypeOrchestrator;
use crate::seed;
use crate::steps::{StepNumber, StepResolver};
use crate::walker::ContentTreeWalker;
use phenoflow_locator::{codec, HexDocument};
use phenoflow_protocol::{
    BulkDelete, Committer, ContentEntry, Contents, FileLocator, FileWrite, NewFile, NewPhenotype,
    PhenotypeQuery, RepositoryMeta,
};
use phenoflow_store::ContentStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Repository that hosts the server itself and survives `delete_all`.
pub const DEFAULT_KEEP_REPOSITORY: &str = "phenoflow-server";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Identity on every commit; its name also signs repository descriptions.
    pub committer: Committer,
    pub keep_repositories: Vec<String>,
    pub seed_path: Option<PathBuf>,
}

impl ServiceConfig {
    pub fn new(committer: Committer) -> Self {
        Self {
            committer,
            keep_repositories: vec![DEFAULT_KEEP_REPOSITORY.to_string()],
            seed_path: None,
        }
    }
}

/// `GET /file/contents` result: decoded text for a file, the listing for a
/// directory.
#[derive(Debug, Clone, PartialEq)]
pub enum FileView {
    Text(String),
    Listing(Vec<ContentEntry>),
}

/// Every operation of the HTTP surface, over a shared store.
#[derive(Clone)]
pub struct Phenoflow {
    store: Arc<dyn ContentStore>,
    config: Arc<ServiceConfig>,
}

impl Phenoflow {
    pub fn new(store: Arc<dyn ContentStore>, config: ServiceConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn orchestrator(&self) -> PhenotypeOrchestrator<'_> {
        PhenotypeOrchestrator::new(self.store.as_ref(), &self.config.committer)
    }

    fn steps(&self) -> StepResolver<'_> {
        StepResolver::new(self.store.as_ref())
    }

    pub async fn rate_limit(&self) -> Result<serde_json::Value> {
        Ok(self.store.rate_limit().await?)
    }

    /// All phenotypes, narrowed by a name substring and then by creator. A
    /// filter that leaves nothing is reported as not found.
    pub async fn list_phenotypes(&self, query: &PhenotypeQuery) -> Result<Vec<RepositoryMeta>> {
        let mut phenotypes = self.store.list_repositories().await?;

        if let Some(name) = &query.name {
            phenotypes.retain(|repo| repo.name.contains(name.as_str()));
            if phenotypes.is_empty() {
                return Err(CoreError::not_found(format!("no phenotype name contains {name:?}")));
            }
        }

        if let Some(author) = &query.author {
            let gate = AuthorGate::new(self.store.as_ref());
            let mut authored = Vec::new();
            for repo in phenotypes {
                if gate.is_author(&repo.name, author).await? {
                    authored.push(repo);
                }
            }
            if authored.is_empty() {
                return Err(CoreError::not_found(format!("no phenotype created by {author:?}")));
            }
            phenotypes = authored;
        }

        Ok(phenotypes)
    }

    pub async fn phenotype(&self, name: &str) -> Result<RepositoryMeta> {
        Ok(self.store.get_repository(name).await?)
    }

    pub async fn phenotype_contents(&self, name: &str) -> Result<Vec<ContentEntry>> {
        ContentTreeWalker::new(self.store.as_ref())
            .walk_repository(name)
            .await
    }

    async fn readme(&self, name: &str) -> Result<(ContentEntry, HexDocument)> {
        let readme = self.store.get_readme(name).await?;
        let content = readme
            .content
            .as_deref()
            .ok_or_else(|| CoreError::malformed(&readme.path, "readme has no content"))?;
        let document = HexDocument::from_base64(content)?;
        Ok((readme, document))
    }

    pub async fn description(&self, name: &str) -> Result<String> {
        let (_, document) = self.readme(name).await?;
        read_description(&document)
    }

    pub async fn set_description(&self, name: &str, description: &str) -> Result<()> {
        let (readme, mut document) = self.readme(name).await?;
        write_description(&mut document, description)?;
        let write = FileWrite {
            message: DESCRIPTION_COMMIT_MESSAGE.to_string(),
            committer: self.config.committer.clone(),
            content: document.to_base64()?,
            sha: Some(readme.sha),
        };
        self.store.put_file(name, &readme.path, &write).await?;
        log::info!("Updated {name} description");
        Ok(())
    }

    pub async fn step(&self, repo: &str, step: StepNumber) -> Result<ContentEntry> {
        self.steps().step_file(repo, step).await
    }

    pub async fn step_contents(&self, repo: &str, step: StepNumber) -> Result<String> {
        self.steps().step_contents(repo, step).await
    }

    pub async fn step_description(&self, repo: &str, step: StepNumber) -> Result<String> {
        self.steps().step_description(repo, step).await
    }

    pub async fn set_step_description(
        &self,
        repo: &str,
        step: StepNumber,
        description: &str,
    ) -> Result<()> {
        self.steps()
            .set_step_description(repo, step, description, &self.config.committer)
            .await
    }

    pub async fn step_implementations(
        &self,
        repo: &str,
        step: StepNumber,
    ) -> Result<Vec<ContentEntry>> {
        self.steps().step_implementations(repo, step).await
    }

    pub async fn file(&self, file: &FileLocator) -> Result<Contents> {
        Ok(self.store.get_contents(&file.repo, &file.path).await?)
    }

    pub async fn file_contents(&self, file: &FileLocator) -> Result<FileView> {
        match self.file(file).await? {
            Contents::Directory(entries) => Ok(FileView::Listing(entries)),
            Contents::File(entry) => match entry.content {
                Some(content) => {
                    let bytes = codec::decode_base64(content)?;
                    Ok(FileView::Text(String::from_utf8_lossy(&bytes).into_owned()))
                }
                None => Ok(FileView::Listing(vec![entry])),
            },
        }
    }

    pub async fn create_phenotype(&self, phenotype: &NewPhenotype) -> Result<RepositoryMeta> {
        self.orchestrator().create(phenotype).await
    }

    pub async fn create_file(&self, file: &NewFile) -> Result<String> {
        self.orchestrator().create_file(file).await
    }

    pub async fn create_files(&self, files: &[NewFile]) -> Result<()> {
        self.orchestrator().create_files(files).await
    }

    pub async fn update_file(&self, file: &NewFile) -> Result<String> {
        self.orchestrator().update_file(file).await
    }

    pub async fn delete_file(&self, file: &FileLocator) -> Result<()> {
        self.orchestrator().delete_file(file).await
    }

    pub async fn delete_files(&self, files: &[FileLocator]) -> Result<()> {
        self.orchestrator().delete_files(files).await
    }

    pub async fn delete_phenotype(&self, name: &str, author: &str) -> Result<()> {
        self.orchestrator().delete_phenotype(name, author).await
    }

    pub async fn delete_phenotypes(&self, request: &BulkDelete) -> Result<Vec<String>> {
        self.orchestrator().delete_phenotypes(request).await
    }

    pub async fn delete_all(&self) -> Result<Vec<RepositoryMeta>> {
        self.orchestrator()
            .delete_all(&self.config.keep_repositories)
            .await
    }

    /// Creates every seed phenotype missing from the organization, in seed
    /// order. Returns the names created.
    pub async fn initialise(&self, phenotypes: &[NewPhenotype]) -> Result<Vec<String>> {
        let existing = self.store.list_repositories().await?;
        let pending: Vec<NewPhenotype> = seed::pending(phenotypes, &existing)
            .into_iter()
            .cloned()
            .collect();
        self.orchestrator().create_many(&pending).await?;
        log::info!("Initialised {} phenotypes", pending.len());
        Ok(pending.into_iter().map(|phenotype| phenotype.name).collect())
    }

    /// [`Self::initialise`] with the seed file named in the configuration.
    pub async fn initialise_from_seed(&self) -> Result<Vec<String>> {
        let path = self
            .config
            .seed_path
            .as_deref()
            .ok_or_else(|| CoreError::Config("no seed file configured".to_string()))?;
        let phenotypes = seed::load_seed(path)?;
        self.initialise(&phenotypes).await
    }
}
