use crate::error::{CoreError, Result};
use crate::walker::ContentTreeWalker;
use phenoflow_locator::{codec, HexDocument, LocatorError, MarkerPosition};
use phenoflow_protocol::{Committer, ContentEntry, FileWrite};
use phenoflow_store::ContentStore;
use std::fmt;
use std::str::FromStr;

pub const WORKFLOW_EXTENSION: &str = ".cwl";
pub const IMPLEMENTATION_EXTENSIONS: [&str; 2] = [".js", ".py"];

pub const STEP_DESCRIPTION_START: &str = "doc: ";
pub const STEP_DESCRIPTION_END: &str = "\nid: ";

/// Steps written by one connector reference a `-disc` document while their
/// implementations carry the plain name.
const DISC_STEP: &str = "read-potential-cases-disc.cwl";
const DISC_STEP_IMPLEMENTATION: &str = "read-potential-cases.cwl";

/// 1-based step index within a workflow document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepNumber(u32);

impl StepNumber {
    pub fn new(number: u32) -> Result<Self> {
        if number == 0 {
            return Err(CoreError::invalid_request("step numbers start at 1"));
        }
        Ok(Self(number))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Start markers for this step's `run:` line, LF first then CRLF.
    fn run_markers(self) -> [String; 2] {
        [
            format!("'{}':\n    run: ", self.0),
            format!("'{}':\r\n    run: ", self.0),
        ]
    }
}

impl FromStr for StepNumber {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self> {
        let number = raw
            .trim()
            .parse::<u32>()
            .map_err(|_| CoreError::invalid_request(format!("invalid step number {raw:?}")))?;
        Self::new(number)
    }
}

impl fmt::Display for StepNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Root workflow document of a phenotype: `<repo>.cwl`.
pub fn workflow_path(repo: &str) -> String {
    format!("{repo}{WORKFLOW_EXTENSION}")
}

pub fn step_description_message(step: StepNumber) -> String {
    format!("Updated step {step} description.")
}

/// Names the implementation files of a step may carry, in extension order.
pub fn implementation_names(target_path: &str) -> Vec<String> {
    let base = target_path.rsplit('/').next().unwrap_or(target_path);
    let base = if base == DISC_STEP {
        DISC_STEP_IMPLEMENTATION
    } else {
        base
    };
    let stem = base.strip_suffix(WORKFLOW_EXTENSION).unwrap_or(base);
    IMPLEMENTATION_EXTENSIONS
        .iter()
        .map(|extension| format!("{stem}{extension}"))
        .collect()
}

/// Resolves a step number to the document it delegates to, and from there
/// to its description or implementation files.
pub struct StepResolver<'a> {
    store: &'a dyn ContentStore,
}

impl<'a> StepResolver<'a> {
    pub fn new(store: &'a dyn ContentStore) -> Self {
        Self { store }
    }

    async fn fetch_file(&self, repo: &str, path: &str) -> Result<ContentEntry> {
        self.store
            .get_contents(repo, path)
            .await?
            .into_file()
            .ok_or_else(|| CoreError::malformed(path, "expected a file, found a directory"))
    }

    fn document(entry: &ContentEntry) -> Result<HexDocument> {
        let content = entry
            .content
            .as_deref()
            .ok_or_else(|| CoreError::malformed(&entry.path, "file has no content"))?;
        Ok(HexDocument::from_base64(content)?)
    }

    /// Path of the document step `step` runs, extension included.
    pub async fn step_path(&self, repo: &str, step: StepNumber) -> Result<String> {
        let root = workflow_path(repo);
        let workflow = Self::document(&self.fetch_file(repo, &root).await?)?;

        let [lf, crlf] = step.run_markers();
        let target = match workflow.extract(&lf, WORKFLOW_EXTENSION, MarkerPosition::Include) {
            Err(LocatorError::RegionNotFound { .. }) => {
                workflow.extract(&crlf, WORKFLOW_EXTENSION, MarkerPosition::Include)?
            }
            other => other?,
        };
        if target.contains('\n') {
            return Err(CoreError::malformed(
                root,
                format!("step {step} target spans several lines"),
            ));
        }
        Ok(target.trim().to_string())
    }

    pub async fn step_file(&self, repo: &str, step: StepNumber) -> Result<ContentEntry> {
        let path = self.step_path(repo, step).await?;
        self.fetch_file(repo, &path).await
    }

    pub async fn step_contents(&self, repo: &str, step: StepNumber) -> Result<String> {
        let file = self.step_file(repo, step).await?;
        let bytes = codec::decode(Self::document(&file)?.as_hex())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn step_description(&self, repo: &str, step: StepNumber) -> Result<String> {
        let file = self.step_file(repo, step).await?;
        Ok(Self::document(&file)?.extract(
            STEP_DESCRIPTION_START,
            STEP_DESCRIPTION_END,
            MarkerPosition::Exclude,
        )?)
    }

    /// Rewrites the step description in place, guarded by the version token
    /// of the fetched step file.
    pub async fn set_step_description(
        &self,
        repo: &str,
        step: StepNumber,
        description: &str,
        committer: &Committer,
    ) -> Result<()> {
        let path = self.step_path(repo, step).await?;
        let file = self.fetch_file(repo, &path).await?;
        let mut document = Self::document(&file)?;
        document.rewrite(STEP_DESCRIPTION_START, STEP_DESCRIPTION_END, description)?;

        let write = FileWrite {
            message: step_description_message(step),
            committer: committer.clone(),
            content: document.to_base64()?,
            sha: Some(file.sha),
        };
        self.store.put_file(repo, &path, &write).await?;
        log::info!("Updated {repo}/{path} step {step} description");
        Ok(())
    }

    /// JavaScript and Python files named after the step document, at most
    /// one per extension. Missing extensions are skipped.
    pub async fn step_implementations(
        &self,
        repo: &str,
        step: StepNumber,
    ) -> Result<Vec<ContentEntry>> {
        let files = ContentTreeWalker::new(self.store)
            .walk_repository(repo)
            .await?;
        let target = self.step_path(repo, step).await?;

        let mut implementations = Vec::new();
        for name in implementation_names(&target) {
            if let Some(found) = files.iter().find(|file| file.name == name) {
                implementations.push(self.fetch_file(repo, &found.path).await?);
            }
        }
        Ok(implementations)
    }
}
