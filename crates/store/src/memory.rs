use crate::error::{Result, StoreError};
use crate::ContentStore;
use async_trait::async_trait;
use phenoflow_locator::codec;
use phenoflow_protocol::{
    CommitRecord, ContentEntry, Contents, FileDelete, FileWrite, NewRepository, RepositoryMeta,
};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

const DEFAULT_OWNER: &str = "phenoflow";
const RATE_LIMIT: u64 = 5000;

/// Store operations, used to address injected faults and call counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
    CreateRepository,
    DeleteRepository,
    GetRepository,
    ListRepositories,
    GetContents,
    GetReadme,
    PutFile,
    DeleteFile,
    ListCommits,
    RateLimit,
}

struct StoredFile {
    bytes: Vec<u8>,
    sha: String,
}

struct Repository {
    meta: RepositoryMeta,
    files: BTreeMap<String, StoredFile>,
    /// Newest first.
    commits: Vec<CommitRecord>,
}

struct Fault {
    op: StoreOp,
    target: Option<String>,
    /// Matching calls still let through before this fault trips.
    skip: usize,
}

#[derive(Default)]
struct State {
    /// Keyed by lowercase name; lookups ignore case like the hosted store.
    repositories: BTreeMap<String, Repository>,
    faults: Vec<Fault>,
    /// Calls per operation, faulted ones included.
    calls: HashMap<StoreOp, usize>,
}

/// In-process [`ContentStore`] enforcing the same version-token rules as the
/// hosted store. Backs the test suites and local runs without credentials.
pub struct MemoryStore {
    owner: String,
    state: Mutex<State>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_owner(DEFAULT_OWNER)
    }

    pub fn with_owner(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            state: Mutex::new(State::default()),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Makes the next `op` call fail with [`StoreError::Unavailable`]. With a
    /// target, only a call addressing that repository trips the fault.
    pub fn fail_next(&self, op: StoreOp, target: Option<&str>) {
        self.fail_after(op, target, 0);
    }

    /// Like [`Self::fail_next`], but lets `skip` matching calls succeed first.
    pub fn fail_after(&self, op: StoreOp, target: Option<&str>, skip: usize) {
        self.lock().faults.push(Fault {
            op,
            target: target.map(str::to_lowercase),
            skip,
        });
    }

    pub fn call_count(&self, op: StoreOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn has_repository(&self, name: &str) -> bool {
        self.lock().repositories.contains_key(&name.to_lowercase())
    }

    pub fn repository_names(&self) -> Vec<String> {
        self.lock()
            .repositories
            .values()
            .map(|repo| repo.meta.name.clone())
            .collect()
    }

    pub fn file_text(&self, repo: &str, path: &str) -> Option<String> {
        let state = self.lock();
        let file = state.repositories.get(&repo.to_lowercase())?.files.get(path)?;
        String::from_utf8(file.bytes.clone()).ok()
    }

    pub fn file_sha(&self, repo: &str, path: &str) -> Option<String> {
        let state = self.lock();
        let file = state.repositories.get(&repo.to_lowercase())?.files.get(path)?;
        Some(file.sha.clone())
    }

    pub fn commits(&self, repo: &str) -> Vec<CommitRecord> {
        self.lock()
            .repositories
            .get(&repo.to_lowercase())
            .map(|repo| repo.commits.clone())
            .unwrap_or_default()
    }

    /// Writes `text` at `path` as a commit by `author`, creating the
    /// repository when missing. Bypasses token checks and faults.
    pub fn seed(&self, repo: &str, path: &str, text: &str, author: &str) {
        let mut state = self.lock();
        let owner = self.owner.clone();
        let entry = state
            .repositories
            .entry(repo.to_lowercase())
            .or_insert_with(|| Repository::new(&owner, repo, ""));
        let action = if entry.files.contains_key(path) {
            "Updated"
        } else {
            "Created"
        };
        entry.write(path, text.as_bytes().to_vec());
        entry.record_commit(&format!("{action} {path}"), author);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("memory store mutex poisoned")
    }

    fn enter(&self, op: StoreOp, target: &str) -> Result<std::sync::MutexGuard<'_, State>> {
        let mut state = self.lock();
        let target = target.to_lowercase();
        *state.calls.entry(op).or_default() += 1;
        let matching = state.faults.iter().position(|fault| {
            fault.op == op && fault.target.as_ref().map_or(true, |t| *t == target)
        });
        if let Some(index) = matching {
            if state.faults[index].skip > 0 {
                state.faults[index].skip -= 1;
            } else {
                state.faults.remove(index);
                return Err(StoreError::unavailable(format!(
                    "injected {op:?} failure for {target}"
                )));
            }
        }
        Ok(state)
    }
}

impl Repository {
    fn new(owner: &str, name: &str, description: &str) -> Self {
        let mut meta = RepositoryMeta::named(name);
        meta.full_name = Some(format!("{owner}/{name}"));
        meta.description = Some(description.to_string());
        Self {
            meta,
            files: BTreeMap::new(),
            commits: Vec::new(),
        }
    }

    fn write(&mut self, path: &str, bytes: Vec<u8>) -> String {
        let sha = blob_sha(&bytes);
        self.files.insert(
            path.to_string(),
            StoredFile {
                bytes,
                sha: sha.clone(),
            },
        );
        sha
    }

    fn record_commit(&mut self, message: &str, author: &str) {
        let parent = self
            .commits
            .first()
            .map(|commit| commit.sha.as_str())
            .unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(parent.as_bytes());
        hasher.update(message.as_bytes());
        hasher.update(author.as_bytes());
        hasher.update(self.commits.len().to_le_bytes());
        self.commits.insert(
            0,
            CommitRecord {
                sha: hex::encode(hasher.finalize()),
                message: message.to_string(),
                author_name: author.to_string(),
            },
        );
    }

    fn file_entry(&self, path: &str, with_content: bool) -> Option<ContentEntry> {
        let stored = self.files.get(path)?;
        let name = path.rsplit('/').next().unwrap_or(path);
        let mut entry = ContentEntry::file(name, path, stored.sha.clone());
        entry.size = stored.bytes.len() as u64;
        if with_content {
            entry.content = Some(codec::to_base64(&stored.bytes));
            entry.encoding = Some("base64".to_string());
        }
        Some(entry)
    }

    fn is_directory(&self, path: &str) -> bool {
        let prefix = format!("{path}/");
        self.files.keys().any(|file| file.starts_with(&prefix))
    }

    /// Immediate children of `path`, directories inferred from file paths.
    fn listing(&self, path: &str) -> Vec<ContentEntry> {
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        let mut dirs = BTreeSet::new();
        let mut entries = Vec::new();
        for file in self.files.keys().filter(|file| file.starts_with(&prefix)) {
            let rest = &file[prefix.len()..];
            match rest.split_once('/') {
                Some((dir, _)) => {
                    dirs.insert(dir.to_string());
                }
                None => entries.extend(self.file_entry(file, false)),
            }
        }
        entries.extend(
            dirs.into_iter()
                .map(|dir| ContentEntry::dir(dir.clone(), format!("{prefix}{dir}"))),
        );
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }
}

fn blob_sha(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("blob {}\0", bytes.len()).as_bytes());
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn normalize_path(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn missing_repository(name: &str) -> StoreError {
    StoreError::not_found(format!("repository {name}"))
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn create_repository(&self, repository: &NewRepository) -> Result<RepositoryMeta> {
        let mut state = self.enter(StoreOp::CreateRepository, &repository.name)?;
        let key = repository.name.to_lowercase();
        if state.repositories.contains_key(&key) {
            return Err(StoreError::conflict(format!(
                "name {} already exists on this account",
                repository.name
            )));
        }
        let mut created = Repository::new(&self.owner, &repository.name, &repository.description);
        created.meta.private = repository.private;
        let meta = created.meta.clone();
        state.repositories.insert(key, created);
        Ok(meta)
    }

    async fn delete_repository(&self, name: &str) -> Result<()> {
        let mut state = self.enter(StoreOp::DeleteRepository, name)?;
        state
            .repositories
            .remove(&name.to_lowercase())
            .map(|_| ())
            .ok_or_else(|| missing_repository(name))
    }

    async fn get_repository(&self, name: &str) -> Result<RepositoryMeta> {
        let state = self.enter(StoreOp::GetRepository, name)?;
        state
            .repositories
            .get(&name.to_lowercase())
            .map(|repo| repo.meta.clone())
            .ok_or_else(|| missing_repository(name))
    }

    async fn list_repositories(&self) -> Result<Vec<RepositoryMeta>> {
        let state = self.enter(StoreOp::ListRepositories, &self.owner)?;
        Ok(state
            .repositories
            .values()
            .map(|repo| repo.meta.clone())
            .collect())
    }

    async fn get_contents(&self, repo: &str, path: &str) -> Result<Contents> {
        let state = self.enter(StoreOp::GetContents, repo)?;
        let stored = state
            .repositories
            .get(&repo.to_lowercase())
            .ok_or_else(|| missing_repository(repo))?;
        let path = normalize_path(path);
        if path.is_empty() {
            return Ok(Contents::Directory(stored.listing("")));
        }
        if let Some(entry) = stored.file_entry(&path, true) {
            return Ok(Contents::File(entry));
        }
        if stored.is_directory(&path) {
            return Ok(Contents::Directory(stored.listing(&path)));
        }
        Err(StoreError::not_found(format!("{repo}/{path}")))
    }

    async fn get_readme(&self, repo: &str) -> Result<ContentEntry> {
        let state = self.enter(StoreOp::GetReadme, repo)?;
        let stored = state
            .repositories
            .get(&repo.to_lowercase())
            .ok_or_else(|| missing_repository(repo))?;
        stored
            .files
            .keys()
            .filter(|path| !path.contains('/'))
            .find(|path| path.to_lowercase().starts_with("readme"))
            .and_then(|path| stored.file_entry(path, true))
            .ok_or_else(|| StoreError::not_found(format!("readme of {repo}")))
    }

    async fn put_file(&self, repo: &str, path: &str, write: &FileWrite) -> Result<String> {
        let mut state = self.enter(StoreOp::PutFile, repo)?;
        let stored = state
            .repositories
            .get_mut(&repo.to_lowercase())
            .ok_or_else(|| missing_repository(repo))?;
        let path = normalize_path(path);
        if path.is_empty() || stored.is_directory(&path) {
            return Err(StoreError::conflict(format!("{repo}/{path} is a directory")));
        }

        let current = stored.files.get(&path).map(|file| file.sha.as_str());
        match (current, write.sha.as_deref()) {
            (None, None) => {}
            (Some(current), Some(given)) if current == given => {}
            (Some(_), None) => {
                return Err(StoreError::conflict(format!(
                    "{repo}/{path} exists and no version token was supplied"
                )))
            }
            _ => {
                return Err(StoreError::conflict(format!(
                    "{repo}/{path} does not match the supplied version token"
                )))
            }
        }

        let bytes = codec::decode_base64(&write.content)
            .map_err(|err| StoreError::conflict(format!("content of {repo}/{path}: {err}")))?;
        let sha = stored.write(&path, bytes);
        stored.record_commit(&write.message, &write.committer.name);
        Ok(sha)
    }

    async fn delete_file(&self, repo: &str, path: &str, delete: &FileDelete) -> Result<()> {
        let mut state = self.enter(StoreOp::DeleteFile, repo)?;
        let stored = state
            .repositories
            .get_mut(&repo.to_lowercase())
            .ok_or_else(|| missing_repository(repo))?;
        let path = normalize_path(path);
        let current = stored
            .files
            .get(&path)
            .map(|file| file.sha.clone())
            .ok_or_else(|| StoreError::not_found(format!("{repo}/{path}")))?;
        if current != delete.sha {
            return Err(StoreError::conflict(format!(
                "{repo}/{path} does not match the supplied version token"
            )));
        }
        stored.files.remove(&path);
        stored.record_commit(&delete.message, &delete.committer.name);
        Ok(())
    }

    async fn list_commits(&self, repo: &str) -> Result<Vec<CommitRecord>> {
        let state = self.enter(StoreOp::ListCommits, repo)?;
        state
            .repositories
            .get(&repo.to_lowercase())
            .map(|stored| stored.commits.clone())
            .ok_or_else(|| missing_repository(repo))
    }

    async fn rate_limit(&self) -> Result<serde_json::Value> {
        let state = self.enter(StoreOp::RateLimit, &self.owner)?;
        let used = state.calls.values().sum::<usize>() as u64;
        let window = serde_json::json!({
            "limit": RATE_LIMIT,
            "used": used.min(RATE_LIMIT),
            "remaining": RATE_LIMIT.saturating_sub(used),
            "reset": 0,
        });
        Ok(serde_json::json!({
            "resources": { "core": window.clone() },
            "rate": window,
        }))
    }
}
