use crate::config::{StoreConfig, API_VERSION};
use crate::error::{Result, StoreError};
use crate::ContentStore;
use async_trait::async_trait;
use phenoflow_protocol::{
    CommitRecord, ContentEntry, Contents, FileDelete, FileWrite, NewRepository, RepositoryMeta,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;

const PAGE_SIZE: usize = 100;
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// [`ContentStore`] backed by the GitHub REST API.
pub struct GitHubStore {
    client: Client,
    config: StoreConfig,
    base: Url,
}

#[derive(Deserialize)]
struct PutFileResponse {
    content: Option<PutFileContent>,
}

#[derive(Deserialize)]
struct PutFileContent {
    sha: String,
}

#[derive(Deserialize)]
struct CommitEnvelope {
    sha: String,
    commit: CommitBody,
}

#[derive(Deserialize)]
struct CommitBody {
    message: String,
    author: Option<CommitAuthor>,
}

#[derive(Deserialize)]
struct CommitAuthor {
    name: String,
}

impl From<CommitEnvelope> for CommitRecord {
    fn from(envelope: CommitEnvelope) -> Self {
        Self {
            sha: envelope.sha,
            message: envelope.commit.message,
            author_name: envelope
                .commit
                .author
                .map(|author| author.name)
                .unwrap_or_default(),
        }
    }
}

impl GitHubStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let base = Url::parse(&config.api_url)
            .map_err(|err| StoreError::InvalidConfig(format!("{}: {err}", config.api_url)))?;
        if base.cannot_be_a_base() {
            return Err(StoreError::InvalidConfig(format!(
                "{} cannot be used as an API base",
                config.api_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token)).map_err(|_| {
            StoreError::InvalidConfig("auth token contains invalid header characters".to_string())
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|err| StoreError::InvalidConfig(format!("http client: {err}")))?;

        Ok(Self {
            client,
            config,
            base,
        })
    }

    pub fn owner(&self) -> &str {
        &self.config.owner
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidConfig(format!("bad API base {}", self.base)))?
            .pop_if_empty()
            .extend(segments.into_iter().filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    fn repo_endpoint(&self, repo: &str, tail: &[&str]) -> Result<Url> {
        let owner = self.config.owner.as_str();
        self.endpoint(["repos", owner, repo].into_iter().chain(tail.iter().copied()))
    }

    fn contents_endpoint(&self, repo: &str, path: &str) -> Result<Url> {
        let owner = self.config.owner.as_str();
        self.endpoint(
            ["repos", owner, repo, "contents"]
                .into_iter()
                .chain(path.split('/')),
        )
    }

    async fn bounded<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.config.timeout, call)
            .await
            .map_err(|_| StoreError::Timeout {
                operation: operation.to_string(),
                after: self.config.timeout,
            })?
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        log::debug!("store call: {operation}");
        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                StoreError::Timeout {
                    operation: operation.to_string(),
                    after: self.config.timeout,
                }
            } else {
                StoreError::unavailable(format!("{operation}: {err}"))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(operation, status, &body))
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        self.bounded(operation, async {
            let response = self.send(operation, request).await?;
            response
                .json::<T>()
                .await
                .map_err(|err| StoreError::Decode(format!("{operation}: {err}")))
        })
        .await
    }

    async fn execute(&self, operation: &str, request: RequestBuilder) -> Result<()> {
        self.bounded(operation, async {
            self.send(operation, request).await.map(|_| ())
        })
        .await
    }

    async fn paginate<T: DeserializeOwned>(&self, operation: &str, url: Url) -> Result<Vec<T>> {
        let mut all = Vec::new();
        let mut page = 1usize;
        loop {
            let mut page_url = url.clone();
            page_url
                .query_pairs_mut()
                .append_pair("per_page", &PAGE_SIZE.to_string())
                .append_pair("page", &page.to_string());
            let batch: Vec<T> = self
                .fetch_json(operation, self.client.get(page_url))
                .await?;
            let exhausted = batch.len() < PAGE_SIZE;
            all.extend(batch);
            if exhausted {
                return Ok(all);
            }
            page += 1;
        }
    }
}

fn classify_status(operation: &str, status: StatusCode, body: &str) -> StoreError {
    let detail = format!("{operation}: HTTP {status}: {}", summarize_body(body));
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(detail),
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::PRECONDITION_FAILED => {
            StoreError::Conflict(detail)
        }
        _ => StoreError::Unavailable(detail),
    }
}

fn summarize_body(body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("message")?.as_str().map(str::to_string));
    match message {
        Some(message) => message,
        None => body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect(),
    }
}

#[async_trait]
impl ContentStore for GitHubStore {
    async fn create_repository(&self, repository: &NewRepository) -> Result<RepositoryMeta> {
        let url = self.endpoint(["orgs", self.config.owner.as_str(), "repos"])?;
        self.fetch_json("create repository", self.client.post(url).json(repository))
            .await
    }

    async fn delete_repository(&self, name: &str) -> Result<()> {
        let url = self.repo_endpoint(name, &[])?;
        self.execute("delete repository", self.client.delete(url))
            .await
    }

    async fn get_repository(&self, name: &str) -> Result<RepositoryMeta> {
        let url = self.repo_endpoint(name, &[])?;
        self.fetch_json("get repository", self.client.get(url)).await
    }

    async fn list_repositories(&self) -> Result<Vec<RepositoryMeta>> {
        let url = self.endpoint(["orgs", self.config.owner.as_str(), "repos"])?;
        self.paginate("list repositories", url).await
    }

    async fn get_contents(&self, repo: &str, path: &str) -> Result<Contents> {
        let url = self.contents_endpoint(repo, path)?;
        self.fetch_json("get contents", self.client.get(url)).await
    }

    async fn get_readme(&self, repo: &str) -> Result<ContentEntry> {
        let url = self.repo_endpoint(repo, &["readme"])?;
        self.fetch_json("get readme", self.client.get(url)).await
    }

    async fn put_file(&self, repo: &str, path: &str, write: &FileWrite) -> Result<String> {
        let url = self.contents_endpoint(repo, path)?;
        let response: PutFileResponse = self
            .fetch_json("put file", self.client.put(url).json(write))
            .await?;
        response
            .content
            .map(|content| content.sha)
            .ok_or_else(|| StoreError::Decode(format!("put file {repo}/{path}: no content sha")))
    }

    async fn delete_file(&self, repo: &str, path: &str, delete: &FileDelete) -> Result<()> {
        let url = self.contents_endpoint(repo, path)?;
        self.execute("delete file", self.client.delete(url).json(delete))
            .await
    }

    async fn list_commits(&self, repo: &str) -> Result<Vec<CommitRecord>> {
        let url = self.repo_endpoint(repo, &["commits"])?;
        match self.paginate::<CommitEnvelope>("list commits", url).await {
            Ok(commits) => Ok(commits.into_iter().map(CommitRecord::from).collect()),
            // An empty repository has no history and answers 409.
            Err(StoreError::Conflict(_)) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    async fn rate_limit(&self) -> Result<serde_json::Value> {
        let url = self.endpoint(["rate_limit"])?;
        self.fetch_json("rate limit", self.client.get(url)).await
    }
}
