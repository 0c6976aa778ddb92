use phenoflow_core::{Phenoflow, ServiceConfig};
use phenoflow_locator::codec;
use phenoflow_protocol::Committer;
use phenoflow_server::{router, ERROR_MESSAGE, LIVENESS_MESSAGE};
use phenoflow_store::MemoryStore;
use pretty_assertions::assert_eq;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

const WORKFLOW: &str = "cwlVersion: v1.0\nclass: Workflow\nsteps:\n  '1':\n    run: covid-cough.cwl\n    out: [output]\n";
const STEP: &str = "cwlVersion: v1.0\nclass: CommandLineTool\ndoc: Identify cough\nid: covid-cough\n";

struct Harness {
    base: String,
    client: Client,
    store: Arc<MemoryStore>,
}

impl Harness {
    async fn start(seed_path: Option<PathBuf>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let mut config = ServiceConfig::new(Committer {
            name: "ada".to_string(),
            email: "ada@example.org".to_string(),
        });
        config.seed_path = seed_path;
        let app = router(Phenoflow::new(store.clone(), config));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: Client::new(),
            store,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn create_demo(&self) {
        let response = self
            .client
            .post(self.url("/phenotype"))
            .json(&demo())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

fn demo() -> Value {
    json!({
        "name": "demo",
        "about": "DEMO - a test",
        "files": [
            {"path": "demo.cwl", "content": codec::to_base64(WORKFLOW)},
            {"path": "covid-cough.cwl", "content": codec::to_base64(STEP)},
            {"path": "python/covid-cough.py", "content": codec::to_base64("print('cough')")},
        ]
    })
}

async fn assert_failed(response: reqwest::Response) {
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text().await.unwrap(), ERROR_MESSAGE);
}

#[tokio::test]
async fn liveness_answers_plain_text() {
    let harness = Harness::start(None).await;
    let response = harness.client.get(harness.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), LIVENESS_MESSAGE);
}

#[tokio::test]
async fn description_round_trips_over_http() {
    let harness = Harness::start(None).await;
    harness.create_demo().await;
    let url = harness.url("/phenotype/demo/description");

    let described = harness.client.get(&url).send().await.unwrap();
    assert_eq!(described.text().await.unwrap(), "a test");

    let updated = harness
        .client
        .put(&url)
        .json(&json!({"description": "NEW"}))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status(), StatusCode::OK);

    let described = harness.client.get(&url).send().await.unwrap();
    assert_eq!(described.text().await.unwrap(), "NEW");
}

#[tokio::test]
async fn failures_get_the_generic_body() {
    let harness = Harness::start(None).await;
    harness.create_demo().await;

    let stranger = harness
        .client
        .delete(harness.url("/phenotype/demo"))
        .json(&json!({"author": "mallory"}))
        .send()
        .await
        .unwrap();
    assert_failed(stranger).await;
    assert!(harness.store.has_repository("demo"));

    let malformed = harness
        .client
        .post(harness.url("/phenotype"))
        .header("content-type", "application/json")
        .body("{\"name\":")
        .send()
        .await
        .unwrap();
    assert_failed(malformed).await;

    let missing = harness
        .client
        .get(harness.url("/phenotype/nothing-here"))
        .send()
        .await
        .unwrap();
    assert_failed(missing).await;

    let owner = harness
        .client
        .delete(harness.url("/phenotype/demo"))
        .json(&json!({"author": "ada"}))
        .send()
        .await
        .unwrap();
    assert_eq!(owner.status(), StatusCode::OK);
    assert!(!harness.store.has_repository("demo"));
}

#[tokio::test]
async fn step_endpoints_follow_the_workflow() {
    let harness = Harness::start(None).await;
    harness.create_demo().await;
    let repo = json!({"repo": "demo"});

    let step: Value = harness
        .client
        .get(harness.url("/step/1"))
        .json(&repo)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(step["path"], "covid-cough.cwl");

    let contents = harness
        .client
        .get(harness.url("/step/1/contents"))
        .json(&repo)
        .send()
        .await
        .unwrap();
    assert_eq!(contents.text().await.unwrap(), STEP);

    let updated = harness
        .client
        .put(harness.url("/step/1/description"))
        .json(&json!({"repo": "demo", "description": "Cough lasting a week"}))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status(), StatusCode::OK);

    let description = harness
        .client
        .get(harness.url("/step/1/description"))
        .json(&repo)
        .send()
        .await
        .unwrap();
    assert_eq!(description.text().await.unwrap(), "Cough lasting a week");

    let implementations: Value = harness
        .client
        .get(harness.url("/step/1/implementation"))
        .json(&repo)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(implementations[0]["path"], "python/covid-cough.py");

    for bad in ["/step/0", "/step/first", "/step/-1/contents"] {
        let response = harness
            .client
            .get(harness.url(bad))
            .json(&repo)
            .send()
            .await
            .unwrap();
        assert_failed(response).await;
    }
}

#[tokio::test]
async fn file_endpoints_write_read_and_delete() {
    let harness = Harness::start(None).await;
    harness.create_demo().await;
    let notes = json!({"repo": "demo", "path": "notes/a.txt"});

    let created = harness
        .client
        .post(harness.url("/file"))
        .json(&json!({"repo": "demo", "path": "notes/a.txt", "content": codec::to_base64("first")}))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);

    let updated = harness
        .client
        .put(harness.url("/file"))
        .json(&json!({"repo": "demo", "path": "notes/a.txt", "content": codec::to_base64("second")}))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status(), StatusCode::OK);

    let text = harness
        .client
        .get(harness.url("/file/contents"))
        .json(&notes)
        .send()
        .await
        .unwrap();
    assert_eq!(text.text().await.unwrap(), "second");

    let listing: Value = harness
        .client
        .get(harness.url("/file/contents"))
        .json(&json!({"repo": "demo", "path": "notes"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing[0]["name"], "a.txt");

    let raw: Value = harness
        .client
        .get(harness.url("/file"))
        .json(&notes)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(raw["path"], "notes/a.txt");
    assert_eq!(raw["type"], "file");

    let batch = harness
        .client
        .post(harness.url("/files"))
        .json(&json!([
            {"repo": "demo", "path": "notes/b.txt", "content": codec::to_base64("b")},
            {"repo": "demo", "path": "notes/c.txt", "content": codec::to_base64("c")},
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(batch.status(), StatusCode::OK);
    assert_eq!(harness.store.file_text("demo", "notes/c.txt").as_deref(), Some("c"));

    let removed = harness
        .client
        .delete(harness.url("/files"))
        .json(&json!([
            {"repo": "demo", "path": "notes/b.txt"},
            {"repo": "demo", "path": "notes/c.txt"},
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(removed.status(), StatusCode::OK);

    let removed = harness
        .client
        .delete(harness.url("/file"))
        .json(&notes)
        .send()
        .await
        .unwrap();
    assert_eq!(removed.status(), StatusCode::OK);
    assert_eq!(harness.store.file_text("demo", "notes/a.txt"), None);
    assert_eq!(harness.store.file_text("demo", "notes/b.txt"), None);
}

#[tokio::test]
async fn phenotype_listing_honours_query_filters() {
    let harness = Harness::start(None).await;
    harness.create_demo().await;
    harness.store.seed("demo-copy", "README.md", "# copy", "bob");

    let all: Vec<Value> = harness
        .client
        .get(harness.url("/phenotypes"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let mine: Vec<Value> = harness
        .client
        .get(harness.url("/phenotypes?name=demo&author=ada"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["name"], "demo");

    let nobody = harness
        .client
        .get(harness.url("/phenotypes?author=carol"))
        .send()
        .await
        .unwrap();
    assert_failed(nobody).await;

    let contents: Vec<Value> = harness
        .client
        .get(harness.url("/phenotype/demo/contents"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(contents.len(), 5);
}

#[tokio::test]
async fn rate_reports_the_store_budget() {
    let harness = Harness::start(None).await;
    let rate: Value = harness
        .client
        .get(harness.url("/rate"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(rate["resources"]["core"]["limit"].is_u64());
}

#[tokio::test]
async fn initialise_reads_the_seed_file_once() {
    let dir = tempfile::tempdir().unwrap();
    let seed_path = dir.path().join("phenotypes.json");
    let seed = json!([
        demo(),
        {"name": "asthma", "about": "ASTHMA - wheeze", "files": []},
    ]);
    std::fs::write(&seed_path, seed.to_string()).unwrap();

    let harness = Harness::start(Some(seed_path)).await;
    for _ in 0..2 {
        let response = harness
            .client
            .post(harness.url("/initialise"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(harness.store.repository_names(), vec!["asthma", "demo"]);
}

#[tokio::test]
async fn initialise_without_a_seed_fails() {
    let harness = Harness::start(None).await;
    let response = harness
        .client
        .post(harness.url("/initialise"))
        .send()
        .await
        .unwrap();
    assert_failed(response).await;
}

#[tokio::test]
async fn bulk_deletes() {
    let harness = Harness::start(None).await;
    harness.create_demo().await;
    harness.store.seed("phenoflow-server", "README.md", "# server", "ops");
    harness.store.seed("other", "README.md", "# other", "bob");

    let refused = harness
        .client
        .delete(harness.url("/phenotypes"))
        .json(&json!({"author": "ada", "repos": ["demo", "other"]}))
        .send()
        .await
        .unwrap();
    assert_failed(refused).await;
    assert!(harness.store.has_repository("demo"));

    let accepted = harness
        .client
        .delete(harness.url("/phenotypes"))
        .json(&json!({"author": "ada", "repos": ["demo"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);
    assert!(!harness.store.has_repository("demo"));

    let listed: Vec<Value> = harness
        .client
        .delete(harness.url("/phenotypes/all"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(harness.store.repository_names(), vec!["phenoflow-server"]);
}
