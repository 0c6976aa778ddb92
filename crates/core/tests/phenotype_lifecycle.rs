use phenoflow_core::{ErrorKind, FileView, Phenoflow, ServiceConfig, StepNumber};
use phenoflow_locator::codec;
use phenoflow_protocol::{
    Committer, FileLocator, NewFile, NewPhenotype, PhenotypeFile, PhenotypeQuery,
};
use phenoflow_store::{MemoryStore, StoreOp};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const WORKFLOW: &str = "cwlVersion: v1.0\nclass: Workflow\nsteps:\n  '1':\n    run: covid-cough.cwl\n    out: [output]\n";
const STEP: &str = "cwlVersion: v1.0\nclass: CommandLineTool\ndoc: Identify cough\nid: covid-cough\n";

fn service(author: &str) -> (Arc<MemoryStore>, Phenoflow) {
    let store = Arc::new(MemoryStore::new());
    let config = ServiceConfig::new(Committer {
        name: author.to_string(),
        email: format!("{author}@example.org"),
    });
    (store.clone(), Phenoflow::new(store, config))
}

fn file(path: &str, text: &str) -> PhenotypeFile {
    PhenotypeFile {
        path: path.to_string(),
        content: codec::to_base64(text),
    }
}

fn demo() -> NewPhenotype {
    NewPhenotype {
        name: "demo".to_string(),
        about: "DEMO - a test".to_string(),
        files: vec![
            file("demo.cwl", WORKFLOW),
            file("covid-cough.cwl", STEP),
            file("python/covid-cough.py", "print('cough')"),
        ],
    }
}

fn locator(repo: &str, path: &str) -> FileLocator {
    FileLocator {
        repo: repo.to_string(),
        path: path.to_string(),
    }
}

#[tokio::test]
async fn description_reads_back_after_create_and_update() {
    let (_, phenoflow) = service("ada");
    phenoflow.create_phenotype(&demo()).await.unwrap();

    assert_eq!(phenoflow.description("demo").await.unwrap(), "a test");
    phenoflow.set_description("demo", "NEW").await.unwrap();
    assert_eq!(phenoflow.description("demo").await.unwrap(), "NEW");
}

#[tokio::test]
async fn uploaded_readmes_with_other_line_breaks_are_editable() {
    let (store, phenoflow) = service("ada");
    store.seed("tight", "README.md", "# tight\nTIGHT - a test\n## About\n", "ada");
    store.seed("crlf", "README.md", "# crlf\r\n\r\nCRLF - a test\r\n\r\n## About\r\n", "ada");

    for name in ["tight", "crlf"] {
        assert_eq!(phenoflow.description(name).await.unwrap(), "a test");
        phenoflow.set_description(name, "NEW").await.unwrap();
        assert_eq!(phenoflow.description(name).await.unwrap(), "NEW");
    }
    assert_eq!(
        store.file_text("crlf", "README.md").as_deref(),
        Some("# crlf\r\n\r\nCRLF - NEW\r\n\r\n## About\r\n")
    );
}

#[tokio::test]
async fn delete_by_a_stranger_fails_and_keeps_the_phenotype() {
    let (store, phenoflow) = service("ada");
    phenoflow.create_phenotype(&demo()).await.unwrap();

    for claimed in ["mallory", "", "ad", "ada "] {
        let err = phenoflow.delete_phenotype("demo", claimed).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
    assert!(store.has_repository("demo"));

    phenoflow.delete_phenotype("demo", "ada").await.unwrap();
    assert!(!store.has_repository("demo"));
}

#[tokio::test]
async fn listing_filters_by_name_and_author() {
    let (store, phenoflow) = service("ada");
    phenoflow.create_phenotype(&demo()).await.unwrap();
    phenoflow
        .create_phenotype(&NewPhenotype {
            name: "asthma".to_string(),
            about: "ASTHMA - b".to_string(),
            files: Vec::new(),
        })
        .await
        .unwrap();
    store.seed("demo-copy", "README.md", "# copy", "bob");

    let all = phenoflow
        .list_phenotypes(&PhenotypeQuery::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let query = PhenotypeQuery {
        author: Some("ada".to_string()),
        name: Some("demo".to_string()),
    };
    let names: Vec<_> = phenoflow
        .list_phenotypes(&query)
        .await
        .unwrap()
        .into_iter()
        .map(|repo| repo.name)
        .collect();
    assert_eq!(names, vec!["demo"]);

    let query = PhenotypeQuery {
        author: None,
        name: Some("zzz".to_string()),
    };
    let err = phenoflow.list_phenotypes(&query).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn steps_resolve_through_the_workflow_document() {
    let (_, phenoflow) = service("ada");
    phenoflow.create_phenotype(&demo()).await.unwrap();
    let first = StepNumber::new(1).unwrap();

    assert_eq!(phenoflow.step("demo", first).await.unwrap().path, "covid-cough.cwl");
    assert_eq!(phenoflow.step_contents("demo", first).await.unwrap(), STEP);
    assert_eq!(
        phenoflow.step_description("demo", first).await.unwrap(),
        "Identify cough"
    );

    phenoflow
        .set_step_description("demo", first, "Cough lasting a week")
        .await
        .unwrap();
    assert_eq!(
        phenoflow.step_description("demo", first).await.unwrap(),
        "Cough lasting a week"
    );

    let implementations = phenoflow.step_implementations("demo", first).await.unwrap();
    assert_eq!(implementations.len(), 1);
    assert_eq!(implementations[0].path, "python/covid-cough.py");

    let err = phenoflow
        .step_description("demo", StepNumber::new(2).unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDocument);
}

#[tokio::test]
async fn contents_flatten_the_tree() {
    let (_, phenoflow) = service("ada");
    phenoflow.create_phenotype(&demo()).await.unwrap();

    let mut paths: Vec<_> = phenoflow
        .phenotype_contents("demo")
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.path)
        .collect();
    paths.sort();
    assert_eq!(
        paths,
        vec![
            "LICENSE.md",
            "README.md",
            "covid-cough.cwl",
            "demo.cwl",
            "python/covid-cough.py"
        ]
    );
}

#[tokio::test]
async fn file_views_decode_files_and_list_directories() {
    let (_, phenoflow) = service("ada");
    phenoflow.create_phenotype(&demo()).await.unwrap();

    assert_eq!(
        phenoflow
            .file_contents(&locator("demo", "python/covid-cough.py"))
            .await
            .unwrap(),
        FileView::Text("print('cough')".to_string())
    );
    match phenoflow.file_contents(&locator("demo", "python")).await.unwrap() {
        FileView::Listing(entries) => assert_eq!(entries[0].name, "covid-cough.py"),
        other => panic!("expected a listing, got {other:?}"),
    }
}

#[tokio::test]
async fn file_update_and_stale_create() {
    let (store, phenoflow) = service("ada");
    phenoflow.create_phenotype(&demo()).await.unwrap();
    let update = NewFile {
        repo: "demo".to_string(),
        path: "covid-cough.cwl".to_string(),
        content: codec::to_base64("doc: x\nid: y\n"),
    };

    phenoflow.update_file(&update).await.unwrap();
    assert_eq!(
        store.file_text("demo", "covid-cough.cwl").as_deref(),
        Some("doc: x\nid: y\n")
    );

    // Creating over an existing path carries no token.
    let err = phenoflow.create_file(&update).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn initialise_creates_only_missing_phenotypes() {
    let (store, phenoflow) = service("ada");
    store.seed("DEMO", "README.md", "# existing", "bob");
    let seed = vec![
        demo(),
        NewPhenotype {
            name: "asthma".to_string(),
            about: "ASTHMA - b".to_string(),
            files: Vec::new(),
        },
    ];

    assert_eq!(phenoflow.initialise(&seed).await.unwrap(), vec!["asthma"]);
    assert_eq!(phenoflow.initialise(&seed).await.unwrap(), Vec::<String>::new());
    assert_eq!(store.call_count(StoreOp::CreateRepository), 1);
}

#[tokio::test]
async fn delete_all_keeps_the_server_repository() {
    let (store, phenoflow) = service("ada");
    store.seed("phenoflow-server", "README.md", "# server", "ops");
    phenoflow.create_phenotype(&demo()).await.unwrap();

    let listed = phenoflow.delete_all().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(store.repository_names(), vec!["phenoflow-server"]);
}
