use crate::documents::{README_COMMIT_MESSAGE, README_PATH};
use phenoflow_locator::codec;
use phenoflow_protocol::{Committer, FileWrite, NewRepository};
use phenoflow_store::{ContentStore, MemoryStore};

pub fn committer(name: &str) -> Committer {
    Committer {
        name: name.to_string(),
        email: format!("{name}@example.org"),
    }
}

/// Writes the first README of `repo` as `author`, creating the repository.
pub async fn initial_readme(store: &MemoryStore, repo: &str, author: &str) {
    if !store.has_repository(repo) {
        store
            .create_repository(&NewRepository::public(repo, ""))
            .await
            .unwrap();
    }
    let write = FileWrite {
        message: README_COMMIT_MESSAGE.to_string(),
        committer: committer(author),
        content: codec::to_base64(format!("# {repo}\n\n{repo} - about\n\n## About\n")),
        sha: store.file_sha(repo, README_PATH),
    };
    store.put_file(repo, README_PATH, &write).await.unwrap();
}

/// Root workflow document with one `run:` entry per step.
pub fn workflow(repo: &str, steps: &[&str], newline: &str) -> String {
    let mut text = format!("cwlVersion: v1.0{newline}class: Workflow{newline}id: {repo}{newline}steps:{newline}");
    for (index, target) in steps.iter().enumerate() {
        text.push_str(&format!(
            "  '{}':{newline}    run: {target}{newline}    out: [output]{newline}",
            index + 1
        ));
    }
    text
}

pub fn step_document(description: &str) -> String {
    format!("cwlVersion: v1.0\nclass: CommandLineTool\ndoc: {description}\nid: step\n")
}
