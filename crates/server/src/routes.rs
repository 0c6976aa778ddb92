use crate::http_api::{empty, json, parse_body, text, ApiError, ApiResult};
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::{get, post},
    Router,
};
use phenoflow_core::{CoreError, FileView, Phenoflow, StepNumber};
use phenoflow_protocol::{
    AuthorClaim, BulkDelete, DescriptionUpdate, FileLocator, NewFile, NewPhenotype,
    PhenotypeQuery, StepDescriptionUpdate, StepRequest,
};

pub const LIVENESS_MESSAGE: &str = "Server is running";

/// The full HTTP surface over one service.
pub fn router(service: Phenoflow) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/rate", get(rate))
        .route("/initialise", post(initialise))
        .route("/phenotypes", get(list_phenotypes).delete(delete_phenotypes))
        .route("/phenotypes/all", axum::routing::delete(delete_all))
        .route("/phenotype", post(create_phenotype))
        .route("/phenotype/:name", get(phenotype).delete(delete_phenotype))
        .route("/phenotype/:name/contents", get(phenotype_contents))
        .route(
            "/phenotype/:name/description",
            get(description).put(set_description),
        )
        .route("/step/:step", get(step))
        .route("/step/:step/contents", get(step_contents))
        .route(
            "/step/:step/description",
            get(step_description).put(set_step_description),
        )
        .route("/step/:step/implementation", get(step_implementations))
        .route(
            "/file",
            get(file)
                .post(create_file)
                .put(update_file)
                .delete(delete_file),
        )
        .route("/file/contents", get(file_contents))
        .route("/files", post(create_files).delete(delete_files))
        .with_state(service)
}

fn step_number(raw: &str) -> Result<StepNumber, ApiError> {
    Ok(raw.parse::<StepNumber>()?)
}

async fn liveness() -> ApiResult {
    text(LIVENESS_MESSAGE.to_string())
}

async fn rate(State(service): State<Phenoflow>) -> ApiResult {
    json(&service.rate_limit().await?)
}

async fn initialise(State(service): State<Phenoflow>) -> ApiResult {
    service.initialise_from_seed().await?;
    empty()
}

async fn list_phenotypes(
    State(service): State<Phenoflow>,
    query: Result<Query<PhenotypeQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) =
        query.map_err(|err| CoreError::invalid_request(format!("query: {err}")))?;
    json(&service.list_phenotypes(&query).await?)
}

async fn delete_phenotypes(State(service): State<Phenoflow>, body: Bytes) -> ApiResult {
    let request: BulkDelete = parse_body(&body)?;
    service.delete_phenotypes(&request).await?;
    empty()
}

async fn delete_all(State(service): State<Phenoflow>) -> ApiResult {
    json(&service.delete_all().await?)
}

async fn create_phenotype(State(service): State<Phenoflow>, body: Bytes) -> ApiResult {
    let phenotype: NewPhenotype = parse_body(&body)?;
    service.create_phenotype(&phenotype).await?;
    empty()
}

async fn phenotype(State(service): State<Phenoflow>, Path(name): Path<String>) -> ApiResult {
    json(&service.phenotype(&name).await?)
}

async fn delete_phenotype(
    State(service): State<Phenoflow>,
    Path(name): Path<String>,
    body: Bytes,
) -> ApiResult {
    let claim: AuthorClaim = parse_body(&body)?;
    service.delete_phenotype(&name, &claim.author).await?;
    empty()
}

async fn phenotype_contents(
    State(service): State<Phenoflow>,
    Path(name): Path<String>,
) -> ApiResult {
    json(&service.phenotype_contents(&name).await?)
}

async fn description(State(service): State<Phenoflow>, Path(name): Path<String>) -> ApiResult {
    text(service.description(&name).await?)
}

async fn set_description(
    State(service): State<Phenoflow>,
    Path(name): Path<String>,
    body: Bytes,
) -> ApiResult {
    let update: DescriptionUpdate = parse_body(&body)?;
    service.set_description(&name, &update.description).await?;
    empty()
}

async fn step(State(service): State<Phenoflow>, Path(raw): Path<String>, body: Bytes) -> ApiResult {
    let step = step_number(&raw)?;
    let request: StepRequest = parse_body(&body)?;
    json(&service.step(&request.repo, step).await?)
}

async fn step_contents(
    State(service): State<Phenoflow>,
    Path(raw): Path<String>,
    body: Bytes,
) -> ApiResult {
    let step = step_number(&raw)?;
    let request: StepRequest = parse_body(&body)?;
    text(service.step_contents(&request.repo, step).await?)
}

async fn step_description(
    State(service): State<Phenoflow>,
    Path(raw): Path<String>,
    body: Bytes,
) -> ApiResult {
    let step = step_number(&raw)?;
    let request: StepRequest = parse_body(&body)?;
    text(service.step_description(&request.repo, step).await?)
}

async fn set_step_description(
    State(service): State<Phenoflow>,
    Path(raw): Path<String>,
    body: Bytes,
) -> ApiResult {
    let step = step_number(&raw)?;
    let update: StepDescriptionUpdate = parse_body(&body)?;
    service
        .set_step_description(&update.repo, step, &update.description)
        .await?;
    empty()
}

async fn step_implementations(
    State(service): State<Phenoflow>,
    Path(raw): Path<String>,
    body: Bytes,
) -> ApiResult {
    let step = step_number(&raw)?;
    let request: StepRequest = parse_body(&body)?;
    json(&service.step_implementations(&request.repo, step).await?)
}

async fn file(State(service): State<Phenoflow>, body: Bytes) -> ApiResult {
    let locator: FileLocator = parse_body(&body)?;
    json(&service.file(&locator).await?)
}

async fn file_contents(State(service): State<Phenoflow>, body: Bytes) -> ApiResult {
    let locator: FileLocator = parse_body(&body)?;
    match service.file_contents(&locator).await? {
        FileView::Text(content) => text(content),
        FileView::Listing(entries) => json(&entries),
    }
}

async fn create_file(State(service): State<Phenoflow>, body: Bytes) -> ApiResult {
    let file: NewFile = parse_body(&body)?;
    service.create_file(&file).await?;
    empty()
}

async fn create_files(State(service): State<Phenoflow>, body: Bytes) -> ApiResult {
    let files: Vec<NewFile> = parse_body(&body)?;
    service.create_files(&files).await?;
    empty()
}

async fn update_file(State(service): State<Phenoflow>, body: Bytes) -> ApiResult {
    let file: NewFile = parse_body(&body)?;
    service.update_file(&file).await?;
    empty()
}

async fn delete_file(State(service): State<Phenoflow>, body: Bytes) -> ApiResult {
    let locator: FileLocator = parse_body(&body)?;
    service.delete_file(&locator).await?;
    empty()
}

async fn delete_files(State(service): State<Phenoflow>, body: Bytes) -> ApiResult {
    let locators: Vec<FileLocator> = parse_body(&body)?;
    service.delete_files(&locators).await?;
    empty()
}
