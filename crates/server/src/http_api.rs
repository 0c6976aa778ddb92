use axum::{
    body::{Body, Bytes},
    http::{header::CONTENT_TYPE, Response as HttpResponse, StatusCode},
    response::{IntoResponse, Response},
};
use phenoflow_core::CoreError;
use phenoflow_protocol::serialize_json;
use serde::{de::DeserializeOwned, Serialize};

/// The only body a failed request ever gets.
pub const ERROR_MESSAGE: &str = "Sorry an error occurred";

/// A failed request. The cause is logged and never sent to the caller.
#[derive(Debug)]
pub(crate) enum ApiError {
    Core(CoreError),
    Encode(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Core(err) => log::error!("Request failed ({:?}): {err}", err.kind()),
            Self::Encode(err) => log::error!("Response encoding failed: {err}"),
        }
        (StatusCode::INTERNAL_SERVER_ERROR, ERROR_MESSAGE).into_response()
    }
}

pub(crate) type ApiResult = Result<Response, ApiError>;

/// Bodies are read raw and parsed here so a malformed body takes the same
/// failure path as every other error.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|err| CoreError::invalid_request(format!("request body: {err}")).into())
}

pub(crate) fn json<T: Serialize>(value: &T) -> ApiResult {
    let bytes = serialize_json(value)
        .map_err(|err| ApiError::Encode(err.to_string()))?
        .into_bytes();
    build(Body::from(bytes), "application/json")
}

pub(crate) fn text(value: String) -> ApiResult {
    build(Body::from(value), "text/plain; charset=utf-8")
}

pub(crate) fn empty() -> ApiResult {
    Ok(StatusCode::OK.into_response())
}

fn build(body: Body, content_type: &'static str) -> ApiResult {
    HttpResponse::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .body(body)
        .map_err(|err| ApiError::Encode(err.to_string()))
}
