// src/api/mod.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::Error;
use crate::process::{LookupResult, RateTable};

/// Body of every failed lookup. Which check failed is only in the logs.
pub const GENERIC_ERROR: &str =
    "Something wrong happend, please read the log for more information";

/// Pipeline error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        debug!(lookup = self.0.is_lookup(), error = %self.0, "answering 404");
        (StatusCode::NOT_FOUND, Json(json!({ "error": GENERIC_ERROR }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

async fn get_rate(
    State(table): State<Arc<RateTable>>,
    Path((date, currency)): Path<(String, String)>,
) -> ApiResult<Json<LookupResult>> {
    Ok(Json(table.lookup(&date, &currency)?))
}

pub fn app_router(table: Arc<RateTable>) -> Router {
    Router::new()
        .route("/{date}/{currency}", get(get_rate))
        .layer(TraceLayer::new_for_http())
        .with_state(table)
}
