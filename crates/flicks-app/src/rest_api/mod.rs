pub mod movie;
pub mod paging;

use std::collections::BTreeMap;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use http::StatusCode;
use serde_json::json;

use crate::{error::ApiError, state::AppState};
pub use paging::{Filters, Metadata};

/// JSON object wrapping payload under a single key, like `{"movie": {...}}`.
pub type Envelope<T> = BTreeMap<&'static str, T>;

pub fn envelope<T>(name: &'static str, value: T) -> Json<Envelope<T>> {
    Json(BTreeMap::from([(name, value)]))
}

async fn healthcheck(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.config();
    (
        StatusCode::OK,
        Json(json!({
            "status": "available",
            "system_info": {
                "environment": config.environment,
                "version": config.version,
            }
        })),
    )
}

async fn not_found() -> ApiError {
    ApiError::ResourceNotFound
}

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/v1/healthcheck", get(healthcheck))
        .nest("/v1/movies", movie::router())
        .fallback(not_found)
}
