use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    response::{IntoResponse, Response},
    Json,
};
use flicks_types::ValidationErrors;
use http::StatusCode;
use serde::Serialize;
use tracing::{debug, error};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Resource not found")]
    ResourceNotFound,

    #[error("Edit conflict")]
    EditConflict,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("{0}")]
    FailedValidation(#[from] ValidationErrors),

    #[error("Internal error: {0}")]
    InternalError(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

#[derive(Serialize)]
struct ErrorBody<T: Serialize> {
    error: T,
}

fn error_response<T: Serialize>(status: StatusCode, error: T) -> Response {
    (status, Json(ErrorBody { error })).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ResourceNotFound => error_response(
                StatusCode::NOT_FOUND,
                "the requested resource could not be found",
            ),
            ApiError::EditConflict => error_response(
                StatusCode::CONFLICT,
                "unable to update the record due to an edit conflict, please try again",
            ),
            ApiError::InvalidRequest(msg) | ApiError::InvalidQuery(msg) => {
                error_response(StatusCode::BAD_REQUEST, msg)
            }
            ApiError::FailedValidation(errors) => {
                debug!("Failed validation: {errors}");
                error_response(StatusCode::UNPROCESSABLE_ENTITY, errors)
            }
            ApiError::InternalError(e) => {
                error!("Internal error: {e}");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "the server encountered a problem and could not process your request",
                )
            }
        }
    }
}

impl From<flicks_dal::Error> for ApiError {
    fn from(value: flicks_dal::Error) -> Self {
        match value {
            flicks_dal::Error::RecordNotFound(_) => ApiError::ResourceNotFound,
            flicks_dal::Error::EditConflict { .. } => ApiError::EditConflict,
            flicks_dal::Error::InvalidOrderByField(field) => {
                debug!("Invalid sort field {field}");
                let mut v = flicks_types::Validator::new();
                v.add_error("sort", "invalid sort value");
                ApiError::FailedValidation(v.errors().clone())
            }
            other => ApiError::InternalError(Box::new(other)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::InvalidRequest(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        ApiError::InvalidQuery(value.body_text())
    }
}
