// Handler-facing error type and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::validation::ErrorDetail;

pub type ApiResult<T> = Result<T, ApiError>;

/// Body of every 422 response
#[derive(Debug, Serialize, ToSchema)]
pub struct HttpValidationError {
    pub detail: Vec<ErrorDetail>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// One or more inputs failed coercion or a declared constraint
    #[error("request validation failed ({} error(s))", .0.len())]
    Validation(Vec<ErrorDetail>),

    /// An axum extractor refused the request before validation ran
    /// (malformed query string, oversized body or broken multipart stream)
    #[error("request rejected: {message}")]
    Rejected { status: StatusCode, message: String },

    /// A response could not be produced; the cause is logged, never sent
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Rejected { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Vec<ErrorDetail>> for ApiError {
    fn from(details: Vec<ErrorDetail>) -> Self {
        ApiError::Validation(details)
    }
}

macro_rules! impl_from_rejection {
    ($($rejection:ty),* $(,)?) => {
        $(
            impl From<$rejection> for ApiError {
                fn from(rejection: $rejection) -> Self {
                    ApiError::Rejected {
                        status: rejection.status(),
                        message: rejection.body_text(),
                    }
                }
            }
        )*
    };
}

impl_from_rejection!(
    axum::extract::rejection::QueryRejection,
    axum::extract::rejection::RawPathParamsRejection,
    axum::extract::rejection::BytesRejection,
    axum::extract::multipart::MultipartError,
);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Validation(details) => {
                warn!(errors = details.len(), "request validation failed");
                (status, Json(HttpValidationError { detail: details })).into_response()
            }
            ApiError::Rejected { message, .. } => {
                warn!(%status, %message, "request rejected by extractor");
                (status, Json(json!({ "detail": message }))).into_response()
            }
            ApiError::Internal(cause) => {
                error!(%cause, "internal error while handling request");
                (status, Json(json!({ "detail": "Internal Server Error" }))).into_response()
            }
        }
    }
}
