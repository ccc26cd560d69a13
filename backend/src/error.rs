use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::db::StoreError;

/// Every failure a request can end in. Nothing here terminates the process;
/// each variant becomes exactly one HTTP response.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("product with given id or name already exists")]
    Conflict,

    #[error("{0}")]
    Validation(String),

    #[error("product with given id does not exist")]
    NotFound,

    #[error("cannot delete, stock is zero")]
    StockIsZero,

    /// Storage failure. `context` is what the caller sees; `source` only goes
    /// to the log.
    #[error("{context}: {source}")]
    Backend {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Adapter for `map_err` on store calls.
    pub fn backend(context: &'static str) -> impl FnOnce(StoreError) -> AppError {
        move |source| AppError::Backend { context, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Conflict | AppError::Validation(_) | AppError::StockIsZero => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Backend { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::Backend { context, source } => {
                error!(error = %source, "{}", context);
                json!({ "message": context })
            }
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
