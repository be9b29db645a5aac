use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error as ThisError;
use uuid::Uuid;

use super::IsRetryable;
use crate::cid::Cid;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("timestamps of {table} {id} changed since they were read")]
    Conflict { table: &'static str, id: Uuid },

    #[error("{table} {id} is not deleted")]
    NotDeleted { table: &'static str, id: Uuid },

    #[error("{op} violated a constraint: {message}")]
    Constraint { op: &'static str, message: String },

    #[error("gave up inserting into {table} after {attempts} identifier collisions")]
    IdExhausted { table: &'static str, attempts: u32 },

    #[error("{op} failed (cid={cid}): {source}")]
    Database {
        op: &'static str,
        cid: Cid,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database error: {0}")]
    Sql(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    /// Labels a raw driver error with the accessor that hit it.
    ///
    /// Constraint violations become `Constraint`; everything else from the
    /// driver becomes `Database`. Already-classified errors pass through.
    pub fn in_context(self, op: &'static str, cid: &Cid) -> Self {
        match self {
            StoreError::Sql(sqlx::Error::Database(db))
                if db.is_unique_violation()
                    || db.is_foreign_key_violation()
                    || db.is_check_violation()
                    || matches!(db.kind(), sqlx::error::ErrorKind::NotNullViolation) =>
            {
                StoreError::Constraint {
                    op,
                    message: db.message().to_string(),
                }
            }
            StoreError::Sql(source) => StoreError::Database {
                op,
                cid: cid.clone(),
                source,
            },
            other => other,
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match &self {
            StoreError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "VALIDATION_FAILED".to_string(),
                    message: message.clone(),
                    details: None,
                },
            ),

            StoreError::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                ApiErrorObject {
                    code: "NOT_FOUND".to_string(),
                    message: self.to_string(),
                    details: None,
                },
            ),

            StoreError::Conflict { .. }
            | StoreError::NotDeleted { .. }
            | StoreError::Constraint { .. } => (
                StatusCode::CONFLICT,
                ApiErrorObject {
                    code: "CONFLICT".to_string(),
                    message: self.to_string(),
                    details: None,
                },
            ),

            StoreError::IdExhausted { .. } | StoreError::Database { .. } | StoreError::Sql(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorObject {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                    details: None,
                },
            ),
        };
        (status, Json(ApiErrorBody { inner: error_body })).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}

impl IsRetryable for StoreError {
    fn is_retryable(&self) -> bool {
        match self {
            StoreError::Database { source, .. } | StoreError::Sql(source) => matches!(
                source,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::WorkerCrashed
            ),
            _ => false,
        }
    }
}
