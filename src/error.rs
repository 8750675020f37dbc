use serde::Serialize;
use thiserror::Error;

use crate::models::RowRejection;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to hash credential: {0}")]
    Credential(String),
}

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors surfaced to the caller of a coordinator operation.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("could not read uploaded file: {0}")]
    UnreadableInput(String),

    #[error("no data rows found in file")]
    EmptyInput,

    #[error("validation failed for {} row(s)", details.len())]
    Validation { details: Vec<RowRejection> },

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("object store error: {0}")]
    ObjectStore(#[from] ObjectStoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<RowRejection>>,
}

impl AppError {
    pub fn status(&self) -> u16 {
        match self {
            AppError::UnsupportedFormat(_)
            | AppError::UnreadableInput(_)
            | AppError::EmptyInput
            | AppError::Validation { .. } => 400,
            AppError::NotFound(_) => 404,
            AppError::Store(StoreError::DuplicateKey(_)) => 409,
            AppError::Store(_)
            | AppError::ObjectStore(_)
            | AppError::Config(_)
            | AppError::Encode(_) => 500,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            AppError::Validation { details } => ErrorBody {
                error: "Validation failed".to_string(),
                details: Some(details.clone()),
            },
            // Internal failures keep their detail in the logs only.
            AppError::Store(StoreError::Database(_) | StoreError::Credential(_))
            | AppError::ObjectStore(_)
            | AppError::Config(_)
            | AppError::Encode(_) => ErrorBody {
                error: "Internal server error".to_string(),
                details: None,
            },
            other => ErrorBody {
                error: other.to_string(),
                details: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table_covers_each_kind() {
        assert_eq!(AppError::UnsupportedFormat("pdf".into()).status(), 400);
        assert_eq!(AppError::EmptyInput.status(), 400);
        assert_eq!(AppError::Validation { details: vec![] }.status(), 400);
        assert_eq!(AppError::NotFound("company".into()).status(), 404);
        assert_eq!(
            AppError::Store(StoreError::DuplicateKey("email".into())).status(),
            409
        );
        assert_eq!(AppError::Config("missing".into()).status(), 500);
    }

    #[test]
    fn validation_body_carries_details() {
        let err = AppError::Validation {
            details: vec![RowRejection {
                row: 2,
                email: "b@x.com".into(),
                name: String::new(),
                reason: "missing required fields".into(),
            }],
        };
        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["details"][0]["row"], 2);
    }

    #[test]
    fn database_errors_are_not_leaked() {
        let err = AppError::Store(StoreError::Database(sqlx::Error::PoolTimedOut));
        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["error"], "Internal server error");
        assert!(body.get("details").is_none());
    }
}
