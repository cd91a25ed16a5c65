//! Error taxonomy for the three read-only queries.

use crate::model::NodeMeta;
use crate::validate::ValidationError;
use thiserror::Error;

pub type QueryResult<T> = std::result::Result<T, QueryError>;

#[derive(Debug, Error)]
pub enum QueryError {
    /// Input rejected before it reached the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("node not found: {id}")]
    NotFound { id: String },

    #[error("node {id} is a {kind}, not a function")]
    WrongKind { id: String, kind: String },

    #[error(transparent)]
    Unavailable(#[from] UnavailableSource),

    /// Malformed request envelope or unknown method.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Store failure unrelated to the input. Never shown to callers verbatim.
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

/// Node exists but its source text cannot be produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnavailableSource {
    #[error("source unavailable: external function")]
    External(NodeMeta),

    #[error("source unavailable: node has no file metadata")]
    NoFileMetadata {
        name: Option<String>,
        package: Option<String>,
    },

    #[error("source file missing: {file}")]
    FileMissing { file: String },
}

impl QueryError {
    /// Stable wire code for the transport layer.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Validation(_) => "validation_error",
            QueryError::NotFound { .. } | QueryError::Unavailable(_) => "not_found",
            QueryError::WrongKind { .. } | QueryError::BadRequest(_) => "bad_request",
            QueryError::Internal(_) => "internal_error",
        }
    }
}

impl From<rusqlite::Error> for QueryError {
    fn from(err: rusqlite::Error) -> Self {
        QueryError::Internal(err.into())
    }
}
