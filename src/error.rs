//! Engine-level error taxonomy
//!
//! Every failure that crosses the engine boundary is an [`EngineError`] and
//! carries an [`ErrorKind`]. Partial outcomes (truncation, timeout,
//! cancellation) are normally reported as a `SearchStatus` on a successful
//! response; the `Timeout` and `Cancelled` variants here cover operations that
//! produced nothing at all.

use crate::graph::GraphError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    NoPathFound,
    Truncated,
    Timeout,
    Cancelled,
    GraphInconsistency,
}

/// Errors surfaced by the engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation timed out")]
    Timeout,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Graph inconsistency: {0}")]
    GraphInconsistency(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidInput(_) | EngineError::Config(_) => ErrorKind::InvalidInput,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::Timeout => ErrorKind::Timeout,
            EngineError::Cancelled => ErrorKind::Cancelled,
            EngineError::GraphInconsistency(_) => ErrorKind::GraphInconsistency,
        }
    }
}

impl From<GraphError> for EngineError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::NodeNotFound(_)
            | GraphError::EdgeNotFound(_)
            | GraphError::InvalidEdgeSource(_)
            | GraphError::InvalidEdgeTarget(_) => EngineError::NotFound(err.to_string()),
            GraphError::SelfLoop(_) | GraphError::InvalidStrength(_) | GraphError::EmptyNodeId => {
                EngineError::InvalidInput(err.to_string())
            }
            GraphError::Inconsistent(msg) => EngineError::GraphInconsistency(msg),
        }
    }
}

/// Structured error payload returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&EngineError> for ErrorBody {
    fn from(err: &EngineError) -> Self {
        ErrorBody {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
