//! Error types for setlist-agent
//!
//! Every failure carries an [`ErrorKind`] so callers and tests can assert on
//! the category of a failure rather than its message.

use crate::workflow::StageKind;
use thiserror::Error;

/// Failure category shared by fatal errors and non-fatal stage skips
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required input field was absent
    Precondition,
    /// A search or filter produced nothing
    EmptyResult,
    /// Network, auth, rate limit or server error from a remote service
    RemoteFailure,
    /// A remote response could not be decoded
    MalformedResponse,
}

/// Remote collaborator errors (language model, catalog, accounts service)
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Rate limit exceeded (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Parse(_) => ErrorKind::MalformedResponse,
            _ => ErrorKind::RemoteFailure,
        }
    }
}

/// Fatal pipeline errors; any of these aborts the run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A remote call made by a stage failed
    #[error("{stage} stage failed: {source}")]
    Remote {
        stage: StageKind,
        #[source]
        source: ServiceError,
    },

    /// Function-call arguments were not valid for the extraction schema
    #[error("Malformed function call arguments: {source}")]
    MalformedArguments {
        arguments: String,
        #[source]
        source: serde_json::Error,
    },

    /// The builder needs a playlist name and none was extracted
    #[error("No playlist name available; cannot create a playlist")]
    MissingPlaylistName,
}

impl PipelineError {
    pub fn remote(stage: StageKind, source: ServiceError) -> Self {
        PipelineError::Remote { stage, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Remote { source, .. } => source.kind(),
            PipelineError::MalformedArguments { .. } => ErrorKind::MalformedResponse,
            PipelineError::MissingPlaylistName => ErrorKind::Precondition,
        }
    }

    /// Stage the error originated from, when known
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            PipelineError::Remote { stage, .. } => Some(*stage),
            PipelineError::MalformedArguments { .. } => Some(StageKind::Extracting),
            PipelineError::MissingPlaylistName => Some(StageKind::Building),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
