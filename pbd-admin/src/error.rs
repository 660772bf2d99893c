//! Error types for pbd-admin
//!
//! Only fatal conditions are errors. Per-operation failures that the run survives
//! are [`OperationOutcome`](crate::outcome::OperationOutcome) values instead.

use crate::operations::Operation;
use thiserror::Error;

/// Fatal run error; always ends the process with a non-zero status
#[derive(Debug, Error)]
pub enum RunError {
    /// Configuration, work list or logging failure
    #[error(transparent)]
    Common(#[from] pbd_common::Error),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Identity check answered with something other than 200
    #[error("Authentication failed (GET /myself): {status} - {body}")]
    AuthenticationRejected { status: u16, body: String },

    /// Identity check never got an answer
    #[error("Authentication check failed: {0}")]
    AuthenticationTransport(String),

    /// 401/403 on a mutation; the credentials are not usable for this batch
    #[error(
        "Authentication or permission error on project '{project_key}' ({operation}): {status} - {body}"
    )]
    PermissionDenied {
        project_key: String,
        operation: Operation,
        status: u16,
        body: String,
    },
}

/// Result type for batch runs
pub type RunResult<T> = Result<T, RunError>;
