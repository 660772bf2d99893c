//! Outcome classification for a single mutation attempt

use crate::client::{ClientError, HttpReply};
use std::fmt;

/// Longest response body kept in logs and outcome records (characters)
pub const BODY_EXCERPT_LEN: usize = 512;

/// Which statuses count as success for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessRule {
    /// Any 2xx status
    AnySuccess,
    /// Exactly this status; other 2xx codes are failures
    Exactly(u16),
}

impl SuccessRule {
    pub fn accepts(self, status: u16) -> bool {
        match self {
            SuccessRule::AnySuccess => (200..300).contains(&status),
            SuccessRule::Exactly(expected) => status == expected,
        }
    }
}

/// Tagged result of one mutation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Success { status: u16 },
    /// Non-success status the run survives
    SoftFailure { status: u16, body: String },
    /// 401/403: the run must stop
    HardFailure { status: u16, body: String },
    /// No usable response (network error, unreadable body)
    TransportError { cause: String },
}

impl OperationOutcome {
    /// Classify a reply (or the lack of one) under `rule`
    pub fn classify(rule: SuccessRule, reply: Result<HttpReply, ClientError>) -> Self {
        match reply {
            Err(err) => OperationOutcome::TransportError {
                cause: err.to_string(),
            },
            Ok(reply) if rule.accepts(reply.status) => OperationOutcome::Success {
                status: reply.status,
            },
            Ok(reply) if matches!(reply.status, 401 | 403) => OperationOutcome::HardFailure {
                status: reply.status,
                body: excerpt(&reply.body),
            },
            Ok(reply) => OperationOutcome::SoftFailure {
                status: reply.status,
                body: excerpt(&reply.body),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Success { .. })
    }

    /// Whether this outcome ends the run
    pub fn is_fatal(&self) -> bool {
        matches!(self, OperationOutcome::HardFailure { .. })
    }

    /// HTTP status, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            OperationOutcome::Success { status }
            | OperationOutcome::SoftFailure { status, .. }
            | OperationOutcome::HardFailure { status, .. } => Some(*status),
            OperationOutcome::TransportError { .. } => None,
        }
    }
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationOutcome::Success { status } => write!(f, "success ({})", status),
            OperationOutcome::SoftFailure { status, body } => write!(f, "{} - {}", status, body),
            OperationOutcome::HardFailure { status, body } => write!(f, "{} - {}", status, body),
            OperationOutcome::TransportError { cause } => write!(f, "transport error: {}", cause),
        }
    }
}

/// Bound a response body for logging, cutting on a char boundary
pub fn excerpt(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
