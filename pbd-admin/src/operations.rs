//! Mutation operations
//!
//! Every operation is one HTTP mutation against a project-key-addressed endpoint.
//! The seven scheme assignments share a single parameterized variant; what differs
//! between them (path suffix, JSON key, label) comes from the
//! [`SchemeKind`] registry.

use crate::outcome::SuccessRule;
use pbd_common::SchemeKind;
use reqwest::Method;
use serde_json::{Map, Value};
use std::fmt;

/// One idempotent per-project mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// `PUT /project/{key}` with `{"leadAccountId": ...}`
    ChangeLead { account_id: String },
    /// `PUT /project/{key}/{suffix}` with `{"<jsonKey>": <id>}`
    AssignScheme { kind: SchemeKind, scheme_id: u64 },
    /// `DELETE /project/{key}`
    DeleteProject,
}

impl Operation {
    pub fn method(&self) -> Method {
        match self {
            Operation::ChangeLead { .. } | Operation::AssignScheme { .. } => Method::PUT,
            Operation::DeleteProject => Method::DELETE,
        }
    }

    /// Path segments below `/rest/api/3`
    pub fn path_segments<'a>(&self, project_key: &'a str) -> Vec<&'a str> {
        match self {
            Operation::ChangeLead { .. } | Operation::DeleteProject => vec!["project", project_key],
            Operation::AssignScheme { kind, .. } => {
                vec!["project", project_key, kind.endpoint().path_suffix]
            }
        }
    }

    /// JSON request body, if the operation sends one
    pub fn payload(&self) -> Option<Value> {
        let mut body = Map::new();
        match self {
            Operation::ChangeLead { account_id } => {
                body.insert("leadAccountId".to_string(), Value::from(account_id.as_str()));
            }
            Operation::AssignScheme { kind, scheme_id } => {
                body.insert(kind.endpoint().json_key.to_string(), Value::from(*scheme_id));
            }
            Operation::DeleteProject => return None,
        }
        Some(Value::Object(body))
    }

    /// Deletion succeeds only on 204; reassignments accept any 2xx
    pub fn success_rule(&self) -> SuccessRule {
        match self {
            Operation::DeleteProject => SuccessRule::Exactly(204),
            _ => SuccessRule::AnySuccess,
        }
    }

    /// Log line for a successful attempt
    pub fn success_message(&self, project_key: &str) -> String {
        match self {
            Operation::ChangeLead { account_id } => format!(
                "Project Lead updated for project '{}' (accountId: '{}')",
                project_key, account_id
            ),
            Operation::AssignScheme { kind, scheme_id } => {
                format!("{} assigned to '{}' ({})", kind, project_key, scheme_id)
            }
            Operation::DeleteProject => format!("Project deleted: {}", project_key),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ChangeLead { .. } => f.write_str("Project Lead change"),
            Operation::AssignScheme { kind, .. } => write!(f, "{} assignment", kind),
            Operation::DeleteProject => f.write_str("project deletion"),
        }
    }
}
