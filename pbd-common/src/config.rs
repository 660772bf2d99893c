//! Environment-sourced configuration
//!
//! Everything the batch driver needs from its environment is resolved here, once,
//! before any network call: connection credentials and the optional scheme ids for
//! the scheme reassignment flow.
//!
//! Resolution goes through a lookup function (`Fn(&str) -> Option<String>`) so the
//! same code serves the real process environment and test fixtures.

use crate::{Error, Result};
use reqwest::Url;
use std::collections::BTreeMap;
use std::fmt;

/// Identity (account e-mail) used for HTTP Basic authentication
pub const ENV_EMAIL: &str = "email";
/// API token paired with the identity
pub const ENV_API_TOKEN: &str = "api_token";
/// Base URL of the ticketing service, e.g. `https://example.atlassian.net`
pub const ENV_BASE_URL: &str = "base_url";
/// Account id of the new project lead (lead change only)
pub const ENV_ACCOUNT_ID: &str = "account_id";

/// Read a variable from the real process environment
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Fetch a value, treating whitespace-only values as absent
fn lookup_trimmed<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Connection parameters for one run
///
/// Immutable once resolved; passed by reference to every component that talks to
/// the service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account e-mail
    pub identity: String,
    /// API token
    pub secret: String,
    /// Service root, always without a trailing slash
    pub base_endpoint: Url,
    /// Operation-specific target (new lead account id)
    pub target_value: Option<String>,
}

impl Credentials {
    /// Resolve credentials from the process environment
    pub fn from_env(require_target: bool) -> Result<Self> {
        Self::resolve(require_target, process_env)
    }

    /// Resolve credentials through `lookup`
    ///
    /// Every missing required variable is reported in a single error so the operator
    /// can fix the environment in one pass.
    pub fn resolve<F>(require_target: bool, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let identity = lookup_trimmed(&lookup, ENV_EMAIL);
        let secret = lookup_trimmed(&lookup, ENV_API_TOKEN);
        let base = lookup_trimmed(&lookup, ENV_BASE_URL);
        let target_value = lookup_trimmed(&lookup, ENV_ACCOUNT_ID);

        let mut missing = Vec::new();
        if identity.is_none() {
            missing.push(ENV_EMAIL);
        }
        if secret.is_none() {
            missing.push(ENV_API_TOKEN);
        }
        if base.is_none() {
            missing.push(ENV_BASE_URL);
        }
        if require_target && target_value.is_none() {
            missing.push(ENV_ACCOUNT_ID);
        }

        match (identity, secret, base) {
            (Some(identity), Some(secret), Some(base)) if missing.is_empty() => Ok(Self {
                identity,
                secret,
                base_endpoint: parse_base_endpoint(&base)?,
                target_value,
            }),
            _ => Err(Error::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            ))),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .field("base_endpoint", &self.base_endpoint.as_str())
            .field("target_value", &self.target_value)
            .finish()
    }
}

/// Parse the service root, rejecting anything a request path cannot be joined onto
fn parse_base_endpoint(raw: &str) -> Result<Url> {
    let trimmed = raw.trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|e| {
        Error::Config(format!("{} is not a valid URL ({}): {}", ENV_BASE_URL, e, raw))
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(Error::Config(format!(
            "{} must be an http(s) URL: {}",
            ENV_BASE_URL, raw
        )));
    }

    Ok(url)
}

/// Reusable configuration objects a project can be pointed at
///
/// Declaration order is the order assignments are applied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SchemeKind {
    Permission,
    Workflow,
    FieldConfiguration,
    IssueTypeScreen,
    Notification,
    Screen,
    IssueType,
}

/// How one scheme kind is addressed upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemeEndpoint {
    /// Path segment appended to `/rest/api/3/project/{key}`
    pub path_suffix: &'static str,
    /// JSON key carrying the scheme id in the request body
    pub json_key: &'static str,
    /// Human readable name for logs
    pub label: &'static str,
    /// Environment variable holding the scheme id
    pub env_var: &'static str,
}

impl SchemeKind {
    /// All scheme kinds in application order
    pub const ALL: [SchemeKind; 7] = [
        SchemeKind::Permission,
        SchemeKind::Workflow,
        SchemeKind::FieldConfiguration,
        SchemeKind::IssueTypeScreen,
        SchemeKind::Notification,
        SchemeKind::Screen,
        SchemeKind::IssueType,
    ];

    pub fn endpoint(self) -> SchemeEndpoint {
        match self {
            SchemeKind::Permission => SchemeEndpoint {
                path_suffix: "permissionscheme",
                json_key: "permissionSchemeId",
                label: "Permission Scheme",
                env_var: "PERMISSION_SCHEME_ID",
            },
            SchemeKind::Workflow => SchemeEndpoint {
                path_suffix: "workflowscheme",
                json_key: "workflowSchemeId",
                label: "Workflow Scheme",
                env_var: "WORKFLOW_SCHEME_ID",
            },
            SchemeKind::FieldConfiguration => SchemeEndpoint {
                path_suffix: "fieldconfigurationscheme",
                json_key: "fieldConfigurationSchemeId",
                label: "Field Configuration Scheme",
                env_var: "FIELD_CONFIG_SCHEME_ID",
            },
            SchemeKind::IssueTypeScreen => SchemeEndpoint {
                path_suffix: "issuescreenscheme",
                json_key: "issueTypeScreenSchemeId",
                label: "Issue Type Screen Scheme",
                env_var: "ISSUE_TYPE_SCREEN_SCHEME_ID",
            },
            SchemeKind::Notification => SchemeEndpoint {
                path_suffix: "notificationscheme",
                json_key: "notificationSchemeId",
                label: "Notification Scheme",
                env_var: "NOTIFICATION_SCHEME_ID",
            },
            SchemeKind::Screen => SchemeEndpoint {
                path_suffix: "screenscheme",
                json_key: "screenSchemeId",
                label: "Screen Scheme",
                env_var: "SCREEN_SCHEME_ID",
            },
            SchemeKind::IssueType => SchemeEndpoint {
                path_suffix: "issuetypescheme",
                json_key: "issueTypeSchemeId",
                label: "Issue Type Scheme",
                env_var: "ISSUE_TYPE_SCHEME_ID",
            },
        }
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint().label)
    }
}

/// Sparse scheme kind → scheme id mapping
///
/// A kind is present only when its environment variable is non-empty; absent kinds
/// are never applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemeSet {
    entries: BTreeMap<SchemeKind, u64>,
}

impl SchemeSet {
    /// Resolve the scheme set from the process environment
    pub fn from_env() -> Result<Self> {
        Self::resolve(process_env)
    }

    /// Resolve the scheme set through `lookup`
    ///
    /// A present but non-numeric scheme id is a configuration error.
    pub fn resolve<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut entries = BTreeMap::new();

        for kind in SchemeKind::ALL {
            let env_var = kind.endpoint().env_var;
            if let Some(raw) = lookup_trimmed(&lookup, env_var) {
                let id = raw.parse::<u64>().map_err(|_| {
                    Error::Config(format!("{} must be a numeric scheme id, got '{}'", env_var, raw))
                })?;
                entries.insert(kind, id);
            }
        }

        Ok(Self { entries })
    }

    /// Present entries in application order
    pub fn iter(&self) -> impl Iterator<Item = (SchemeKind, u64)> + '_ {
        self.entries.iter().map(|(kind, id)| (*kind, *id))
    }

    pub fn get(&self, kind: SchemeKind) -> Option<u64> {
        self.entries.get(&kind).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(SchemeKind, u64)> for SchemeSet {
    fn from_iter<I: IntoIterator<Item = (SchemeKind, u64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
