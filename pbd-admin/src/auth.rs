//! Session authentication gate
//!
//! Runs once per process, before the work list is opened. Any failure here ends
//! the run; nothing has been mutated yet.

use crate::client::ServiceClient;
use crate::error::{RunError, RunResult};
use crate::outcome::excerpt;
use serde::Deserialize;

/// Account behind the credentials, as reported by `GET /myself`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub account_id: Option<String>,
    pub display_name: Option<String>,
    pub email_address: Option<String>,
}

impl Identity {
    /// Display name, else account id
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.account_id.as_deref())
            .unwrap_or("unknown")
    }
}

/// Proof that the identity check passed
///
/// Only [`authenticate`] produces one, so holding a session means the gate ran.
#[derive(Debug, Clone)]
pub struct VerifiedSession {
    identity: Identity,
}

impl VerifiedSession {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

/// Verify the client's credentials against the identity-check endpoint
///
/// - transport failure → [`RunError::AuthenticationTransport`]
/// - any status but 200 → [`RunError::AuthenticationRejected`]
/// - 200 → session; an unparseable body only loses the identity details
pub async fn authenticate(client: &ServiceClient) -> RunResult<VerifiedSession> {
    tracing::debug!(identity = %client.credentials().identity, "Verifying credentials");

    let reply = client
        .get_myself()
        .await
        .map_err(|e| RunError::AuthenticationTransport(e.to_string()))?;

    if reply.status != 200 {
        return Err(RunError::AuthenticationRejected {
            status: reply.status,
            body: excerpt(&reply.body),
        });
    }

    let identity = serde_json::from_str::<Identity>(&reply.body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Identity check body not understood");
        Identity::default()
    });

    tracing::info!(
        account_id = identity.account_id.as_deref().unwrap_or("unknown"),
        "Authentication verified as {}",
        identity
            .display_name
            .as_deref()
            .unwrap_or(&client.credentials().identity)
    );

    Ok(VerifiedSession { identity })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_parses_partial_body() {
        let identity: Identity =
            serde_json::from_str(r#"{"accountId":"abc-123","active":true}"#).unwrap();
        assert_eq!(identity.account_id.as_deref(), Some("abc-123"));
        assert!(identity.display_name.is_none());
    }

    #[test]
    fn test_identity_full_body() {
        let identity: Identity = serde_json::from_str(
            r#"{"accountId":"abc","displayName":"Ops Bot","emailAddress":"ops@example.com"}"#,
        )
        .unwrap();
        assert_eq!(identity.display_name.as_deref(), Some("Ops Bot"));
        assert_eq!(identity.email_address.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn test_identity_label_falls_back_to_account_id() {
        let identity: Identity = serde_json::from_str(r#"{"accountId":"abc-123"}"#).unwrap();
        assert_eq!(identity.label(), "abc-123");
        assert_eq!(Identity::default().label(), "unknown");
    }
}
