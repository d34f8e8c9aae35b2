use chrono::{DateTime, Utc};
use serde::Serialize;

/// Caller identity derived from a verified access token.
///
/// Lives for one request: the access middleware puts it into the request
/// extensions and handlers read it back through `PrincipalExtractor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub subject: String,
    pub client_id: Option<String>,
    pub authorities: Vec<String>,
    pub scopes: Vec<String>,
    pub token_id: Option<String>,
    pub expires_at: u64,
}

impl Principal {
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.expires_at)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}
