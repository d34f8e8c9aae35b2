/*
 * Responsibility
 * - GET /api/v1/me の response DTO
 */
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::services::auth::Principal;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub authorities: Vec<String>,
    pub scopes: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Principal> for MeResponse {
    fn from(p: Principal) -> Self {
        let expires_at = p.expires_at_utc();
        Self {
            subject: p.subject,
            client_id: p.client_id,
            authorities: p.authorities,
            scopes: p.scopes,
            expires_at,
        }
    }
}
