//! Remote verification-key lookup (the authorization server's `token_key` endpoint).
//!
//! Protocol:
//! - `GET <key-uri>`
//! - `Authorization: Basic base64(client_id:client_secret)` when both are configured
//! - 2xx response with a JSON body `{"alg": "...", "value": "<pem>"}`
//!
//! One request, bounded by the client timeout. Never retried.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use url::Url;

use crate::services::auth::key_provider::KeyUnavailableError;

/// Source of the verification key when nothing is bundled locally.
#[async_trait]
pub trait RemoteKeySource: Send + Sync {
    async fn fetch_key(&self) -> Result<String, KeyUnavailableError>;

    /// Where the key is fetched from (for logs and errors).
    fn describe(&self) -> String;
}

/// OAuth2 client credentials presented to the key endpoint.
#[derive(Clone)]
pub struct ClientCredentials {
    client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Credentials are only used when both halves are configured.
    pub fn from_parts(client_id: Option<String>, client_secret: Option<String>) -> Option<Self> {
        match (client_id, client_secret) {
            (Some(id), Some(secret)) => Some(Self::new(id, secret)),
            _ => None,
        }
    }

    pub fn basic_authorization(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(raw.as_bytes()))
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the secret
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenKeyResponse {
    #[serde(default)]
    alg: Option<String>,
    value: String,
}

/// `reqwest`-backed key-uri client.
#[derive(Debug, Clone)]
pub struct KeyUriClient {
    http: reqwest::Client,
    key_uri: Url,
    credentials: Option<ClientCredentials>,
}

impl KeyUriClient {
    pub fn new(
        key_uri: Url,
        credentials: Option<ClientCredentials>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            key_uri,
            credentials,
        })
    }
}

#[async_trait]
impl RemoteKeySource for KeyUriClient {
    async fn fetch_key(&self) -> Result<String, KeyUnavailableError> {
        let uri = self.key_uri.to_string();

        let mut request = self.http.get(self.key_uri.clone());
        if let Some(credentials) = &self.credentials {
            request = request.header(AUTHORIZATION, credentials.basic_authorization());
        }

        let response = request
            .send()
            .await
            .map_err(|e| KeyUnavailableError::Request {
                uri: uri.clone(),
                cause: error_chain(&e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeyUnavailableError::Status {
                uri,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| KeyUnavailableError::Request {
                uri: uri.clone(),
                cause: error_chain(&e),
            })?;

        let parsed: TokenKeyResponse =
            serde_json::from_slice(&body).map_err(|e| KeyUnavailableError::MalformedBody {
                uri: uri.clone(),
                cause: e.to_string(),
            })?;

        if parsed.value.trim().is_empty() {
            return Err(KeyUnavailableError::EmptyKey { uri });
        }

        tracing::debug!(
            key_uri = %uri,
            alg = parsed.alg.as_deref().unwrap_or("unspecified"),
            "key-uri responded with verification key"
        );

        Ok(parsed.value)
    }

    fn describe(&self) -> String {
        self.key_uri.to_string()
    }
}

// reqwest's Display stops at the outermost error; keep the whole chain for logs.
fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
