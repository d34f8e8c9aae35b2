//! Verification-key acquisition.
//!
//! Order:
//! 1. bundled resource `pubkey.txt` (trailing whitespace trimmed)
//! 2. key-uri fallback, only when the bundled key is absent, unreadable or blank
//!
//! The outcome (key or failure) is computed once per `KeyProvider` and cached.

use std::fmt;
use std::io;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::OnceCell;

use crate::services::auth::key_uri::RemoteKeySource;
use crate::services::auth::resource::ResourceReader;

/// Well-known name of the bundled public key.
pub const PUBLIC_KEY_RESOURCE: &str = "pubkey.txt";

/// Neither the bundled resource nor the key-uri produced a key.
///
/// Causes are kept as text so the cached outcome can be handed to every caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyUnavailableError {
    #[error("verification key resource `{resource}` is unavailable and no key-uri is configured")]
    NoKeyUri { resource: String },
    #[error("key request to {uri} failed: {cause}")]
    Request { uri: String, cause: String },
    #[error("key endpoint {uri} responded with status {status}")]
    Status { uri: String, status: u16 },
    #[error("key endpoint {uri} returned a malformed body: {cause}")]
    MalformedBody { uri: String, cause: String },
    #[error("key endpoint {uri} returned an empty key")]
    EmptyKey { uri: String },
}

/// Public key material (PEM text). Cheap to clone.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationKey(Arc<str>);

impl VerificationKey {
    /// Returns `None` for blank material.
    pub fn new(material: impl AsRef<str>) -> Option<Self> {
        let material = material.as_ref();
        if material.trim().is_empty() {
            return None;
        }
        Some(Self(Arc::from(material)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationKey")
            .field("len", &self.0.len())
            .finish()
    }
}

pub struct KeyProvider {
    resources: Arc<dyn ResourceReader>,
    remote: Option<Arc<dyn RemoteKeySource>>,
    cached: OnceCell<Result<VerificationKey, KeyUnavailableError>>,
}

impl fmt::Debug for KeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyProvider")
            .field("resource", &self.resources.describe(PUBLIC_KEY_RESOURCE))
            .field("remote", &self.remote.as_ref().map(|r| r.describe()))
            .field("acquired", &self.cached.initialized())
            .finish()
    }
}

impl KeyProvider {
    pub fn new(
        resources: Arc<dyn ResourceReader>,
        remote: Option<Arc<dyn RemoteKeySource>>,
    ) -> Self {
        Self {
            resources,
            remote,
            cached: OnceCell::new(),
        }
    }

    /// Resolve the verification key.
    ///
    /// Concurrent callers wait on a single acquisition; later callers get the
    /// cached outcome. A failure is cached too and is never retried.
    pub async fn verification_key(&self) -> Result<VerificationKey, KeyUnavailableError> {
        self.cached.get_or_init(|| self.acquire()).await.clone()
    }

    async fn acquire(&self) -> Result<VerificationKey, KeyUnavailableError> {
        if let Some(key) = self.read_bundled() {
            return Ok(key);
        }

        let Some(remote) = &self.remote else {
            let err = KeyUnavailableError::NoKeyUri {
                resource: self.resources.describe(PUBLIC_KEY_RESOURCE),
            };
            tracing::error!(error = %err, "no source for verification key");
            return Err(err);
        };

        let fetched = remote.fetch_key().await.and_then(|value| {
            VerificationKey::new(value).ok_or_else(|| KeyUnavailableError::EmptyKey {
                uri: remote.describe(),
            })
        });

        match fetched {
            Ok(key) => {
                tracing::info!(key_uri = %remote.describe(), "verification key fetched from key-uri");
                Ok(key)
            }
            Err(err) => {
                tracing::error!(
                    key_uri = %remote.describe(),
                    error = %err,
                    "get public key from authorization server failed"
                );
                Err(err)
            }
        }
    }

    // Missing and unreadable both fall through to the key-uri; only the log level differs.
    fn read_bundled(&self) -> Option<VerificationKey> {
        let location = self.resources.describe(PUBLIC_KEY_RESOURCE);

        let bytes = match self.resources.read(PUBLIC_KEY_RESOURCE) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(resource = %location, "no bundled verification key");
                return None;
            }
            Err(e) => {
                tracing::warn!(resource = %location, error = %e, "bundled verification key unreadable");
                return None;
            }
        };

        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(resource = %location, error = %e, "bundled verification key is not UTF-8");
                return None;
            }
        };

        match VerificationKey::new(text.trim_end()) {
            Some(key) => {
                tracing::info!(resource = %location, "verification key loaded from bundled resource");
                Some(key)
            }
            None => {
                tracing::warn!(resource = %location, "bundled verification key is empty");
                None
            }
        }
    }
}
