//! Factory: build the auth components from application `Config`.
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::StartupError;
use crate::services::auth::access_jwt::{TokenVerifier, VerifierSettings};
use crate::services::auth::allow_list::AllowList;
use crate::services::auth::denied::AccessDeniedHandler;
use crate::services::auth::gate::AccessGate;
use crate::services::auth::key_provider::KeyProvider;
use crate::services::auth::key_uri::{ClientCredentials, KeyUriClient, RemoteKeySource};
use crate::services::auth::policy::PermissionEvaluator;
use crate::services::auth::resource::{FsResourceReader, ResourceReader};

pub fn build_key_provider(config: &Config) -> Result<KeyProvider, StartupError> {
    let resources: Arc<dyn ResourceReader> =
        Arc::new(FsResourceReader::new(&config.key_resource_dir));

    let remote: Option<Arc<dyn RemoteKeySource>> = match &config.key_uri {
        Some(key_uri) => {
            let credentials =
                ClientCredentials::from_parts(config.client_id.clone(), config.client_secret.clone());
            let client = KeyUriClient::new(
                key_uri.clone(),
                credentials,
                Duration::from_secs(config.key_fetch_timeout_seconds),
            )
            .map_err(StartupError::HttpClient)?;
            let client: Arc<dyn RemoteKeySource> = Arc::new(client);
            Some(client)
        }
        None => None,
    };

    Ok(KeyProvider::new(resources, remote))
}

pub fn verifier_settings(config: &Config) -> VerifierSettings {
    VerifierSettings {
        algorithm: config.jwt_algorithm,
        issuer: config.auth_issuer.clone(),
        audience: config.auth_audience.clone(),
        leeway_seconds: config.access_token_leeway_seconds,
    }
}

/// Key → verifier → gate, in that order. Any failure here is fatal.
pub async fn build_access_gate(
    key_provider: &KeyProvider,
    config: &Config,
    evaluator: Arc<dyn PermissionEvaluator>,
    denied_handler: Arc<dyn AccessDeniedHandler>,
) -> Result<AccessGate, StartupError> {
    let key = key_provider.verification_key().await?;
    let verifier = TokenVerifier::new(&key, &verifier_settings(config))?;

    let gate = AccessGate::new(
        AllowList::new(&config.url_permit_all),
        verifier,
        evaluator,
        denied_handler,
    )
    .with_query_token(config.allow_query_token);

    Ok(gate)
}
