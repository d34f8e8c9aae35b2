#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::get;
use axum::Router;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::Value;

use gateway_auth::config::Config;

pub const ED25519_PRIVATE_PEM: &str = include_str!("../fixtures/ed25519_private.pem");
pub const ED25519_PUBLIC_PEM: &str = include_str!("../fixtures/ed25519_public.pem");
pub const RSA_PRIVATE_PEM: &str = include_str!("../fixtures/rsa_private.pem");
pub const RSA_PUBLIC_PEM: &str = include_str!("../fixtures/rsa_public.pem");

pub fn config(vars: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned()).expect("valid test config")
}

pub fn mint_ed25519(claims: &Value) -> String {
    let key = EncodingKey::from_ed_pem(ED25519_PRIVATE_PEM.as_bytes()).unwrap();
    jsonwebtoken::encode(&Header::new(Algorithm::EdDSA), claims, &key).unwrap()
}

pub fn mint_rsa(claims: &Value) -> String {
    let key = EncodingKey::from_rsa_pem(RSA_PRIVATE_PEM.as_bytes()).unwrap();
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), claims, &key).unwrap()
}

#[derive(Clone)]
struct KeyEndpoint {
    status: StatusCode,
    body: String,
    delay: Duration,
    hits: Arc<AtomicUsize>,
    authorizations: Arc<Mutex<Vec<Option<String>>>>,
}

async fn token_key(
    State(endpoint): State<KeyEndpoint>,
    headers: HeaderMap,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    endpoint.hits.fetch_add(1, Ordering::SeqCst);
    endpoint.authorizations.lock().unwrap().push(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );

    if !endpoint.delay.is_zero() {
        tokio::time::sleep(endpoint.delay).await;
    }

    (
        endpoint.status,
        [(header::CONTENT_TYPE, "application/json")],
        endpoint.body.clone(),
    )
}

/// Stand-in authorization server exposing `/oauth/token_key` on an ephemeral port.
pub struct KeyServer {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    authorizations: Arc<Mutex<Vec<Option<String>>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl KeyServer {
    pub async fn spawn(status: StatusCode, body: impl Into<String>) -> Self {
        Self::spawn_with_delay(status, body, Duration::ZERO).await
    }

    pub async fn spawn_with_delay(
        status: StatusCode,
        body: impl Into<String>,
        delay: Duration,
    ) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let authorizations = Arc::new(Mutex::new(Vec::new()));
        let endpoint = KeyEndpoint {
            status,
            body: body.into(),
            delay,
            hits: hits.clone(),
            authorizations: authorizations.clone(),
        };

        let app = Router::new()
            .route("/oauth/token_key", get(token_key))
            .with_state(endpoint);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            hits,
            authorizations,
            handle,
        }
    }

    pub fn key_uri(&self) -> String {
        format!("{}/oauth/token_key", self.base_url)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.authorizations.lock().unwrap().clone()
    }
}

impl Drop for KeyServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
