//! Shared fixtures for unit tests.

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::Value;

use crate::services::auth::key_provider::VerificationKey;

pub const ED25519_PRIVATE_PEM: &str = include_str!("../tests/fixtures/ed25519_private.pem");
pub const ED25519_PUBLIC_PEM: &str = include_str!("../tests/fixtures/ed25519_public.pem");
pub const ED25519_OTHER_PUBLIC_PEM: &str =
    include_str!("../tests/fixtures/ed25519_other_public.pem");
pub const RSA_PRIVATE_PEM: &str = include_str!("../tests/fixtures/rsa_private.pem");
pub const RSA_PUBLIC_PEM: &str = include_str!("../tests/fixtures/rsa_public.pem");

pub fn ed25519_public_key() -> VerificationKey {
    VerificationKey::new(ED25519_PUBLIC_PEM).unwrap()
}

pub fn ed25519_other_public_key() -> VerificationKey {
    VerificationKey::new(ED25519_OTHER_PUBLIC_PEM).unwrap()
}

pub fn rsa_public_key() -> VerificationKey {
    VerificationKey::new(RSA_PUBLIC_PEM).unwrap()
}

pub fn mint_ed25519(claims: &Value) -> String {
    let key = EncodingKey::from_ed_pem(ED25519_PRIVATE_PEM.as_bytes()).unwrap();
    jsonwebtoken::encode(&Header::new(Algorithm::EdDSA), claims, &key).unwrap()
}

pub fn mint_rsa(claims: &Value) -> String {
    let key = EncodingKey::from_rsa_pem(RSA_PRIVATE_PEM.as_bytes()).unwrap();
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), claims, &key).unwrap()
}
