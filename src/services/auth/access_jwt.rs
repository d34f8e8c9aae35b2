use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

use crate::services::auth::key_provider::VerificationKey;
use crate::services::auth::principal::Principal;

/// Why a presented access token was rejected.
///
/// All variants end in a denial; they stay distinct for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token signature does not match the verification key")]
    SignatureMismatch,
    #[error("token expired")]
    Expired,
    #[error("claim validation failed: {0}")]
    ClaimValidation(String),
}

impl TokenError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed_token",
            Self::SignatureMismatch => "signature_mismatch",
            Self::Expired => "token_expired",
            Self::ClaimValidation(_) => "invalid_claims",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => Self::SignatureMismatch,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::ClaimValidation("token not yet valid".into()),
            ErrorKind::InvalidIssuer => Self::ClaimValidation("issuer mismatch".into()),
            ErrorKind::InvalidAudience => Self::ClaimValidation("audience mismatch".into()),
            ErrorKind::InvalidSubject => Self::ClaimValidation("subject mismatch".into()),
            ErrorKind::MissingRequiredClaim(claim) => {
                Self::ClaimValidation(format!("missing required claim '{claim}'"))
            }
            ErrorKind::InvalidAlgorithm => {
                Self::Malformed("token algorithm does not match the verifier".into())
            }
            _ => Self::Malformed(err.to_string()),
        }
    }
}

/// The verification key cannot back a `TokenVerifier`.
#[derive(Debug, Error)]
pub enum InvalidKeyError {
    #[error("{algorithm:?} is not an asymmetric signature algorithm")]
    NotAsymmetric { algorithm: Algorithm },
    #[error("verification key is not a valid {algorithm:?} public key: {source}")]
    Unparsable {
        algorithm: Algorithm,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
}

#[derive(Debug, Clone)]
pub struct VerifierSettings {
    pub algorithm: Algorithm,
    // Enforced only when set.
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_seconds: u64,
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::RS256,
            issuer: None,
            audience: None,
            leeway_seconds: 60,
        }
    }
}

/// `scope` is a space-delimited string (RFC 8693) or a JSON array (Spring OAuth2).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ScopeClaim {
    Delimited(String),
    List(Vec<String>),
}

impl ScopeClaim {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::Delimited(s) => s.split_whitespace().map(str::to_string).collect(),
            Self::List(v) => v,
        }
    }
}

/// Access token claims.
///
/// `iss`/`aud`/`exp`/`nbf` are checked by `jsonwebtoken::Validation` before this is built.
#[derive(Debug, Clone, Deserialize)]
struct AccessTokenClaims {
    #[serde(default)]
    sub: Option<String>,
    // Authorization-server user tokens carry the user here instead of `sub`
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    client_id: Option<String>,

    exp: u64,
    #[serde(default)]
    jti: Option<String>,

    #[serde(default)]
    scope: Option<ScopeClaim>,
    #[serde(default)]
    authorities: Vec<String>,
    #[serde(default)]
    roles: Vec<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AccessTokenClaims {
    fn into_principal(self) -> Result<Principal, TokenError> {
        let client_id = non_blank(self.client_id);

        let subject = non_blank(self.sub)
            .or_else(|| non_blank(self.user_name))
            .or_else(|| client_id.clone())
            .ok_or_else(|| TokenError::ClaimValidation("token carries no subject".into()))?;

        let mut authorities: Vec<String> = Vec::new();
        for a in self.authorities.into_iter().chain(self.roles) {
            if !authorities.contains(&a) {
                authorities.push(a);
            }
        }

        Ok(Principal {
            subject,
            client_id,
            authorities,
            scopes: self.scope.map(ScopeClaim::into_vec).unwrap_or_default(),
            token_id: self.jti,
            expires_at: self.exp,
        })
    }
}

/// Access-token verifier bound to one public key.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(key: &VerificationKey, settings: &VerifierSettings) -> Result<Self, InvalidKeyError> {
        let algorithm = settings.algorithm;
        let pem = key.as_bytes();

        let decoding_key = match algorithm {
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => DecodingKey::from_rsa_pem(pem),
            Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem),
            Algorithm::EdDSA => DecodingKey::from_ed_pem(pem),
            _ => return Err(InvalidKeyError::NotAsymmetric { algorithm }),
        }
        .map_err(|source| InvalidKeyError::Unparsable { algorithm, source })?;

        let mut validation = Validation::new(algorithm);
        validation.validate_nbf = true;
        validation.leeway = settings.leeway_seconds;
        if let Some(issuer) = &settings.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &settings.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Verify signature and claims, then build the request principal.
    pub fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        let data = jsonwebtoken::decode::<AccessTokenClaims>(
            token,
            &self.decoding_key,
            &self.validation,
        )?;

        data.claims.into_principal()
    }
}
