//! Per-request access decision.
//!
//! ```text
//! AllowListCheck ─ match ─────────────────────────────────────────▶ Allow(Public)
//!        │ no match
//!        ▼
//! bearer token? ─ none ───────────────────────────────────────────▶ Deny(Unauthenticated)
//!        │
//!        ▼
//! TokenVerifier::verify ─ Err ────────────────────────────────────▶ Deny(InvalidToken)
//!        │ Ok(principal)
//!        ▼
//! PermissionEvaluator ─ true ─▶ Allow(Authenticated) │ false ─▶ Deny(Forbidden)
//!                                                    │ Err   ─▶ Deny(PolicyFailure)
//! ```

use std::fmt;
use std::sync::Arc;

use axum::http::{StatusCode, header, request::Parts};
use axum::response::Response;

use crate::services::auth::access_jwt::{TokenError, TokenVerifier};
use crate::services::auth::allow_list::AllowList;
use crate::services::auth::denied::AccessDeniedHandler;
use crate::services::auth::policy::PermissionEvaluator;
use crate::services::auth::principal::Principal;

const ACCESS_TOKEN_PARAM: &str = "access_token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    InvalidToken(TokenError),
    Forbidden,
    PolicyFailure,
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidToken(err) => err.code(),
            Self::Forbidden => "forbidden",
            Self::PolicyFailure => "policy_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::PolicyFailure => StatusCode::FORBIDDEN,
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "full authentication is required"),
            Self::InvalidToken(err) => write!(f, "invalid access token: {err}"),
            Self::Forbidden => write!(f, "access is denied"),
            Self::PolicyFailure => write!(f, "access could not be evaluated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Allow-listed path; no token was looked at.
    Public,
    Authenticated(Principal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow(Access),
    Deny(DenyReason),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Self::Allow(Access::Public) => "permit_all",
            Self::Allow(Access::Authenticated(_)) => "permitted",
            Self::Deny(reason) => reason.code(),
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Allow(Access::Authenticated(p)) => Some(p),
            _ => None,
        }
    }
}

/// Shared, immutable, lock-free. Build once at startup and wrap in `Arc`.
pub struct AccessGate {
    allow_list: AllowList,
    verifier: TokenVerifier,
    evaluator: Arc<dyn PermissionEvaluator>,
    denied_handler: Arc<dyn AccessDeniedHandler>,
    allow_query_token: bool,
}

impl fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGate")
            .field("allow_list", &self.allow_list)
            .field("verifier", &self.verifier)
            .field("allow_query_token", &self.allow_query_token)
            .finish()
    }
}

impl AccessGate {
    pub fn new(
        allow_list: AllowList,
        verifier: TokenVerifier,
        evaluator: Arc<dyn PermissionEvaluator>,
        denied_handler: Arc<dyn AccessDeniedHandler>,
    ) -> Self {
        Self {
            allow_list,
            verifier,
            evaluator,
            denied_handler,
            allow_query_token: false,
        }
    }

    /// Also accept `?access_token=` when no bearer header is sent.
    pub fn with_query_token(mut self, enabled: bool) -> Self {
        self.allow_query_token = enabled;
        self
    }

    pub async fn authorize(&self, request: &Parts) -> AccessDecision {
        let path = request.uri.path();

        if let Some(pattern) = self.allow_list.find(path) {
            tracing::debug!(path, pattern = pattern.as_str(), "permit-all path");
            return AccessDecision::Allow(Access::Public);
        }

        let Some(token) = self.bearer_token(request) else {
            tracing::debug!(path, "no bearer token");
            return AccessDecision::Deny(DenyReason::Unauthenticated);
        };

        let principal = match self.verifier.verify(&token) {
            Ok(principal) => principal,
            Err(err) => {
                tracing::warn!(path, code = err.code(), error = %err, "access token rejected");
                return AccessDecision::Deny(DenyReason::InvalidToken(err));
            }
        };

        match self.evaluator.has_permission(request, &principal).await {
            Ok(true) => AccessDecision::Allow(Access::Authenticated(principal)),
            Ok(false) => {
                tracing::info!(path, subject = %principal.subject, "permission denied");
                AccessDecision::Deny(DenyReason::Forbidden)
            }
            Err(err) => {
                tracing::error!(
                    path,
                    subject = %principal.subject,
                    error = %err,
                    "permission evaluation failed; denying"
                );
                AccessDecision::Deny(DenyReason::PolicyFailure)
            }
        }
    }

    /// Hand a denial to the configured `AccessDeniedHandler`.
    pub fn deny(&self, request: &Parts, reason: &DenyReason) -> Response {
        self.denied_handler.handle(request, reason)
    }

    fn bearer_token(&self, request: &Parts) -> Option<String> {
        if let Some(value) = request.headers.get(header::AUTHORIZATION) {
            let value = value.to_str().ok()?;
            let (scheme, token) = value.split_once(' ')?;
            let token = token.trim();
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
                return Some(token.to_string());
            }
            return None;
        }

        if !self.allow_query_token {
            return None;
        }

        let query = request.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == ACCESS_TOKEN_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    }
}
