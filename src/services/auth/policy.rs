//! Authorization policy seam.
//!
//! The gate authenticates; the final allow/deny for an authenticated caller is
//! delegated to a `PermissionEvaluator`.

use async_trait::async_trait;
use axum::http::request::Parts;
use thiserror::Error;

use crate::services::auth::principal::Principal;

/// The evaluator could not reach a decision. Treated as a denial.
#[derive(Debug, Error)]
#[error("permission evaluation failed: {message}")]
pub struct PolicyEvaluationError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl PolicyEvaluationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Decides whether an authenticated caller may perform `request`.
///
/// Called at most once per gated request and never while the gate holds a
/// lock, so implementations are free to do their own I/O.
#[async_trait]
pub trait PermissionEvaluator: Send + Sync {
    async fn has_permission(
        &self,
        request: &Parts,
        principal: &Principal,
    ) -> Result<bool, PolicyEvaluationError>;
}

/// Permits every caller holding a verified token.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticatedEvaluator;

#[async_trait]
impl PermissionEvaluator for AuthenticatedEvaluator {
    async fn has_permission(
        &self,
        _request: &Parts,
        _principal: &Principal,
    ) -> Result<bool, PolicyEvaluationError> {
        Ok(true)
    }
}
