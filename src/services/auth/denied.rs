//! Rendering of denied requests.

use axum::{
    Json,
    http::{HeaderValue, header, request::Parts},
    response::{IntoResponse, Response},
};

use crate::error::{ErrorBody, ErrorResponse};
use crate::services::auth::gate::DenyReason;

/// Turns a denial into the response sent to the caller.
pub trait AccessDeniedHandler: Send + Sync {
    fn handle(&self, request: &Parts, reason: &DenyReason) -> Response;
}

/// JSON error body plus an RFC 6750 `WWW-Authenticate` challenge on 401s.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAccessDeniedHandler;

impl JsonAccessDeniedHandler {
    fn challenge(reason: &DenyReason) -> Option<HeaderValue> {
        match reason {
            DenyReason::Unauthenticated => Some(HeaderValue::from_static("Bearer")),
            DenyReason::InvalidToken(err) => HeaderValue::from_str(&format!(
                "Bearer error=\"invalid_token\", error_description=\"{}\"",
                err.code()
            ))
            .ok(),
            DenyReason::Forbidden | DenyReason::PolicyFailure => None,
        }
    }
}

impl AccessDeniedHandler for JsonAccessDeniedHandler {
    fn handle(&self, request: &Parts, reason: &DenyReason) -> Response {
        tracing::debug!(
            method = %request.method,
            path = request.uri.path(),
            code = reason.code(),
            "rendering access denial"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: reason.code(),
                message: reason.to_string(),
            },
        };

        let mut response = (reason.status(), Json(body)).into_response();
        if let Some(challenge) = Self::challenge(reason) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, challenge);
        }
        response
    }
}
