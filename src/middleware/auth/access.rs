//! Access gate middleware.
//!
//! Runs `AccessGate::authorize` for every request:
//! - Allow(Public)            → pass through untouched
//! - Allow(Authenticated(p))  → insert `Principal` into extensions, pass through
//! - Deny(reason)             → `AccessDeniedHandler` renders the response
//!
//! Handlers read the principal back with `PrincipalExtractor`.

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};

use crate::services::auth::{Access, AccessDecision};
use crate::state::AppState;

/// Install the gate on `router`.
///
/// 例：
/// ```ignore
/// let router = Router::new().nest("/api/v1", api::v1::routes()).with_state(state.clone());
/// let router = middleware::auth::access::apply(router, state);
/// ```
pub fn apply(router: Router, state: AppState) -> Router {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();

    match state.gate.authorize(&parts).await {
        AccessDecision::Allow(Access::Public) => {}
        AccessDecision::Allow(Access::Authenticated(principal)) => {
            // middleware → extractor への受け渡し
            parts.extensions.insert(principal);
        }
        AccessDecision::Deny(reason) => return state.gate.deny(&parts, &reason),
    }

    next.run(Request::from_parts(parts, body)).await
}
