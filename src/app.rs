/*
 * Responsibility
 * - Config 読み込み → verification key 取得 → AccessGate 組み立て
 * - Router 組み立て (access middleware → HTTP layers)
 * - axum::serve() で起動
 * - key が取れない / 壊れている場合は listener を bind する前に失敗させる
 */
use std::{panic, process, sync::Arc};

use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::Config;
use crate::error::{AppError, StartupError};
use crate::middleware;
use crate::services::auth::factory::{build_access_gate, build_key_provider};
use crate::services::auth::{
    AccessDeniedHandler, AuthenticatedEvaluator, JsonAccessDeniedHandler, KeyProvider,
    PermissionEvaluator,
};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,gateway_auth=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // In development, fail fast. In production, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<(), StartupError> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting gateway in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let key_provider = build_key_provider(&config)?;
    let state = bootstrap(
        &config,
        &key_provider,
        Arc::new(AuthenticatedEvaluator),
        Arc::new(JsonAccessDeniedHandler),
    )
    .await
    .inspect_err(|err| tracing::error!(error = %err, "bootstrap failed; not serving"))?;

    let app = build_router(state, &config);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build process-level services and inject them into the shared state.
///
/// KeyProvider → TokenVerifier → AccessGate. Nothing here is retried.
pub async fn bootstrap(
    config: &Config,
    key_provider: &KeyProvider,
    evaluator: Arc<dyn PermissionEvaluator>,
    denied_handler: Arc<dyn AccessDeniedHandler>,
) -> Result<AppState, StartupError> {
    let gate = build_access_gate(key_provider, config, evaluator, denied_handler).await?;

    tracing::info!(
        permit_all = ?config.url_permit_all,
        algorithm = ?config.jwt_algorithm,
        "access gate ready"
    );

    Ok(AppState::new(Arc::new(gate)))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    async fn not_found() -> AppError {
        AppError::NotFound
    }

    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes())
        .fallback(not_found)
        .with_state(state.clone());

    // Gate first, HTTP layers outermost.
    let router = middleware::auth::access::apply(router, state);
    middleware::http::apply(router, config)
}
