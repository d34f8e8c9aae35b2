/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - 認証は app 側で access middleware として一括適用する (ここでは掛けない)
 */
use axum::{Router, routing::get};

use crate::state::AppState;

use crate::api::v1::handlers::me::me;

pub fn routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}
