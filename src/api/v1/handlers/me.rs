/*
 * Responsibility
 * - GET /api/v1/me
 * - access middleware が検証した Principal をそのまま返す
 */
use axum::Json;

use crate::api::v1::dto::me::MeResponse;
use crate::api::v1::extractors::PrincipalExtractor;

pub async fn me(PrincipalExtractor(principal): PrincipalExtractor) -> Json<MeResponse> {
    Json(MeResponse::from(principal))
}
