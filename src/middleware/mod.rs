/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: access gate (permit-all → bearer → policy)
 * - http: request-id / body limit / timeout / trace
 */
pub mod auth;
pub mod http;
