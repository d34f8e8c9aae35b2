/*!
 * Principal extractor
 *
 * Responsibility:
 * - access middleware が request extensions に入れた Principal を handler に渡す
 * - 型 (Principal) は services::auth 側に置き、ここは axum との接続だけ
 */

mod core;

pub use self::core::PrincipalExtractor;
