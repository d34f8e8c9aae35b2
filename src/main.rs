/*
 * Responsibility
 * - tokio runtime 起動
 * - app::run() の呼び出し（ロジックは置かない）
 * - 起動失敗 (key 取得不可など) は non-zero exit
 */
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    gateway_auth::app::run().await?;
    Ok(())
}
