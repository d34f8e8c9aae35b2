/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - gate: 起動時に一度だけ組み立てた AccessGate
 * - Clone 前提で持つ (内部は Arc)
 */
use std::sync::Arc;

use crate::services::auth::AccessGate;

#[derive(Clone, Debug)]
pub struct AppState {
    pub gate: Arc<AccessGate>,
}

impl AppState {
    pub fn new(gate: Arc<AccessGate>) -> Self {
        Self { gate }
    }
}
