use axum::{Json, extract::State};
use std::sync::Arc;

use crate::application::messaging::TransportSelector;

use super::types::TransportStatusResponse;

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub selector: Arc<TransportSelector>,
}

// ============================================================================
// Health handlers (GET)
// ============================================================================

/// GET /health - プロセスの生存確認
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /health/transport - 起動時に選ばれたトランスポート
///
/// モードはプロセスの生存期間中に変わらない。
pub async fn transport_status(State(state): State<Arc<AppState>>) -> Json<TransportStatusResponse> {
    Json(TransportStatusResponse {
        mode: state.selector.mode(),
        fallback_available: state.selector.fallback().is_some(),
    })
}
