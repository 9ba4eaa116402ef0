use serde::Serialize;

use crate::application::messaging::TransportMode;

/// トランスポート状態のレスポンス（GET /health/transport）
#[derive(Debug, Clone, Serialize)]
pub struct TransportStatusResponse {
    pub mode: TransportMode,
    pub fallback_available: bool,
}
