use crate::domain::{LoanEvent, LoanEventType};
use crate::ports::EventHandler;
use std::sync::Arc;

/// イベントリスナー
///
/// `loan_events`から受け取ったペイロードをデコードして、
/// アプリケーションが登録したハンドラーへ渡す。
/// 配送は重複・欠落しうるので、ハンドラーは冪等であること。
#[derive(Clone)]
pub struct EventListener {
    handler: EventHandler,
}

impl EventListener {
    pub fn new(handler: EventHandler) -> Self {
        Self { handler }
    }

    /// ログ出力だけを行うリスナー
    pub fn logging() -> Self {
        Self::new(Arc::new(log_loan_event))
    }

    /// 受信したペイロードを処理する
    ///
    /// デコードできないペイロードは破棄して`false`を返す。
    pub fn deliver(&self, payload: &[u8]) -> bool {
        match serde_json::from_slice::<LoanEvent>(payload) {
            Ok(event) => {
                (self.handler)(event);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Invalid loan event received, dropping");
                false
            }
        }
    }
}

/// 既定のハンドラー：イベントをログに出す
pub fn log_loan_event(event: LoanEvent) {
    match event.event_type {
        LoanEventType::LoanRequested => tracing::info!(
            loan_id = %event.loan_id,
            user_id = %event.user_id,
            book_id = %event.book_id,
            remaining_copies = ?event.remaining_copies,
            due_date = ?event.due_date,
            "User requested loan"
        ),
        LoanEventType::LoanApproved => tracing::info!(loan_id = %event.loan_id, "Loan approved"),
        LoanEventType::LoanRejected => tracing::info!(loan_id = %event.loan_id, "Loan rejected"),
        LoanEventType::LoanReturned => tracing::info!(
            loan_id = %event.loan_id,
            user_id = %event.user_id,
            book_id = %event.book_id,
            remaining_copies = ?event.remaining_copies,
            "Loan returned"
        ),
        LoanEventType::Unknown => tracing::info!(event = ?event, "Unknown loan event"),
    }
}
