use crate::domain::LoanEvent;
use async_trait::async_trait;
use std::sync::Arc;

/// イベント発行ポート
///
/// 貸出エンジンがドメインイベントを通知する先。
/// 発行は投げっぱなし（fire-and-forget）で、失敗は呼び出し側に返らない。
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: LoanEvent);
}

/// イベントハンドラー
///
/// アプリケーションがログや通知のために登録するコールバック。
pub type EventHandler = Arc<dyn Fn(LoanEvent) + Send + Sync>;
