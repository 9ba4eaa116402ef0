use async_trait::async_trait;
use thiserror::Error;

/// コマンド用のトピック（キュー／チャネル名）
pub const LOAN_COMMANDS_TOPIC: &str = "loan_commands";

/// イベント用のトピック（キュー／チャネル名）
pub const LOAN_EVENTS_TOPIC: &str = "loan_events";

/// 起動時に宣言する永続トピック
pub const DURABLE_TOPICS: [&str; 2] = [LOAN_EVENTS_TOPIC, LOAN_COMMANDS_TOPIC];

/// トランスポート層のエラー
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Subscribe failed: {0}")]
    Subscribe(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// メッセージトランスポートポート
///
/// 永続ブローカー（AMQP）とフォールバック（Redis Pub/Sub）の両方が実装する。
/// ペイロードはJSONエンコード済みのバイト列。
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// ログ用の名前
    fn name(&self) -> &'static str;

    /// トピックへ発行する
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<()>;
}
