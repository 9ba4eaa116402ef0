use crate::domain::{LoanCommand, LoanEvent};
use crate::ports::EventSink;
use crate::ports::transport::{LOAN_COMMANDS_TOPIC, LOAN_EVENTS_TOPIC};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use super::selector::TransportSelector;

/// 発行の結果
///
/// 発行は投げっぱなしなので、トランスポートのエラーは呼び出し側に返らない。
/// どの経路で届いた（届かなかった）かだけをログ・テスト用に返す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// 永続ブローカーへ発行した
    Primary,
    /// 永続ブローカーへの発行に失敗し、フォールバックへミラーした
    Mirrored,
    /// フォールバックのみのモードでフォールバックへ発行した
    Fallback,
    /// どこにも届かなかった（フォールバックなし、またはミラーも失敗）
    Dropped,
}

/// 発行前のエンコードエラー
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to encode message")]
    Encode(#[from] serde_json::Error),
}

/// コマンド／イベントのパブリッシャー
///
/// 配送は exactly-once ではない。ミラーにより重複することも、
/// 両経路の失敗で欠落することもある。
#[derive(Clone)]
pub struct LoanPublisher {
    selector: Arc<TransportSelector>,
}

impl LoanPublisher {
    pub fn new(selector: Arc<TransportSelector>) -> Self {
        Self { selector }
    }

    /// エンコード済みのペイロードをトピックへ発行する
    ///
    /// - 主経路が有効：永続発行を試み、失敗したらフォールバックへベストエフォートでミラー
    /// - フォールバックのみ：フォールバックへ発行（クライアントがなければ no-op）
    pub async fn publish(&self, topic: &str, payload: &[u8]) -> PublishOutcome {
        let Some(primary) = self.selector.primary() else {
            return if self.publish_fallback(topic, payload).await {
                PublishOutcome::Fallback
            } else {
                PublishOutcome::Dropped
            };
        };

        match primary.publish(topic, payload).await {
            Ok(()) => {
                tracing::debug!(transport = primary.name(), topic = %topic, "Published message");
                PublishOutcome::Primary
            }
            Err(e) => {
                tracing::error!(
                    transport = primary.name(),
                    topic = %topic,
                    error = %e,
                    "Publish failed, mirroring to fallback transport"
                );
                if self.publish_fallback(topic, payload).await {
                    PublishOutcome::Mirrored
                } else {
                    PublishOutcome::Dropped
                }
            }
        }
    }

    /// 貸出コマンドをJSONにして`loan_commands`へ発行する
    pub async fn publish_loan_command(
        &self,
        cmd: &LoanCommand,
    ) -> Result<PublishOutcome, PublishError> {
        let payload = serde_json::to_vec(cmd)?;
        Ok(self.publish(LOAN_COMMANDS_TOPIC, &payload).await)
    }

    /// 貸出イベントをJSONにして`loan_events`へ発行する
    pub async fn publish_event(&self, event: &LoanEvent) -> Result<PublishOutcome, PublishError> {
        let payload = serde_json::to_vec(event)?;
        Ok(self.publish(LOAN_EVENTS_TOPIC, &payload).await)
    }

    async fn publish_fallback(&self, topic: &str, payload: &[u8]) -> bool {
        let Some(fallback) = self.selector.fallback() else {
            tracing::debug!(topic = %topic, "No fallback transport, message dropped");
            return false;
        };

        match fallback.publish(topic, payload).await {
            Ok(()) => {
                tracing::debug!(transport = fallback.name(), topic = %topic, "Published message");
                true
            }
            Err(e) => {
                tracing::warn!(
                    transport = fallback.name(),
                    topic = %topic,
                    error = %e,
                    "Fallback publish failed, message dropped"
                );
                false
            }
        }
    }
}

#[async_trait]
impl EventSink for LoanPublisher {
    async fn emit(&self, event: LoanEvent) {
        match self.publish_event(&event).await {
            Ok(outcome) => tracing::debug!(
                event_type = ?event.event_type,
                loan_id = %event.loan_id,
                outcome = ?outcome,
                "Loan event emitted"
            ),
            Err(e) => tracing::error!(
                event_type = ?event.event_type,
                loan_id = %event.loan_id,
                error = %e,
                "Failed to encode loan event"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::RecordingTransport;
    use crate::domain::{BookId, UserId};
    use crate::ports::MessageTransport;

    fn selector(
        primary: Option<Arc<RecordingTransport>>,
        fallback: Option<Arc<RecordingTransport>>,
    ) -> Arc<TransportSelector> {
        let fallback = fallback.map(|f| f as Arc<dyn MessageTransport>);
        Arc::new(match primary {
            Some(p) => TransportSelector::with_primary(p, fallback),
            None => TransportSelector::fallback_only(fallback),
        })
    }

    #[tokio::test]
    async fn test_primary_publish_does_not_touch_fallback() {
        let primary = Arc::new(RecordingTransport::new("amqp"));
        let fallback = Arc::new(RecordingTransport::new("redis"));
        let publisher = LoanPublisher::new(selector(Some(primary.clone()), Some(fallback.clone())));

        let outcome = publisher.publish("loan_events", b"{}").await;

        assert_eq!(outcome, PublishOutcome::Primary);
        assert_eq!(primary.published().len(), 1);
        assert!(fallback.published().is_empty());
    }

    #[tokio::test]
    async fn test_primary_failure_mirrors_to_fallback() {
        let primary = Arc::new(RecordingTransport::new("amqp"));
        primary.fail_publishes(true);
        let fallback = Arc::new(RecordingTransport::new("redis"));
        let publisher = LoanPublisher::new(selector(Some(primary.clone()), Some(fallback.clone())));

        let outcome = publisher.publish("loan_commands", b"payload").await;

        assert_eq!(outcome, PublishOutcome::Mirrored);
        let mirrored = fallback.published();
        assert_eq!(mirrored.len(), 1);
        assert_eq!(mirrored[0].topic, "loan_commands");
        assert_eq!(mirrored[0].payload, b"payload".to_vec());
    }

    #[tokio::test]
    async fn test_mirror_failure_is_swallowed() {
        let primary = Arc::new(RecordingTransport::new("amqp"));
        primary.fail_publishes(true);
        let fallback = Arc::new(RecordingTransport::new("redis"));
        fallback.fail_publishes(true);
        let publisher = LoanPublisher::new(selector(Some(primary), Some(fallback)));

        assert_eq!(
            publisher.publish("loan_events", b"{}").await,
            PublishOutcome::Dropped
        );
    }

    #[tokio::test]
    async fn test_fallback_only_without_client_is_noop() {
        let publisher = LoanPublisher::new(selector(None, None));
        assert_eq!(
            publisher.publish("loan_events", b"{}").await,
            PublishOutcome::Dropped
        );
    }

    #[tokio::test]
    async fn test_publish_loan_command_encodes_json() {
        let fallback = Arc::new(RecordingTransport::new("redis"));
        let publisher = LoanPublisher::new(selector(None, Some(fallback.clone())));
        let cmd = LoanCommand::borrow(UserId::new(7), BookId::new(1), Some(5));

        let outcome = publisher.publish_loan_command(&cmd).await.unwrap();

        assert_eq!(outcome, PublishOutcome::Fallback);
        let sent = fallback.published();
        assert_eq!(sent[0].topic, LOAN_COMMANDS_TOPIC);
        let decoded: LoanCommand = serde_json::from_slice(&sent[0].payload).unwrap();
        assert_eq!(decoded, cmd);
    }
}
