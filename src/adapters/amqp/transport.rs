use crate::ports::transport::{DURABLE_TOPICS, MessageTransport, Result, TransportError};
use async_trait::async_trait;
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties,
    options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions},
    types::FieldTable,
};

/// AMQPトランスポート
///
/// 接続と発行用チャネルを1つずつ持つ。コンシューマーは別チャネルを開く。
pub struct AmqpTransport {
    connection: Connection,
    channel: Channel,
}

impl AmqpTransport {
    /// ブローカーへ接続し、永続トピックを宣言する
    ///
    /// 宣言は冪等なので、既存のキューがあってもそのまま使う。
    pub async fn connect(url: &str) -> Result<Self> {
        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| TransportError::Connection(format!("Failed to connect: {}", e)))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| TransportError::Connection(format!("Failed to create channel: {}", e)))?;

        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| {
                TransportError::Connection(format!("Failed to enable publisher confirms: {}", e))
            })?;

        for topic in DURABLE_TOPICS {
            declare_durable_queue(&channel, topic).await?;
        }

        tracing::info!(topics = ?DURABLE_TOPICS, "Declared durable AMQP queues");

        Ok(Self {
            connection,
            channel,
        })
    }

    /// コンシューマー用の新しいチャネルを開く
    pub(super) async fn open_channel(&self) -> Result<Channel> {
        let channel = self
            .connection
            .create_channel()
            .await
            .map_err(|e| TransportError::Subscribe(format!("Failed to create channel: {}", e)))?;
        Ok(channel)
    }

    /// 接続を閉じる（コンシューマーのストリームも終了する）
    pub async fn close(&self) {
        if let Err(e) = self.connection.close(200, "shutdown").await {
            tracing::warn!(error = %e, "Failed to close AMQP connection");
        }
    }
}

pub(super) async fn declare_durable_queue(channel: &Channel, topic: &str) -> Result<()> {
    channel
        .queue_declare(
            topic,
            QueueDeclareOptions {
                durable: true,
                auto_delete: false,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(|e| TransportError::Connection(format!("Failed to declare queue {}: {}", topic, e)))?;
    Ok(())
}

#[async_trait]
impl MessageTransport for AmqpTransport {
    fn name(&self) -> &'static str {
        "amqp"
    }

    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<()> {
        let properties = BasicProperties::default()
            .with_content_type("application/json".into())
            .with_delivery_mode(2); // persistent

        let confirm = self
            .channel
            .basic_publish(
                "",
                topic,
                BasicPublishOptions::default(),
                payload,
                properties,
            )
            .await
            .map_err(|e| TransportError::Publish(format!("Failed to publish: {}", e)))?;

        let confirmation = confirm
            .await
            .map_err(|e| TransportError::Publish(format!("Publish confirmation failed: {}", e)))?;

        if confirmation.is_nack() {
            return Err(TransportError::Publish(format!(
                "Broker rejected message on {}",
                topic
            )));
        }

        Ok(())
    }
}
