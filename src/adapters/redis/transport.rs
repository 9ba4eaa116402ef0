use crate::ports::transport::{MessageTransport, Result, TransportError};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager, aio::PubSub};

/// Redisトランスポート
///
/// 発行には`ConnectionManager`を使い、購読は購読ごとに専用の接続を開く。
#[derive(Clone)]
pub struct RedisTransport {
    client: Client,
    conn: ConnectionManager,
}

impl RedisTransport {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url)
            .map_err(|e| TransportError::Connection(format!("Failed to create Redis client: {}", e)))?;

        let conn = ConnectionManager::new(client.clone()).await.map_err(|e| {
            TransportError::Connection(format!("Failed to create Redis connection manager: {}", e))
        })?;

        Ok(Self { client, conn })
    }

    pub(super) async fn subscribe(&self, channel: &str) -> Result<PubSub> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| TransportError::Subscribe(format!("Failed to open pubsub connection: {}", e)))?;

        pubsub
            .subscribe(channel)
            .await
            .map_err(|e| TransportError::Subscribe(format!("Failed to subscribe to {}: {}", channel, e)))?;

        Ok(pubsub)
    }
}

#[async_trait]
impl MessageTransport for RedisTransport {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<()> {
        let mut conn = self.conn.clone();
        let receivers: i64 = conn
            .publish(topic, payload)
            .await
            .map_err(|e| TransportError::Publish(format!("Failed to publish: {}", e)))?;

        if receivers == 0 {
            tracing::debug!(channel = %topic, "Published with no active subscribers");
        }
        Ok(())
    }
}
