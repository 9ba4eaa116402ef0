use crate::application::loan::CommandDispatcher;
use crate::application::messaging::EventListener;
use crate::ports::transport::{LOAN_COMMANDS_TOPIC, LOAN_EVENTS_TOPIC, Result};
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::transport::RedisTransport;

/// `loan_commands`チャネルの購読を開始する
///
/// Pub/SubにはAck/Nackがないので、処理結果はログに残すだけ。
/// 失敗したコマンドは再配送されない。
pub async fn spawn_command_subscriber(
    transport: &RedisTransport,
    dispatcher: CommandDispatcher,
) -> Result<JoinHandle<()>> {
    let pubsub = transport.subscribe(LOAN_COMMANDS_TOPIC).await?;
    tracing::info!(channel = LOAN_COMMANDS_TOPIC, "Redis command subscriber started");

    Ok(tokio::spawn(async move {
        let mut messages = std::pin::pin!(pubsub.into_on_message());
        while let Some(msg) = messages.next().await {
            let disposition = dispatcher.dispatch(msg.get_payload_bytes()).await;
            tracing::debug!(disposition = ?disposition, "Fallback command processed");
        }
        tracing::info!(channel = LOAN_COMMANDS_TOPIC, "Redis command subscriber stopped");
    }))
}

/// `loan_events`チャネルの購読を開始する
pub async fn spawn_event_subscriber(
    transport: &RedisTransport,
    listener: EventListener,
) -> Result<JoinHandle<()>> {
    let pubsub = transport.subscribe(LOAN_EVENTS_TOPIC).await?;
    tracing::info!(channel = LOAN_EVENTS_TOPIC, "Redis event subscriber started");

    Ok(tokio::spawn(async move {
        let mut messages = std::pin::pin!(pubsub.into_on_message());
        while let Some(msg) = messages.next().await {
            listener.deliver(msg.get_payload_bytes());
        }
        tracing::info!(channel = LOAN_EVENTS_TOPIC, "Redis event subscriber stopped");
    }))
}
