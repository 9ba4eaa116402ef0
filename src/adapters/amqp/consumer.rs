use crate::application::loan::{CommandDispatcher, Disposition};
use crate::application::messaging::EventListener;
use crate::ports::transport::{LOAN_COMMANDS_TOPIC, LOAN_EVENTS_TOPIC, Result, TransportError};
use futures::StreamExt;
use lapin::{
    Consumer,
    message::Delivery,
    options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions},
    types::FieldTable,
};
use tokio::task::JoinHandle;

use super::transport::{AmqpTransport, declare_durable_queue};

/// `loan_commands`のコンシューマーを起動する
///
/// 手動Ackで購読し、1件ずつ順番に処理する。処理結果の`Disposition`に応じて
/// Ack・再配送ありNack・再配送なしNackを返す。
/// 接続が閉じてストリームが終わるとタスクも終了する。
pub async fn spawn_command_consumer(
    transport: &AmqpTransport,
    dispatcher: CommandDispatcher,
    prefetch: u16,
) -> Result<JoinHandle<()>> {
    let channel = transport.open_channel().await?;
    declare_durable_queue(&channel, LOAN_COMMANDS_TOPIC).await?;

    channel
        .basic_qos(prefetch, BasicQosOptions::default())
        .await
        .map_err(|e| TransportError::Subscribe(format!("Failed to set prefetch: {}", e)))?;

    let mut consumer = start_consumer(
        &channel,
        LOAN_COMMANDS_TOPIC,
        "loan-command-consumer",
        BasicConsumeOptions::default(),
    )
    .await?;

    tracing::info!(queue = LOAN_COMMANDS_TOPIC, prefetch, "AMQP command consumer started");

    Ok(tokio::spawn(async move {
        // チャネルはコンシューマーと同じ寿命
        let _channel = channel;
        while let Some(delivery) = consumer.next().await {
            match delivery {
                Ok(delivery) => {
                    let disposition = dispatcher.dispatch(&delivery.data).await;
                    settle(delivery, disposition).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Command consumer delivery error");
                    break;
                }
            }
        }
        tracing::info!(queue = LOAN_COMMANDS_TOPIC, "AMQP command consumer stopped");
    }))
}

/// `loan_events`のリスナーを起動する（自動Ack）
pub async fn spawn_event_consumer(
    transport: &AmqpTransport,
    listener: EventListener,
) -> Result<JoinHandle<()>> {
    let channel = transport.open_channel().await?;
    declare_durable_queue(&channel, LOAN_EVENTS_TOPIC).await?;

    let mut consumer = start_consumer(
        &channel,
        LOAN_EVENTS_TOPIC,
        "loan-event-listener",
        BasicConsumeOptions {
            no_ack: true,
            ..Default::default()
        },
    )
    .await?;

    tracing::info!(queue = LOAN_EVENTS_TOPIC, "AMQP event listener started");

    Ok(tokio::spawn(async move {
        let _channel = channel;
        while let Some(delivery) = consumer.next().await {
            match delivery {
                Ok(delivery) => {
                    listener.deliver(&delivery.data);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Event listener delivery error");
                    break;
                }
            }
        }
        tracing::info!(queue = LOAN_EVENTS_TOPIC, "AMQP event listener stopped");
    }))
}

async fn start_consumer(
    channel: &lapin::Channel,
    queue: &str,
    tag: &str,
    options: BasicConsumeOptions,
) -> Result<Consumer> {
    channel
        .basic_consume(queue, tag, options, FieldTable::default())
        .await
        .map_err(|e| TransportError::Subscribe(format!("Failed to start consumer: {}", e)))
}

async fn settle(delivery: Delivery, disposition: Disposition) {
    let result = match disposition {
        Disposition::Ack => delivery.ack(BasicAckOptions::default()).await,
        Disposition::Requeue => {
            delivery
                .nack(BasicNackOptions {
                    requeue: true,
                    multiple: false,
                })
                .await
        }
        Disposition::DeadLetter => {
            delivery
                .nack(BasicNackOptions {
                    requeue: false,
                    multiple: false,
                })
                .await
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, disposition = ?disposition, "Failed to settle delivery");
    }
}
