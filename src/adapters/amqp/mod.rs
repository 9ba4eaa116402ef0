//! AMQP（RabbitMQ）の永続ブローカーアダプター
//!
//! トピック名をそのまま永続キュー名として使い、デフォルトエクスチェンジ経由で発行する。

mod consumer;
mod transport;

pub use consumer::{spawn_command_consumer, spawn_event_consumer};
pub use transport::AmqpTransport;
