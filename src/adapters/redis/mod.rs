//! Redis Pub/Subのフォールバックアダプター
//!
//! 永続性も確認応答もない。購読していないときに発行されたメッセージは失われる。

mod subscriber;
mod transport;

pub use subscriber::{spawn_command_subscriber, spawn_event_subscriber};
pub use transport::RedisTransport;
