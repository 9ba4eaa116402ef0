use crate::ports::transport::{MessageTransport, Result, TransportError};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// 発行されたメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// 発行内容を記録するトランスポート
///
/// ブローカーなしでパブリッシャーやエンジンを検証するために使う。
/// `fail_publishes(true)`で発行エラーを再現できる。
pub struct RecordingTransport {
    name: &'static str,
    published: Mutex<Vec<PublishedMessage>>,
    fail: AtomicBool,
}

impl RecordingTransport {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            published: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail_publishes(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// これまでに発行されたメッセージ
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// 指定トピックへ発行されたペイロード
    pub fn payloads(&self, topic: &str) -> Vec<Vec<u8>> {
        self.published()
            .into_iter()
            .filter(|m| m.topic == topic)
            .map(|m| m.payload)
            .collect()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Publish(format!(
                "{} rejected publish to {}",
                self.name, topic
            )));
        }
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(PublishedMessage {
                topic: topic.to_string(),
                payload: payload.to_vec(),
            });
        Ok(())
    }
}
