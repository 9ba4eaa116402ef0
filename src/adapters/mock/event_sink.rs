use crate::domain::LoanEvent;
use crate::ports::event_sink::EventSink as EventSinkTrait;
use async_trait::async_trait;
use std::sync::Mutex;

/// Mock implementation of EventSink
///
/// 発行されたイベントを順番に記録する。
pub struct EventSink {
    events: Mutex<Vec<LoanEvent>>,
}

impl EventSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// 記録済みイベントのスナップショット
    pub fn events(&self) -> Vec<LoanEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSinkTrait for EventSink {
    async fn emit(&self, event: LoanEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
