use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::{RwLock, broadcast};

use crate::models::{CoverView, SwitchView};

pub const COVER_TOPIC: &str = "cover.state";
pub const SWITCH_TOPIC: &str = "switch.state";
pub const COORDINATOR_TOPIC: &str = "coordinator.refresh";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    CoverUpdated(CoverView),
    SwitchUpdated(SwitchView),
    SnapshotsRefreshed {
        devices: usize,
        online: usize,
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },
    RefreshFailed {
        error: String,
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },
}

pub struct EventBus {
    publishers: Arc<RwLock<HashMap<String, broadcast::Sender<EventPayload>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            publishers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn publish(
        &self,
        event_type: &str,
        payload: EventPayload,
    ) -> Result<usize, broadcast::error::SendError<EventPayload>> {
        let sender = self.sender(event_type).await;
        sender.send(payload)
    }

    pub async fn subscribe(&self, event_type: &str) -> broadcast::Receiver<EventPayload> {
        let sender = self.sender(event_type).await;
        sender.subscribe()
    }

    pub async fn has_subscribers(&self, event_type: &str) -> bool {
        let publishers = self.publishers.read().await;
        if let Some(sender) = publishers.get(event_type) {
            sender.receiver_count() > 0
        } else {
            false
        }
    }

    async fn sender(&self, event_type: &str) -> broadcast::Sender<EventPayload> {
        let mut publishers = self.publishers.write().await;
        publishers
            .entry(event_type.to_string())
            .or_insert_with(|| broadcast::channel(100).0)
            .clone()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
