use std::sync::Arc;

use async_trait::async_trait;
use slide_api::GatewayError;
use tokio::sync::RwLock;

use super::ConfigSwitch;
use crate::models::{
    DeviceSnapshot, EntityCategory, SnapshotCollection, SwitchView, TOUCH_AND_GO_NAME,
    TOUCH_AND_GO_SUFFIX,
};
use crate::services::{EventBus, EventPayload, SWITCH_TOPIC};

/// Touch and Go setting of a slide.
///
/// Read-only: the cloud offers no way to change it, so toggling does nothing.
pub struct TouchAndGoSwitch {
    unique_id: String,
    device_id: String,
    device_unique_id: String,
    state: RwLock<Option<bool>>,
    event_bus: Arc<EventBus>,
}

impl TouchAndGoSwitch {
    pub fn new(snapshot: &DeviceSnapshot, event_bus: Arc<EventBus>) -> Self {
        Self {
            unique_id: format!("{}{}", snapshot.unique_id, TOUCH_AND_GO_SUFFIX),
            device_id: snapshot.device_id.clone(),
            device_unique_id: snapshot.unique_id.clone(),
            state: RwLock::new(snapshot.touch_and_go_enabled),
            event_bus,
        }
    }

    async fn write_state(&self) {
        if !self.event_bus.has_subscribers(SWITCH_TOPIC).await {
            return;
        }
        let view = self.view().await;
        let _ = self
            .event_bus
            .publish(SWITCH_TOPIC, EventPayload::SwitchUpdated(view))
            .await;
    }
}

#[async_trait]
impl ConfigSwitch for TouchAndGoSwitch {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        TOUCH_AND_GO_NAME
    }

    async fn view(&self) -> SwitchView {
        let state = *self.state.read().await;
        SwitchView {
            unique_id: self.unique_id.clone(),
            name: TOUCH_AND_GO_NAME.to_string(),
            device: self.device_unique_id.clone(),
            state,
            is_on: state == Some(true),
            is_off: state == Some(false),
            entity_category: EntityCategory::Config,
        }
    }

    async fn is_on(&self) -> bool {
        *self.state.read().await == Some(true)
    }

    async fn is_off(&self) -> bool {
        *self.state.read().await == Some(false)
    }

    async fn turn_on(&self) -> Result<(), GatewayError> {
        tracing::debug!("{}: turn on ignored", self.unique_id);
        Ok(())
    }

    async fn turn_off(&self) -> Result<(), GatewayError> {
        tracing::debug!("{}: turn off ignored", self.unique_id);
        Ok(())
    }

    async fn handle_coordinator_update(&self, data: &SnapshotCollection) {
        let Some(snapshot) = data.get(&self.device_id) else {
            return;
        };

        let changed = {
            let mut state = self.state.write().await;
            let changed = *state != snapshot.touch_and_go_enabled;
            *state = snapshot.touch_and_go_enabled;
            changed
        };

        if changed {
            self.write_state().await;
        }
    }
}
