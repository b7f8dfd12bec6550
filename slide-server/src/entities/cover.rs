use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use slide_api::{GatewayError, SlideGateway, SlideId};
use tokio::sync::RwLock;

use super::Cover;
use crate::models::{
    CoverState, CoverStatus, CoverView, DeviceClass, DeviceInfo, DeviceRuntime, DeviceSnapshot,
    MANUFACTURER, MODEL, SOFTWARE_VERSION, SnapshotCollection, TOUCH_AND_GO_SUFFIX,
};
use crate::services::{Actuated, COVER_TOPIC, CommandSequencer, EventBus, EventPayload, StateMachine};

#[derive(Debug, Clone, Default)]
struct Attributes {
    slide_setup: Option<serde_json::Value>,
    curtain_type: Option<serde_json::Value>,
}

/// Cover entity backed by one slide.
pub struct SlideCover {
    slide_id: SlideId,
    device_id: String,
    unique_id: String,
    name: String,
    machine: StateMachine,
    runtime: RwLock<DeviceRuntime>,
    attributes: RwLock<Attributes>,
    gateway: Arc<dyn SlideGateway>,
    sequencer: Arc<CommandSequencer>,
    event_bus: Arc<EventBus>,
    request_timeout: Duration,
}

impl SlideCover {
    pub fn new(
        snapshot: &DeviceSnapshot,
        machine: StateMachine,
        gateway: Arc<dyn SlideGateway>,
        sequencer: Arc<CommandSequencer>,
        event_bus: Arc<EventBus>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            slide_id: snapshot.slide_id,
            device_id: snapshot.device_id.clone(),
            unique_id: snapshot.unique_id.clone(),
            name: snapshot.name.clone(),
            runtime: RwLock::new(DeviceRuntime::from_snapshot(snapshot, &machine)),
            attributes: RwLock::new(Attributes {
                slide_setup: snapshot.slide_setup.clone(),
                curtain_type: snapshot.curtain_type.clone(),
            }),
            machine,
            gateway,
            sequencer,
            event_bus,
            request_timeout,
        }
    }

    pub async fn runtime_snapshot(&self) -> DeviceRuntime {
        self.runtime.read().await.clone()
    }

    fn device_info(&self, runtime: &DeviceRuntime) -> DeviceInfo {
        DeviceInfo {
            identifier: self.unique_id.clone(),
            name: self.name.clone(),
            manufacturer: MANUFACTURER.to_string(),
            model: MODEL.to_string(),
            sw_version: SOFTWARE_VERSION.to_string(),
            hw_version: runtime.hardware_revision,
            zone_id: runtime.zone_id,
            linked_entities: vec![format!("{}{}", self.unique_id, TOUCH_AND_GO_SUFFIX)],
        }
    }
}

#[async_trait]
impl Actuated for SlideCover {
    fn slide_id(&self) -> SlideId {
        self.slide_id
    }

    fn runtime(&self) -> &RwLock<DeviceRuntime> {
        &self.runtime
    }

    async fn write_state(&self) {
        if !self.event_bus.has_subscribers(COVER_TOPIC).await {
            return;
        }
        let view = self.view().await;
        let _ = self
            .event_bus
            .publish(COVER_TOPIC, EventPayload::CoverUpdated(view))
            .await;
    }
}

#[async_trait]
impl Cover for SlideCover {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn view(&self) -> CoverView {
        let runtime = self.runtime.read().await;
        let attributes = self.attributes.read().await;
        let state = runtime.state;
        let known = state != CoverState::Unknown;

        CoverView {
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            status: CoverStatus::new(state, runtime.online),
            position: runtime
                .position
                .map(|position| self.machine.current_cover_position(position)),
            is_opening: state == CoverState::Opening,
            is_closing: state == CoverState::Closing,
            is_open: known.then_some(state == CoverState::Open),
            is_closed: known.then_some(state == CoverState::Closed),
            available: runtime.online,
            assumed_state: true,
            device_class: DeviceClass::Curtain,
            slide_setup: attributes.slide_setup.clone(),
            curtain_type: attributes.curtain_type.clone(),
            device: self.device_info(&runtime),
        }
    }

    async fn open_cover(&self) -> Result<(), GatewayError> {
        self.sequencer.open(self).await
    }

    async fn close_cover(&self) -> Result<(), GatewayError> {
        self.sequencer.close(self).await
    }

    async fn stop_cover(&self) -> Result<(), GatewayError> {
        self.sequencer.stop(self).await
    }

    async fn set_cover_position(&self, position: u8) -> Result<(), GatewayError> {
        self.sequencer.set_position(self, position).await
    }

    async fn update(&self) -> Result<(), GatewayError> {
        let result = tokio::time::timeout(self.request_timeout, self.gateway.slide_info(self.slide_id))
            .await
            .map_err(|_| GatewayError::Timeout(self.request_timeout))
            .and_then(|result| result);

        {
            let mut runtime = self.runtime.write().await;
            match &result {
                Ok(info) => {
                    if info.calib_time.is_some() {
                        runtime.calibration_time_ms = info.calib_time;
                    }
                    if info.board_rev.is_some() {
                        runtime.hardware_revision = info.board_rev;
                    }
                    runtime.observe(info.pos, &self.machine);
                }
                Err(e) => {
                    tracing::error!("{}: slide info failed: {}", self.unique_id, e);
                    runtime.online = false;
                }
            }
        }
        self.write_state().await;

        result.map(|_| ())
    }

    async fn handle_coordinator_update(&self, data: &SnapshotCollection) {
        {
            let mut runtime = self.runtime.write().await;
            match data.get(&self.device_id) {
                Some(snapshot) => {
                    runtime.apply_snapshot(snapshot, &self.machine);

                    let mut attributes = self.attributes.write().await;
                    attributes.slide_setup = snapshot.slide_setup.clone();
                    attributes.curtain_type = snapshot.curtain_type.clone();
                }
                None => {
                    tracing::warn!("{}: missing from overview", self.unique_id);
                    runtime.online = false;
                }
            }
        }
        self.write_state().await;
    }
}
