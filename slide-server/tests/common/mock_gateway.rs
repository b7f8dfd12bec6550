use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use slide_api::{GatewayError, SlideGateway, SlideId, SlideInfo, SlideRecord};
use slide_server::context::{IntegrationContext, IntegrationOptions};
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetPosition(SlideId, f64),
    Stop(SlideId),
}

/// In-memory account with scripted failures.
#[derive(Default)]
pub struct MockGateway {
    slides: Mutex<Vec<SlideRecord>>,
    login_error: Mutex<Option<GatewayError>>,
    overview_error: Mutex<Option<GatewayError>>,
    overview_delay: Mutex<Duration>,
    commands: Mutex<Vec<(Instant, Command)>>,
    pub login_calls: AtomicUsize,
    pub overview_calls: AtomicUsize,
    pub info_calls: AtomicUsize,
}

pub fn device_id(id: SlideId) -> String {
    format!("slide_3000000000{id:02}")
}

pub fn unique_id(id: SlideId) -> String {
    format!("3000000000{id:02}")
}

pub fn record(id: SlideId, position: Option<f64>) -> SlideRecord {
    SlideRecord {
        id: Some(id),
        device_id: Some(device_id(id)),
        device_name: Some(format!("Slide {id}")),
        zone_id: Some(1),
        touch_go: Some(id % 2 == 0),
        slide_setup: Some(serde_json::json!("middle")),
        curtain_type: Some(serde_json::json!(0)),
        device_info: Some(SlideInfo {
            pos: position,
            calib_time: Some(8000),
            board_rev: Some(1),
            touch_go: None,
        }),
    }
}

impl MockGateway {
    pub fn new(slides: Vec<SlideRecord>) -> Self {
        Self {
            slides: Mutex::new(slides),
            ..Default::default()
        }
    }

    pub fn with_positions(positions: &[f64]) -> Self {
        Self::new(
            positions
                .iter()
                .enumerate()
                .map(|(index, position)| record(index as SlideId + 1, Some(*position)))
                .collect(),
        )
    }

    pub fn set_position(&self, id: SlideId, position: Option<f64>) {
        let mut slides = self.slides.lock().unwrap();
        for slide in slides.iter_mut().filter(|slide| slide.id == Some(id)) {
            if let Some(info) = slide.device_info.as_mut() {
                info.pos = position;
            }
        }
    }

    pub fn push_record(&self, record: SlideRecord) {
        self.slides.lock().unwrap().push(record);
    }

    pub fn fail_login(&self, error: GatewayError) {
        *self.login_error.lock().unwrap() = Some(error);
    }

    pub fn fail_overview(&self, error: Option<GatewayError>) {
        *self.overview_error.lock().unwrap() = error;
    }

    pub fn delay_overview(&self, delay: Duration) {
        *self.overview_delay.lock().unwrap() = delay;
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(|(_, command)| command.clone())
            .collect()
    }

    pub fn command_instants(&self) -> Vec<Instant> {
        self.commands.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }

    pub fn overview_calls(&self) -> usize {
        self.overview_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SlideGateway for MockGateway {
    async fn login(&self) -> Result<(), GatewayError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);

        match self.login_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn slides_overview(&self) -> Result<Vec<SlideRecord>, GatewayError> {
        self.overview_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.overview_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(e) = self.overview_error.lock().unwrap().clone() {
            return Err(e);
        }

        Ok(self.slides.lock().unwrap().clone())
    }

    async fn slide_info(&self, id: SlideId) -> Result<SlideInfo, GatewayError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);

        self.slides
            .lock()
            .unwrap()
            .iter()
            .find(|slide| slide.id == Some(id))
            .and_then(|slide| slide.device_info.clone())
            .ok_or_else(|| GatewayError::Unavailable(format!("Unknown slide {id}")))
    }

    async fn slide_set_position(&self, id: SlideId, position: f64) -> Result<(), GatewayError> {
        self.commands
            .lock()
            .unwrap()
            .push((Instant::now(), Command::SetPosition(id, position)));
        Ok(())
    }

    async fn slide_stop(&self, id: SlideId) -> Result<(), GatewayError> {
        self.commands
            .lock()
            .unwrap()
            .push((Instant::now(), Command::Stop(id)));
        Ok(())
    }
}

/// Options with the per-entity scan disabled so only the coordinator polls.
pub fn options() -> IntegrationOptions {
    IntegrationOptions {
        scan_interval: None,
        ..Default::default()
    }
}

pub async fn setup(gateway: &Arc<MockGateway>) -> Arc<IntegrationContext> {
    Arc::new(
        IntegrationContext::setup(gateway.clone(), options())
            .await
            .unwrap(),
    )
}
