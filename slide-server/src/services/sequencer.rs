use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use slide_api::{GatewayError, SlideGateway, SlideId};
use tokio::sync::RwLock;

use crate::models::{CoverState, DeviceRuntime};
use crate::services::shutdown::Shutdown;
use crate::services::state::position_from_percent;

/// Extra time granted on top of the calibration time before the resend.
pub const DEFAULT_SETTLE_MARGIN: Duration = Duration::from_millis(2000);
/// Traverse time assumed for slides that never reported a calibration.
pub const DEFAULT_CALIBRATION_FALLBACK: Duration = Duration::from_millis(20000);

const OPEN_POSITION: f64 = 0.0;
const CLOSED_POSITION: f64 = 1.0;

/// A slide the sequencer can drive.
#[async_trait]
pub trait Actuated: Send + Sync {
    fn slide_id(&self) -> SlideId;

    fn runtime(&self) -> &RwLock<DeviceRuntime>;

    /// Push the current runtime state to observers.
    async fn write_state(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Travel {
    Open,
    Close,
}

impl Travel {
    fn position(self) -> f64 {
        match self {
            Travel::Open => OPEN_POSITION,
            Travel::Close => CLOSED_POSITION,
        }
    }

    fn state(self) -> CoverState {
        match self {
            Travel::Open => CoverState::Opening,
            Travel::Close => CoverState::Closing,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SequencerOptions {
    pub settle_margin: Duration,
    pub calibration_fallback: Duration,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            settle_margin: DEFAULT_SETTLE_MARGIN,
            calibration_fallback: DEFAULT_CALIBRATION_FALLBACK,
        }
    }
}

/// Issues movement commands and compensates for dropped ones.
///
/// Some slides silently ignore a position command, so after a full open or
/// close the same command is sent once more when the traverse should be
/// over, unless the move was stopped meanwhile.
pub struct CommandSequencer {
    gateway: Arc<dyn SlideGateway>,
    options: SequencerOptions,
    shutdown: Shutdown,
}

impl CommandSequencer {
    pub fn new(gateway: Arc<dyn SlideGateway>, options: SequencerOptions, shutdown: Shutdown) -> Self {
        Self {
            gateway,
            options,
            shutdown,
        }
    }

    /// Time to wait for a full traverse before the correction resend.
    pub fn settle_time(&self, calibration_time_ms: Option<u64>) -> Duration {
        calibration_time_ms
            .map(Duration::from_millis)
            .unwrap_or(self.options.calibration_fallback)
            + self.options.settle_margin
    }

    pub async fn open(&self, target: &dyn Actuated) -> Result<(), GatewayError> {
        self.travel(target, Travel::Open).await
    }

    pub async fn close(&self, target: &dyn Actuated) -> Result<(), GatewayError> {
        self.travel(target, Travel::Close).await
    }

    pub async fn stop(&self, target: &dyn Actuated) -> Result<(), GatewayError> {
        target.runtime().write().await.stop();

        tracing::debug!("slide {}: stop", target.slide_id());

        self.gateway.slide_stop(target.slide_id()).await
    }

    /// Move to `percent` (100 fully closed) without any correction.
    ///
    /// The optimistic direction compares against the last known position,
    /// which may be stale after a failed poll.
    pub async fn set_position(&self, target: &dyn Actuated, percent: u8) -> Result<(), GatewayError> {
        let fraction = position_from_percent(percent);

        {
            let mut runtime = target.runtime().write().await;
            if let Some(current) = runtime.position {
                runtime.state = if fraction > current {
                    CoverState::Closing
                } else {
                    CoverState::Opening
                };
            }
        }
        target.write_state().await;

        tracing::debug!("slide {}: set position {}", target.slide_id(), fraction);

        self.gateway.slide_set_position(target.slide_id(), fraction).await
    }

    async fn travel(&self, target: &dyn Actuated, travel: Travel) -> Result<(), GatewayError> {
        let (move_id, settle_time) = {
            let mut runtime = target.runtime().write().await;
            let move_id = runtime.begin_move();
            runtime.state = travel.state();
            (move_id, self.settle_time(runtime.calibration_time_ms))
        };
        target.write_state().await;

        let slide_id = target.slide_id();
        let position = travel.position();

        tracing::debug!("slide {}: {:?}, settling for {:?}", slide_id, travel, settle_time);

        self.gateway.slide_set_position(slide_id, position).await?;

        tokio::select! {
            _ = tokio::time::sleep(settle_time) => {}
            _ = self.shutdown.requested() => {
                tracing::debug!("slide {}: shutting down, skipping correction", slide_id);
                return Ok(());
            }
        }

        if target.runtime().read().await.is_stopped(move_id) {
            tracing::debug!("slide {}: stopped during {:?}, skipping correction", slide_id, travel);
            return Ok(());
        }

        tracing::debug!("slide {}: resending {:?}", slide_id, travel);

        self.gateway.slide_set_position(slide_id, position).await
    }
}
