//! Per-integration context owning every runtime object of one account.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use slide_api::{GatewayError, SlideGateway};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};

use crate::configs::Settings;
use crate::entities::{ConfigSwitch, Cover, SlideCover, TouchAndGoSwitch};
use crate::errors::{EntityError, SetupError};
use crate::models::{CommandAccepted, CoverCommand, SnapshotCollection};
use crate::services::{
    CommandSequencer, DEFAULT_REQUEST_TIMEOUT, DEFAULT_UPDATE_INTERVAL, EventBus,
    PollingCoordinator, SequencerOptions, Shutdown, ShutdownTrigger, StateMachine,
    shutdown_channel,
};

pub const DEFAULT_NAME: &str = "Curtains";
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct IntegrationOptions {
    pub name: String,
    pub update_interval: Duration,
    pub request_timeout: Duration,
    pub offset: f64,
    pub sequencer: SequencerOptions,
    /// Interval of the per-entity `slide_info` queries, `None` disables them
    pub scan_interval: Option<Duration>,
}

impl Default for IntegrationOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            update_interval: DEFAULT_UPDATE_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            offset: StateMachine::default().offset(),
            sequencer: SequencerOptions::default(),
            scan_interval: Some(DEFAULT_SCAN_INTERVAL),
        }
    }
}

impl From<&Settings> for IntegrationOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            update_interval: settings.update_interval(),
            request_timeout: settings.request_timeout(),
            offset: settings.cover.offset,
            sequencer: SequencerOptions {
                settle_margin: Duration::from_millis(settings.cover.settle_margin),
                calibration_fallback: Duration::from_millis(settings.cover.calibration_fallback),
            },
            scan_interval: (settings.cover.scan_interval > 0)
                .then(|| Duration::from_secs(settings.cover.scan_interval)),
        }
    }
}

/// Everything set up for one cloud account.
///
/// Created by [`IntegrationContext::setup`] and torn down by
/// [`IntegrationContext::unload`]; entities only exist while it is alive.
pub struct IntegrationContext {
    options: IntegrationOptions,
    gateway: Arc<dyn SlideGateway>,
    event_bus: Arc<EventBus>,
    coordinator: Arc<PollingCoordinator>,
    covers: BTreeMap<String, Arc<dyn Cover>>,
    switches: BTreeMap<String, Arc<dyn ConfigSwitch>>,
    shutdown_trigger: ShutdownTrigger,
    shutdown: Shutdown,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    commands: Mutex<JoinSet<()>>,
}

impl IntegrationContext {
    /// Log in, run the first refresh and register one cover and one switch per slide.
    ///
    /// Nothing is registered unless both steps succeed.
    pub async fn setup(
        gateway: Arc<dyn SlideGateway>,
        options: IntegrationOptions,
    ) -> Result<Self, SetupError> {
        gateway.login().await?;

        let event_bus = Arc::new(EventBus::new());
        let coordinator = Arc::new(PollingCoordinator::new(
            &options.name,
            gateway.clone(),
            event_bus.clone(),
            options.update_interval,
            options.request_timeout,
        ));

        let data = coordinator.first_refresh().await?;

        let (shutdown_trigger, shutdown) = shutdown_channel();
        let sequencer = Arc::new(CommandSequencer::new(
            gateway.clone(),
            options.sequencer,
            shutdown.clone(),
        ));
        let machine = StateMachine::new(options.offset);

        let mut covers: BTreeMap<String, Arc<dyn Cover>> = BTreeMap::new();
        let mut switches: BTreeMap<String, Arc<dyn ConfigSwitch>> = BTreeMap::new();

        for snapshot in data.iter() {
            let cover = SlideCover::new(
                snapshot,
                machine,
                gateway.clone(),
                sequencer.clone(),
                event_bus.clone(),
                options.request_timeout,
            );
            covers.insert(snapshot.unique_id.clone(), Arc::new(cover));

            let switch = TouchAndGoSwitch::new(snapshot, event_bus.clone());
            switches.insert(switch.unique_id().to_string(), Arc::new(switch));
        }

        tracing::info!(
            "{}: registered {} slides ({} online)",
            options.name,
            covers.len(),
            data.online_count()
        );

        Ok(Self {
            options,
            gateway,
            event_bus,
            coordinator,
            covers,
            switches,
            shutdown_trigger,
            shutdown,
            tasks: Mutex::new(Vec::new()),
            commands: Mutex::new(JoinSet::new()),
        })
    }

    /// Spawn the polling loop and, if enabled, the per-entity scan loop.
    pub async fn start(&self) {
        let mut tasks = self.tasks.lock().await;
        if !tasks.is_empty() {
            tracing::debug!("{}: background loops already running", self.options.name);
            return;
        }

        tasks.push(tokio::spawn(poll_loop(
            self.coordinator.clone(),
            self.covers.values().cloned().collect(),
            self.switches.values().cloned().collect(),
            self.shutdown.clone(),
        )));

        if let Some(scan_interval) = self.options.scan_interval {
            tasks.push(tokio::spawn(scan_loop(
                self.covers.values().cloned().collect(),
                scan_interval,
                self.shutdown.clone(),
            )));
        }
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn gateway(&self) -> &Arc<dyn SlideGateway> {
        &self.gateway
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn coordinator(&self) -> &Arc<PollingCoordinator> {
        &self.coordinator
    }

    pub fn cover(&self, unique_id: &str) -> Option<Arc<dyn Cover>> {
        self.covers.get(unique_id).cloned()
    }

    pub fn covers(&self) -> impl Iterator<Item = &Arc<dyn Cover>> {
        self.covers.values()
    }

    pub fn switch(&self, unique_id: &str) -> Option<Arc<dyn ConfigSwitch>> {
        self.switches.get(unique_id).cloned()
    }

    pub fn switches(&self) -> impl Iterator<Item = &Arc<dyn ConfigSwitch>> {
        self.switches.values()
    }

    pub fn is_unloaded(&self) -> bool {
        self.shutdown.is_requested()
    }

    /// Refresh now and hand the result to every entity.
    pub async fn refresh(&self) -> Result<Arc<SnapshotCollection>, GatewayError> {
        let result = self.coordinator.refresh().await;

        if let Some(data) = self.coordinator.data().await {
            dispatch(self.covers.values(), self.switches.values(), &data).await;
        }

        result
    }

    /// Hand a command to the sequencer without waiting for it to finish.
    pub async fn run_command(
        &self,
        unique_id: &str,
        command: CoverCommand,
    ) -> Result<CommandAccepted, EntityError> {
        if self.is_unloaded() {
            return Err(EntityError::Unloaded);
        }
        if let CoverCommand::SetPosition { position } = command {
            if position > 100 {
                return Err(EntityError::InvalidPosition(i64::from(position)));
            }
        }

        let cover = self.cover(unique_id).ok_or(EntityError::CoverNotFound)?;

        let mut commands = self.commands.lock().await;
        while commands.try_join_next().is_some() {}

        commands.spawn(async move {
            let result = match command {
                CoverCommand::Open => cover.open_cover().await,
                CoverCommand::Close => cover.close_cover().await,
                CoverCommand::Stop => cover.stop_cover().await,
                CoverCommand::SetPosition { position } => cover.set_cover_position(position).await,
            };

            if let Err(e) = result {
                tracing::error!("{}: {:?} failed: {}", cover.unique_id(), command, e);
            }
        });

        Ok(CommandAccepted {
            unique_id: unique_id.to_string(),
            command,
        })
    }

    /// Stop background work and wait for it to wind down.
    ///
    /// Pending correction resends are dropped.
    pub async fn unload(&self) {
        self.shutdown_trigger.trigger();

        let tasks: Vec<_> = self.tasks.lock().await.drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!("{}: background task ended abnormally: {}", self.options.name, e);
            }
        }

        let mut commands = self.commands.lock().await;
        while commands.join_next().await.is_some() {}

        tracing::info!("{}: unloaded", self.options.name);
    }
}

async fn dispatch<'a>(
    covers: impl Iterator<Item = &'a Arc<dyn Cover>>,
    switches: impl Iterator<Item = &'a Arc<dyn ConfigSwitch>>,
    data: &SnapshotCollection,
) {
    for cover in covers {
        cover.handle_coordinator_update(data).await;
    }
    for switch in switches {
        switch.handle_coordinator_update(data).await;
    }
}

async fn poll_loop(
    coordinator: Arc<PollingCoordinator>,
    covers: Vec<Arc<dyn Cover>>,
    switches: Vec<Arc<dyn ConfigSwitch>>,
    shutdown: Shutdown,
) {
    let period = coordinator.update_interval();
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.requested() => break,
        }

        // Failures are logged by the coordinator and leave offline-marked data behind.
        let _ = coordinator.refresh().await;

        if let Some(data) = coordinator.data().await {
            dispatch(covers.iter(), switches.iter(), &data).await;
        }
    }

    tracing::debug!("{}: polling stopped", coordinator.name());
}

async fn scan_loop(covers: Vec<Arc<dyn Cover>>, period: Duration, shutdown: Shutdown) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.requested() => break,
        }

        join_all(covers.iter().map(|cover| cover.update())).await;
    }
}
