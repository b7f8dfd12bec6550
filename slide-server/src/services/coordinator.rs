use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use slide_api::{GatewayError, SlideGateway};
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};

use crate::errors::SetupError;
use crate::models::SnapshotCollection;
use crate::services::event_bus::{COORDINATOR_TOPIC, EventBus, EventPayload};

pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type RefreshOutcome = Result<Arc<SnapshotCollection>, GatewayError>;

/// Shared refresh cycle for every slide of an account.
///
/// Only one overview request is in flight at any time. Callers that queue
/// behind a running refresh receive its outcome rather than issuing their own.
pub struct PollingCoordinator {
    name: String,
    gateway: Arc<dyn SlideGateway>,
    event_bus: Arc<EventBus>,
    update_interval: Duration,
    request_timeout: Duration,
    data: RwLock<Option<Arc<SnapshotCollection>>>,
    generation: AtomicU64,
    /// Outcome of the last refresh, tagged with the generation it completed
    last_outcome: Mutex<Option<(u64, RefreshOutcome)>>,
}

impl PollingCoordinator {
    pub fn new(
        name: &str,
        gateway: Arc<dyn SlideGateway>,
        event_bus: Arc<EventBus>,
        update_interval: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            name: name.to_string(),
            gateway,
            event_bus,
            update_interval,
            request_timeout,
            data: RwLock::new(None),
            generation: AtomicU64::new(0),
            last_outcome: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    /// Number of completed refreshes.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Last known snapshot collection, if any refresh ever succeeded.
    pub async fn data(&self) -> Option<Arc<SnapshotCollection>> {
        self.data.read().await.clone()
    }

    /// Initial refresh gating entity registration.
    pub async fn first_refresh(&self) -> Result<Arc<SnapshotCollection>, SetupError> {
        self.refresh().await.map_err(SetupError::from)
    }

    pub async fn refresh(&self) -> Result<Arc<SnapshotCollection>, GatewayError> {
        let observed = self.generation.load(Ordering::Acquire);
        let mut last_outcome = self.last_outcome.lock().await;

        if let Some((completed, outcome)) = last_outcome.as_ref() {
            if *completed > observed {
                tracing::debug!("{}: sharing result of concurrent refresh", self.name);
                return outcome.clone();
            }
        }

        let outcome = match self.fetch().await {
            Ok(collection) => {
                let collection = Arc::new(collection);
                *self.data.write().await = Some(collection.clone());

                tracing::debug!(
                    "{}: refreshed {} slides ({} online)",
                    self.name,
                    collection.len(),
                    collection.online_count()
                );

                let _ = self
                    .event_bus
                    .publish(
                        COORDINATOR_TOPIC,
                        EventPayload::SnapshotsRefreshed {
                            devices: collection.len(),
                            online: collection.online_count(),
                            timestamp: collection.fetched_at(),
                        },
                    )
                    .await;

                Ok(collection)
            }
            Err(e) => {
                {
                    let mut data = self.data.write().await;
                    if let Some(previous) = data.as_ref() {
                        *data = Some(Arc::new(previous.mark_offline()));
                    }
                }

                if e.is_transient() {
                    tracing::warn!("{}: refresh failed: {}", self.name, e);
                } else {
                    tracing::error!("{}: refresh rejected, credentials need attention: {}", self.name, e);
                }

                let _ = self
                    .event_bus
                    .publish(
                        COORDINATOR_TOPIC,
                        EventPayload::RefreshFailed {
                            error: e.to_string(),
                            timestamp: OffsetDateTime::now_utc(),
                        },
                    )
                    .await;

                Err(e)
            }
        };

        // Advanced after the lock is released; callers that read the old
        // generation share this outcome.
        let completed = self.generation.load(Ordering::Acquire) + 1;
        *last_outcome = Some((completed, outcome.clone()));
        drop(last_outcome);
        self.generation.store(completed, Ordering::Release);

        outcome
    }

    async fn fetch(&self) -> Result<SnapshotCollection, GatewayError> {
        let records = tokio::time::timeout(self.request_timeout, self.gateway.slides_overview())
            .await
            .map_err(|_| GatewayError::Timeout(self.request_timeout))??;

        let (collection, rejected) = SnapshotCollection::from_records(records);
        for e in rejected {
            tracing::error!("{}: skipping slide: {}", self.name, e);
        }

        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use slide_api::{SlideId, SlideInfo, SlideRecord};

    use super::*;

    #[derive(Default)]
    struct CountingGateway {
        overview_calls: AtomicUsize,
    }

    #[async_trait]
    impl SlideGateway for CountingGateway {
        async fn login(&self) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn slides_overview(&self) -> Result<Vec<SlideRecord>, GatewayError> {
            self.overview_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn slide_info(&self, _id: SlideId) -> Result<SlideInfo, GatewayError> {
            Ok(SlideInfo::default())
        }

        async fn slide_set_position(&self, _id: SlideId, _position: f64) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn slide_stop(&self, _id: SlideId) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    fn coordinator(gateway: Arc<CountingGateway>) -> PollingCoordinator {
        PollingCoordinator::new(
            "Curtains",
            gateway,
            Arc::new(EventBus::new()),
            DEFAULT_UPDATE_INTERVAL,
            DEFAULT_REQUEST_TIMEOUT,
        )
    }

    #[tokio::test]
    async fn test_outcome_shared_before_generation_advances() {
        let gateway = Arc::new(CountingGateway::default());
        let coordinator = coordinator(gateway.clone());

        let first = coordinator.refresh().await.unwrap();
        assert_eq!(coordinator.generation(), 1);

        // A caller that read the generation while the first refresh was
        // still publishing its outcome.
        coordinator.generation.store(0, Ordering::Release);
        let second = coordinator.refresh().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(gateway.overview_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_later_callers_fetch_again() {
        let gateway = Arc::new(CountingGateway::default());
        let coordinator = coordinator(gateway.clone());

        coordinator.refresh().await.unwrap();
        coordinator.refresh().await.unwrap();

        assert_eq!(coordinator.generation(), 2);
        assert_eq!(gateway.overview_calls.load(Ordering::SeqCst), 2);
    }
}
