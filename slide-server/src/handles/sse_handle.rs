use std::convert::Infallible;

use axum::extract::State;
use axum::response::Sse;
use axum::response::sse::{Event, KeepAlive};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use super::IntegrationState;
use crate::services::{COORDINATOR_TOPIC, COVER_TOPIC, EventPayload, SWITCH_TOPIC};

fn event_name(payload: &EventPayload) -> &'static str {
    match payload {
        EventPayload::CoverUpdated(_) => "cover",
        EventPayload::SwitchUpdated(_) => "switch",
        EventPayload::SnapshotsRefreshed { .. } | EventPayload::RefreshFailed { .. } => "coordinator",
    }
}

pub async fn sse_handler(
    State(state): State<IntegrationState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let event_bus = state.context.event_bus();
    let covers = BroadcastStream::new(event_bus.subscribe(COVER_TOPIC).await);
    let switches = BroadcastStream::new(event_bus.subscribe(SWITCH_TOPIC).await);
    let coordinator = BroadcastStream::new(event_bus.subscribe(COORDINATOR_TOPIC).await);

    // Lagged receivers skip the missed events.
    let stream = covers
        .merge(switches)
        .merge(coordinator)
        .filter_map(|result| {
            let payload = result.ok()?;
            match Event::default().event(event_name(&payload)).json_data(&payload) {
                Ok(event) => Some(Ok(event)),
                Err(e) => {
                    tracing::warn!("Failed to encode event: {}", e);
                    None
                }
            }
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
