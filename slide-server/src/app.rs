use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::context::IntegrationContext;
use crate::handles::*;

pub fn create_app(context: Arc<IntegrationContext>) -> Router {
    let state = IntegrationState { context };

    let covers = Router::new()
        .route("/", get(get_covers))
        .route("/:unique_id", get(get_cover))
        .route("/:unique_id/open", post(open_cover))
        .route("/:unique_id/close", post(close_cover))
        .route("/:unique_id/stop", post(stop_cover))
        .route("/:unique_id/position", post(set_cover_position))
        .route("/:unique_id/update", post(update_cover))
        .with_state(state.clone());

    let switches = Router::new()
        .route("/", get(get_switches))
        .route("/:unique_id", get(get_switch))
        .route("/:unique_id/on", post(turn_on_switch))
        .route("/:unique_id/off", post(turn_off_switch))
        .with_state(state.clone());

    let events = Router::new()
        .route("/", get(sse_handler))
        .with_state(state.clone());

    Router::new()
        .route("/refresh", post(refresh))
        .with_state(state)
        .nest("/covers", covers)
        .nest("/switches", switches)
        .nest("/events", events)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
