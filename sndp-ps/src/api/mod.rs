//! REST API implementation for the Profile Scheduler
//!
//! The control surface around the scheduling core: profile CRUD,
//! schedule/cancel/apply, default-profile selection, mixer levels and
//! an SSE event stream.

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use sndp_common::events::EventBus;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::mixer::SoftMixer;
use crate::scheduler::ProfileScheduler;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub scheduler: Arc<ProfileScheduler>,
    pub mixer: Arc<SoftMixer>,
    pub bus: EventBus,
    /// Server port
    pub port: u16,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no prefix for health endpoint)
        .route("/health", get(handlers::health))
        // API v1 routes
        .nest(
            "/api/v1",
            Router::new()
                // Profile CRUD
                .route(
                    "/profiles",
                    get(handlers::list_profiles)
                        .post(handlers::create_profile)
                        .delete(handlers::delete_all_profiles),
                )
                .route(
                    "/profiles/:id",
                    get(handlers::get_profile)
                        .put(handlers::update_profile)
                        .delete(handlers::delete_profile),
                )
                // Schedule control
                .route("/profiles/:id/schedule", post(handlers::schedule_profile))
                .route("/profiles/:id/cancel", post(handlers::cancel_profile))
                .route("/profiles/:id/apply", post(handlers::apply_profile_now))
                // Default profile slot
                .route(
                    "/settings/default-profile",
                    get(handlers::get_default_profile)
                        .put(handlers::set_default_profile)
                        .delete(handlers::clear_default_profile),
                )
                // Current mixer levels
                .route("/volumes", get(handlers::get_volumes))
                // SSE events
                .route("/events", get(handlers::events)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
