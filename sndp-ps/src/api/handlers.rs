//! HTTP request handlers
//!
//! Implements the REST endpoints for profile management and schedule
//! control.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sndp_common::db::profiles;
use sndp_common::events::SndpEvent;
use sndp_common::params::{self, PARAMS};
use sndp_common::{Day, SoundProfile};
use tracing::info;

use crate::api::AppState;
use crate::error::Error;
use crate::mixer::{apply_profile, StreamLevel};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    port: u16,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

/// User-editable profile fields
///
/// `is_active` is deliberately absent: the flag is owned by the
/// schedule/cancel endpoints.
#[derive(Debug, Deserialize)]
pub struct ProfileBody {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub media_volume: f32,
    pub notification_volume: f32,
    pub ringer_volume: f32,
    pub call_volume: f32,
    pub alarm_volume: f32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub repeat_everyday: bool,
    #[serde(default)]
    pub repeat_days: Vec<Day>,
}

impl ProfileBody {
    fn into_profile(self, id: i64, is_active: bool) -> SoundProfile {
        SoundProfile {
            id,
            title: self.title,
            description: self.description,
            media_volume: self.media_volume,
            notification_volume: self.notification_volume,
            ringer_volume: self.ringer_volume,
            call_volume: self.call_volume,
            alarm_volume: self.alarm_volume,
            start_time: self.start_time,
            end_time: self.end_time,
            is_active,
            repeat_everyday: self.repeat_everyday,
            repeat_days: self.repeat_days,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DefaultProfileResponse {
    pub default_profile_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SetDefaultProfileRequest {
    pub profile_id: i64,
}

#[derive(Debug, Serialize)]
pub struct VolumesResponse {
    pub streams: Vec<StreamLevel>,
}

type ErrorResponse = (StatusCode, Json<StatusResponse>);

/// Map a service error onto an HTTP status
fn error_response(e: Error) -> ErrorResponse {
    let status = if e.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        match &e {
            Error::CapabilityDenied(_) => StatusCode::FORBIDDEN,
            Error::Common(sndp_common::Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    };
    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}

// ============================================================================
// Health & Events
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "sndp-ps".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        port: state.port,
    })
}

/// GET /api/v1/events - SSE stream of scheduler events
pub async fn events(State(state): State<AppState>) -> impl IntoResponse {
    sndp_common::sse::event_sse_stream(&state.bus, "sndp-ps")
}

// ============================================================================
// Profile CRUD
// ============================================================================

/// GET /api/v1/profiles - List all profiles
pub async fn list_profiles(
    State(state): State<AppState>,
) -> Result<Json<Vec<SoundProfile>>, ErrorResponse> {
    let all = profiles::get_all(&state.db)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(all))
}

/// POST /api/v1/profiles - Create a profile
pub async fn create_profile(
    State(state): State<AppState>,
    Json(body): Json<ProfileBody>,
) -> Result<(StatusCode, Json<SoundProfile>), ErrorResponse> {
    let mut profile = body.into_profile(0, false);
    profile
        .validate()
        .map_err(|e| error_response(e.into()))?;

    profile.id = profiles::insert(&state.db, &profile)
        .await
        .map_err(|e| error_response(e.into()))?;

    info!(profile_id = profile.id, title = %profile.title, "Profile created");
    Ok((StatusCode::CREATED, Json(profile)))
}

/// GET /api/v1/profiles/:id - Get one profile
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SoundProfile>, ErrorResponse> {
    let profile = profiles::get_by_id(&state.db, id)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(profile))
}

/// PUT /api/v1/profiles/:id - Update a profile
///
/// Preserves the stored is_active flag; pending alarm registrations
/// are NOT rewritten (cancel and re-schedule to pick up new times).
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ProfileBody>,
) -> Result<Json<SoundProfile>, ErrorResponse> {
    let existing = profiles::get_by_id(&state.db, id)
        .await
        .map_err(|e| error_response(e.into()))?;

    let profile = body.into_profile(id, existing.is_active);
    profile
        .validate()
        .map_err(|e| error_response(e.into()))?;

    profiles::update(&state.db, &profile)
        .await
        .map_err(|e| error_response(e.into()))?;

    Ok(Json(profile))
}

/// DELETE /api/v1/profiles/:id - Delete a profile
///
/// Pending alarms are left registered; firings for a deleted profile
/// are a graceful no-op in the trigger handler.
pub async fn delete_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatusResponse>, ErrorResponse> {
    profiles::delete_by_id(&state.db, id)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(StatusResponse {
        status: "deleted".to_string(),
    }))
}

/// DELETE /api/v1/profiles - Delete all profiles
pub async fn delete_all_profiles(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ErrorResponse> {
    profiles::delete_all(&state.db)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(StatusResponse {
        status: "deleted".to_string(),
    }))
}

// ============================================================================
// Schedule Control
// ============================================================================

/// POST /api/v1/profiles/:id/schedule - Register the profile's alarms
///
/// Refused with 403 when the exact-alarm capability is not granted;
/// the caller must obtain the grant and retry.
pub async fn schedule_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SoundProfile>, ErrorResponse> {
    let profile = profiles::get_by_id(&state.db, id)
        .await
        .map_err(|e| error_response(e.into()))?;

    if !state.scheduler.has_exact_alarm_capability() {
        return Err(error_response(Error::CapabilityDenied(
            "grant the exact alarm capability before scheduling".to_string(),
        )));
    }

    state
        .scheduler
        .schedule(&profile)
        .map_err(error_response)?;
    profiles::set_active(&state.db, id, true)
        .await
        .map_err(|e| error_response(e.into()))?;

    let profile = profiles::get_by_id(&state.db, id)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(profile))
}

/// POST /api/v1/profiles/:id/cancel - Unregister the profile's alarms
pub async fn cancel_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SoundProfile>, ErrorResponse> {
    let profile = profiles::get_by_id(&state.db, id)
        .await
        .map_err(|e| error_response(e.into()))?;

    state.scheduler.cancel(&profile);
    profiles::set_active(&state.db, id, false)
        .await
        .map_err(|e| error_response(e.into()))?;

    let profile = profiles::get_by_id(&state.db, id)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(profile))
}

/// POST /api/v1/profiles/:id/apply - Apply a profile immediately
pub async fn apply_profile_now(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatusResponse>, ErrorResponse> {
    let profile = profiles::get_by_id(&state.db, id)
        .await
        .map_err(|e| error_response(e.into()))?;

    apply_profile(state.mixer.as_ref(), &profile);
    state
        .bus
        .emit(SndpEvent::ProfileApplied {
            profile_id: id,
            title: profile.title.clone(),
            timestamp: Utc::now(),
        })
        .ok();

    Ok(Json(StatusResponse {
        status: "applied".to_string(),
    }))
}

// ============================================================================
// Default Profile Slot
// ============================================================================

/// GET /api/v1/settings/default-profile - Current default profile id
pub async fn get_default_profile() -> Json<DefaultProfileResponse> {
    Json(DefaultProfileResponse {
        default_profile_id: PARAMS.default_profile_id(),
    })
}

/// PUT /api/v1/settings/default-profile - Point the slot at a profile
pub async fn set_default_profile(
    State(state): State<AppState>,
    Json(body): Json<SetDefaultProfileRequest>,
) -> Result<Json<DefaultProfileResponse>, ErrorResponse> {
    // The target must exist when the slot is set; it may still be
    // deleted later, which the reset path tolerates.
    profiles::get_by_id(&state.db, body.profile_id)
        .await
        .map_err(|e| error_response(e.into()))?;

    params::set_and_persist(&state.db, Some(body.profile_id))
        .await
        .map_err(|e| error_response(e.into()))?;
    state
        .bus
        .emit(SndpEvent::DefaultProfileChanged {
            default_profile_id: Some(body.profile_id),
            timestamp: Utc::now(),
        })
        .ok();

    Ok(Json(DefaultProfileResponse {
        default_profile_id: Some(body.profile_id),
    }))
}

/// DELETE /api/v1/settings/default-profile - Clear the slot
pub async fn clear_default_profile(
    State(state): State<AppState>,
) -> Result<Json<DefaultProfileResponse>, ErrorResponse> {
    params::set_and_persist(&state.db, None)
        .await
        .map_err(|e| error_response(e.into()))?;
    state
        .bus
        .emit(SndpEvent::DefaultProfileChanged {
            default_profile_id: None,
            timestamp: Utc::now(),
        })
        .ok();

    Ok(Json(DefaultProfileResponse {
        default_profile_id: None,
    }))
}

// ============================================================================
// Mixer
// ============================================================================

/// GET /api/v1/volumes - Current mixer levels
pub async fn get_volumes(State(state): State<AppState>) -> Json<VolumesResponse> {
    Json(VolumesResponse {
        streams: state.mixer.snapshot(),
    })
}
