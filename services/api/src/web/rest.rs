//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the sleep, sound-session and preference
//! endpoints, and the master definition for the OpenAPI specification.

use crate::web::state::AppState;
use crate::web::{auth, sounds};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{Duration, Utc};
use nightfall_core::analysis::{analyze_sleep, ANALYSIS_WINDOW_DAYS};
use nightfall_core::domain::{
    AuthenticatedUser, NewSleepSession, NewSoundSession, PreferencesPatch, SleepAnalysis,
    SleepSession, SleepTrend, SoundSession, UserPreferences, WeeklyComparison,
};
use nightfall_core::ports::PortError;
use nightfall_core::sound::{SoundCategory, SoundTrack};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_sleep_sessions_handler,
        create_sleep_session_handler,
        sleep_analysis_handler,
        list_sound_sessions_handler,
        create_sound_session_handler,
        get_preferences_handler,
        update_preferences_handler,
        auth::redirect_url_handler,
        auth::create_session_handler,
        auth::me_handler,
        auth::logout_handler,
        sounds::catalog_handler,
        sounds::preview_handler,
    ),
    components(
        schemas(
            CreatedResponse,
            SleepSession,
            NewSleepSession,
            SleepAnalysis,
            SleepTrend,
            WeeklyComparison,
            SoundSession,
            NewSoundSession,
            UserPreferences,
            PreferencesPatch,
            AuthenticatedUser,
            SoundCategory,
            SoundTrack,
            auth::RedirectUrlResponse,
            auth::CreateSessionRequest,
            auth::SuccessResponse,
        )
    ),
    tags(
        (name = "NightFall API", description = "Sleep tracking, analysis and ambient sound endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

pub const DEFAULT_SLEEP_SESSION_LIMIT: i64 = 30;
pub const DEFAULT_SOUND_SESSION_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 500;

/// The response payload sent after successfully creating a row.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponse {
    pub id: i64,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    /// Maximum number of rows, most recent first.
    pub limit: Option<i64>,
}

impl LimitQuery {
    fn resolve(&self, default: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, MAX_LIST_LIMIT)
    }
}

/// Logs a port failure and turns it into the handler error tuple.
pub(crate) fn port_error(e: PortError, context: &str) -> (StatusCode, String) {
    match e {
        PortError::Invalid(msg) => (StatusCode::BAD_REQUEST, msg),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        e @ PortError::Unexpected(_) => {
            error!("{}: {:?}", context, e);
            (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
        }
    }
}

//=========================================================================================
// Sleep Session Handlers
//=========================================================================================

/// List the caller's sleep sessions, most recent first.
#[utoipa::path(
    get,
    path = "/api/sleep-sessions",
    params(LimitQuery),
    responses(
        (status = 200, description = "Sleep sessions", body = [SleepSession]),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_sleep_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let sessions = state
        .db
        .list_sleep_sessions(&user.id, query.resolve(DEFAULT_SLEEP_SESSION_LIMIT))
        .await
        .map_err(|e| port_error(e, "Failed to list sleep sessions"))?;
    Ok(Json(sessions))
}

/// Record a night of sleep.
#[utoipa::path(
    post,
    path = "/api/sleep-sessions",
    request_body = NewSleepSession,
    responses(
        (status = 201, description = "Sleep session created", body = CreatedResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_sleep_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(session): Json<NewSleepSession>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    session
        .validate()
        .map_err(|e| port_error(e, "Invalid sleep session"))?;
    let id = state
        .db
        .create_sleep_session(&user.id, &session)
        .await
        .map_err(|e| port_error(e, "Failed to create sleep session"))?;
    info!(user_id = %user.id, id, "sleep session recorded");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// Summary statistics over the caller's last 30 days of sleep.
#[utoipa::path(
    get,
    path = "/api/sleep-analysis",
    responses(
        (status = 200, description = "Derived sleep statistics", body = SleepAnalysis),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn sleep_analysis_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let since = Utc::now() - Duration::days(ANALYSIS_WINDOW_DAYS);
    let sessions = state
        .db
        .sleep_sessions_since(&user.id, since)
        .await
        .map_err(|e| port_error(e, "Failed to load sleep sessions"))?;
    Ok(Json(analyze_sleep(&sessions)))
}

//=========================================================================================
// Sound Session Handlers
//=========================================================================================

/// List the caller's ambient-sound playbacks, most recent first.
#[utoipa::path(
    get,
    path = "/api/sound-sessions",
    params(LimitQuery),
    responses(
        (status = 200, description = "Sound sessions", body = [SoundSession]),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_sound_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let sessions = state
        .db
        .list_sound_sessions(&user.id, query.resolve(DEFAULT_SOUND_SESSION_LIMIT))
        .await
        .map_err(|e| port_error(e, "Failed to list sound sessions"))?;
    Ok(Json(sessions))
}

/// Log the start of an ambient-sound playback.
#[utoipa::path(
    post,
    path = "/api/sound-sessions",
    request_body = NewSoundSession,
    responses(
        (status = 201, description = "Sound session created", body = CreatedResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_sound_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(session): Json<NewSoundSession>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    session
        .validate()
        .map_err(|e| port_error(e, "Invalid sound session"))?;
    let id = state
        .db
        .create_sound_session(&user.id, &session)
        .await
        .map_err(|e| port_error(e, "Failed to create sound session"))?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

//=========================================================================================
// Preference Handlers
//=========================================================================================

/// The caller's preferences, created with defaults on first access.
#[utoipa::path(
    get,
    path = "/api/preferences",
    responses(
        (status = 200, description = "Stored preferences", body = UserPreferences),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_preferences_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let preferences = state
        .db
        .get_or_create_preferences(&user.id)
        .await
        .map_err(|e| port_error(e, "Failed to load preferences"))?;
    Ok(Json(preferences))
}

/// Merge the supplied fields into the caller's preferences.
#[utoipa::path(
    put,
    path = "/api/preferences",
    request_body = PreferencesPatch,
    responses(
        (status = 200, description = "Updated preferences", body = UserPreferences),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_preferences_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(patch): Json<PreferencesPatch>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    patch
        .validate()
        .map_err(|e| port_error(e, "Invalid preferences"))?;
    let preferences = if patch.is_empty() {
        state.db.get_or_create_preferences(&user.id).await
    } else {
        state.db.update_preferences(&user.id, &patch).await
    }
    .map_err(|e| port_error(e, "Failed to update preferences"))?;
    Ok(Json(preferences))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::test_support::{body_json, test_state, user};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn created_sleep_session_is_listed_first() {
        let state = test_state();
        for score in [70, 85] {
            let session = NewSleepSession {
                sleep_score: Some(score),
                sleep_quality_rating: Some(4),
                ..Default::default()
            };
            let response = create_sleep_session_handler(
                State(state.clone()),
                Extension(user("u1")),
                Json(session),
            )
            .await
            .unwrap()
            .into_response();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = list_sleep_sessions_handler(
            State(state.clone()),
            Extension(user("u1")),
            Query(LimitQuery::default()),
        )
        .await
        .unwrap()
        .into_response();
        let sessions: Vec<SleepSession> = body_json(response).await;
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].sleep_score, Some(85));
        assert_eq!(sessions[0].user_id, "u1");
    }

    #[tokio::test]
    async fn out_of_range_rating_is_rejected() {
        let state = test_state();
        for rating in [0, 6] {
            let session = NewSleepSession {
                sleep_quality_rating: Some(rating),
                ..Default::default()
            };
            let err = create_sleep_session_handler(
                State(state.clone()),
                Extension(user("u1")),
                Json(session),
            )
            .await
            .map(|_| ())
            .unwrap_err();
            assert_eq!(err.0, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn sessions_are_scoped_to_their_owner() {
        let state = test_state();
        create_sleep_session_handler(
            State(state.clone()),
            Extension(user("u1")),
            Json(NewSleepSession::default()),
        )
        .await
        .map(|_| ())
        .unwrap();

        let response = list_sleep_sessions_handler(
            State(state.clone()),
            Extension(user("u2")),
            Query(LimitQuery::default()),
        )
        .await
        .unwrap()
        .into_response();
        let sessions: Vec<SleepSession> = body_json(response).await;
        assert!(sessions.is_empty());
    }

    #[test]
    fn list_limits_are_defaulted_and_clamped() {
        assert_eq!(LimitQuery::default().resolve(30), 30);
        assert_eq!(LimitQuery { limit: Some(0) }.resolve(30), 1);
        assert_eq!(LimitQuery { limit: Some(10_000) }.resolve(30), MAX_LIST_LIMIT);
    }

    #[tokio::test]
    async fn analysis_with_no_sessions_is_empty() {
        let state = test_state();
        let response = sleep_analysis_handler(State(state), Extension(user("u1")))
            .await
            .unwrap()
            .into_response();
        let body: serde_json::Value = body_json(response).await;
        assert_eq!(body["averageSleepScore"], 0);
        assert_eq!(body["sleepTrend"], "stable");
        assert_eq!(body["bestSleepDay"], "");
    }

    #[tokio::test]
    async fn analysis_covers_recent_sessions() {
        let state = test_state();
        for score in [60, 80] {
            create_sleep_session_handler(
                State(state.clone()),
                Extension(user("u1")),
                Json(NewSleepSession {
                    sleep_score: Some(score),
                    sleep_duration_minutes: Some(420),
                    ..Default::default()
                }),
            )
            .await
            .map(|_| ())
            .unwrap();
        }

        let response = sleep_analysis_handler(State(state), Extension(user("u1")))
            .await
            .unwrap()
            .into_response();
        let analysis: SleepAnalysis = body_json(response).await;
        assert_eq!(analysis.average_sleep_score, 70);
        assert_eq!(analysis.average_sleep_duration, 420);
    }

    #[tokio::test]
    async fn sound_sessions_round_trip_through_the_store() {
        let state = test_state();
        let session = NewSoundSession {
            sound_type: "nature".to_string(),
            sound_name: "Realistic Rain".to_string(),
            duration_minutes: 60,
        };
        let response = create_sound_session_handler(
            State(state.clone()),
            Extension(user("u1")),
            Json(session),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: CreatedResponse = body_json(response).await;

        let response = list_sound_sessions_handler(
            State(state),
            Extension(user("u1")),
            Query(LimitQuery::default()),
        )
        .await
        .unwrap()
        .into_response();
        let sessions: Vec<SoundSession> = body_json(response).await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, created.id);
        assert_eq!(sessions[0].sound_name, "Realistic Rain");
    }

    #[tokio::test]
    async fn blank_sound_name_is_rejected() {
        let err = create_sound_session_handler(
            State(test_state()),
            Extension(user("u1")),
            Json(NewSoundSession {
                sound_type: "nature".to_string(),
                sound_name: " ".to_string(),
                duration_minutes: 60,
            }),
        )
        .await
        .map(|_| ())
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn first_preferences_read_returns_defaults() {
        let response = get_preferences_handler(State(test_state()), Extension(user("u1")))
            .await
            .unwrap()
            .into_response();
        let preferences: UserPreferences = body_json(response).await;
        assert!(preferences.bedtime_reminder_enabled);
        assert!(preferences.smart_alarm_enabled);
        assert!(preferences.dnd_enabled);
        assert_eq!(preferences.preferred_wake_window_minutes, 30);
    }

    #[tokio::test]
    async fn preference_patch_changes_only_supplied_fields() {
        let state = test_state();
        let patch = PreferencesPatch {
            dnd_enabled: Some(false),
            bedtime_reminder_time: Some("22:30".to_string()),
            ..Default::default()
        };
        let response = update_preferences_handler(
            State(state.clone()),
            Extension(user("u1")),
            Json(patch),
        )
        .await
        .unwrap()
        .into_response();
        let preferences: UserPreferences = body_json(response).await;
        assert!(!preferences.dnd_enabled);
        assert_eq!(preferences.bedtime_reminder_time.as_deref(), Some("22:30"));
        assert!(preferences.smart_alarm_enabled);
        assert_eq!(preferences.preferred_wake_window_minutes, 30);

        let response = get_preferences_handler(State(state), Extension(user("u1")))
            .await
            .unwrap()
            .into_response();
        let stored: UserPreferences = body_json(response).await;
        assert!(!stored.dnd_enabled);
    }

    #[tokio::test]
    async fn malformed_preference_time_is_rejected() {
        let patch = PreferencesPatch {
            dnd_start_time: Some("25:99".to_string()),
            ..Default::default()
        };
        let err = update_preferences_handler(State(test_state()), Extension(user("u1")), Json(patch))
            .await
            .map(|_| ())
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unexpected_port_errors_hide_their_details() {
        let (status, body) = port_error(
            PortError::Unexpected("connection refused".to_string()),
            "Failed to load preferences",
        );
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to load preferences");
    }
}
