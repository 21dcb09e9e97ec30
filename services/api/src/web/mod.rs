pub mod auth;
pub mod middleware;
pub mod rest;
pub mod sounds;
pub mod state;
#[cfg(test)]
pub(crate) mod test_support;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use middleware::require_auth;
pub use rest::ApiDoc;
use state::AppState;

/// Builds every `/api` route, with the authenticated ones behind `require_auth`.
pub fn api_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/oauth/{provider}/redirect_url", get(auth::redirect_url_handler))
        .route("/api/sessions", post(auth::create_session_handler))
        .route("/api/logout", get(auth::logout_handler))
        .route("/api/sounds", get(sounds::catalog_handler))
        .route("/api/sounds/{track_id}/preview", get(sounds::preview_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/users/me", get(auth::me_handler))
        .route(
            "/api/sleep-sessions",
            get(rest::list_sleep_sessions_handler).post(rest::create_sleep_session_handler),
        )
        .route("/api/sleep-analysis", get(rest::sleep_analysis_handler))
        .route(
            "/api/sound-sessions",
            get(rest::list_sound_sessions_handler).post(rest::create_sound_session_handler),
        )
        .route(
            "/api/preferences",
            get(rest::get_preferences_handler).put(rest::update_preferences_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
