//! services/api/src/web/auth.rs
//!
//! Authentication endpoints. Sign-in itself happens at the hosted identity
//! service; these handlers bootstrap the OAuth redirect, turn the returned code
//! into a session cookie, and tear the session down again.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use nightfall_core::domain::AuthenticatedUser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::web::middleware::session_token;
use crate::web::rest::port_error;
use crate::web::state::AppState;

/// How long the browser keeps the session cookie.
pub const SESSION_COOKIE_MAX_AGE_SECONDS: i64 = 60 * 24 * 60 * 60;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedirectUrlResponse {
    pub redirect_url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

fn session_cookie(name: &str, value: &str, max_age: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=None; Path=/; Max-Age={}",
        name, value, max_age
    )
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/oauth/{provider}/redirect_url - Where to send the browser to sign in
#[utoipa::path(
    get,
    path = "/api/oauth/{provider}/redirect_url",
    params(("provider" = String, Path, description = "OAuth provider, e.g. `google`.")),
    responses(
        (status = 200, description = "Redirect URL issued", body = RedirectUrlResponse),
        (status = 500, description = "Identity service unavailable")
    )
)]
pub async fn redirect_url_handler(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let redirect_url = state
        .identity
        .redirect_url(&provider)
        .await
        .map_err(|e| port_error(e, "Failed to get OAuth redirect URL"))?;
    Ok(Json(RedirectUrlResponse { redirect_url }))
}

/// POST /api/sessions - Exchange an OAuth code for a session cookie
#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created, cookie set", body = SuccessResponse),
        (status = 400, description = "No authorization code provided"),
        (status = 401, description = "Code rejected by the identity service"),
        (status = 500, description = "Identity service unavailable")
    )
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Require a code
    let code = req
        .code
        .filter(|c| !c.is_empty())
        .ok_or((StatusCode::BAD_REQUEST, "No authorization code provided".to_string()))?;

    // 2. Exchange it for a session token
    let token = state
        .identity
        .exchange_code(&code)
        .await
        .map_err(|e| port_error(e, "Failed to exchange authorization code"))?;

    // 3. Hand the token to the browser as a cookie
    let cookie = session_cookie(
        &state.config.session_cookie_name,
        &token,
        SESSION_COOKIE_MAX_AGE_SECONDS,
    );
    info!("Session created");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(SuccessResponse { success: true }),
    ))
}

/// GET /api/users/me - The signed-in user
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "The authenticated user", body = AuthenticatedUser),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn me_handler(Extension(user): Extension<AuthenticatedUser>) -> Json<AuthenticatedUser> {
    Json(user)
}

/// GET /api/logout - End the session and clear the cookie
#[utoipa::path(
    get,
    path = "/api/logout",
    responses(
        (status = 200, description = "Logged out, cookie cleared", body = SuccessResponse)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let cookie_name = &state.config.session_cookie_name;

    // 1. Best-effort delete of the identity session
    if let Some(token) = session_token(&headers, cookie_name) {
        if let Err(e) = state.identity.delete_session(token).await {
            warn!("Failed to delete identity session: {:?}", e);
        }
    }

    // 2. Clear cookie
    (
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(cookie_name, "", 0))],
        Json(SuccessResponse { success: true }),
    )
}
