//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use nightfall_core::ports::PortError;
use std::sync::Arc;
use tracing::{error, warn};

use crate::web::state::AppState;

/// Reads the value of the cookie called `name` from the request headers.
pub fn session_token<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            let (key, value) = c.trim().split_once('=')?;
            (key == name && !value.is_empty()).then_some(value)
        })
}

/// Middleware that resolves the session cookie to a user through the identity service.
///
/// If valid, inserts the `AuthenticatedUser` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract the session token from the cookie header
    let token = session_token(req.headers(), &state.config.session_cookie_name)
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_string();

    // 2. Ask the identity service who it belongs to
    let user = state.identity.user_for_session(&token).await.map_err(|e| match e {
        PortError::Unauthorized => {
            warn!("Rejected unknown or expired session");
            StatusCode::UNAUTHORIZED
        }
        e => {
            error!("Failed to validate session: {:?}", e);
            StatusCode::UNAUTHORIZED
        }
    })?;

    // 3. Insert the user into request extensions
    req.extensions_mut().insert(user);

    // 4. Continue to the handler
    Ok(next.run(req).await)
}
