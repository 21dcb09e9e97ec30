//! services/api/src/adapters/identity.rs
//!
//! This module contains the adapter for the hosted users service, which owns
//! OAuth sign-in and session issuance. It implements the `IdentityService`
//! port from the `core` crate.

use async_trait::async_trait;
use nightfall_core::domain::AuthenticatedUser;
use nightfall_core::ports::{IdentityService, PortError, PortResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Deserialize)]
struct RedirectUrlResponse {
    redirect_url: String,
}

#[derive(Serialize)]
struct ExchangeCodeRequest<'a> {
    code: &'a str,
}

#[derive(Deserialize)]
struct ExchangeCodeResponse {
    session_token: String,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `IdentityService` port over the users service's HTTP API.
#[derive(Clone)]
pub struct UsersServiceAdapter {
    client: Client,
    api_url: String,
    api_key: String,
}

impl UsersServiceAdapter {
    /// Creates a new `UsersServiceAdapter`.
    pub fn new(client: Client, api_url: &str, api_key: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

/// Maps a non-success status from the users service onto a port error.
fn status_error(status: StatusCode, context: &str) -> PortError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized,
        StatusCode::NOT_FOUND => PortError::NotFound(context.to_string()),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            PortError::Invalid(context.to_string())
        }
        other => PortError::Unexpected(format!("{} failed with status {}", context, other)),
    }
}

fn transport_error(e: reqwest::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// `IdentityService` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityService for UsersServiceAdapter {
    async fn redirect_url(&self, provider: &str) -> PortResult<String> {
        let response = self
            .client
            .get(self.url(&format!("/oauth/{}/redirect_url", provider)))
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(status_error(response.status(), "OAuth redirect URL"));
        }
        let body: RedirectUrlResponse = response.json().await.map_err(transport_error)?;
        Ok(body.redirect_url)
    }

    async fn exchange_code(&self, code: &str) -> PortResult<String> {
        let response = self
            .client
            .post(self.url("/sessions"))
            .header("x-api-key", &self.api_key)
            .json(&ExchangeCodeRequest { code })
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(status_error(response.status(), "Authorization code exchange"));
        }
        let body: ExchangeCodeResponse = response.json().await.map_err(transport_error)?;
        Ok(body.session_token)
    }

    async fn user_for_session(&self, session_token: &str) -> PortResult<AuthenticatedUser> {
        let response = self
            .client
            .get(self.url("/users/me"))
            .header("x-api-key", &self.api_key)
            .bearer_auth(session_token)
            .send()
            .await
            .map_err(transport_error)?;
        match response.status() {
            status if status.is_success() => response.json().await.map_err(transport_error),
            // An unknown or expired token is simply not a signed-in user.
            StatusCode::NOT_FOUND => Err(PortError::Unauthorized),
            status => Err(status_error(status, "Session lookup")),
        }
    }

    async fn delete_session(&self, session_token: &str) -> PortResult<()> {
        let response = self
            .client
            .delete(self.url("/sessions/current"))
            .header("x-api-key", &self.api_key)
            .bearer_auth(session_token)
            .send()
            .await
            .map_err(transport_error)?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND | StatusCode::UNAUTHORIZED => Ok(()),
            status => Err(status_error(status, "Session deletion")),
        }
    }
}
