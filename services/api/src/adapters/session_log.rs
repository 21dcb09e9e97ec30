//! services/api/src/adapters/session_log.rs
//!
//! `SoundSessionLog` implementations for the `ambient` binary: one posting to
//! a running NightFall API with a session cookie, and a local fallback that
//! only writes to the trace log.

use async_trait::async_trait;
use nightfall_core::domain::NewSoundSession;
use nightfall_core::ports::{PortError, PortResult, SoundSessionLog};
use reqwest::Client;
use tracing::info;

/// Used when no API session is configured.
pub struct TracingSoundSessionLog;

#[async_trait]
impl SoundSessionLog for TracingSoundSessionLog {
    async fn record_sound_session(&self, session: &NewSoundSession) -> PortResult<()> {
        info!(
            sound_type = %session.sound_type,
            sound_name = %session.sound_name,
            duration_minutes = session.duration_minutes,
            "sound session"
        );
        Ok(())
    }
}

/// Logs sound sessions by calling `POST /api/sound-sessions` on a NightFall API.
#[derive(Clone)]
pub struct HttpSoundSessionLog {
    client: Client,
    endpoint: String,
    cookie: String,
}

impl HttpSoundSessionLog {
    pub fn new(client: Client, api_base: &str, cookie_name: &str, session_token: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/sound-sessions", api_base.trim_end_matches('/')),
            cookie: format!("{}={}", cookie_name, session_token),
        }
    }
}

#[async_trait]
impl SoundSessionLog for HttpSoundSessionLog {
    async fn record_sound_session(&self, session: &NewSoundSession) -> PortResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::COOKIE, &self.cookie)
            .json(session)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            reqwest::StatusCode::UNAUTHORIZED => Err(PortError::Unauthorized),
            status => Err(PortError::Unexpected(format!(
                "sound session log rejected with status {}",
                status
            ))),
        }
    }
}
