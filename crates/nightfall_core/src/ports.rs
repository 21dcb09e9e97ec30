//! crates/nightfall_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the table store, the hosted identity service and the
//! audio device.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    AuthenticatedUser, NewSleepSession, NewSoundSession, PreferencesPatch, SleepSession,
    SoundSession, UserPreferences,
};
use crate::sound::mixer::SharedMixer;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Sleep Sessions ---
    async fn create_sleep_session(&self, user_id: &str, session: &NewSleepSession)
        -> PortResult<i64>;

    /// Most recent first.
    async fn list_sleep_sessions(&self, user_id: &str, limit: i64)
        -> PortResult<Vec<SleepSession>>;

    /// Every session created at or after `since`, most recent first.
    async fn sleep_sessions_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> PortResult<Vec<SleepSession>>;

    // --- Sound Sessions ---
    async fn create_sound_session(&self, user_id: &str, session: &NewSoundSession)
        -> PortResult<i64>;

    async fn list_sound_sessions(&self, user_id: &str, limit: i64)
        -> PortResult<Vec<SoundSession>>;

    // --- Preferences ---
    /// Returns the stored preferences, inserting the defaults on first access.
    async fn get_or_create_preferences(&self, user_id: &str) -> PortResult<UserPreferences>;

    async fn update_preferences(
        &self,
        user_id: &str,
        patch: &PreferencesPatch,
    ) -> PortResult<UserPreferences>;
}

/// The hosted identity service that owns sign-in and session issuance.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// The URL the browser is sent to for the given OAuth provider.
    async fn redirect_url(&self, provider: &str) -> PortResult<String>;

    /// Exchanges an OAuth authorization code for a session token.
    async fn exchange_code(&self, code: &str) -> PortResult<String>;

    /// Resolves a session token to its user, or `Unauthorized`.
    async fn user_for_session(&self, session_token: &str) -> PortResult<AuthenticatedUser>;

    async fn delete_session(&self, session_token: &str) -> PortResult<()>;
}

/// Where playback events are reported. Callers treat failures as non-fatal.
#[async_trait]
pub trait SoundSessionLog: Send + Sync {
    async fn record_sound_session(&self, session: &NewSoundSession) -> PortResult<()>;
}

/// A sink that pulls mono samples from the mixer while playback is active.
pub trait AudioOutput: Send {
    fn sample_rate(&self) -> u32;

    /// Acquires the device and begins pulling from `mixer`.
    fn start(&mut self, mixer: SharedMixer) -> PortResult<()>;

    /// Releases the device. Calling it while stopped does nothing.
    fn stop(&mut self);
}
