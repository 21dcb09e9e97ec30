//! In-memory port fakes shared by the handler tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, Utc};
use nightfall_core::domain::{
    AuthenticatedUser, NewSleepSession, NewSoundSession, PreferencesPatch, SleepSession,
    SoundSession, UserPreferences,
};
use nightfall_core::ports::{DatabaseService, IdentityService, PortError, PortResult};
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::web::state::AppState;

#[derive(Default)]
struct Tables {
    next_id: i64,
    sleep_sessions: Vec<SleepSession>,
    sound_sessions: Vec<SoundSession>,
    preferences: Vec<UserPreferences>,
}

#[derive(Default)]
pub struct FakeDb {
    tables: Mutex<Tables>,
}

fn most_recent_first<T>(rows: &mut [T], created_at: impl Fn(&T) -> (DateTime<Utc>, i64)) {
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
}

#[async_trait]
impl DatabaseService for FakeDb {
    async fn create_sleep_session(&self, user_id: &str, s: &NewSleepSession) -> PortResult<i64> {
        let mut tables = self.tables.lock().unwrap();
        tables.next_id += 1;
        let id = tables.next_id;
        let now = Utc::now();
        tables.sleep_sessions.push(SleepSession {
            id,
            user_id: user_id.to_string(),
            sleep_score: s.sleep_score,
            bedtime_at: s.bedtime_at,
            wake_time_at: s.wake_time_at,
            sleep_duration_minutes: s.sleep_duration_minutes,
            deep_sleep_minutes: s.deep_sleep_minutes,
            light_sleep_minutes: s.light_sleep_minutes,
            rem_sleep_minutes: s.rem_sleep_minutes,
            awake_minutes: s.awake_minutes,
            sleep_quality_rating: s.sleep_quality_rating,
            notes: s.notes.clone(),
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn list_sleep_sessions(&self, user_id: &str, limit: i64) -> PortResult<Vec<SleepSession>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<SleepSession> = tables
            .sleep_sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        most_recent_first(&mut rows, |s| (s.created_at, s.id));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn sleep_sessions_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> PortResult<Vec<SleepSession>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<SleepSession> = tables
            .sleep_sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.created_at >= since)
            .cloned()
            .collect();
        most_recent_first(&mut rows, |s| (s.created_at, s.id));
        Ok(rows)
    }

    async fn create_sound_session(&self, user_id: &str, s: &NewSoundSession) -> PortResult<i64> {
        let mut tables = self.tables.lock().unwrap();
        tables.next_id += 1;
        let id = tables.next_id;
        let now = Utc::now();
        tables.sound_sessions.push(SoundSession {
            id,
            user_id: user_id.to_string(),
            sound_type: s.sound_type.clone(),
            sound_name: s.sound_name.clone(),
            duration_minutes: s.duration_minutes,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn list_sound_sessions(&self, user_id: &str, limit: i64) -> PortResult<Vec<SoundSession>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<SoundSession> = tables
            .sound_sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        most_recent_first(&mut rows, |s| (s.created_at, s.id));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn get_or_create_preferences(&self, user_id: &str) -> PortResult<UserPreferences> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(existing) = tables.preferences.iter().find(|p| p.user_id == user_id) {
            return Ok(existing.clone());
        }
        let created = UserPreferences::defaults_for(user_id, Utc::now());
        tables.preferences.push(created.clone());
        Ok(created)
    }

    async fn update_preferences(
        &self,
        user_id: &str,
        patch: &PreferencesPatch,
    ) -> PortResult<UserPreferences> {
        self.get_or_create_preferences(user_id).await?;
        let mut tables = self.tables.lock().unwrap();
        let stored = tables
            .preferences
            .iter_mut()
            .find(|p| p.user_id == user_id)
            .ok_or_else(|| PortError::NotFound(user_id.to_string()))?;
        stored.apply(patch, Utc::now());
        Ok(stored.clone())
    }
}

/// Accepts one code, issues one token, and remembers deleted sessions.
#[derive(Default)]
pub struct FakeIdentity {
    pub deleted: Mutex<Vec<String>>,
}

impl FakeIdentity {
    pub const VALID_CODE: &'static str = "good-code";
    pub const TOKEN: &'static str = "token-123";
}

#[async_trait]
impl IdentityService for FakeIdentity {
    async fn redirect_url(&self, provider: &str) -> PortResult<String> {
        Ok(format!("https://identity.test/oauth/{}", provider))
    }

    async fn exchange_code(&self, code: &str) -> PortResult<String> {
        if code == Self::VALID_CODE {
            Ok(Self::TOKEN.to_string())
        } else {
            Err(PortError::Unauthorized)
        }
    }

    async fn user_for_session(&self, session_token: &str) -> PortResult<AuthenticatedUser> {
        if session_token == Self::TOKEN {
            Ok(user("u1"))
        } else {
            Err(PortError::Unauthorized)
        }
    }

    async fn delete_session(&self, session_token: &str) -> PortResult<()> {
        self.deleted.lock().unwrap().push(session_token.to_string());
        Ok(())
    }
}

pub fn user(id: &str) -> AuthenticatedUser {
    AuthenticatedUser {
        id: id.to_string(),
        email: Some(format!("{}@example.com", id)),
        name: None,
    }
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://localhost/nightfall_test".to_string()),
        "USERS_SERVICE_API_URL" => Some("https://identity.test".to_string()),
        "USERS_SERVICE_API_KEY" => Some("test-key".to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn test_state() -> Arc<AppState> {
    test_state_with_identity(Arc::new(FakeIdentity::default()))
}

pub fn test_state_with_identity(identity: Arc<FakeIdentity>) -> Arc<AppState> {
    Arc::new(AppState {
        db: Arc::new(FakeDb::default()),
        identity,
        config: Arc::new(test_config()),
    })
}

pub async fn body_json<T: DeserializeOwned>(response: Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
