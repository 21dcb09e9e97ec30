//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nightfall_core::domain::{
    NewSleepSession, NewSoundSession, PreferencesPatch, SleepSession, SoundSession,
    UserPreferences,
};
use nightfall_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const SLEEP_SESSION_COLUMNS: &str = "id, user_id, sleep_score, bedtime_at, wake_time_at, \
     sleep_duration_minutes, deep_sleep_minutes, light_sleep_minutes, rem_sleep_minutes, \
     awake_minutes, sleep_quality_rating, notes, created_at, updated_at";

#[derive(FromRow)]
struct SleepSessionRecord {
    id: i64,
    user_id: String,
    sleep_score: Option<i32>,
    bedtime_at: Option<DateTime<Utc>>,
    wake_time_at: Option<DateTime<Utc>>,
    sleep_duration_minutes: Option<i32>,
    deep_sleep_minutes: Option<i32>,
    light_sleep_minutes: Option<i32>,
    rem_sleep_minutes: Option<i32>,
    awake_minutes: Option<i32>,
    sleep_quality_rating: Option<i32>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl SleepSessionRecord {
    fn to_domain(self) -> SleepSession {
        SleepSession {
            id: self.id,
            user_id: self.user_id,
            sleep_score: self.sleep_score,
            bedtime_at: self.bedtime_at,
            wake_time_at: self.wake_time_at,
            sleep_duration_minutes: self.sleep_duration_minutes,
            deep_sleep_minutes: self.deep_sleep_minutes,
            light_sleep_minutes: self.light_sleep_minutes,
            rem_sleep_minutes: self.rem_sleep_minutes,
            awake_minutes: self.awake_minutes,
            sleep_quality_rating: self.sleep_quality_rating,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct SoundSessionRecord {
    id: i64,
    user_id: String,
    sound_type: String,
    sound_name: String,
    duration_minutes: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl SoundSessionRecord {
    fn to_domain(self) -> SoundSession {
        SoundSession {
            id: self.id,
            user_id: self.user_id,
            sound_type: self.sound_type,
            sound_name: self.sound_name,
            duration_minutes: self.duration_minutes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const PREFERENCES_COLUMNS: &str = "user_id, bedtime_reminder_enabled, bedtime_reminder_time, \
     smart_alarm_enabled, preferred_wake_window_minutes, dnd_enabled, dnd_start_time, \
     dnd_end_time, preferred_sound_category, created_at, updated_at";

#[derive(FromRow)]
struct PreferencesRecord {
    user_id: String,
    bedtime_reminder_enabled: bool,
    bedtime_reminder_time: Option<String>,
    smart_alarm_enabled: bool,
    preferred_wake_window_minutes: i32,
    dnd_enabled: bool,
    dnd_start_time: Option<String>,
    dnd_end_time: Option<String>,
    preferred_sound_category: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl PreferencesRecord {
    fn to_domain(self) -> UserPreferences {
        UserPreferences {
            user_id: self.user_id,
            bedtime_reminder_enabled: self.bedtime_reminder_enabled,
            bedtime_reminder_time: self.bedtime_reminder_time,
            smart_alarm_enabled: self.smart_alarm_enabled,
            preferred_wake_window_minutes: self.preferred_wake_window_minutes,
            dnd_enabled: self.dnd_enabled,
            dnd_start_time: self.dnd_start_time,
            dnd_end_time: self.dnd_end_time,
            preferred_sound_category: self.preferred_sound_category,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_sleep_session(
        &self,
        user_id: &str,
        session: &NewSleepSession,
    ) -> PortResult<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO sleep_sessions (user_id, sleep_score, bedtime_at, wake_time_at, \
             sleep_duration_minutes, deep_sleep_minutes, light_sleep_minutes, rem_sleep_minutes, \
             awake_minutes, sleep_quality_rating, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING id",
        )
        .bind(user_id)
        .bind(session.sleep_score)
        .bind(session.bedtime_at)
        .bind(session.wake_time_at)
        .bind(session.sleep_duration_minutes)
        .bind(session.deep_sleep_minutes)
        .bind(session.light_sleep_minutes)
        .bind(session.rem_sleep_minutes)
        .bind(session.awake_minutes)
        .bind(session.sleep_quality_rating)
        .bind(&session.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(id)
    }

    async fn list_sleep_sessions(&self, user_id: &str, limit: i64) -> PortResult<Vec<SleepSession>> {
        let records = sqlx::query_as::<_, SleepSessionRecord>(&format!(
            "SELECT {} FROM sleep_sessions WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2",
            SLEEP_SESSION_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn sleep_sessions_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> PortResult<Vec<SleepSession>> {
        let records = sqlx::query_as::<_, SleepSessionRecord>(&format!(
            "SELECT {} FROM sleep_sessions WHERE user_id = $1 AND created_at >= $2 \
             ORDER BY created_at DESC, id DESC",
            SLEEP_SESSION_COLUMNS
        ))
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_sound_session(
        &self,
        user_id: &str,
        session: &NewSoundSession,
    ) -> PortResult<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO sound_sessions (user_id, sound_type, sound_name, duration_minutes) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(user_id)
        .bind(&session.sound_type)
        .bind(&session.sound_name)
        .bind(session.duration_minutes)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(id)
    }

    async fn list_sound_sessions(&self, user_id: &str, limit: i64) -> PortResult<Vec<SoundSession>> {
        let records = sqlx::query_as::<_, SoundSessionRecord>(
            "SELECT id, user_id, sound_type, sound_name, duration_minutes, created_at, updated_at \
             FROM sound_sessions WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_or_create_preferences(&self, user_id: &str) -> PortResult<UserPreferences> {
        sqlx::query("INSERT INTO user_preferences (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        let record = sqlx::query_as::<_, PreferencesRecord>(&format!(
            "SELECT {} FROM user_preferences WHERE user_id = $1",
            PREFERENCES_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Preferences for user {} not found", user_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        Ok(record.to_domain())
    }

    async fn update_preferences(
        &self,
        user_id: &str,
        patch: &PreferencesPatch,
    ) -> PortResult<UserPreferences> {
        // Absent fields bind as NULL and COALESCE keeps the stored value.
        self.get_or_create_preferences(user_id).await?;

        let record = sqlx::query_as::<_, PreferencesRecord>(&format!(
            "UPDATE user_preferences SET \
             bedtime_reminder_enabled = COALESCE($2, bedtime_reminder_enabled), \
             bedtime_reminder_time = COALESCE($3, bedtime_reminder_time), \
             smart_alarm_enabled = COALESCE($4, smart_alarm_enabled), \
             preferred_wake_window_minutes = COALESCE($5, preferred_wake_window_minutes), \
             dnd_enabled = COALESCE($6, dnd_enabled), \
             dnd_start_time = COALESCE($7, dnd_start_time), \
             dnd_end_time = COALESCE($8, dnd_end_time), \
             preferred_sound_category = COALESCE($9, preferred_sound_category), \
             updated_at = NOW() \
             WHERE user_id = $1 RETURNING {}",
            PREFERENCES_COLUMNS
        ))
        .bind(user_id)
        .bind(patch.bedtime_reminder_enabled)
        .bind(&patch.bedtime_reminder_time)
        .bind(patch.smart_alarm_enabled)
        .bind(patch.preferred_wake_window_minutes)
        .bind(patch.dnd_enabled)
        .bind(&patch.dnd_start_time)
        .bind(&patch.dnd_end_time)
        .bind(&patch.preferred_sound_category)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.to_domain())
    }
}
