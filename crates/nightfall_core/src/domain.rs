//! crates/nightfall_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database; they serialize the way the
//! REST boundary presents them.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ports::{PortError, PortResult};

/// The user the hosted identity service vouched for.
///
/// The id is opaque to the core; it is only ever compared and stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthenticatedUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// One reported night of sleep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SleepSession {
    pub id: i64,
    pub user_id: String,
    pub sleep_score: Option<i32>,
    pub bedtime_at: Option<DateTime<Utc>>,
    pub wake_time_at: Option<DateTime<Utc>>,
    pub sleep_duration_minutes: Option<i32>,
    pub deep_sleep_minutes: Option<i32>,
    pub light_sleep_minutes: Option<i32>,
    pub rem_sleep_minutes: Option<i32>,
    pub awake_minutes: Option<i32>,
    pub sleep_quality_rating: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The client payload for a new sleep session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewSleepSession {
    pub sleep_score: Option<i32>,
    pub bedtime_at: Option<DateTime<Utc>>,
    pub wake_time_at: Option<DateTime<Utc>>,
    pub sleep_duration_minutes: Option<i32>,
    pub deep_sleep_minutes: Option<i32>,
    pub light_sleep_minutes: Option<i32>,
    pub rem_sleep_minutes: Option<i32>,
    pub awake_minutes: Option<i32>,
    pub sleep_quality_rating: Option<i32>,
    pub notes: Option<String>,
}

impl NewSleepSession {
    pub fn validate(&self) -> PortResult<()> {
        if let Some(rating) = self.sleep_quality_rating {
            if !(1..=5).contains(&rating) {
                return Err(PortError::Invalid(format!(
                    "sleep_quality_rating must be between 1 and 5, got {}",
                    rating
                )));
            }
        }
        if let Some(score) = self.sleep_score {
            if !(0..=100).contains(&score) {
                return Err(PortError::Invalid(format!(
                    "sleep_score must be between 0 and 100, got {}",
                    score
                )));
            }
        }
        let minutes = [
            ("sleep_duration_minutes", self.sleep_duration_minutes),
            ("deep_sleep_minutes", self.deep_sleep_minutes),
            ("light_sleep_minutes", self.light_sleep_minutes),
            ("rem_sleep_minutes", self.rem_sleep_minutes),
            ("awake_minutes", self.awake_minutes),
        ];
        for (field, value) in minutes {
            if matches!(value, Some(m) if m < 0) {
                return Err(PortError::Invalid(format!("{} must not be negative", field)));
            }
        }
        Ok(())
    }
}

/// A log entry for one ambient-sound playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SoundSession {
    pub id: i64,
    pub user_id: String,
    pub sound_type: String,
    pub sound_name: String,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewSoundSession {
    pub sound_type: String,
    pub sound_name: String,
    pub duration_minutes: i32,
}

impl NewSoundSession {
    pub fn validate(&self) -> PortResult<()> {
        if self.sound_type.trim().is_empty() || self.sound_name.trim().is_empty() {
            return Err(PortError::Invalid(
                "sound_type and sound_name are required".to_string(),
            ));
        }
        if self.duration_minutes < 0 {
            return Err(PortError::Invalid(
                "duration_minutes must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-user settings, created lazily with [`UserPreferences::defaults_for`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserPreferences {
    pub user_id: String,
    pub bedtime_reminder_enabled: bool,
    pub bedtime_reminder_time: Option<String>,
    pub smart_alarm_enabled: bool,
    pub preferred_wake_window_minutes: i32,
    pub dnd_enabled: bool,
    pub dnd_start_time: Option<String>,
    pub dnd_end_time: Option<String>,
    pub preferred_sound_category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DEFAULT_WAKE_WINDOW_MINUTES: i32 = 30;
pub const MAX_WAKE_WINDOW_MINUTES: i32 = 180;

impl UserPreferences {
    pub fn defaults_for(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            bedtime_reminder_enabled: true,
            bedtime_reminder_time: None,
            smart_alarm_enabled: true,
            preferred_wake_window_minutes: DEFAULT_WAKE_WINDOW_MINUTES,
            dnd_enabled: true,
            dnd_start_time: None,
            dnd_end_time: None,
            preferred_sound_category: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges the supplied fields of `patch`; absent fields keep their value.
    pub fn apply(&mut self, patch: &PreferencesPatch, now: DateTime<Utc>) {
        if let Some(v) = patch.bedtime_reminder_enabled {
            self.bedtime_reminder_enabled = v;
        }
        if let Some(v) = &patch.bedtime_reminder_time {
            self.bedtime_reminder_time = Some(v.clone());
        }
        if let Some(v) = patch.smart_alarm_enabled {
            self.smart_alarm_enabled = v;
        }
        if let Some(v) = patch.preferred_wake_window_minutes {
            self.preferred_wake_window_minutes = v;
        }
        if let Some(v) = patch.dnd_enabled {
            self.dnd_enabled = v;
        }
        if let Some(v) = &patch.dnd_start_time {
            self.dnd_start_time = Some(v.clone());
        }
        if let Some(v) = &patch.dnd_end_time {
            self.dnd_end_time = Some(v.clone());
        }
        if let Some(v) = &patch.preferred_sound_category {
            self.preferred_sound_category = Some(v.clone());
        }
        self.updated_at = now;
    }
}

/// A partial update of [`UserPreferences`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(deny_unknown_fields)]
pub struct PreferencesPatch {
    pub bedtime_reminder_enabled: Option<bool>,
    pub bedtime_reminder_time: Option<String>,
    pub smart_alarm_enabled: Option<bool>,
    pub preferred_wake_window_minutes: Option<i32>,
    pub dnd_enabled: Option<bool>,
    pub dnd_start_time: Option<String>,
    pub dnd_end_time: Option<String>,
    pub preferred_sound_category: Option<String>,
}

impl PreferencesPatch {
    pub fn validate(&self) -> PortResult<()> {
        let times = [
            ("bedtime_reminder_time", &self.bedtime_reminder_time),
            ("dnd_start_time", &self.dnd_start_time),
            ("dnd_end_time", &self.dnd_end_time),
        ];
        for (field, value) in times {
            if let Some(time) = value {
                NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| {
                    PortError::Invalid(format!("{} must be HH:MM, got '{}'", field, time))
                })?;
            }
        }
        if let Some(minutes) = self.preferred_wake_window_minutes {
            if !(0..=MAX_WAKE_WINDOW_MINUTES).contains(&minutes) {
                return Err(PortError::Invalid(format!(
                    "preferred_wake_window_minutes must be between 0 and {}",
                    MAX_WAKE_WINDOW_MINUTES
                )));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SleepTrend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct WeeklyComparison {
    pub this_week: i32,
    pub last_week: i32,
    pub change: i32,
}

/// Summary statistics derived from a user's recent sleep sessions. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SleepAnalysis {
    pub average_sleep_score: i32,
    pub average_sleep_duration: i32,
    pub sleep_trend: SleepTrend,
    pub best_sleep_day: String,
    pub worst_sleep_day: String,
    pub weekly_comparison: WeeklyComparison,
}

impl SleepAnalysis {
    pub fn empty() -> Self {
        Self {
            average_sleep_score: 0,
            average_sleep_duration: 0,
            sleep_trend: SleepTrend::Stable,
            best_sleep_day: String::new(),
            worst_sleep_day: String::new(),
            weekly_comparison: WeeklyComparison::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rating_outside_one_to_five_is_rejected() {
        for rating in [0, 6, -1] {
            let payload = NewSleepSession {
                sleep_quality_rating: Some(rating),
                ..Default::default()
            };
            assert!(matches!(payload.validate(), Err(PortError::Invalid(_))));
        }
        let ok = NewSleepSession {
            sleep_quality_rating: Some(5),
            sleep_score: Some(100),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn negative_minutes_are_rejected() {
        let payload = NewSleepSession {
            rem_sleep_minutes: Some(-3),
            ..Default::default()
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let now = Utc::now();
        let mut prefs = UserPreferences::defaults_for("user-1", now);
        let patch = PreferencesPatch {
            dnd_enabled: Some(false),
            dnd_start_time: Some("22:30".to_string()),
            ..Default::default()
        };
        patch.validate().unwrap();
        prefs.apply(&patch, now);

        assert!(!prefs.dnd_enabled);
        assert_eq!(prefs.dnd_start_time.as_deref(), Some("22:30"));
        assert!(prefs.bedtime_reminder_enabled);
        assert!(prefs.smart_alarm_enabled);
        assert_eq!(prefs.preferred_wake_window_minutes, 30);
    }

    #[test]
    fn patch_rejects_malformed_times() {
        let patch = PreferencesPatch {
            bedtime_reminder_time: Some("25:99".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn empty_analysis_serializes_with_camel_case_fields() {
        let json = serde_json::to_value(SleepAnalysis::empty()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "averageSleepScore": 0,
                "averageSleepDuration": 0,
                "sleepTrend": "stable",
                "bestSleepDay": "",
                "worstSleepDay": "",
                "weeklyComparison": { "thisWeek": 0, "lastWeek": 0, "change": 0 }
            })
        );
    }
}
