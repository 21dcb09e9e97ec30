//! crates/nightfall_core/src/analysis.rs
//!
//! Summary statistics over a user's recent sleep sessions.
//!
//! Windows are positional: the first seven scored sessions form "this week",
//! the next seven "last week", regardless of the dates they were logged on.
//! A score or duration of 0 is treated as not recorded.

use crate::domain::{SleepAnalysis, SleepSession, SleepTrend, WeeklyComparison};

/// How many scored sessions make up one comparison window.
pub const WEEK_WINDOW: usize = 7;

/// Mean differences up to this many points count as `Stable`.
pub const TREND_THRESHOLD: f64 = 5.0;

/// How far back the analysis endpoint looks.
pub const ANALYSIS_WINDOW_DAYS: i64 = 30;

/// Computes a [`SleepAnalysis`] from sessions ordered most recent first.
pub fn analyze_sleep(sessions: &[SleepSession]) -> SleepAnalysis {
    let (Some(first), Some(last)) = (sessions.first(), sessions.last()) else {
        return SleepAnalysis::empty();
    };

    let scores: Vec<f64> = sessions
        .iter()
        .filter_map(|s| s.sleep_score)
        .filter(|&score| score != 0)
        .map(f64::from)
        .collect();
    let durations: Vec<f64> = sessions
        .iter()
        .filter_map(|s| s.sleep_duration_minutes)
        .filter(|&minutes| minutes != 0)
        .map(f64::from)
        .collect();

    let recent = &scores[..scores.len().min(WEEK_WINDOW)];
    let older = &scores[recent.len()..scores.len().min(2 * WEEK_WINDOW)];

    let recent_mean = mean(recent);
    let older_mean = mean(older);

    let (sleep_trend, change) = match (recent_mean, older_mean) {
        (Some(recent), Some(older)) => (classify(recent, older), round_half_up(recent - older)),
        _ => (SleepTrend::Stable, 0),
    };

    SleepAnalysis {
        average_sleep_score: mean(&scores).map(round_half_up).unwrap_or(0),
        average_sleep_duration: mean(&durations).map(round_half_up).unwrap_or(0),
        sleep_trend,
        best_sleep_day: first.created_at.date_naive().to_string(),
        worst_sleep_day: last.created_at.date_naive().to_string(),
        weekly_comparison: WeeklyComparison {
            this_week: recent_mean.map(round_half_up).unwrap_or(0),
            last_week: older_mean.map(round_half_up).unwrap_or(0),
            change,
        },
    }
}

fn classify(recent: f64, older: f64) -> SleepTrend {
    if recent > older + TREND_THRESHOLD {
        SleepTrend::Improving
    } else if recent < older - TREND_THRESHOLD {
        SleepTrend::Declining
    } else {
        SleepTrend::Stable
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Rounds halves towards positive infinity, so -2.5 becomes -2.
fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}
