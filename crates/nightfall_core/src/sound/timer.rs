//! The sleep timer: a one-shot deferred stop.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::engine::SoundEngine;

/// Durations offered to the user, in minutes.
pub const SLEEP_TIMER_PRESETS_MINUTES: [u64; 7] = [15, 30, 60, 120, 180, 300, 480];

struct PendingStop {
    cancellation_token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Holds at most one pending stop; arming again replaces it.
#[derive(Default)]
pub struct AutoStopTimer {
    pending: Option<PendingStop>,
}

impl AutoStopTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `engine.stop()` after `delay`, cancelling any earlier arming.
    pub fn arm(&mut self, delay: Duration, engine: Arc<Mutex<SoundEngine>>) {
        self.cancel();
        let cancellation_token = CancellationToken::new();
        let token = cancellation_token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let mut engine = engine.lock().unwrap_or_else(|p| p.into_inner());
                    if engine.stop() {
                        info!(after = ?delay, "sleep timer stopped playback");
                    }
                }
            }
        });
        self.pending = Some(PendingStop {
            cancellation_token,
            handle,
        });
    }

    /// Removes the pending stop, if any, without running it.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.cancellation_token.cancel();
                !pending.handle.is_finished()
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.handle.is_finished())
    }
}

impl Drop for AutoStopTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::catalog::TrackId;
    use crate::sound::engine::tests::RecordingOutput;
    use crate::sound::engine::PlaybackState;
    use pretty_assertions::assert_eq;

    fn playing_engine() -> (Arc<Mutex<SoundEngine>>, RecordingOutput) {
        let output = RecordingOutput::default();
        let mut engine = SoundEngine::with_seed(Box::new(output.clone()), 3);
        engine.start(TrackId::Forest).unwrap();
        (Arc::new(Mutex::new(engine)), output)
    }

    fn state(engine: &Arc<Mutex<SoundEngine>>) -> PlaybackState {
        engine.lock().unwrap().state()
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_the_delay() {
        let (engine, output) = playing_engine();
        let mut timer = AutoStopTimer::new();
        timer.arm(Duration::from_secs(60), engine.clone());
        assert!(timer.is_armed());

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(state(&engine), PlaybackState::Playing(TrackId::Forest));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(state(&engine), PlaybackState::Idle);
        assert!(!timer.is_armed());
        assert_eq!(output.calls(), ["start", "stop"]);
    }

    #[tokio::test(start_paused = true)]
    async fn re_arming_replaces_the_earlier_deadline() {
        let (engine, output) = playing_engine();
        let mut timer = AutoStopTimer::new();
        timer.arm(Duration::from_secs(1), engine.clone());
        timer.arm(Duration::from_secs(5), engine.clone());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(state(&engine), PlaybackState::Playing(TrackId::Forest));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(state(&engine), PlaybackState::Idle);
        assert_eq!(output.calls(), ["start", "stop"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_removes_the_pending_stop() {
        let (engine, output) = playing_engine();
        let mut timer = AutoStopTimer::new();
        timer.arm(Duration::from_secs(1), engine.clone());
        assert!(timer.cancel());
        assert!(!timer.cancel());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(state(&engine), PlaybackState::Playing(TrackId::Forest));
        assert_eq!(output.calls(), ["start"]);
    }
}
