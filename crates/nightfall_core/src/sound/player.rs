//! Playback control as the sounds page drives it: toggle a track, adjust the
//! volume, arm a sleep timer, and report every start to the session log.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::warn;

use super::catalog::TrackId;
use super::engine::{PlaybackState, SoundEngine};
use super::timer::AutoStopTimer;
use super::SynthError;
use crate::domain::NewSoundSession;
use crate::ports::SoundSessionLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Started(TrackId),
    Stopped,
}

pub struct SoundPlayer {
    engine: Arc<Mutex<SoundEngine>>,
    timer: AutoStopTimer,
    log: Arc<dyn SoundSessionLog>,
}

impl SoundPlayer {
    pub fn new(engine: SoundEngine, log: Arc<dyn SoundSessionLog>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            timer: AutoStopTimer::new(),
            log,
        }
    }

    fn engine(&self) -> MutexGuard<'_, SoundEngine> {
        self.engine.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn state(&self) -> PlaybackState {
        self.engine().state()
    }

    /// Stops `track_id` if it is the one playing, otherwise switches to it.
    ///
    /// Unknown ids play white noise.
    pub fn toggle(&mut self, track_id: &str) -> Result<PlayOutcome, SynthError> {
        let track = TrackId::from_id_lossy(track_id);
        let mut engine = self.engine();
        if engine.state() == PlaybackState::Playing(track) {
            engine.stop();
            return Ok(PlayOutcome::Stopped);
        }
        engine.start(track)?;
        drop(engine);

        self.report(track);
        Ok(PlayOutcome::Started(track))
    }

    pub fn stop(&mut self) -> bool {
        self.engine().stop()
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.engine().set_volume(volume);
    }

    pub fn volume(&self) -> f32 {
        self.engine().volume()
    }

    pub fn arm_sleep_timer(&mut self, minutes: u64) {
        self.timer
            .arm(Duration::from_secs(minutes.saturating_mul(60)), self.engine.clone());
    }

    pub fn cancel_sleep_timer(&mut self) -> bool {
        self.timer.cancel()
    }

    pub fn sleep_timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    /// Best-effort: a failed report is logged and otherwise ignored.
    fn report(&self, track: TrackId) {
        let session = NewSoundSession {
            sound_type: track.category().as_str().to_string(),
            sound_name: track.name().to_string(),
            duration_minutes: (track.sound_track().duration as f64 / 60.0).round() as i32,
        };
        let log = self.log.clone();
        tokio::spawn(async move {
            if let Err(e) = log.record_sound_session(&session).await {
                warn!(sound = %session.sound_name, "failed to log sound session: {}", e);
            }
        });
    }
}
