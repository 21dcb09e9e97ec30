//! The ambient sound engine: one owned instance, at most one program playing.
//!
//! `start` always tears the previous program down before the next one's
//! voices exist. Recurring events are spawned onto the current Tokio runtime,
//! so `start` must be called from within one.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use tracing::{info, warn};

use super::catalog::TrackId;
use super::mixer::{lock, Mixer, SharedMixer, DEFAULT_VOLUME};
use super::program::Program;
use super::scheduler::RecurringTask;
use super::SynthError;
use crate::ports::AudioOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing(TrackId),
}

/// What the engine holds on to while a program plays.
struct ActiveProgram {
    track: TrackId,
    generation: u64,
    tasks: Vec<RecurringTask>,
    noise_beds: Vec<Arc<[f32]>>,
}

pub struct SoundEngine {
    output: Box<dyn AudioOutput>,
    mixer: SharedMixer,
    rng: Pcg32,
    active: Option<ActiveProgram>,
}

impl SoundEngine {
    pub fn new(output: Box<dyn AudioOutput>) -> Self {
        Self::with_rng(output, Pcg32::from_entropy())
    }

    /// An engine whose noise and event timing are reproducible from `seed`.
    pub fn with_seed(output: Box<dyn AudioOutput>, seed: u64) -> Self {
        Self::with_rng(output, Pcg32::seed_from_u64(seed))
    }

    fn with_rng(output: Box<dyn AudioOutput>, rng: Pcg32) -> Self {
        Self {
            output,
            mixer: Mixer::shared(DEFAULT_VOLUME),
            rng,
            active: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        match &self.active {
            Some(active) => PlaybackState::Playing(active.track),
            None => PlaybackState::Idle,
        }
    }

    pub fn mixer(&self) -> SharedMixer {
        self.mixer.clone()
    }

    pub fn volume(&self) -> f32 {
        lock(&self.mixer).gain()
    }

    /// Changes the master gain in place; playing voices are untouched.
    pub fn set_volume(&mut self, volume: f32) {
        lock(&self.mixer).set_gain(volume);
    }

    /// The noise buffers generated for the current program.
    pub fn noise_beds(&self) -> &[Arc<[f32]>] {
        self.active
            .as_ref()
            .map(|active| active.noise_beds.as_slice())
            .unwrap_or_default()
    }

    /// Stops whatever is playing and starts `track`.
    ///
    /// If the output cannot be acquired the engine is left idle.
    pub fn start(&mut self, track: TrackId) -> Result<(), SynthError> {
        self.stop();

        let sample_rate = self.output.sample_rate() as f32;
        let parts = Program::build(track, sample_rate, &mut self.rng).into_parts();
        let generation = lock(&self.mixer).load(parts.voices);

        if let Err(e) = self.output.start(self.mixer.clone()) {
            lock(&self.mixer).clear();
            warn!(track = %track, "audio output unavailable: {}", e);
            return Err(SynthError::OutputUnavailable(e));
        }

        let tasks = parts
            .chains
            .into_iter()
            .map(|chain| {
                let rng = Pcg32::seed_from_u64(self.rng.gen());
                RecurringTask::spawn(chain, self.mixer.clone(), generation, sample_rate, rng)
            })
            .collect();

        self.active = Some(ActiveProgram {
            track,
            generation,
            tasks,
            noise_beds: parts.noise_beds,
        });
        info!(track = %track, generation, "ambient playback started");
        Ok(())
    }

    /// Halts and releases the current program. Returns `false` when idle.
    pub fn stop(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        for task in &active.tasks {
            task.cancel();
        }
        lock(&self.mixer).clear();
        self.output.stop();
        info!(track = %active.track, generation = active.generation, "ambient playback stopped");
        true
    }
}

impl Drop for SoundEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
