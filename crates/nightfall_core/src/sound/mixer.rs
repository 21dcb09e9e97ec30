//! The shared summing bus between the engine, recurring events and the
//! audio output.
//!
//! Each loaded program gets a fresh generation number. One-shot voices are
//! pushed together with the generation they were scheduled for and are
//! rejected once that program has been cleared, so nothing from a torn-down
//! program can sound alongside its successor.

use std::sync::{Arc, Mutex, MutexGuard};

use super::voice::Voice;

pub const DEFAULT_VOLUME: f32 = 0.7;

pub type SharedMixer = Arc<Mutex<Mixer>>;

pub struct Mixer {
    generation: u64,
    voices: Vec<Box<dyn Voice>>,
    gain: f32,
}

/// Clamps a master gain into `[0, 1]`; NaN falls back to [`DEFAULT_VOLUME`].
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        DEFAULT_VOLUME
    } else {
        volume.clamp(0.0, 1.0)
    }
}

impl Mixer {
    pub fn new(gain: f32) -> Self {
        Self {
            generation: 0,
            voices: Vec::new(),
            gain: clamp_volume(gain),
        }
    }

    pub fn shared(gain: f32) -> SharedMixer {
        Arc::new(Mutex::new(Self::new(gain)))
    }

    /// Replaces every voice with `voices` and returns the new generation.
    pub fn load(&mut self, voices: Vec<Box<dyn Voice>>) -> u64 {
        self.generation += 1;
        self.voices = voices;
        self.generation
    }

    /// Drops every voice and invalidates the current generation.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.voices.clear();
    }

    /// Adds a one-shot voice if `generation` is still the live one.
    pub fn push(&mut self, generation: u64, voice: Box<dyn Voice>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.voices.push(voice);
        true
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = clamp_volume(gain);
    }

    /// Fills `out` with the gained, clipped sum of all voices.
    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            let sum: f32 = self.voices.iter_mut().map(|v| v.next_sample()).sum();
            *sample = (sum * self.gain).clamp(-1.0, 1.0);
        }
        self.voices.retain(|v| !v.is_finished());
    }
}

/// Locks the mixer, recovering it if a holder panicked mid-render.
pub fn lock(mixer: &SharedMixer) -> MutexGuard<'_, Mixer> {
    mixer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(f32);

    impl Voice for Constant {
        fn next_sample(&mut self) -> f32 {
            self.0
        }
    }

    struct Blip(usize);

    impl Voice for Blip {
        fn next_sample(&mut self) -> f32 {
            self.0 = self.0.saturating_sub(1);
            1.0
        }

        fn is_finished(&self) -> bool {
            self.0 == 0
        }
    }

    #[test]
    fn render_applies_gain_and_clips() {
        let mut mixer = Mixer::new(0.5);
        mixer.load(vec![Box::new(Constant(0.4)), Box::new(Constant(0.4))]);
        let mut out = [0.0; 4];
        mixer.render(&mut out);
        assert!(out.iter().all(|s| (s - 0.4).abs() < 1e-6));

        mixer.set_gain(1.0);
        mixer.load(vec![Box::new(Constant(0.9)), Box::new(Constant(0.9))]);
        mixer.render(&mut out);
        assert_eq!(out, [1.0; 4]);
    }

    #[test]
    fn finished_voices_are_dropped_after_render() {
        let mut mixer = Mixer::new(1.0);
        let generation = mixer.load(vec![Box::new(Constant(0.0))]);
        assert!(mixer.push(generation, Box::new(Blip(3))));
        assert_eq!(mixer.voice_count(), 2);

        let mut out = [0.0; 8];
        mixer.render(&mut out);
        assert_eq!(mixer.voice_count(), 1);
    }

    #[test]
    fn stale_generation_pushes_are_rejected() {
        let mut mixer = Mixer::new(1.0);
        let first = mixer.load(Vec::new());
        mixer.clear();
        assert!(!mixer.push(first, Box::new(Blip(1))));
        let second = mixer.load(Vec::new());
        assert!(second > first);
        assert!(!mixer.push(first, Box::new(Blip(1))));
        assert!(mixer.push(second, Box::new(Blip(1))));
    }

    #[test]
    fn gain_is_clamped_to_unit_range() {
        let mut mixer = Mixer::new(3.0);
        assert_eq!(mixer.gain(), 1.0);
        mixer.set_gain(-1.0);
        assert_eq!(mixer.gain(), 0.0);
    }

    #[test]
    fn nan_gain_falls_back_to_default_volume() {
        assert_eq!(Mixer::new(f32::NAN).gain(), DEFAULT_VOLUME);

        let mut mixer = Mixer::new(0.2);
        mixer.set_gain(f32::NAN);
        assert_eq!(mixer.gain(), DEFAULT_VOLUME);

        let mut out = [0.0; 4];
        mixer.load(vec![Box::new(Constant(0.5))]);
        mixer.render(&mut out);
        assert!(out.iter().all(|s| (*s - 0.5 * DEFAULT_VOLUME).abs() < 1e-6));
    }
}
