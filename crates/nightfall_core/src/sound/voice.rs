//! Voices: the generator nodes a program is assembled from.
//!
//! A voice yields one mono sample per call. Continuous voices run until the
//! program is torn down; one-shot voices (droplets, wave crashes) report
//! themselves finished and are dropped by the mixer.

use std::sync::Arc;

use rand::Rng;
use rand_pcg::Pcg32;

use super::dsp::{AttackDecay, Biquad, NoiseColor, Oscillator, Waveform, noise_buffer};

pub trait Voice: Send {
    fn next_sample(&mut self) -> f32;

    fn is_finished(&self) -> bool {
        false
    }
}

/// A pre-generated noise buffer played on a loop through a filter.
pub struct NoiseBed {
    buffer: Arc<[f32]>,
    cursor: usize,
    filter: Biquad,
    gain: f32,
}

impl NoiseBed {
    pub fn new(buffer: Arc<[f32]>, filter: Biquad, gain: f32) -> Self {
        Self {
            buffer,
            cursor: 0,
            filter,
            gain,
        }
    }
}

impl Voice for NoiseBed {
    fn next_sample(&mut self) -> f32 {
        let Some(&raw) = self.buffer.get(self.cursor) else {
            return 0.0;
        };
        self.cursor = (self.cursor + 1) % self.buffer.len();
        self.filter.process(raw) * self.gain
    }
}

/// An oscillator whose frequency is optionally swept by a slow LFO.
pub struct Tone {
    osc: Oscillator,
    lfo: Option<(Oscillator, f32)>,
}

impl Tone {
    pub fn new(waveform: Waveform, frequency: f32, sample_rate: f32) -> Self {
        Self {
            osc: Oscillator::new(waveform, frequency, sample_rate),
            lfo: None,
        }
    }

    /// Modulates the frequency by ±`depth_hz` at `rate_hz`.
    pub fn with_lfo(mut self, rate_hz: f32, depth_hz: f32, sample_rate: f32) -> Self {
        self.lfo = Some((Oscillator::new(Waveform::Sine, rate_hz, sample_rate), depth_hz));
        self
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        let offset = match &mut self.lfo {
            Some((lfo, depth)) => lfo.next_sample(0.0) * *depth,
            None => 0.0,
        };
        self.osc.next_sample(offset)
    }
}

/// One or more tones summed, optionally filtered, then scaled.
pub struct Drone {
    tones: Vec<Tone>,
    filter: Option<Biquad>,
    gain: f32,
}

impl Drone {
    pub fn new(tones: Vec<Tone>, filter: Option<Biquad>, gain: f32) -> Self {
        Self {
            tones,
            filter,
            gain,
        }
    }
}

impl Voice for Drone {
    fn next_sample(&mut self) -> f32 {
        let sum: f32 = self.tones.iter_mut().map(Tone::next_sample).sum();
        let shaped = match &mut self.filter {
            Some(filter) => filter.process(sum),
            None => sum,
        };
        shaped * self.gain
    }
}

pub const DROPLET_MIN_HZ: f32 = 80.0;
pub const DROPLET_MAX_HZ: f32 = 400.0;

/// A short, softly enveloped sine burst.
pub struct Droplet {
    osc: Oscillator,
    filter: Biquad,
    envelope: AttackDecay,
}

impl Droplet {
    pub fn random(rng: &mut Pcg32, sample_rate: f32) -> Self {
        let frequency = rng.gen_range(DROPLET_MIN_HZ..DROPLET_MAX_HZ);
        Self {
            osc: Oscillator::new(Waveform::Sine, frequency, sample_rate),
            filter: Biquad::lowpass(800.0, 0.3, sample_rate),
            envelope: AttackDecay::new(0.02, 0.5, 0.05, 0.0001, sample_rate),
        }
    }

    pub fn frequency(&self) -> f32 {
        self.osc.frequency()
    }
}

impl Voice for Droplet {
    fn next_sample(&mut self) -> f32 {
        let level = self.envelope.next_level();
        self.filter.process(self.osc.next_sample(0.0)) * level
    }

    fn is_finished(&self) -> bool {
        self.envelope.is_finished()
    }
}

pub const WAVE_CRASH_SECONDS: f32 = 4.0;

/// A freshly synthesised swell of noise, band-limited between two filters.
pub struct WaveCrash {
    buffer: Vec<f32>,
    cursor: usize,
    lowpass: Biquad,
    highpass: Biquad,
    gain: f32,
}

impl WaveCrash {
    pub fn random(rng: &mut Pcg32, sample_rate: f32) -> Self {
        let mut buffer = noise_buffer(
            NoiseColor::White,
            rng,
            (WAVE_CRASH_SECONDS * sample_rate) as usize,
            0.18,
        );
        for (i, sample) in buffer.iter_mut().enumerate() {
            let t = i as f32 / sample_rate;
            let attack = (t * 3.0).min(1.0);
            let release = (-t / 1.2).exp();
            *sample *= attack * release;
        }
        Self {
            buffer,
            cursor: 0,
            lowpass: Biquad::lowpass(280.0, 0.5, sample_rate),
            highpass: Biquad::highpass(60.0, 0.3, sample_rate),
            gain: rng.gen_range(0.25..0.40),
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }
}

impl Voice for WaveCrash {
    fn next_sample(&mut self) -> f32 {
        let Some(&raw) = self.buffer.get(self.cursor) else {
            return 0.0;
        };
        self.cursor += 1;
        self.highpass.process(self.lowpass.process(raw)) * self.gain
    }

    fn is_finished(&self) -> bool {
        self.cursor >= self.buffer.len()
    }
}
