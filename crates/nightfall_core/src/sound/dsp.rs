//! Signal-generator primitives: oscillators, biquad filters, envelopes and
//! procedurally generated noise buffers.
//!
//! Everything runs sample by sample in `f32`. Filter coefficients follow the
//! Audio EQ Cookbook.

use std::f32::consts::{PI, TAU};

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
}

/// A phase-accumulating periodic oscillator.
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: f32,
    sample_rate: f32,
    /// Normalised phase in [0, 1).
    phase: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32, sample_rate: f32) -> Self {
        Self {
            waveform,
            frequency,
            sample_rate,
            phase: 0.0,
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Produces the current sample and advances by `frequency + offset_hz`.
    #[inline]
    pub fn next_sample(&mut self, offset_hz: f32) -> f32 {
        let value = match self.waveform {
            Waveform::Sine => (self.phase * TAU).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (self.phase - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * self.phase - 1.0,
        };
        let frequency = (self.frequency + offset_hz).max(0.0);
        self.phase = (self.phase + frequency / self.sample_rate).fract();
        value
    }
}

/// A second-order IIR filter in direct form I.
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    pub fn lowpass(cutoff: f32, q: f32, sample_rate: f32) -> Self {
        let (cos_omega, alpha) = Self::prewarp(cutoff, q, sample_rate);
        let b0 = (1.0 - cos_omega) / 2.0;
        Self::normalised(b0, 1.0 - cos_omega, b0, cos_omega, alpha)
    }

    pub fn highpass(cutoff: f32, q: f32, sample_rate: f32) -> Self {
        let (cos_omega, alpha) = Self::prewarp(cutoff, q, sample_rate);
        let b0 = (1.0 + cos_omega) / 2.0;
        Self::normalised(b0, -(1.0 + cos_omega), b0, cos_omega, alpha)
    }

    /// Constant skirt gain band-pass centred on `center`.
    pub fn bandpass(center: f32, q: f32, sample_rate: f32) -> Self {
        let (cos_omega, alpha) = Self::prewarp(center, q, sample_rate);
        Self::normalised(alpha, 0.0, -alpha, cos_omega, alpha)
    }

    fn prewarp(frequency: f32, q: f32, sample_rate: f32) -> (f32, f32) {
        // keep the corner strictly below Nyquist so the coefficients stay stable
        let frequency = frequency.clamp(1.0, (sample_rate * 0.45).max(1.0));
        let q = q.max(0.1);
        let omega = 2.0 * PI * frequency / sample_rate;
        (omega.cos(), omega.sin() / (2.0 * q))
    }

    fn normalised(b0: f32, b1: f32, b2: f32, cos_omega: f32, alpha: f32) -> Self {
        let a0 = 1.0 + alpha;
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: -2.0 * cos_omega / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }
}

/// Linear attack to `peak`, then an exponential fall to `floor` at `length`.
#[derive(Debug, Clone)]
pub struct AttackDecay {
    attack: usize,
    length: usize,
    peak: f32,
    floor: f32,
    position: usize,
}

impl AttackDecay {
    pub fn new(attack_secs: f32, length_secs: f32, peak: f32, floor: f32, sample_rate: f32) -> Self {
        let attack = ((attack_secs * sample_rate) as usize).max(1);
        let length = ((length_secs * sample_rate) as usize).max(attack + 1);
        Self {
            attack,
            length,
            peak,
            floor: floor.max(f32::MIN_POSITIVE),
            position: 0,
        }
    }

    #[inline]
    pub fn next_level(&mut self) -> f32 {
        let t = self.position;
        if t >= self.length {
            return 0.0;
        }
        self.position += 1;
        if t < self.attack {
            return self.peak * t as f32 / self.attack as f32;
        }
        let progress = (t - self.attack) as f32 / (self.length - self.attack) as f32;
        self.peak * (self.floor / self.peak).powf(progress)
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.length
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseColor {
    /// Uncorrelated samples, flat spectrum.
    White,
    /// Weighted recursive-filter cascade, 1/f spectrum.
    Pink,
    /// Leaky integrator of white noise, 1/f² spectrum.
    Brown,
}

/// Generates `len` samples of `color` noise scaled by `level`.
pub fn noise_buffer<R: Rng + ?Sized>(color: NoiseColor, rng: &mut R, len: usize, level: f32) -> Vec<f32> {
    match color {
        NoiseColor::White => (0..len).map(|_| white(rng) * level).collect(),
        NoiseColor::Pink => pink_noise(rng, len, level),
        NoiseColor::Brown => brown_noise(rng, len, level),
    }
}

#[inline]
fn white<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(-1.0f32..1.0)
}

/// Paul Kellet's refined pink-noise filter.
fn pink_noise<R: Rng + ?Sized>(rng: &mut R, len: usize, level: f32) -> Vec<f32> {
    let mut b = [0.0f32; 7];
    let mut output = Vec::with_capacity(len);
    for _ in 0..len {
        let w = white(rng);
        b[0] = 0.99886 * b[0] + w * 0.055_517_9;
        b[1] = 0.99332 * b[1] + w * 0.075_075_9;
        b[2] = 0.96900 * b[2] + w * 0.153_852;
        b[3] = 0.86650 * b[3] + w * 0.310_485_6;
        b[4] = 0.55000 * b[4] + w * 0.532_952_2;
        b[5] = -0.7616 * b[5] - w * 0.016_898;
        let sum: f32 = b.iter().sum::<f32>() + w * 0.5362;
        output.push(sum * level);
        b[6] = w * 0.115_926;
    }
    output
}

fn brown_noise<R: Rng + ?Sized>(rng: &mut R, len: usize, level: f32) -> Vec<f32> {
    let mut last = 0.0f32;
    let mut output = Vec::with_capacity(len);
    for _ in 0..len {
        last = (last + 0.015 * white(rng)) / 1.015;
        output.push(last * level);
    }
    output
}
