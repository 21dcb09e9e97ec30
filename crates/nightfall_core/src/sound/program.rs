//! Per-track synthesis programs.
//!
//! A [`Program`] is built fresh on every start: its noise buffers are newly
//! generated, never reused from an earlier playback.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand_pcg::Pcg32;

use super::catalog::TrackId;
use super::dsp::{Biquad, NoiseColor, Waveform, noise_buffer};
use super::voice::{Drone, Droplet, NoiseBed, Tone, Voice, WaveCrash};

pub const NOISE_BUFFER_SECONDS: f32 = 2.0;

/// A one-shot sound that re-schedules itself after each firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurringEvent {
    Droplet,
    WaveCrash,
}

impl RecurringEvent {
    pub fn voice(self, rng: &mut Pcg32, sample_rate: f32) -> Box<dyn Voice> {
        match self {
            RecurringEvent::Droplet => Box::new(Droplet::random(rng, sample_rate)),
            RecurringEvent::WaveCrash => Box::new(WaveCrash::random(rng, sample_rate)),
        }
    }

    /// The randomized wait before the next firing.
    pub fn next_delay(self, rng: &mut Pcg32) -> Duration {
        match self {
            RecurringEvent::Droplet => Duration::from_millis(rng.gen_range(15..75)),
            RecurringEvent::WaveCrash => Duration::from_millis(rng.gen_range(4_000..9_000)),
        }
    }
}

/// A recurring event and the delay before its first firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventChain {
    pub event: RecurringEvent,
    pub first_delay: Duration,
}

pub struct Program {
    voices: Vec<Box<dyn Voice>>,
    chains: Vec<EventChain>,
    noise_beds: Vec<Arc<[f32]>>,
}

/// A program split into what the mixer owns and what the scheduler owns.
pub struct ProgramParts {
    pub voices: Vec<Box<dyn Voice>>,
    pub chains: Vec<EventChain>,
    pub noise_beds: Vec<Arc<[f32]>>,
}

impl Program {
    pub fn build(track: TrackId, sample_rate: f32, rng: &mut Pcg32) -> Self {
        let mut program = Self {
            voices: Vec::new(),
            chains: Vec::new(),
            noise_beds: Vec::new(),
        };
        match track {
            TrackId::Rain => program.rain(sample_rate, rng),
            TrackId::Ocean => program.ocean(sample_rate),
            TrackId::Forest => program.forest(sample_rate),
            TrackId::WhiteNoise => program.noise(NoiseColor::White, sample_rate, rng),
            TrackId::PinkNoise => program.noise(NoiseColor::Pink, sample_rate, rng),
            TrackId::BrownNoise => program.noise(NoiseColor::Brown, sample_rate, rng),
        }
        program
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn chains(&self) -> &[EventChain] {
        &self.chains
    }

    pub fn noise_beds(&self) -> &[Arc<[f32]>] {
        &self.noise_beds
    }

    pub fn into_parts(self) -> ProgramParts {
        ProgramParts {
            voices: self.voices,
            chains: self.chains,
            noise_beds: self.noise_beds,
        }
    }

    fn add_noise_bed(&mut self, samples: Vec<f32>, filter: Biquad, gain: f32) {
        let buffer: Arc<[f32]> = Arc::from(samples);
        self.noise_beds.push(buffer.clone());
        self.voices.push(Box::new(NoiseBed::new(buffer, filter, gain)));
    }

    fn rain(&mut self, sample_rate: f32, rng: &mut Pcg32) {
        let len = (NOISE_BUFFER_SECONDS * sample_rate) as usize;
        self.add_noise_bed(
            noise_buffer(NoiseColor::Pink, rng, len, 0.08),
            Biquad::bandpass(350.0, 0.4, sample_rate),
            0.12,
        );

        // low rumble for depth
        let rumble = Tone::new(Waveform::Sine, 50.0, sample_rate).with_lfo(0.08, 8.0, sample_rate);
        self.voices.push(Box::new(Drone::new(vec![rumble], None, 0.06)));

        self.chains.extend((0..4).map(|i| EventChain {
            event: RecurringEvent::Droplet,
            first_delay: Duration::from_millis(i * 150),
        }));
    }

    fn ocean(&mut self, sample_rate: f32) {
        let swell = vec![
            Tone::new(Waveform::Sine, 35.0, sample_rate).with_lfo(0.06, 8.0, sample_rate),
            Tone::new(Waveform::Sine, 52.0, sample_rate).with_lfo(0.09, 12.0, sample_rate),
            Tone::new(Waveform::Triangle, 70.0, sample_rate).with_lfo(0.12, 15.0, sample_rate),
            Tone::new(Waveform::Triangle, 105.0, sample_rate),
        ];
        self.voices.push(Box::new(Drone::new(
            swell,
            Some(Biquad::lowpass(200.0, 0.5, sample_rate)),
            0.16,
        )));

        self.chains.push(EventChain {
            event: RecurringEvent::WaveCrash,
            first_delay: Duration::from_secs(2),
        });
    }

    fn forest(&mut self, sample_rate: f32) {
        let layers = [
            (150.0, Waveform::Sine, 0.2),
            (250.0, Waveform::Triangle, 0.15),
            (400.0, Waveform::Sine, 0.1),
            (80.0, Waveform::Sawtooth, 0.05),
        ];
        for (frequency, waveform, gain) in layers {
            let tone = Tone::new(waveform, frequency, sample_rate);
            let filter = Biquad::lowpass(frequency * 3.0, 0.7, sample_rate);
            self.voices.push(Box::new(Drone::new(vec![tone], Some(filter), gain)));
        }
    }

    fn noise(&mut self, color: NoiseColor, sample_rate: f32, rng: &mut Pcg32) {
        let (level, cutoff) = match color {
            NoiseColor::White => (0.7, 8_000.0),
            NoiseColor::Pink => (0.09, 5_000.0),
            NoiseColor::Brown => (2.8, 2_000.0),
        };
        let len = (NOISE_BUFFER_SECONDS * sample_rate) as usize;
        self.add_noise_bed(
            noise_buffer(color, rng, len, level),
            Biquad::lowpass(cutoff, 0.5, sample_rate),
            1.0,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const SAMPLE_RATE: f32 = 8_000.0;

    #[test]
    fn rain_has_bed_rumble_and_four_droplet_chains() {
        let mut rng = Pcg32::seed_from_u64(1);
        let program = Program::build(TrackId::Rain, SAMPLE_RATE, &mut rng);
        assert_eq!(program.voice_count(), 2);
        assert_eq!(program.noise_beds().len(), 1);
        let delays: Vec<u64> = program
            .chains()
            .iter()
            .map(|c| c.first_delay.as_millis() as u64)
            .collect();
        assert_eq!(delays, [0, 150, 300, 450]);
        assert!(program.chains().iter().all(|c| c.event == RecurringEvent::Droplet));
    }

    #[test]
    fn ocean_schedules_its_first_wave_after_two_seconds() {
        let mut rng = Pcg32::seed_from_u64(1);
        let program = Program::build(TrackId::Ocean, SAMPLE_RATE, &mut rng);
        assert_eq!(
            program.chains(),
            [EventChain {
                event: RecurringEvent::WaveCrash,
                first_delay: Duration::from_secs(2),
            }]
        );
        assert!(program.noise_beds().is_empty());
    }

    #[test]
    fn forest_is_a_static_drone() {
        let mut rng = Pcg32::seed_from_u64(1);
        let program = Program::build(TrackId::Forest, SAMPLE_RATE, &mut rng);
        assert_eq!(program.voice_count(), 4);
        assert!(program.chains().is_empty());
    }

    #[test]
    fn noise_tracks_hold_one_two_second_buffer() {
        let mut rng = Pcg32::seed_from_u64(1);
        for track in [TrackId::WhiteNoise, TrackId::PinkNoise, TrackId::BrownNoise] {
            let program = Program::build(track, SAMPLE_RATE, &mut rng);
            assert_eq!(program.noise_beds().len(), 1);
            assert_eq!(program.noise_beds()[0].len(), 2 * SAMPLE_RATE as usize);
            assert!(program.chains().is_empty());
        }
    }

    #[test]
    fn each_build_generates_a_new_buffer() {
        let mut rng = Pcg32::seed_from_u64(9);
        let first = Program::build(TrackId::PinkNoise, SAMPLE_RATE, &mut rng);
        let second = Program::build(TrackId::PinkNoise, SAMPLE_RATE, &mut rng);
        assert!(!Arc::ptr_eq(&first.noise_beds()[0], &second.noise_beds()[0]));
        assert_ne!(first.noise_beds()[0][..], second.noise_beds()[0][..]);
    }

    #[test]
    fn event_delays_stay_in_their_ranges() {
        let mut rng = Pcg32::seed_from_u64(4);
        for _ in 0..500 {
            let droplet = RecurringEvent::Droplet.next_delay(&mut rng);
            assert!((Duration::from_millis(15)..Duration::from_millis(75)).contains(&droplet));
            let wave = RecurringEvent::WaveCrash.next_delay(&mut rng);
            assert!((Duration::from_secs(4)..Duration::from_secs(9)).contains(&wave));
        }
    }
}
