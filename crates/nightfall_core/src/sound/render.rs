//! Offline rendering: the same programs the engine plays, with recurring
//! events fired on the sample clock instead of the Tokio timer.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::catalog::TrackId;
use super::mixer::Mixer;
use super::program::{EventChain, Program};

/// Longest clip [`render_track`] will produce.
pub const MAX_RENDER_SECONDS: u32 = 60;

struct PendingChain {
    chain: EventChain,
    next_at: usize,
    rng: Pcg32,
}

fn delay_in_samples(delay: std::time::Duration, sample_rate: u32) -> usize {
    (delay.as_secs_f64() * sample_rate as f64).round() as usize
}

/// Renders `seconds` of `track` as mono samples in `[-1, 1]`.
///
/// The output is a pure function of the arguments.
pub fn render_track(track: TrackId, sample_rate: u32, seconds: u32, volume: f32, seed: u64) -> Vec<f32> {
    let seconds = seconds.min(MAX_RENDER_SECONDS);
    let total = sample_rate as usize * seconds as usize;
    if total == 0 {
        return Vec::new();
    }
    let mut rng = Pcg32::seed_from_u64(seed);

    let parts = Program::build(track, sample_rate as f32, &mut rng).into_parts();
    let mut mixer = Mixer::new(volume);
    let generation = mixer.load(parts.voices);

    let mut chains: Vec<PendingChain> = parts
        .chains
        .into_iter()
        .map(|chain| PendingChain {
            chain,
            next_at: delay_in_samples(chain.first_delay, sample_rate),
            rng: Pcg32::seed_from_u64(rng.gen()),
        })
        .collect();

    let mut out = vec![0.0; total];
    let mut cursor = 0;
    while cursor < total {
        for pending in chains.iter_mut().filter(|pending| pending.next_at <= cursor) {
            let voice = pending.chain.event.voice(&mut pending.rng, sample_rate as f32);
            mixer.push(generation, voice);
            let delay = pending.chain.event.next_delay(&mut pending.rng);
            pending.next_at = cursor + delay_in_samples(delay, sample_rate).max(1);
        }
        let until = chains
            .iter()
            .map(|pending| pending.next_at)
            .min()
            .unwrap_or(total)
            .min(total);
        mixer.render(&mut out[cursor..until]);
        cursor = until;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 8_000;

    #[test]
    fn renders_the_requested_length() {
        let samples = render_track(TrackId::Forest, SAMPLE_RATE, 3, 0.7, 1);
        assert_eq!(samples.len(), 3 * SAMPLE_RATE as usize);
    }

    #[test]
    fn length_is_capped() {
        let samples = render_track(TrackId::WhiteNoise, 1_000, 600, 0.7, 1);
        assert_eq!(samples.len(), MAX_RENDER_SECONDS as usize * 1_000);
    }

    #[test]
    fn same_seed_same_samples() {
        let a = render_track(TrackId::Rain, SAMPLE_RATE, 2, 0.7, 11);
        let b = render_track(TrackId::Rain, SAMPLE_RATE, 2, 0.7, 11);
        let c = render_track(TrackId::Rain, SAMPLE_RATE, 2, 0.7, 12);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn every_track_stays_within_full_scale() {
        for track in TrackId::ALL {
            let samples = render_track(track, SAMPLE_RATE, 4, 1.0, 5);
            assert!(samples.iter().all(|s| s.is_finite() && (-1.0..=1.0).contains(s)), "{track}");
            assert!(samples.iter().any(|s| s.abs() > 1e-4), "{track} is silent");
        }
    }

    #[test]
    fn zero_sample_rate_or_length_renders_nothing() {
        assert!(render_track(TrackId::Rain, 0, 5, 0.7, 1).is_empty());
        assert!(render_track(TrackId::BrownNoise, SAMPLE_RATE, 0, 0.7, 1).is_empty());
    }

    #[test]
    fn zero_volume_is_silent() {
        let samples = render_track(TrackId::Ocean, SAMPLE_RATE, 3, 0.0, 5);
        assert!(samples.iter().all(|&s| s == 0.0));
    }
}
