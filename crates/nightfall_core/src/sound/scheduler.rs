//! Self-rescheduling event chains (rain droplets, ocean wave crashes).
//!
//! Each chain is a Tokio task bound to the program that spawned it. The
//! cancellation token is checked at the top of every iteration, before the
//! next delay is drawn, and every wait races the token so tearing a program
//! down ends its chains within one pending interval.

use std::time::Duration;

use rand_pcg::Pcg32;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::mixer::{lock, SharedMixer};
use super::program::EventChain;

pub struct RecurringTask {
    cancellation_token: CancellationToken,
    handle: JoinHandle<()>,
}

impl RecurringTask {
    /// Spawns `chain` onto the current Tokio runtime, pushing every firing
    /// into `mixer` under `generation`.
    pub fn spawn(
        chain: EventChain,
        mixer: SharedMixer,
        generation: u64,
        sample_rate: f32,
        rng: Pcg32,
    ) -> Self {
        let cancellation_token = CancellationToken::new();
        let handle = tokio::spawn(run_chain(
            chain,
            mixer,
            generation,
            sample_rate,
            rng,
            cancellation_token.clone(),
        ));
        Self {
            cancellation_token,
            handle,
        }
    }

    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RecurringTask {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

async fn run_chain(
    chain: EventChain,
    mixer: SharedMixer,
    generation: u64,
    sample_rate: f32,
    mut rng: Pcg32,
    cancellation_token: CancellationToken,
) {
    let mut delay = chain.first_delay;
    loop {
        if !wait(delay, &cancellation_token).await {
            break;
        }
        if cancellation_token.is_cancelled() {
            break;
        }
        let voice = chain.event.voice(&mut rng, sample_rate);
        if !lock(&mixer).push(generation, voice) {
            // the program this chain belonged to is gone
            break;
        }
        delay = chain.event.next_delay(&mut rng);
    }
    debug!(event = ?chain.event, "event chain stopped");
}

/// Sleeps for `delay`, returning `false` if cancelled first.
async fn wait(delay: Duration, cancellation_token: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancellation_token.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::mixer::Mixer;
    use crate::sound::program::RecurringEvent;
    use rand::SeedableRng;

    fn droplets() -> EventChain {
        EventChain {
            event: RecurringEvent::Droplet,
            first_delay: Duration::ZERO,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn chain_keeps_firing_until_cancelled() {
        let mixer = Mixer::shared(1.0);
        let generation = lock(&mixer).load(Vec::new());
        let task = RecurringTask::spawn(droplets(), mixer.clone(), generation, 8_000.0, Pcg32::seed_from_u64(1));

        tokio::time::sleep(Duration::from_millis(400)).await;
        // at most 75 ms between droplets
        assert!(lock(&mixer).voice_count() >= 5);

        task.cancel();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(task.is_finished());

        let count = lock(&mixer).voice_count();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(lock(&mixer).voice_count(), count);
    }

    #[tokio::test(start_paused = true)]
    async fn chain_ends_itself_when_its_generation_is_cleared() {
        let mixer = Mixer::shared(1.0);
        let generation = lock(&mixer).load(Vec::new());
        let task = RecurringTask::spawn(droplets(), mixer.clone(), generation, 8_000.0, Pcg32::seed_from_u64(2));

        tokio::time::sleep(Duration::from_millis(100)).await;
        lock(&mixer).load(Vec::new());
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(task.is_finished());
        assert_eq!(lock(&mixer).voice_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels_the_chain() {
        let mixer = Mixer::shared(1.0);
        let generation = lock(&mixer).load(Vec::new());
        let chain = EventChain {
            event: RecurringEvent::WaveCrash,
            first_delay: Duration::from_secs(2),
        };
        drop(RecurringTask::spawn(chain, mixer.clone(), generation, 8_000.0, Pcg32::seed_from_u64(3)));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(lock(&mixer).voice_count(), 0);
    }
}
