//! crates/nightfall_core/src/sound/mod.rs
//!
//! Procedural ambient sound: the track catalog, the DSP building blocks, and
//! the engine that plays one program at a time through an [`AudioOutput`].
//!
//! [`AudioOutput`]: crate::ports::AudioOutput

pub mod catalog;
pub mod dsp;
pub mod engine;
pub mod mixer;
pub mod player;
pub mod program;
pub mod render;
pub mod scheduler;
pub mod timer;
pub mod voice;

use crate::ports::PortError;

pub use catalog::{catalog, CategoryId, SoundCategory, SoundTrack, TrackId};
pub use engine::{PlaybackState, SoundEngine};
pub use player::{PlayOutcome, SoundPlayer};
pub use render::render_track;
pub use timer::{AutoStopTimer, SLEEP_TIMER_PRESETS_MINUTES};

#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    #[error("audio output unavailable: {0}")]
    OutputUnavailable(PortError),
}
