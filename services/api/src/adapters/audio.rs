//! services/api/src/adapters/audio.rs
//!
//! `AudioOutput` over the default `cpal` output device.
//!
//! A `cpal::Stream` cannot leave the thread that built it, so each playback
//! owns a dedicated thread that builds the stream, reports whether that
//! worked, and keeps the stream alive until told to stop.

use std::sync::mpsc;
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use nightfall_core::ports::{AudioOutput, PortError, PortResult};
use nightfall_core::sound::mixer::{lock, SharedMixer};
use tracing::{error, info};

struct StreamThread {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

pub struct CpalOutput {
    sample_rate: u32,
    channels: u16,
    stream: Option<StreamThread>,
}

impl CpalOutput {
    /// Probes the default output device for its sample rate and channel count.
    pub fn new() -> PortResult<Self> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or_else(|| PortError::Unexpected("No audio output device found".to_string()))?;
        let config = device
            .default_output_config()
            .map_err(|e| PortError::Unexpected(format!("Failed to get audio config: {}", e)))?;

        info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate = config.sample_rate().0,
            channels = config.channels(),
            "audio output selected"
        );
        Ok(Self {
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
            stream: None,
        })
    }
}

fn build_stream(sample_rate: u32, channels: u16, mixer: SharedMixer) -> PortResult<cpal::Stream> {
    let device = cpal::default_host()
        .default_output_device()
        .ok_or_else(|| PortError::Unexpected("No audio output device found".to_string()))?;
    let config = cpal::StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let mut mono = Vec::new();
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels as usize;
                mono.resize(frames, 0.0);
                lock(&mixer).render(&mut mono);
                for (frame, sample) in data.chunks_mut(channels as usize).zip(&mono) {
                    frame.fill(*sample);
                }
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| PortError::Unexpected(format!("Failed to build audio stream: {}", e)))?;
    stream
        .play()
        .map_err(|e| PortError::Unexpected(format!("Failed to start audio stream: {}", e)))?;
    Ok(stream)
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&mut self, mixer: SharedMixer) -> PortResult<()> {
        self.stop();

        let (ready_tx, ready_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (sample_rate, channels) = (self.sample_rate, self.channels);

        let handle = std::thread::Builder::new()
            .name("nightfall-audio".to_string())
            .spawn(move || match build_stream(sample_rate, channels, mixer) {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    // Returns on an explicit stop or when the sender is dropped.
                    let _ = stop_rx.recv();
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| PortError::Unexpected(format!("Failed to spawn audio thread: {}", e)))?;

        ready_rx
            .recv()
            .map_err(|_| PortError::Unexpected("Audio thread exited before starting".to_string()))??;
        self.stream = Some(StreamThread { stop_tx, handle });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.stop_tx.send(());
            if stream.handle.join().is_err() {
                error!("audio thread panicked");
            }
        }
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        self.stop();
    }
}
