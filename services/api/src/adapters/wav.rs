//! services/api/src/adapters/wav.rs
//!
//! Encodes rendered synthesizer output as a 16-bit mono WAV file.

use hound::{WavSpec, WavWriter};

/// Sample rate used for preview renders.
pub const PREVIEW_SAMPLE_RATE: u32 = 22_050;

pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let mut cursor = std::io::Cursor::new(Vec::new());

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for &sample in samples {
        let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        writer.write_sample(scaled)?;
    }

    writer.finalize()?;
    Ok(cursor.into_inner())
}
