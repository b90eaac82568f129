//! WAV encoding for captured audio
//!
//! Produces a mono 16-bit PCM WAV file in memory.

use crate::error::ChessMusicError;
use std::io::Cursor;

/// Encode mono samples (range [-1.0, 1.0]) as a 16-bit PCM WAV file
///
/// # Example
/// ```
/// use chess_music::audio::encode_wav;
///
/// let bytes = encode_wav(&[0.0f32; 441], 44100).unwrap();
/// assert_eq!(&bytes[0..4], b"RIFF");
/// assert_eq!(bytes.len(), 44 + 441 * 2);
/// ```
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, ChessMusicError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut bytes = Vec::with_capacity(44 + samples.len() * 2);
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec)
            .map_err(|e| ChessMusicError::EngineError(format!("Failed to create WAV: {}", e)))?;

        for &sample in samples {
            let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| ChessMusicError::EngineError(format!("Failed to write sample: {}", e)))?;
        }

        writer
            .finalize()
            .map_err(|e| ChessMusicError::EngineError(format!("Failed to finalize WAV: {}", e)))?;
    }

    Ok(bytes)
}
