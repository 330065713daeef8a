//! PCM post-processing for native capture: mixdown, resampling and WAV
//! packaging

use std::io::Cursor;

use rubato::{FftFixedIn, Resampler};
use thiserror::Error;

use crate::domain::recording::AudioEncoding;

/// Resampler input chunk size in frames
const RESAMPLE_CHUNK: usize = 1024;

#[derive(Debug, Error)]
pub enum PcmError {
    #[error("Resampler init failed: {0}")]
    ResamplerInit(String),

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),
}

/// Average interleaved frames down to one channel
pub fn mix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

/// Convert float samples in [-1, 1] to i16
pub fn f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

/// Resample mono audio between rates
pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Result<Vec<i16>, PcmError> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let input: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();
    let output_len = (input.len() as f64 * to_rate as f64 / from_rate as f64).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        RESAMPLE_CHUNK,
        2,
        1,
    )
    .map_err(|e| PcmError::ResamplerInit(e.to_string()))?;

    let mut output = Vec::with_capacity(output_len + RESAMPLE_CHUNK);
    let mut pos = 0;
    while pos < input.len() {
        let needed = resampler.input_frames_next();
        let end = (pos + needed).min(input.len());
        let mut chunk = input[pos..end].to_vec();
        chunk.resize(needed, 0.0);

        let resampled = resampler
            .process(&[chunk], None)
            .map_err(|e| PcmError::Resample(e.to_string()))?;
        output.extend(resampled[0].iter().map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16));
        pos = end;
    }
    output.truncate(output_len);

    Ok(output)
}

/// Package mono samples captured at `source_rate` as a WAV file in the
/// requested encoding. Returns the bytes and the audio length in seconds.
pub fn encode_wav(
    samples: &[i16],
    source_rate: u32,
    encoding: AudioEncoding,
) -> Result<(Vec<u8>, f64), PcmError> {
    let samples = resample(samples, source_rate, encoding.sample_rate)?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: encoding.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in &samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }

    let seconds = samples.len() as f64 / encoding.sample_rate as f64;
    Ok((cursor.into_inner(), seconds))
}
