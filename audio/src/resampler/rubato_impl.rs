//! Rubato-based resampler implementation.

use rubato::{FftFixedInOut, Resampler as RubatoResampler};

use crate::error::AudioError;

/// Frames per processing block fed to rubato.
const CHUNK_SIZE: usize = 1024;

/// Resamples mono f32 samples from `src_rate` to `dst_rate`.
///
/// The output has exactly `round(len * dst_rate / src_rate)` samples; the
/// resampler's group delay is removed so output sample `i` lines up with
/// input time `i / dst_rate`.
pub fn resample(samples: &[f32], src_rate: u32, dst_rate: u32) -> Result<Vec<f32>, AudioError> {
    if src_rate == 0 || dst_rate == 0 {
        return Err(AudioError::Resample(format!(
            "invalid rates: {src_rate} -> {dst_rate}"
        )));
    }
    if src_rate == dst_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler =
        FftFixedInOut::<f32>::new(src_rate as usize, dst_rate as usize, CHUNK_SIZE, 1)?;

    let delay = resampler.output_delay();
    let expected = (samples.len() as f64 * dst_rate as f64 / src_rate as f64).round() as usize;

    let mut input_buf: Vec<Vec<f32>> = vec![Vec::new()];
    let mut output_buf: Vec<Vec<f32>> = vec![vec![0.0; resampler.output_frames_max()]];
    let mut out = Vec::with_capacity(expected + delay + resampler.output_frames_max());
    let mut pos = 0usize;

    // Keep feeding (zero padding past the end) until the delayed tail is flushed.
    while out.len() < expected + delay {
        let frames_needed = resampler.input_frames_next();
        let end = (pos + frames_needed).min(samples.len());

        input_buf[0].clear();
        if pos < end {
            input_buf[0].extend_from_slice(&samples[pos..end]);
        }
        input_buf[0].resize(frames_needed, 0.0);
        pos = end;

        let output_frames = resampler.output_frames_next();
        output_buf[0].resize(output_frames, 0.0);

        let (_, written) = resampler.process_into_buffer(&input_buf, &mut output_buf, None)?;
        if written == 0 {
            return Err(AudioError::Resample("resampler produced no output".into()));
        }
        out.extend_from_slice(&output_buf[0][..written]);
    }

    Ok(out[delay..delay + expected].to_vec())
}

/// Averages interleaved frames of `channels` samples into mono.
///
/// A trailing partial frame is dropped.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    let scale = 1.0 / channels as f32;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}
