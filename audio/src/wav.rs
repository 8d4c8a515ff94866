//! WAV container decoding and encoding.

use std::io::Read;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::buffer::AudioBuffer;
use crate::error::AudioError;
use crate::resampler::{downmix, resample};

/// Working sample rate for feature and pitch extraction.
pub const WORKING_RATE: u32 = 16000;

/// Loads an audio file as mono at [`WORKING_RATE`].
///
/// Accepts PCM integer (8 to 32 bit) and 32-bit float WAV files with any
/// channel count. Channels are averaged; the result is resampled to 16 kHz.
pub fn load(path: impl AsRef<Path>) -> Result<AudioBuffer, AudioError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(AudioError::NotFound(path.to_path_buf()));
    }

    let unreadable = |reason: String| AudioError::Unreadable {
        path: path.to_path_buf(),
        reason,
    };

    let reader = WavReader::open(path).map_err(|e| unreadable(e.to_string()))?;
    let spec = reader.spec();
    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(unreadable(format!(
            "invalid format: {} channel(s) at {} Hz",
            spec.channels, spec.sample_rate
        )));
    }

    let interleaved = read_samples(reader, spec).map_err(|e| unreadable(e.to_string()))?;
    let mono = downmix(&interleaved, spec.channels as usize);
    if mono.is_empty() {
        return Err(unreadable("no audio samples".into()));
    }

    debug!(
        "decoded {}: {} frame(s), {} channel(s) at {} Hz",
        path.display(),
        mono.len(),
        spec.channels,
        spec.sample_rate
    );

    let samples = resample(&mono, spec.sample_rate, WORKING_RATE)?;
    AudioBuffer::mono(samples, WORKING_RATE).map_err(|e| unreadable(e.to_string()))
}

fn read_samples<R: Read>(reader: WavReader<R>, spec: WavSpec) -> Result<Vec<f32>, hound::Error> {
    match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect(),
        SampleFormat::Int => {
            let bits = spec.bits_per_sample.clamp(1, 32) as i32;
            let scale = 1.0 / 2f64.powi(bits - 1);
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| (v as f64 * scale) as f32))
                .collect()
        }
    }
}

/// Writes mono samples as a 16-bit PCM WAV file at `sample_rate`.
///
/// No resampling is performed; the caller supplies the rate the samples
/// were produced at.
pub fn save(samples: &[f32], path: impl AsRef<Path>, sample_rate: u32) -> Result<(), AudioError> {
    let path = path.as_ref();
    let write_err = |reason: String| AudioError::Write {
        path: path.to_path_buf(),
        reason,
    };

    if sample_rate == 0 {
        return Err(write_err("sample rate must be > 0".into()));
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).map_err(|e| write_err(e.to_string()))?;
    for &s in samples {
        writer
            .write_sample(f32_to_pcm16(s))
            .map_err(|e| write_err(e.to_string()))?;
    }
    writer.finalize().map_err(|e| write_err(e.to_string()))?;

    debug!(
        "wrote {}: {} sample(s) at {} Hz",
        path.display(),
        samples.len(),
        sample_rate
    );
    Ok(())
}

/// Converts an f32 sample to 16-bit PCM, clamping to [-1, 1].
pub fn f32_to_pcm16(x: f32) -> i16 {
    let x = if x.is_finite() { x.clamp(-1.0, 1.0) } else { 0.0 };
    // Symmetric mapping: -1.0 -> -32768, +1.0 -> 32767
    if x >= 0.0 {
        (x * 32767.0).round() as i16
    } else {
        (x * 32768.0).round() as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, rate: u32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_save_then_load_16k() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples = sine(220.0, 16000, 16000);
        save(&samples, &path, 16000).unwrap();

        let buf = load(&path).unwrap();
        assert_eq!(buf.sample_rate(), WORKING_RATE);
        assert_eq!(buf.len(), 16000);
        for (a, b) in buf.samples().iter().zip(samples.iter()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_load_resamples_to_working_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone_44k.wav");
        save(&sine(220.0, 44100, 22050), &path, 44100).unwrap();

        let buf = load(&path).unwrap();
        assert_eq!(buf.sample_rate(), 16000);
        assert_eq!(buf.len(), 8000);
    }

    #[test]
    fn test_load_downmixes_stereo_float() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 16000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut w = WavWriter::create(&path, spec).unwrap();
        for _ in 0..1600 {
            w.write_sample(0.5f32).unwrap();
            w.write_sample(-0.25f32).unwrap();
        }
        w.finalize().unwrap();

        let buf = load(&path).unwrap();
        assert_eq!(buf.len(), 1600);
        assert!(buf.samples().iter().all(|&s| (s - 0.125).abs() < 1e-6));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path().join("absent.wav")).unwrap_err();
        assert!(matches!(err, AudioError::NotFound(_)));
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"definitely not a riff header").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, AudioError::Unreadable { .. }));
    }

    #[test]
    fn test_load_empty_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        save(&[], &path, 16000).unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, AudioError::Unreadable { .. }));
    }

    #[test]
    fn test_save_zero_rate() {
        let dir = tempfile::tempdir().unwrap();
        let err = save(&[0.0], dir.path().join("x.wav"), 0).unwrap_err();
        assert!(matches!(err, AudioError::Write { .. }));
    }

    #[test]
    fn test_f32_to_pcm16() {
        assert_eq!(f32_to_pcm16(1.0), 32767);
        assert_eq!(f32_to_pcm16(-1.0), -32768);
        assert_eq!(f32_to_pcm16(2.0), 32767);
        assert_eq!(f32_to_pcm16(0.0), 0);
        assert_eq!(f32_to_pcm16(f32::NAN), 0);
    }
}
