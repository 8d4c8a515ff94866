use rvc_audio::AudioBuffer;
use tracing::{debug, warn};

use crate::config::F0Config;
use crate::contour::PitchContour;
use crate::dio::dio;
use crate::error::PitchError;
use crate::stonemask::stonemask;

/// Estimates the F0 contour of `audio`.
///
/// Never fails: invalid configuration or unusable audio is logged at WARN
/// and yields an all-unvoiced contour with the expected frame count.
pub fn extract_f0(audio: &AudioBuffer, cfg: &F0Config) -> PitchContour {
    match try_extract_f0(audio, cfg) {
        Ok(contour) => contour,
        Err(e) => {
            let frames = cfg.frame_count(audio.len(), audio.sample_rate());
            warn!("{e}; treating all {frames} frame(s) as unvoiced");
            PitchContour::unvoiced(frames, cfg.effective_period_ms())
        }
    }
}

/// Estimates the F0 contour of `audio`, reporting why estimation failed.
///
/// Produces `floor(duration_ms / frame_period_ms) + 1` frames. Voiced
/// values lie within `[floor_hz, ceil_hz]`; unvoiced frames are 0.
pub fn try_extract_f0(audio: &AudioBuffer, cfg: &F0Config) -> Result<PitchContour, PitchError> {
    cfg.validate()?;
    if audio.is_empty() || audio.sample_rate() == 0 {
        return Err(PitchError::EmptyAudio);
    }

    let fs = audio.sample_rate() as f64;
    let x: Vec<f64> = audio
        .samples()
        .iter()
        .map(|&s| if s.is_finite() { s as f64 } else { 0.0 })
        .collect();
    let frames = cfg.frame_count(x.len(), audio.sample_rate());

    let raw = dio(&x, fs, cfg, frames);
    let f0 = if cfg.refine {
        stonemask(&x, fs, &raw.times, &raw.f0, cfg)
    } else {
        raw.f0
    };

    let hz: Vec<f32> = f0
        .iter()
        .map(|&v| {
            if v >= cfg.floor_hz && v <= cfg.ceil_hz {
                v as f32
            } else {
                0.0
            }
        })
        .collect();
    let contour = PitchContour::new(hz, cfg.frame_period_ms);
    debug!(
        "f0: {} frame(s), {} voiced",
        contour.len(),
        contour.voiced_frames()
    );
    Ok(contour)
}
