//! Spectral subtraction on a single analysis frame.
//!
//! The noise profile is the mean magnitude of the first `noise_frames`
//! time slices of the frame being processed. It is recomputed for every
//! frame; nothing is carried over between frames.

use tracing::trace;

use crate::audio::stft::{Spectrogram, Stft};
use crate::config::DenoiseConfig;
use crate::error::DspError;

/// Parameters of the subtractor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubtractionParams {
    pub frame_length: usize,
    pub hop_length: usize,
    pub noise_frames: usize,
    pub over_subtraction: f32,
}

impl Default for SubtractionParams {
    fn default() -> Self {
        Self {
            frame_length: 2048,
            hop_length: 512,
            noise_frames: 2,
            over_subtraction: 0.5,
        }
    }
}

impl From<&DenoiseConfig> for SubtractionParams {
    fn from(config: &DenoiseConfig) -> Self {
        Self {
            frame_length: config.frame_length,
            hop_length: config.hop_length,
            noise_frames: config.noise_frames,
            over_subtraction: config.over_subtraction,
        }
    }
}

/// Magnitude/phase view of one frame after subtraction
#[derive(Debug, Clone)]
pub struct SubtractedSpectrum {
    pub bins: usize,
    pub frames: usize,
    /// Original magnitude, bin-major
    pub magnitude: Vec<f32>,
    /// Magnitude after subtraction, bin-major, never negative
    pub enhanced: Vec<f32>,
    /// Original phase, bin-major
    pub phase: Vec<f32>,
    /// One value per bin
    pub noise_profile: Vec<f32>,
}

/// Time-domain result for one analysis frame
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancedFrame {
    pub samples: Vec<f32>,
}

impl EnhancedFrame {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

pub struct SpectralSubtractor {
    params: SubtractionParams,
    stft: Stft,
}

impl SpectralSubtractor {
    pub fn new(params: SubtractionParams) -> Result<Self, DspError> {
        let stft = Stft::new(params.frame_length, params.hop_length)?;

        let slices = stft.num_frames(params.frame_length);
        if params.noise_frames == 0 || params.noise_frames > slices {
            return Err(DspError::InvalidParameter {
                name: "noise_frames",
                value: params.noise_frames.to_string(),
            });
        }
        if params.over_subtraction.is_nan() || params.over_subtraction < 0.0 {
            return Err(DspError::InvalidParameter {
                name: "over_subtraction",
                value: params.over_subtraction.to_string(),
            });
        }

        Ok(Self { params, stft })
    }

    pub fn params(&self) -> &SubtractionParams {
        &self.params
    }

    /// Analyse a frame and subtract its noise estimate, without resynthesis
    pub fn subtract_spectrum(&self, frame: &[f32]) -> Result<SubtractedSpectrum, DspError> {
        if frame.len() != self.params.frame_length {
            return Err(DspError::FrameLength {
                expected: self.params.frame_length,
                got: frame.len(),
            });
        }

        let spec = self.stft.forward(frame);
        let (bins, frames) = (spec.bins(), spec.frames());
        let magnitude = spec.magnitude();
        let phase = spec.phase();

        let noise_profile = noise_profile(&magnitude, bins, frames, self.params.noise_frames);
        let enhanced = subtract_noise(
            &magnitude,
            &noise_profile,
            frames,
            self.params.over_subtraction,
        );

        Ok(SubtractedSpectrum {
            bins,
            frames,
            magnitude,
            enhanced,
            phase,
            noise_profile,
        })
    }

    /// Full denoise of one frame: analysis, subtraction and resynthesis with the original phase
    pub fn process(&self, frame: &[f32]) -> Result<EnhancedFrame, DspError> {
        let spectrum = self.subtract_spectrum(frame)?;

        let rebuilt = Spectrogram::from_polar(
            spectrum.bins,
            spectrum.frames,
            &spectrum.enhanced,
            &spectrum.phase,
        )?;
        let samples = self.stft.inverse(&rebuilt, Some(self.params.frame_length))?;

        trace!(
            "Enhanced frame: {} bins x {} slices -> {} samples",
            spectrum.bins,
            spectrum.frames,
            samples.len()
        );

        Ok(EnhancedFrame { samples })
    }
}

/// Mean magnitude of the first `noise_frames` slices, one value per bin
pub fn noise_profile(
    magnitude: &[f32],
    bins: usize,
    frames: usize,
    noise_frames: usize,
) -> Vec<f32> {
    let take = noise_frames.min(frames).max(1);
    (0..bins)
        .map(|b| {
            let row = &magnitude[b * frames..b * frames + take];
            row.iter().sum::<f32>() / take as f32
        })
        .collect()
}

/// `max(magnitude - factor * noise, 0)` with the profile broadcast over time
pub fn subtract_noise(magnitude: &[f32], noise: &[f32], frames: usize, factor: f32) -> Vec<f32> {
    magnitude
        .chunks(frames)
        .zip(noise)
        .flat_map(|(row, &n)| row.iter().map(move |&m| (m - factor * n).max(0.0)))
        .collect()
}
