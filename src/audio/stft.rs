//! Short-time Fourier transform and its inverse.
//!
//! Framing is centered: the signal is zero-padded by `n_fft / 2` on both
//! sides, analysed with a periodic Hann window and resynthesised with
//! window-sum-square normalised overlap-add, so `inverse(forward(x))`
//! reproduces `x` up to floating point error.

use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::TAU;
use std::sync::Arc;

use crate::error::DspError;

/// Complex spectrogram stored bin-major: `data[bin * frames + frame]`
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    bins: usize,
    frames: usize,
    data: Vec<Complex32>,
}

impl Spectrogram {
    pub fn zeros(bins: usize, frames: usize) -> Self {
        Self {
            bins,
            frames,
            data: vec![Complex32::new(0.0, 0.0); bins * frames],
        }
    }

    /// Rebuild a spectrogram from magnitude and phase arrays of the same shape
    pub fn from_polar(
        bins: usize,
        frames: usize,
        magnitude: &[f32],
        phase: &[f32],
    ) -> Result<Self, DspError> {
        let expected = bins * frames;
        if magnitude.len() != expected || phase.len() != expected {
            return Err(DspError::Shape {
                expected_bins: bins,
                expected_frames: frames,
                bins: magnitude.len().min(phase.len()) / frames.max(1),
                frames,
            });
        }

        let data = magnitude
            .iter()
            .zip(phase)
            .map(|(&m, &p)| Complex32::from_polar(m, p))
            .collect();

        Ok(Self { bins, frames, data })
    }

    /// Number of frequency bins
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Number of time slices
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn get(&self, bin: usize, frame: usize) -> Complex32 {
        self.data[bin * self.frames + frame]
    }

    pub fn set(&mut self, bin: usize, frame: usize, value: Complex32) {
        self.data[bin * self.frames + frame] = value;
    }

    /// Element-wise absolute value
    pub fn magnitude(&self) -> Vec<f32> {
        self.data.iter().map(|c| c.norm()).collect()
    }

    /// Element-wise angle in radians
    pub fn phase(&self) -> Vec<f32> {
        self.data.iter().map(|c| c.arg()).collect()
    }
}

/// Centered STFT with a periodic Hann window
pub struct Stft {
    n_fft: usize,
    hop_length: usize,
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl Stft {
    pub fn new(n_fft: usize, hop_length: usize) -> Result<Self, DspError> {
        if n_fft < 2 || n_fft % 2 != 0 {
            return Err(DspError::InvalidParameter {
                name: "n_fft",
                value: n_fft.to_string(),
            });
        }
        if hop_length == 0 || hop_length > n_fft {
            return Err(DspError::InvalidParameter {
                name: "hop_length",
                value: hop_length.to_string(),
            });
        }

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(n_fft);
        let inverse = planner.plan_fft_inverse(n_fft);

        Ok(Self {
            n_fft,
            hop_length,
            window: hann_window(n_fft),
            forward,
            inverse,
        })
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// One-sided bin count
    pub fn bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Number of time slices produced for a signal of `len` samples
    pub fn num_frames(&self, len: usize) -> usize {
        1 + len / self.hop_length
    }

    /// Forward transform, returns a `bins x frames` spectrogram
    pub fn forward(&self, signal: &[f32]) -> Spectrogram {
        let pad = self.n_fft / 2;
        let mut padded = vec![0.0f32; signal.len() + 2 * pad];
        padded[pad..pad + signal.len()].copy_from_slice(signal);

        let frames = 1 + (padded.len() - self.n_fft) / self.hop_length;
        let bins = self.bins();
        let mut spec = Spectrogram::zeros(bins, frames);
        let mut buffer = vec![Complex32::new(0.0, 0.0); self.n_fft];

        for t in 0..frames {
            let start = t * self.hop_length;
            for (j, slot) in buffer.iter_mut().enumerate() {
                *slot = Complex32::new(padded[start + j] * self.window[j], 0.0);
            }

            self.forward.process(&mut buffer);

            for (b, value) in buffer.iter().take(bins).enumerate() {
                spec.set(b, t, *value);
            }
        }

        spec
    }

    /// Inverse transform. Without `length` the output covers the unpadded
    /// span `hop_length * (frames - 1)`; with it the output is trimmed or
    /// zero-extended to exactly `length` samples.
    pub fn inverse(
        &self,
        spec: &Spectrogram,
        length: Option<usize>,
    ) -> Result<Vec<f32>, DspError> {
        if spec.bins() != self.bins() || spec.frames() == 0 {
            return Err(DspError::Shape {
                expected_bins: self.bins(),
                expected_frames: spec.frames().max(1),
                bins: spec.bins(),
                frames: spec.frames(),
            });
        }

        let n = self.n_fft;
        let half = n / 2;
        let frames = spec.frames();
        let span = n + self.hop_length * (frames - 1);

        let mut signal = vec![0.0f32; span];
        let mut norm = vec![0.0f32; span];
        let mut buffer = vec![Complex32::new(0.0, 0.0); n];
        let scale = 1.0 / n as f32;

        for t in 0..frames {
            // Hermitian extension of the one-sided spectrum
            buffer[0] = Complex32::new(spec.get(0, t).re, 0.0);
            buffer[half] = Complex32::new(spec.get(half, t).re, 0.0);
            for b in 1..half {
                let value = spec.get(b, t);
                buffer[b] = value;
                buffer[n - b] = value.conj();
            }

            self.inverse.process(&mut buffer);

            let start = t * self.hop_length;
            for (j, value) in buffer.iter().enumerate() {
                let w = self.window[j];
                signal[start + j] += value.re * scale * w;
                norm[start + j] += w * w;
            }
        }

        for (s, &w) in signal.iter_mut().zip(&norm) {
            if w > f32::MIN_POSITIVE {
                *s /= w;
            }
        }

        let target = length.unwrap_or(self.hop_length * (frames - 1));
        let mut output: Vec<f32> = signal.into_iter().skip(half).take(target).collect();
        output.resize(target, 0.0);
        Ok(output)
    }
}

/// Periodic Hann window (DFT-even), matching the usual STFT convention
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (TAU * i as f32 / size as f32).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (TAU * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_shape() {
        let stft = Stft::new(2048, 512).unwrap();
        let spec = stft.forward(&vec![0.0; 2048]);
        assert_eq!(spec.bins(), 1025);
        assert_eq!(spec.frames(), 5);
        assert_eq!(stft.num_frames(2048), 5);
    }

    #[test]
    fn test_round_trip_reconstructs_signal() {
        let stft = Stft::new(512, 128).unwrap();
        let signal = sine(440.0, 16000.0, 512);

        let spec = stft.forward(&signal);
        let restored = stft.inverse(&spec, None).unwrap();

        assert_eq!(restored.len(), signal.len());
        for (a, b) in signal.iter().zip(&restored) {
            assert!((a - b).abs() < 1e-4, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_peak_bin_matches_tone() {
        // 1 kHz at 16 kHz with n_fft 2048 lands on bin 128
        let stft = Stft::new(2048, 512).unwrap();
        let spec = stft.forward(&sine(1000.0, 16000.0, 2048));
        let magnitude = spec.magnitude();

        let middle = spec.frames() / 2;
        let peak = (0..spec.bins())
            .max_by(|&a, &b| {
                magnitude[a * spec.frames() + middle]
                    .total_cmp(&magnitude[b * spec.frames() + middle])
            })
            .unwrap();
        assert_eq!(peak, 128);
    }

    #[test]
    fn test_explicit_length() {
        let stft = Stft::new(256, 64).unwrap();
        let spec = stft.forward(&vec![0.1; 256]);
        assert_eq!(stft.inverse(&spec, Some(300)).unwrap().len(), 300);
        assert_eq!(stft.inverse(&spec, Some(100)).unwrap().len(), 100);
    }

    #[test]
    fn test_polar_round_trip() {
        let stft = Stft::new(64, 16).unwrap();
        let spec = stft.forward(&sine(1000.0, 8000.0, 64));
        let rebuilt =
            Spectrogram::from_polar(spec.bins(), spec.frames(), &spec.magnitude(), &spec.phase())
                .unwrap();

        for b in 0..spec.bins() {
            for t in 0..spec.frames() {
                assert!((spec.get(b, t) - rebuilt.get(b, t)).norm() < 1e-4);
            }
        }
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(Stft::new(0, 1).is_err());
        assert!(Stft::new(1023, 256).is_err());
        assert!(Stft::new(1024, 0).is_err());
        assert!(Stft::new(1024, 2048).is_err());
    }

    #[test]
    fn test_inverse_rejects_wrong_shape() {
        let stft = Stft::new(64, 16).unwrap();
        let spec = Spectrogram::zeros(10, 3);
        assert!(matches!(
            stft.inverse(&spec, None),
            Err(DspError::Shape { .. })
        ));
    }

    #[test]
    fn test_window_is_periodic() {
        let window = hann_window(8);
        assert_eq!(window[0], 0.0);
        assert!((window[4] - 1.0).abs() < 1e-6);
        assert!((window[2] - window[6]).abs() < 1e-6);
    }
}
