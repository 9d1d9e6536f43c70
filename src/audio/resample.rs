//! Sample rate conversion

use rubato::{FftFixedIn, Resampler};
use tracing::debug;

use crate::error::{AudioError, Result};

const CHUNK_SIZE: usize = 1024;

/// Streaming mono resampler. Input is buffered until a full chunk is available.
pub struct AudioResampler {
    resampler: FftFixedIn<f32>,
    source_sample_rate: u32,
    target_sample_rate: u32,
    pending: Vec<f32>,
}

impl AudioResampler {
    pub fn new(source_sample_rate: u32, target_sample_rate: u32) -> Result<Self> {
        debug!(
            "Initializing resampler: {} Hz -> {} Hz",
            source_sample_rate, target_sample_rate
        );

        let resampler = FftFixedIn::<f32>::new(
            source_sample_rate as usize,
            target_sample_rate as usize,
            CHUNK_SIZE,
            1, // sub-chunks
            1, // channels
        )
        .map_err(|e| AudioError::Resampling(e.to_string()))?;

        Ok(Self {
            resampler,
            source_sample_rate,
            target_sample_rate,
            pending: Vec::new(),
        })
    }

    /// Feed samples and return whatever full chunks produced
    pub fn process(&mut self, samples: &[f32]) -> Result<Vec<f32>> {
        self.pending.extend_from_slice(samples);

        let needed = self.resampler.input_frames_next();
        let mut output = Vec::new();

        while self.pending.len() >= needed {
            let chunk: Vec<f32> = self.pending.drain(..needed).collect();
            output.extend(self.run_chunk(chunk)?);
        }

        Ok(output)
    }

    /// Zero-pad and convert the buffered tail, keeping only its share of the output
    pub fn flush(&mut self) -> Result<Vec<f32>> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        let remainder = self.pending.len();
        let keep = self.output_len(remainder);

        let needed = self.resampler.input_frames_next();
        let mut chunk = std::mem::take(&mut self.pending);
        chunk.resize(needed, 0.0);

        let mut output = self.run_chunk(chunk)?;
        output.truncate(keep);
        Ok(output)
    }

    fn run_chunk(&mut self, chunk: Vec<f32>) -> Result<Vec<f32>> {
        let result = self
            .resampler
            .process(&[chunk], None)
            .map_err(|e| AudioError::Resampling(e.to_string()))?;

        Ok(result.into_iter().next().unwrap_or_default())
    }

    /// Expected output length for `input_len` source samples
    pub fn output_len(&self, input_len: usize) -> usize {
        (input_len as f64 * self.target_sample_rate as f64 / self.source_sample_rate as f64)
            .round() as usize
    }

    /// Output samples the filter lags behind the input
    pub fn output_delay(&self) -> usize {
        self.resampler.output_delay()
    }

    pub fn source_sample_rate(&self) -> u32 {
        self.source_sample_rate
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Drop buffered input and internal filter state
    pub fn reset(&mut self) {
        self.pending.clear();
        self.resampler.reset();
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Convert a whole mono signal to `target` Hz. The output length is `len * target / source`.
///
/// The signal is edge-extended on both sides so the filter sees no artificial
/// silence, and the resampler delay is removed, keeping output sample `k`
/// aligned with input time `k / target`.
pub fn resample(samples: &[f32], source: u32, target: u32) -> Result<Vec<f32>> {
    if source == target || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler = AudioResampler::new(source, target)?;
    let expected = resampler.output_len(samples.len());
    let delay = resampler.output_delay();

    // Lead-in must map to a whole number of output samples
    let g = gcd(source, target) as usize;
    let (step_in, step_out) = (source as usize / g, target as usize / g);
    let lead_steps = (delay * step_in).div_ceil(step_out).div_ceil(step_in).max(1);
    let (lead_in, lead_out) = (lead_steps * step_in, lead_steps * step_out);

    let first = samples[0];
    let last = samples[samples.len() - 1];
    let mut padded = Vec::with_capacity(samples.len() + 2 * lead_in);
    padded.resize(lead_in, first);
    padded.extend_from_slice(samples);
    padded.resize(padded.len() + lead_in, last);

    let skip = delay + lead_out;
    let mut output = resampler.process(&padded)?;
    let tail = vec![last; resampler.resampler.input_frames_next()];
    while output.len() < skip + expected {
        output.extend(resampler.process(&tail)?);
    }

    output.drain(..skip);
    output.truncate(expected);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resampler_creation() {
        assert!(AudioResampler::new(44100, 16000).is_ok());
    }

    #[test]
    fn test_identity_rate() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&samples, 16000, 16000).unwrap(), samples);
    }

    #[test]
    fn test_downsample_length() {
        let samples: Vec<f32> = (0..44100)
            .map(|i| (i as f32 * 2.0 * std::f32::consts::PI * 440.0 / 44100.0).sin())
            .collect();

        let output = resample(&samples, 44100, 16000).unwrap();
        assert_eq!(output.len(), 16000);
        assert!(output.iter().all(|s| s.abs() <= 1.5));
    }

    #[test]
    fn test_constant_signal_keeps_its_level() {
        for (source, target) in [(44100, 16000), (16000, 44100), (48000, 16000)] {
            let output = resample(&vec![1.0; source as usize], source, target).unwrap();

            assert_eq!(output.len(), target as usize);
            for (i, s) in output.iter().enumerate() {
                assert!(
                    (s - 1.0).abs() < 0.05,
                    "{} -> {} Hz: sample {} is {}",
                    source,
                    target,
                    i,
                    s
                );
            }
        }
    }

    #[test]
    fn test_impulse_position_is_preserved() {
        let mut samples = vec![0.0f32; 44100];
        samples[4410] = 1.0;

        let output = resample(&samples, 44100, 16000).unwrap();
        let peak = output
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();

        let expected = (4410.0f64 * 16000.0 / 44100.0).round() as usize;
        assert!(
            peak.abs_diff(expected) <= 2,
            "peak at {}, expected {}",
            peak,
            expected
        );
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(44100, 16000), 100);
        assert_eq!(gcd(48000, 16000), 16000);
    }

    #[test]
    fn test_streaming_buffers_partial_chunks() {
        let mut resampler = AudioResampler::new(48000, 16000).unwrap();
        let out = resampler.process(&[0.0; 100]).unwrap();
        assert!(out.is_empty());

        let tail = resampler.flush().unwrap();
        assert!(tail.len() <= resampler.output_len(100));

        resampler.reset();
        assert!(resampler.flush().unwrap().is_empty());
    }
}
