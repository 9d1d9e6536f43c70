//! WAV file reading and writing

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use tracing::debug;

use crate::error::{AudioError, Result};

/// Decoded audio with interleaved samples in `[-1.0, 1.0]`
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: 1,
            sample_rate,
        }
    }

    /// Number of sample frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }

    /// Average all channels into one
    pub fn to_mono(&self) -> Vec<f32> {
        downmix(&self.samples, self.channels)
    }
}

/// Average interleaved channels into a mono signal
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels as usize)
        .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Read a WAV file, returning the clip and its on-disk format
pub fn read_wav_with_spec<P: AsRef<Path>>(path: P) -> Result<(AudioClip, WavSpec)> {
    let path = path.as_ref();
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    debug!(
        "Reading {}: {} channels, {} Hz, {} bits {:?}",
        path.display(),
        spec.channels,
        spec.sample_rate,
        spec.bits_per_sample,
        spec.sample_format
    );

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, hound::Error>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_val))
                .collect::<std::result::Result<Vec<f32>, hound::Error>>()?
        }
    };

    let clip = AudioClip {
        samples,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    };
    Ok((clip, spec))
}

/// Read a WAV file into floating point samples
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<AudioClip> {
    read_wav_with_spec(path).map(|(clip, _)| clip)
}

/// Write interleaved samples using the given format. Integer formats are clamped to full scale.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> Result<()> {
    let mut writer = WavWriter::create(path.as_ref(), spec)?;

    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => {
            for &sample in samples {
                writer.write_sample(sample)?;
            }
        }
        (SampleFormat::Int, bits @ (8 | 16 | 24 | 32)) => {
            let max_val = ((1i64 << (bits - 1)) - 1) as f64;
            for &sample in samples {
                let value = (sample.clamp(-1.0, 1.0) as f64 * max_val).round();
                match bits {
                    8 => writer.write_sample(value as i8)?,
                    16 => writer.write_sample(value as i16)?,
                    _ => writer.write_sample(value as i32)?,
                }
            }
        }
        (format, bits) => {
            return Err(AudioError::UnsupportedFormat(format!("{:?} {} bit", format, bits)).into());
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Write a mono 32-bit float WAV file
pub fn write_mono_f32<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<()> {
    write_mono_f32_chunks(path, [samples], sample_rate)
}

/// Write consecutive chunks as one mono 32-bit float WAV file
pub fn write_mono_f32_chunks<'a, P, I>(path: P, chunks: I, sample_rate: u32) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a [f32]>,
{
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path.as_ref(), spec)?;
    for chunk in chunks {
        for &sample in chunk {
            writer.write_sample(sample)?;
        }
    }
    writer.finalize()?;
    Ok(())
}
