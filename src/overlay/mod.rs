//! Noise overlay: loop a noise recording under clean audio at a fixed attenuation

pub mod dataset;

pub use dataset::{overlay_dataset, OverlayReport};

use crate::audio::resample::resample;
use crate::audio::wav::{downmix, AudioClip};
use crate::error::{AudioError, Result};

/// Convert decibels to a linear amplitude factor
pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Scale samples down by `attenuation_db`
pub fn attenuate(samples: &[f32], attenuation_db: f32) -> Vec<f32> {
    let gain = db_to_gain(-attenuation_db);
    samples.iter().map(|s| s * gain).collect()
}

/// Tile `noise` by repeated doubling until it covers `len` samples, then
/// cut it to exactly `len`.
pub fn loop_to_length(noise: &[f32], len: usize) -> Result<Vec<f32>> {
    if len == 0 {
        return Ok(Vec::new());
    }
    if noise.is_empty() {
        return Err(AudioError::EmptyNoise.into());
    }

    let mut looped = noise.to_vec();
    while looped.len() < len {
        looped.extend_from_within(..);
    }
    looped.truncate(len);
    Ok(looped)
}

/// `clean + looped(noise) * 10^(-attenuation_db / 20)`, same length as `clean`
pub fn overlay(clean: &[f32], noise: &[f32], attenuation_db: f32) -> Result<Vec<f32>> {
    let looped = loop_to_length(noise, clean.len())?;
    let gain = db_to_gain(-attenuation_db);

    Ok(clean
        .iter()
        .zip(&looped)
        .map(|(c, n)| c + n * gain)
        .collect())
}

/// Overlay `noise` onto `clean`, first converting the noise to the clean
/// clip's sample rate and channel layout. The result keeps the clean clip's
/// format and length.
pub fn overlay_clip(
    clean: &AudioClip,
    noise: &AudioClip,
    attenuation_db: f32,
) -> Result<AudioClip> {
    let channels = clean.channels.max(1) as usize;

    let mut mono_noise = downmix(&noise.samples, noise.channels);
    if noise.sample_rate != clean.sample_rate {
        mono_noise = resample(&mono_noise, noise.sample_rate, clean.sample_rate)?;
    }

    let looped = loop_to_length(&mono_noise, clean.frames())?;
    let gain = db_to_gain(-attenuation_db);

    let mut samples = clean.samples.clone();
    for (frame, &n) in samples.chunks_mut(channels).zip(&looped) {
        for sample in frame {
            *sample += n * gain;
        }
    }

    Ok(AudioClip {
        samples,
        channels: clean.channels,
        sample_rate: clean.sample_rate,
    })
}
