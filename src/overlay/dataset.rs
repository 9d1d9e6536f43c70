//! Batch overlay over a folder of clean clips

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::overlay_clip;
use crate::audio::wav::{read_wav, read_wav_with_spec, write_wav};
use crate::error::{AudioError, Result};

/// Files written and skipped by [`overlay_dataset`]
#[derive(Debug, Default, Clone, Serialize)]
pub struct OverlayReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// Mix `noise_file` into every `.wav` under `clean_dir` and write the result
/// under the same file name in `output_dir`.
///
/// Files are processed in name order. `.mp3` inputs are skipped with a
/// warning; other extensions are ignored.
pub fn overlay_dataset(
    clean_dir: &Path,
    noise_file: &Path,
    output_dir: &Path,
    attenuation_db: f32,
) -> Result<OverlayReport> {
    std::fs::create_dir_all(output_dir)?;

    let noise = read_wav(noise_file)?;
    if noise.samples.is_empty() {
        return Err(AudioError::EmptyNoise.into());
    }
    info!(
        "Noise source {}: {:.2}s @ {} Hz",
        noise_file.display(),
        noise.duration_secs(),
        noise.sample_rate
    );

    let mut entries: Vec<PathBuf> = std::fs::read_dir(clean_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    let mut report = OverlayReport::default();

    for clean_path in entries {
        let extension = clean_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("wav") => {}
            Some("mp3") => {
                warn!("Skipping {}: MP3 decoding is not supported", clean_path.display());
                report.skipped.push(clean_path);
                continue;
            }
            _ => continue,
        }

        let Some(file_name) = clean_path.file_name() else {
            continue;
        };

        let (clean, spec) = read_wav_with_spec(&clean_path)?;
        let mixed = overlay_clip(&clean, &noise, attenuation_db)?;

        let output_path = output_dir.join(file_name);
        write_wav(&output_path, &mixed.samples, spec)?;

        info!("Saved: {}", output_path.display());
        report.written.push(output_path);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::write_mono_f32;

    #[test]
    fn test_overlay_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let clean_dir = dir.path().join("good_dataset");
        let output_dir = dir.path().join("noisy_dataset");
        std::fs::create_dir_all(&clean_dir).unwrap();

        let noise_path = dir.path().join("sea_noise.wav");
        write_mono_f32(&noise_path, &[0.1; 100], 8000).unwrap();

        write_mono_f32(clean_dir.join("b.wav"), &[0.0; 250], 8000).unwrap();
        write_mono_f32(clean_dir.join("a.wav"), &[0.5; 50], 8000).unwrap();
        std::fs::write(clean_dir.join("c.mp3"), b"not decoded").unwrap();
        std::fs::write(clean_dir.join("notes.txt"), b"ignored").unwrap();

        let report = overlay_dataset(&clean_dir, &noise_path, &output_dir, 0.0).unwrap();

        assert_eq!(
            report.written,
            vec![output_dir.join("a.wav"), output_dir.join("b.wav")]
        );
        assert_eq!(report.skipped, vec![clean_dir.join("c.mp3")]);

        let b = read_wav(output_dir.join("b.wav")).unwrap();
        assert_eq!(b.samples.len(), 250);
        assert!(b.samples.iter().all(|s| (s - 0.1).abs() < 1e-6));

        let a = read_wav(output_dir.join("a.wav")).unwrap();
        assert_eq!(a.samples.len(), 50);
        assert!((a.samples[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_missing_noise_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = overlay_dataset(
            dir.path(),
            &dir.path().join("missing.wav"),
            &dir.path().join("out"),
            10.0,
        );
        assert!(result.is_err());
    }
}
