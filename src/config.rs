//! Configuration structures for the denoise-rs system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub denoise: DenoiseConfig,
    pub output: OutputConfig,
    pub overlay: OverlayConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the parameters that the processing loop relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audio.sample_rate == 0 {
            return Err(invalid("audio.sample_rate", self.audio.sample_rate));
        }
        if self.audio.channels == 0 {
            return Err(invalid("audio.channels", self.audio.channels));
        }
        if self.audio.block_size == 0 {
            return Err(invalid("audio.block_size", self.audio.block_size));
        }

        let d = &self.denoise;
        if d.frame_length < 2 || d.frame_length % 2 != 0 {
            return Err(invalid("denoise.frame_length", d.frame_length));
        }
        if d.hop_length == 0 || d.hop_length > d.frame_length {
            return Err(invalid("denoise.hop_length", d.hop_length));
        }
        if d.noise_frames == 0 || d.noise_frames > 1 + d.frame_length / d.hop_length {
            return Err(invalid("denoise.noise_frames", d.noise_frames));
        }
        if d.over_subtraction.is_nan() || d.over_subtraction < 0.0 {
            return Err(invalid("denoise.over_subtraction", d.over_subtraction));
        }
        if d.queue_capacity == Some(0) {
            return Err(invalid("denoise.queue_capacity", 0));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Processing sample rate (Hz)
    pub sample_rate: u32,
    /// Number of device channels (downmixed to mono on capture)
    pub channels: u16,
    /// Samples per captured block
    pub block_size: u32,
    /// Audio device name (None = default device)
    pub device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            block_size: 1024,
            device: None,
        }
    }
}

/// Spectral subtraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseConfig {
    /// Samples per analysis frame (also the FFT size)
    pub frame_length: usize,
    /// STFT hop inside one analysis frame
    pub hop_length: usize,
    /// Leading time slices averaged into the noise profile
    pub noise_frames: usize,
    /// Scale applied to the noise profile before subtraction
    pub over_subtraction: f32,
    /// Block queue bound (None = unbounded, never drops)
    pub queue_capacity: Option<usize>,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            frame_length: 2048,
            hop_length: 512,
            noise_frames: 2,
            over_subtraction: 0.5,
            queue_capacity: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Enhanced audio file written when the session stops
    pub output_path: PathBuf,
    /// Print an ASCII waveform of the saved audio
    pub show_waveform: bool,
    /// Width of the waveform in characters
    pub waveform_width: usize,
    /// Height of the waveform in rows
    pub waveform_height: usize,
    /// Session report format
    pub report_format: ReportFormat,
    /// Optional path for the session report (None = console only)
    pub report_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("enhanced_realtime.wav"),
            show_waveform: true,
            waveform_width: 80,
            waveform_height: 12,
            report_format: ReportFormat::Text,
            report_path: None,
        }
    }
}

/// Session report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human readable text
    Text,
    /// JSON
    Json,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(invalid("output.report_format", other)),
        }
    }
}

/// Noise overlay (dataset generation) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Folder of clean clips
    pub clean_dir: PathBuf,
    /// Noise recording looped under every clip
    pub noise_file: PathBuf,
    /// Folder receiving the noisy clips
    pub output_dir: PathBuf,
    /// Noise attenuation in dB
    pub attenuation_db: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            clean_dir: PathBuf::from("good_dataset"),
            noise_file: PathBuf::from("sea_noise.wav"),
            output_dir: PathBuf::from("noisy_dataset"),
            attenuation_db: 10.0,
        }
    }
}

/// Speech translation pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sample rate the recognizer expects
    pub sample_rate: u32,
    /// Language code passed to the recognizer
    pub asr_language: String,
    /// Source language tag for the translator
    pub source_language: String,
    /// Target language tag for the translator
    pub target_language: String,
    /// Keep the untranslated text when translation fails
    pub fallback_to_source: bool,
    /// Path to the Whisper model file
    pub model_path: PathBuf,
    /// Number of threads for inference
    pub threads: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            asr_language: "kn".to_string(),
            source_language: "kan_Knda".to_string(),
            target_language: "eng_Latn".to_string(),
            fallback_to_source: true,
            model_path: PathBuf::from("./models/ggml-large-v3.bin"),
            threads: 4,
        }
    }
}
