//! Custom error types for the denoise-rs system

use thiserror::Error;

/// Main error type for the denoise-rs system
#[derive(Error, Debug)]
pub enum DenoiseError {
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("DSP error: {0}")]
    Dsp(#[from] DspError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

/// Audio device, capture and file related errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No audio input device available")]
    NoInputDevice,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to get device configuration: {0}")]
    DeviceConfig(String),

    #[error("Failed to build audio stream: {0}")]
    StreamBuild(String),

    #[error("Stream playback error: {0}")]
    StreamPlay(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Resampling error: {0}")]
    Resampling(String),

    #[error("Noise source is empty")]
    EmptyNoise,
}

/// Spectral processing errors. These indicate a framing bug and are fatal to a session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Frame length mismatch: expected {expected} samples, got {got}")]
    FrameLength { expected: usize, got: usize },

    #[error("Spectrogram shape mismatch: expected {expected_bins}x{expected_frames}, got {bins}x{frames}")]
    Shape {
        expected_bins: usize,
        expected_frames: usize,
        bins: usize,
        frames: usize,
    },

    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter { name: &'static str, value: String },
}

/// Session lifecycle errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Invalid session transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Session output has already been saved")]
    AlreadyFinalized,
}

/// Speech translation pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Audio file not found: {0}")]
    InputNotFound(String),

    #[error("Model file not found: {0}")]
    ModelNotFound(String),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Invalid audio data for transcription")]
    InvalidAudioData,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },
}

pub type Result<T> = std::result::Result<T, DenoiseError>;
