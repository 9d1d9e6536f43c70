//! Real-time spectral-subtraction denoiser
//!
//! Captures microphone audio, removes a per-frame noise estimate in the
//! frequency domain and saves the enhanced signal when the session stops.
//! Also ships a noise-overlay tool for building noisy datasets and a
//! pluggable speech-to-speech translation pipeline.
//!
//! # Architecture
//!
//! - `audio`: capture, block queue, frame accumulation, STFT, spectral
//!   subtraction and the session state machine
//! - `overlay`: looping and mixing noise into clean clips
//! - `pipeline`: transcribe / translate / synthesize stages
//! - `output`: session reports and waveform rendering
//! - `config`: configuration structures
//! - `error`: error types
//!
//! # Example
//!
//! ```no_run
//! use std::sync::atomic::AtomicBool;
//! use denoise_rs::{block_queue, AudioCapture, Config, DenoiseSession, SubtractionParams};
//!
//! let config = Config::default();
//! let (sender, receiver) = block_queue(config.denoise.queue_capacity);
//!
//! let mut capture = AudioCapture::new(config.audio.clone()).unwrap();
//! capture.init().unwrap();
//! capture.start(sender).unwrap();
//!
//! let mut session = DenoiseSession::new(
//!     SubtractionParams::from(&config.denoise),
//!     config.audio.sample_rate,
//! )
//! .unwrap()
//! .with_input_rate(capture.actual_sample_rate())
//! .unwrap();
//!
//! let stop = AtomicBool::new(false);
//! session.run(&receiver, &stop).unwrap();
//! session.finalize(&config.output.output_path).unwrap();
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod output;
pub mod overlay;
pub mod pipeline;

// Re-exports for convenience
pub use audio::{
    block_queue, AudioBlock, AudioCapture, AudioClip, DenoiseSession, FrameAccumulator,
    SessionState, SpectralSubtractor, Stft, SubtractionParams,
};
pub use config::{AudioConfig, Config, DenoiseConfig, OutputConfig, OverlayConfig, PipelineConfig};
pub use error::{
    AudioError, ConfigError, DenoiseError, DspError, PipelineError, Result, SessionError,
};
pub use output::ReportWriter;
pub use overlay::{overlay, overlay_dataset};
pub use pipeline::{SpeechTranslator, Synthesizer, Transcriber, TranslationOutcome, Translator};
