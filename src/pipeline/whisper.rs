//! Whisper-based transcription backend

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::Transcriber;
use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// Transcriber backed by a local ggml Whisper model
pub struct WhisperTranscriber {
    ctx: Arc<WhisperContext>,
    threads: u32,
}

impl WhisperTranscriber {
    /// Load the model named in the pipeline configuration
    pub fn new(config: &PipelineConfig) -> Result<Self, PipelineError> {
        Self::from_model_path(&config.model_path, config.threads)
    }

    pub fn from_model_path<P: AsRef<Path>>(path: P, threads: u32) -> Result<Self, PipelineError> {
        let model_path = path.as_ref();
        if !model_path.exists() {
            return Err(PipelineError::ModelNotFound(model_path.display().to_string()));
        }

        info!("Loading Whisper model from: {}", model_path.display());

        let model_str = model_path
            .to_str()
            .ok_or_else(|| PipelineError::ModelLoad("model path is not valid UTF-8".to_string()))?;
        let ctx = WhisperContext::new_with_params(model_str, WhisperContextParameters::default())
            .map_err(|e| PipelineError::ModelLoad(e.to_string()))?;

        info!("Whisper model loaded successfully");

        Ok(Self {
            ctx: Arc::new(ctx),
            threads,
        })
    }
}

impl Transcriber for WhisperTranscriber {
    /// Audio must be 16kHz mono f32 samples
    fn transcribe(&self, samples: &[f32], language: &str) -> Result<String, PipelineError> {
        if samples.is_empty() {
            return Err(PipelineError::InvalidAudioData);
        }

        debug!("Transcribing {} samples ({:.2}s)", samples.len(), samples.len() as f32 / 16000.0);

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.threads as i32);
        params.set_language(Some(language));
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_no_context(true);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| PipelineError::ModelLoad(e.to_string()))?;

        state
            .full(params, samples)
            .map_err(|e| PipelineError::Transcription(e.to_string()))?;

        let num_segments = state
            .full_n_segments()
            .map_err(|e| PipelineError::Transcription(e.to_string()))?;

        let mut text = String::new();
        for i in 0..num_segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| PipelineError::Transcription(e.to_string()))?;
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(segment);
        }

        debug!("Transcription complete: {} segments, {} chars", num_segments, text.len());
        Ok(text)
    }
}

// Safety: WhisperContext is thread-safe for inference
unsafe impl Send for WhisperTranscriber {}
unsafe impl Sync for WhisperTranscriber {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model() {
        let config = PipelineConfig {
            model_path: "/nonexistent/model.bin".into(),
            ..Default::default()
        };

        let result = WhisperTranscriber::new(&config);
        assert!(matches!(result, Err(PipelineError::ModelNotFound(_))));
    }
}
