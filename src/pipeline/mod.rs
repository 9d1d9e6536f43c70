//! Speech-to-speech translation: transcribe, translate, synthesize.
//!
//! Each stage is a trait so model backends can be swapped or mocked. A
//! Whisper transcriber is available with the `whisper` feature.

#[cfg(feature = "whisper")]
pub mod whisper;

#[cfg(feature = "whisper")]
pub use whisper::WhisperTranscriber;

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::audio::resample::resample;
use crate::audio::wav::{read_wav, write_mono_f32};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};

/// Result type returned by the model backends
pub type StageResult<T> = std::result::Result<T, PipelineError>;

/// Speech recognition backend
pub trait Transcriber {
    /// Transcribe mono samples at the pipeline sample rate
    fn transcribe(&self, samples: &[f32], language: &str) -> StageResult<String>;
}

/// Text translation backend
pub trait Translator {
    fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> StageResult<String>;
}

/// Text-to-speech backend. The voice (speaker embedding) is the backend's concern.
pub trait Synthesizer {
    fn synthesize(&self, text: &str) -> StageResult<SynthesizedSpeech>;
}

/// Audio produced by a [`Synthesizer`]
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedSpeech {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// What the translation stage produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranslationOutcome {
    Translated(String),
    /// Translation failed and the source text was kept
    FallbackOriginal { text: String, reason: String },
}

impl TranslationOutcome {
    /// Text handed to the synthesizer
    pub fn text(&self) -> &str {
        match self {
            TranslationOutcome::Translated(text) => text,
            TranslationOutcome::FallbackOriginal { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, TranslationOutcome::FallbackOriginal { .. })
    }
}

/// Result of a full pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct TranslationReport {
    pub source_text: String,
    pub outcome: TranslationOutcome,
    pub output_path: PathBuf,
}

/// Load `path`, downmix to mono and convert to `sample_rate`
pub fn load_speech_audio(path: &Path, sample_rate: u32) -> Result<Vec<f32>> {
    if !path.exists() {
        return Err(PipelineError::InputNotFound(path.display().to_string()).into());
    }

    let clip = read_wav(path)?;
    let mono = clip.to_mono();
    resample(&mono, clip.sample_rate, sample_rate)
}

/// Chains the three stages over one input file
pub struct SpeechTranslator<T, M, S> {
    config: PipelineConfig,
    transcriber: T,
    translator: M,
    synthesizer: S,
}

impl<T, M, S> SpeechTranslator<T, M, S>
where
    T: Transcriber,
    M: Translator,
    S: Synthesizer,
{
    pub fn new(config: PipelineConfig, transcriber: T, translator: M, synthesizer: S) -> Self {
        Self {
            config,
            transcriber,
            translator,
            synthesizer,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load `path`, downmix to mono and convert to the recognizer's rate
    pub fn load_audio(&self, path: &Path) -> Result<Vec<f32>> {
        load_speech_audio(path, self.config.sample_rate)
    }

    /// Transcribe a file in the configured ASR language
    pub fn transcribe_file(&self, path: &Path) -> Result<String> {
        let samples = self.load_audio(path)?;
        info!(
            "Transcribing {} ({:.2}s, language {})",
            path.display(),
            samples.len() as f32 / self.config.sample_rate as f32,
            self.config.asr_language
        );

        let text = self
            .transcriber
            .transcribe(&samples, &self.config.asr_language)?;
        info!("Recognized text: {}", text);
        Ok(text)
    }

    /// Translate text. Failures fall back to the source text when configured,
    /// otherwise they are returned as errors.
    pub fn translate_text(&self, text: &str) -> Result<TranslationOutcome> {
        match self.translator.translate(
            text,
            &self.config.source_language,
            &self.config.target_language,
        ) {
            Ok(translated) => {
                info!("Translated text: {}", translated);
                Ok(TranslationOutcome::Translated(translated))
            }
            Err(e) if self.config.fallback_to_source => {
                warn!("Translation failed, keeping source text: {}", e);
                Ok(TranslationOutcome::FallbackOriginal {
                    text: text.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Synthesize `text` and write it to `output`
    pub fn synthesize_to_file(&self, text: &str, output: &Path) -> Result<SynthesizedSpeech> {
        let speech = self.synthesizer.synthesize(text)?;
        write_mono_f32(output, &speech.samples, speech.sample_rate)?;
        info!("Generated speech saved as: {}", output.display());
        Ok(speech)
    }

    /// Full pipeline. Returns `Ok(None)` when no speech was recognized.
    pub fn translate_speech(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<Option<TranslationReport>> {
        let source_text = self.transcribe_file(input)?;

        if source_text.trim().is_empty() {
            warn!("No speech detected in {}", input.display());
            return Ok(None);
        }

        let outcome = self.translate_text(&source_text)?;
        self.synthesize_to_file(outcome.text(), output)?;

        Ok(Some(TranslationReport {
            source_text,
            outcome,
            output_path: output.to_path_buf(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DenoiseError;
    use std::cell::RefCell;

    struct FixedTranscriber(String);

    impl Transcriber for FixedTranscriber {
        fn transcribe(&self, samples: &[f32], language: &str) -> StageResult<String> {
            assert_eq!(language, "kn");
            if samples.is_empty() {
                return Err(PipelineError::InvalidAudioData);
            }
            Ok(self.0.clone())
        }
    }

    struct UppercaseTranslator;

    impl Translator for UppercaseTranslator {
        fn translate(&self, text: &str, src: &str, tgt: &str) -> StageResult<String> {
            assert_eq!(src, "kan_Knda");
            assert_eq!(tgt, "eng_Latn");
            Ok(text.to_uppercase())
        }
    }

    struct FailingTranslator;

    impl Translator for FailingTranslator {
        fn translate(&self, _: &str, _: &str, _: &str) -> StageResult<String> {
            Err(PipelineError::Translation("model unavailable".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingSynthesizer {
        spoken: RefCell<Vec<String>>,
    }

    impl Synthesizer for RecordingSynthesizer {
        fn synthesize(&self, text: &str) -> StageResult<SynthesizedSpeech> {
            self.spoken.borrow_mut().push(text.to_string());
            Ok(SynthesizedSpeech {
                samples: vec![0.1; 160],
                sample_rate: 16000,
            })
        }
    }

    fn input_file(dir: &Path) -> PathBuf {
        let path = dir.join("test.wav");
        write_mono_f32(&path, &vec![0.2; 4410], 44100).unwrap();
        path
    }

    #[test]
    fn test_full_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(dir.path());
        let output = dir.path().join("translated_english.wav");

        let pipeline = SpeechTranslator::new(
            PipelineConfig::default(),
            FixedTranscriber("namaskara".to_string()),
            UppercaseTranslator,
            RecordingSynthesizer::default(),
        );

        let report = pipeline.translate_speech(&input, &output).unwrap().unwrap();
        assert_eq!(report.source_text, "namaskara");
        assert_eq!(report.outcome, TranslationOutcome::Translated("NAMASKARA".to_string()));
        assert!(output.exists());
        assert_eq!(pipeline.synthesizer.spoken.borrow().as_slice(), ["NAMASKARA"]);
    }

    #[test]
    fn test_input_is_resampled() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(dir.path());

        let pipeline = SpeechTranslator::new(
            PipelineConfig::default(),
            FixedTranscriber(String::new()),
            UppercaseTranslator,
            RecordingSynthesizer::default(),
        );

        let samples = pipeline.load_audio(&input).unwrap();
        assert_eq!(samples.len(), 1600);
        assert!(samples.iter().all(|s| (s - 0.2).abs() < 0.01));
    }

    #[test]
    fn test_load_speech_audio_missing_file() {
        let result = load_speech_audio(Path::new("/nonexistent/test.wav"), 16000);
        assert!(matches!(
            result,
            Err(DenoiseError::Pipeline(PipelineError::InputNotFound(_)))
        ));
    }

    #[test]
    fn test_translation_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(dir.path());
        let output = dir.path().join("out.wav");

        let pipeline = SpeechTranslator::new(
            PipelineConfig::default(),
            FixedTranscriber("namaskara".to_string()),
            FailingTranslator,
            RecordingSynthesizer::default(),
        );

        let report = pipeline.translate_speech(&input, &output).unwrap().unwrap();
        assert!(report.outcome.is_fallback());
        assert_eq!(report.outcome.text(), "namaskara");
        assert_eq!(pipeline.synthesizer.spoken.borrow().as_slice(), ["namaskara"]);
    }

    #[test]
    fn test_translation_error_without_fallback() {
        let config = PipelineConfig {
            fallback_to_source: false,
            ..Default::default()
        };
        let pipeline = SpeechTranslator::new(
            config,
            FixedTranscriber("x".to_string()),
            FailingTranslator,
            RecordingSynthesizer::default(),
        );

        assert!(matches!(
            pipeline.translate_text("x"),
            Err(DenoiseError::Pipeline(PipelineError::Translation(_)))
        ));
    }

    #[test]
    fn test_no_speech_detected() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(dir.path());
        let output = dir.path().join("out.wav");

        let pipeline = SpeechTranslator::new(
            PipelineConfig::default(),
            FixedTranscriber("   ".to_string()),
            UppercaseTranslator,
            RecordingSynthesizer::default(),
        );

        assert!(pipeline.translate_speech(&input, &output).unwrap().is_none());
        assert!(!output.exists());
        assert!(pipeline.synthesizer.spoken.borrow().is_empty());
    }

    #[test]
    fn test_missing_input() {
        let pipeline = SpeechTranslator::new(
            PipelineConfig::default(),
            FixedTranscriber("x".to_string()),
            UppercaseTranslator,
            RecordingSynthesizer::default(),
        );

        let result =
            pipeline.translate_speech(Path::new("/nonexistent/test.wav"), Path::new("out.wav"));
        assert!(matches!(
            result,
            Err(DenoiseError::Pipeline(PipelineError::InputNotFound(_)))
        ));
    }
}
