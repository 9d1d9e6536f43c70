//! Denoising session: frame accumulation, spectral subtraction, output
//! accumulation and the one-shot finalizer.
//!
//! A session moves through `Idle -> Recording -> Stopping -> Saved`. All
//! state lives in the [`DenoiseSession`] value owned by the processing
//! loop; the only thing shared with the capture side is the block queue.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::audio::buffer::FrameAccumulator;
use crate::audio::queue::{AudioBlock, BlockReceiver, PopOutcome};
use crate::audio::resample::AudioResampler;
use crate::audio::spectral::{EnhancedFrame, SpectralSubtractor, SubtractionParams};
use crate::audio::wav::write_mono_f32_chunks;
use crate::error::{Result, SessionError};

/// How long the processing loop waits on the queue before re-checking the stop flag
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Recording,
    Stopping,
    Saved,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Recording => write!(f, "recording"),
            SessionState::Stopping => write!(f, "stopping"),
            SessionState::Saved => write!(f, "saved"),
        }
    }
}

/// Why the processing loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The stop flag was raised
    Interrupted,
    /// Every producer went away and the queue drained
    QueueClosed,
}

/// Append-only list of enhanced frames in production order
#[derive(Debug, Default)]
pub struct OutputAccumulator {
    frames: Vec<EnhancedFrame>,
    total_samples: usize,
}

impl OutputAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: EnhancedFrame) {
        self.total_samples += frame.len();
        self.frames.push(frame);
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Sum of all frame lengths
    pub fn total_samples(&self) -> usize {
        self.total_samples
    }

    pub fn frames(&self) -> &[EnhancedFrame] {
        &self.frames
    }

    /// Concatenate every frame in order
    pub fn concat(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.total_samples);
        for frame in &self.frames {
            out.extend_from_slice(&frame.samples);
        }
        out
    }
}

/// Result of a finalized session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub output_path: PathBuf,
    pub sample_rate: u32,
    pub frames: usize,
    pub samples: usize,
    pub duration_secs: f32,
    pub blocks_received: u64,
    pub samples_discarded: u64,
    /// Samples left in the accumulator that never filled a frame
    pub pending_samples: usize,
    pub elapsed_secs: f32,
}

/// Owns everything the processing loop touches
pub struct DenoiseSession {
    state: SessionState,
    sample_rate: u32,
    accumulator: FrameAccumulator,
    subtractor: SpectralSubtractor,
    output: OutputAccumulator,
    resampler: Option<AudioResampler>,
    blocks_received: u64,
    last_sequence: Option<u64>,
    started_at: Option<Instant>,
}

impl DenoiseSession {
    /// Create an idle session processing audio at `sample_rate`
    pub fn new(params: SubtractionParams, sample_rate: u32) -> Result<Self> {
        let subtractor = SpectralSubtractor::new(params)?;

        Ok(Self {
            state: SessionState::Idle,
            sample_rate,
            accumulator: FrameAccumulator::new(params.frame_length),
            subtractor,
            output: OutputAccumulator::new(),
            resampler: None,
            blocks_received: 0,
            last_sequence: None,
            started_at: None,
        })
    }

    /// Resample incoming blocks from `source_sample_rate` to the session rate
    pub fn with_input_rate(mut self, source_sample_rate: u32) -> Result<Self> {
        if source_sample_rate != self.sample_rate {
            self.resampler = Some(AudioResampler::new(source_sample_rate, self.sample_rate)?);
        }
        Ok(self)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn output(&self) -> &OutputAccumulator {
        &self.output
    }

    /// Samples waiting for the next frame
    pub fn pending_samples(&self) -> usize {
        self.accumulator.len()
    }

    pub fn blocks_received(&self) -> u64 {
        self.blocks_received
    }

    /// Idle -> Recording
    pub fn start(&mut self) -> Result<()> {
        self.transition(SessionState::Idle, SessionState::Recording)?;
        self.started_at = Some(Instant::now());
        info!("Session recording at {} Hz", self.sample_rate);
        Ok(())
    }

    /// Recording -> Stopping. Stopping twice is a no-op.
    pub fn stop(&mut self) -> Result<()> {
        if self.state == SessionState::Stopping {
            return Ok(());
        }
        self.transition(SessionState::Recording, SessionState::Stopping)?;
        info!(
            "Session stopping: {} frames, {} samples pending",
            self.output.len(),
            self.accumulator.len()
        );
        Ok(())
    }

    /// Accumulate one block; returns the enhanced frame length when a frame was produced
    pub fn process_block(&mut self, block: &AudioBlock) -> Result<Option<usize>> {
        if self.state != SessionState::Recording {
            return Err(SessionError::InvalidTransition {
                from: self.state.to_string(),
                to: "processing".to_string(),
            }
            .into());
        }

        if let Some(last) = self.last_sequence {
            if block.sequence() <= last {
                debug!(
                    "Block sequence went from {} to {}",
                    last,
                    block.sequence()
                );
            }
        }
        self.last_sequence = Some(block.sequence());
        self.blocks_received += 1;

        let resampled;
        let samples = match self.resampler.as_mut() {
            Some(resampler) => {
                resampled = resampler.process(block.samples())?;
                resampled.as_slice()
            }
            None => block.samples(),
        };

        let Some(frame) = self.accumulator.push(samples) else {
            return Ok(None);
        };

        let enhanced = self.subtractor.process(&frame)?;
        let len = enhanced.len();
        self.output.push(enhanced);

        debug!(
            "Frame {} enhanced ({} samples, block {})",
            self.output.len(),
            len,
            block.sequence()
        );
        Ok(Some(len))
    }

    /// Blocking processing loop. Pops blocks until `stop` is raised or the
    /// queue disconnects, then moves the session to `Stopping`. The flag is
    /// checked between iterations, never in the middle of a frame.
    pub fn run(&mut self, queue: &BlockReceiver, stop: &AtomicBool) -> Result<StopReason> {
        if self.state == SessionState::Idle {
            self.start()?;
        }

        let reason = loop {
            if stop.load(Ordering::SeqCst) {
                break StopReason::Interrupted;
            }

            match queue.pop_timeout(POLL_INTERVAL) {
                PopOutcome::Popped(block) => {
                    self.process_block(&block)?;
                    let backlog = queue.len();
                    if backlog > 0 {
                        debug!("Block queue backlog: {} blocks", backlog);
                    }
                }
                PopOutcome::Empty => continue,
                PopOutcome::Disconnected => break StopReason::QueueClosed,
            }
        };

        self.stop()?;
        Ok(reason)
    }

    /// Write every enhanced frame, in order, to `path` as a mono float WAV.
    /// Runs once; the session ends in `Saved`.
    pub fn finalize(&mut self, path: &Path) -> Result<SessionSummary> {
        match self.state {
            SessionState::Saved => return Err(SessionError::AlreadyFinalized.into()),
            SessionState::Recording => self.stop()?,
            SessionState::Idle => {
                return Err(SessionError::InvalidTransition {
                    from: self.state.to_string(),
                    to: SessionState::Saved.to_string(),
                }
                .into())
            }
            SessionState::Stopping => {}
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let frames = self.output.frames().iter().map(|f| f.samples.as_slice());
        write_mono_f32_chunks(path, frames, self.sample_rate)?;
        self.state = SessionState::Saved;

        let samples = self.output.total_samples();
        let summary = SessionSummary {
            output_path: path.to_path_buf(),
            sample_rate: self.sample_rate,
            frames: self.output.len(),
            samples,
            duration_secs: samples as f32 / self.sample_rate as f32,
            blocks_received: self.blocks_received,
            samples_discarded: self.accumulator.discarded(),
            pending_samples: self.accumulator.len(),
            elapsed_secs: self
                .started_at
                .map(|t| t.elapsed().as_secs_f32())
                .unwrap_or(0.0),
        };

        info!(
            "Enhanced audio saved at: {} ({} frames, {:.2}s)",
            path.display(),
            summary.frames,
            summary.duration_secs
        );
        Ok(summary)
    }

    fn transition(&mut self, from: SessionState, to: SessionState) -> Result<()> {
        if self.state != from {
            return Err(SessionError::InvalidTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            }
            .into());
        }
        self.state = to;
        Ok(())
    }
}
