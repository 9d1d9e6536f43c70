//! Audio capture, framing, spectral processing and file I/O

pub mod buffer;
pub mod capture;
pub mod queue;
pub mod resample;
pub mod session;
pub mod spectral;
pub mod stft;
pub mod wav;

pub use buffer::FrameAccumulator;
pub use capture::{AudioCapture, BlockChunker, CaptureStats};
pub use queue::{
    block_queue, AudioBlock, AudioSample, BlockReceiver, BlockSender, PopOutcome, PushOutcome,
};
pub use resample::{resample, AudioResampler};
pub use session::{DenoiseSession, OutputAccumulator, SessionState, SessionSummary, StopReason};
pub use spectral::{EnhancedFrame, SpectralSubtractor, SubtractionParams};
pub use stft::{Spectrogram, Stft};
pub use wav::{read_wav, write_mono_f32, write_mono_f32_chunks, AudioClip};
