//! FIFO handoff between the capture callback and the processing loop

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::time::Duration;

/// Audio sample type alias
pub type AudioSample = f32;

/// One fixed-size chunk of mono samples delivered by the capture side
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBlock {
    sequence: u64,
    samples: Box<[AudioSample]>,
}

impl AudioBlock {
    pub fn new(sequence: u64, samples: Vec<AudioSample>) -> Self {
        Self {
            sequence,
            samples: samples.into_boxed_slice(),
        }
    }

    /// Capture order of this block
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn samples(&self) -> &[AudioSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Result of pushing a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// Bounded queue was full; the block was discarded
    Dropped,
    /// The processing side is gone
    Disconnected,
}

/// Result of a timed pop
#[derive(Debug, Clone, PartialEq)]
pub enum PopOutcome {
    Popped(AudioBlock),
    Empty,
    Disconnected,
}

/// Producer half, held by the capture callback
#[derive(Clone)]
pub struct BlockSender {
    inner: Sender<AudioBlock>,
}

impl BlockSender {
    /// Push a block without blocking the caller
    pub fn push(&self, block: AudioBlock) -> PushOutcome {
        match self.inner.try_send(block) {
            Ok(()) => PushOutcome::Queued,
            Err(TrySendError::Full(_)) => PushOutcome::Dropped,
            Err(TrySendError::Disconnected(_)) => PushOutcome::Disconnected,
        }
    }
}

/// Consumer half, owned by the processing loop
#[derive(Clone)]
pub struct BlockReceiver {
    inner: Receiver<AudioBlock>,
}

impl BlockReceiver {
    /// Block until a block arrives; `None` once every sender is dropped and the queue is drained
    pub fn pop(&self) -> Option<AudioBlock> {
        self.inner.recv().ok()
    }

    pub fn pop_timeout(&self, timeout: Duration) -> PopOutcome {
        match self.inner.recv_timeout(timeout) {
            Ok(block) => PopOutcome::Popped(block),
            Err(RecvTimeoutError::Timeout) => PopOutcome::Empty,
            Err(RecvTimeoutError::Disconnected) => PopOutcome::Disconnected,
        }
    }

    pub fn try_pop(&self) -> Option<AudioBlock> {
        self.inner.try_recv().ok()
    }

    /// Number of blocks waiting to be processed
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Create a block queue. `None` gives an unbounded queue where nothing is ever dropped.
pub fn block_queue(capacity: Option<usize>) -> (BlockSender, BlockReceiver) {
    let (tx, rx) = match capacity {
        Some(n) => bounded(n),
        None => unbounded(),
    };
    (BlockSender { inner: tx }, BlockReceiver { inner: rx })
}
