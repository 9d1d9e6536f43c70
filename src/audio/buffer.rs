//! Frame accumulation for the streaming denoiser

use tracing::debug;

/// Collects incoming blocks until one analysis frame is available.
///
/// When the buffer reaches `frame_length` samples the first `frame_length`
/// samples are handed out and the buffer is reset to empty. Any surplus
/// beyond the frame is discarded, so consecutive frames never overlap.
#[derive(Debug)]
pub struct FrameAccumulator {
    buffer: Vec<f32>,
    frame_length: usize,
    discarded: u64,
}

impl FrameAccumulator {
    /// Create an accumulator for frames of `frame_length` samples
    pub fn new(frame_length: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(frame_length),
            frame_length,
            discarded: 0,
        }
    }

    /// Append samples and return a full frame if one is ready
    pub fn push(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        self.buffer.extend_from_slice(samples);

        if self.buffer.len() < self.frame_length {
            return None;
        }

        let surplus = self.buffer.len() - self.frame_length;
        if surplus > 0 {
            debug!("Discarding {} samples beyond frame boundary", surplus);
            self.discarded += surplus as u64;
        }

        self.buffer.truncate(self.frame_length);
        let frame = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.frame_length));
        Some(frame)
    }

    /// Whether a frame would be produced without more input
    pub fn has_frame(&self) -> bool {
        self.buffer.len() >= self.frame_length
    }

    /// Take whatever is buffered (shorter than a frame)
    pub fn flush(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.buffer)
    }

    /// Number of samples currently buffered
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    /// Total samples dropped at frame boundaries so far
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waits_for_full_frame() {
        let mut acc = FrameAccumulator::new(8);

        assert!(acc.push(&[1.0, 2.0, 3.0]).is_none());
        assert_eq!(acc.len(), 3);
        assert!(acc.push(&[4.0, 5.0, 6.0, 7.0]).is_none());
        assert!(!acc.has_frame());

        let frame = acc.push(&[8.0]).unwrap();
        assert_eq!(frame, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert!(acc.is_empty());
        assert_eq!(acc.discarded(), 0);
    }

    #[test]
    fn test_surplus_is_discarded() {
        let mut acc = FrameAccumulator::new(4);

        let frame = acc.push(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(frame, vec![0.0, 1.0, 2.0, 3.0]);
        assert!(acc.is_empty());
        assert_eq!(acc.discarded(), 2);

        // Next frame starts fresh
        assert!(acc.push(&[9.0]).is_none());
        assert_eq!(acc.flush(), vec![9.0]);
        assert!(acc.is_empty());
    }

    #[test]
    fn test_block_aligned_frames() {
        // 1024-sample blocks into 2048-sample frames: every second block completes a frame
        let mut acc = FrameAccumulator::new(2048);
        let block = vec![0.25; 1024];

        let mut frames = 0;
        for i in 0..6 {
            if let Some(frame) = acc.push(&block) {
                assert_eq!(frame.len(), 2048);
                assert_eq!(i % 2, 1);
                frames += 1;
            }
        }
        assert_eq!(frames, 3);
        assert_eq!(acc.discarded(), 0);
    }

    #[test]
    fn test_clear() {
        let mut acc = FrameAccumulator::new(16);
        acc.push(&[1.0; 10]);
        acc.clear();
        assert!(acc.is_empty());
        assert_eq!(acc.frame_length(), 16);
    }
}
