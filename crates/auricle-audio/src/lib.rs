pub mod capture;
pub mod device;
pub mod queue;
pub mod window;

pub use capture::{CaptureConfig, CaptureStats, MicArrayCapture, StopHandle};
pub use queue::{block_channel, BlockIter, BlockReceiver, BlockSender};
pub use window::{EpochWindow, SlidingWindow};

use std::time::Instant;

/// One block of interleaved 16-bit samples as captured from the array.
/// Immutable once produced; ownership moves from the capture queue to the
/// consumer. An empty block is the queue's end-of-stream sentinel and never
/// reaches consumer code.
#[derive(Debug, Clone)]
pub struct SampleBlock {
    pub samples: Vec<i16>,
    pub channels: u16,
    pub sample_rate: u32,
    pub timestamp: Instant,
}

impl SampleBlock {
    pub(crate) fn sentinel() -> Self {
        Self {
            samples: Vec::new(),
            channels: 0,
            sample_rate: 0,
            timestamp: Instant::now(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.samples.is_empty()
    }

    /// Frames in the block (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }
}
