use std::collections::VecDeque;

use crate::SampleBlock;

/// Bounded history of the most recent blocks, flushed on an external trigger
/// (a positive keyword score). The history keeps accumulating after a flush;
/// nothing is reset.
pub struct SlidingWindow {
    blocks: VecDeque<SampleBlock>,
    capacity: usize,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            blocks: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a block, evicting the oldest when the history is full.
    pub fn push(&mut self, block: SampleBlock) {
        if self.blocks.len() == self.capacity {
            self.blocks.pop_front();
        }
        self.blocks.push_back(block);
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Concatenate the buffered history oldest-to-newest into one interleaved
    /// buffer, preserving channel order.
    pub fn concat(&self) -> Vec<i16> {
        let total: usize = self.blocks.iter().map(|b| b.samples.len()).sum();
        let mut out = Vec::with_capacity(total);
        for block in &self.blocks {
            out.extend_from_slice(&block.samples);
        }
        out
    }
}

/// Fixed-size epoch of consecutive blocks with an activity count. At the end
/// of each epoch the concatenated buffer is emitted iff enough blocks were
/// classified active; buffer and counter reset either way.
pub struct EpochWindow {
    blocks: Vec<SampleBlock>,
    epoch_len: usize,
    active_threshold: usize,
    active_count: usize,
}

impl EpochWindow {
    pub fn new(epoch_len: usize, active_threshold: usize) -> Self {
        let epoch_len = epoch_len.max(1);
        Self {
            blocks: Vec::with_capacity(epoch_len),
            epoch_len,
            active_threshold,
            active_count: 0,
        }
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Accumulate one classified block. Returns the concatenated epoch at
    /// every Nth block when the activity count clears the threshold.
    pub fn push(&mut self, block: SampleBlock, is_active: bool) -> Option<Vec<i16>> {
        if is_active {
            self.active_count += 1;
        }
        self.blocks.push(block);

        if self.blocks.len() < self.epoch_len {
            return None;
        }

        let emit = self.active_count > self.active_threshold;
        tracing::trace!(
            active = self.active_count,
            threshold = self.active_threshold,
            emit,
            "epoch boundary"
        );
        let out = if emit {
            let total: usize = self.blocks.iter().map(|b| b.samples.len()).sum();
            let mut buf = Vec::with_capacity(total);
            for block in &self.blocks {
                buf.extend_from_slice(&block.samples);
            }
            Some(buf)
        } else {
            None
        };

        self.blocks.clear();
        self.active_count = 0;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn block(tag: i16, samples: usize) -> SampleBlock {
        SampleBlock {
            samples: vec![tag; samples],
            channels: 2,
            sample_rate: 16_000,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn sliding_window_never_exceeds_capacity() {
        let mut window = SlidingWindow::new(3);
        for tag in 0..10 {
            window.push(block(tag, 4));
            assert!(window.len() <= 3);
        }
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn sliding_window_concat_keeps_temporal_order() {
        let mut window = SlidingWindow::new(3);
        for tag in 0..5 {
            window.push(block(tag, 2));
        }
        // Oldest two evicted; remaining history is blocks 2, 3, 4.
        assert_eq!(window.concat(), vec![2, 2, 3, 3, 4, 4]);
    }

    #[test]
    fn sliding_window_keeps_accumulating_after_concat() {
        let mut window = SlidingWindow::new(2);
        window.push(block(1, 2));
        window.push(block(2, 2));
        let first = window.concat();
        assert_eq!(first, vec![1, 1, 2, 2]);

        window.push(block(3, 2));
        assert_eq!(window.concat(), vec![2, 2, 3, 3]);
    }

    #[test]
    fn sliding_window_concat_preserves_interleaving() {
        let mut window = SlidingWindow::new(2);
        window.push(SampleBlock {
            samples: vec![10, 20, 11, 21],
            channels: 2,
            sample_rate: 16_000,
            timestamp: Instant::now(),
        });
        window.push(SampleBlock {
            samples: vec![12, 22, 13, 23],
            channels: 2,
            sample_rate: 16_000,
            timestamp: Instant::now(),
        });
        assert_eq!(window.concat(), vec![10, 20, 11, 21, 12, 22, 13, 23]);
    }

    #[test]
    fn epoch_emits_only_past_threshold() {
        let mut window = EpochWindow::new(4, 2);

        // Epoch 1: two active blocks, not past the strict threshold.
        assert_eq!(window.push(block(1, 2), true), None);
        assert_eq!(window.push(block(2, 2), true), None);
        assert_eq!(window.push(block(3, 2), false), None);
        assert_eq!(window.push(block(4, 2), false), None);

        // Epoch 2: three active blocks clears it.
        assert_eq!(window.push(block(5, 2), true), None);
        assert_eq!(window.push(block(6, 2), true), None);
        assert_eq!(window.push(block(7, 2), true), None);
        let epoch = window.push(block(8, 2), false);
        assert_eq!(epoch, Some(vec![5, 5, 6, 6, 7, 7, 8, 8]));
    }

    #[test]
    fn epoch_resets_counter_and_buffer_every_cycle() {
        let mut window = EpochWindow::new(2, 0);

        assert_eq!(window.push(block(1, 2), true), None);
        assert!(window.push(block(2, 2), false).is_some());
        assert_eq!(window.len(), 0);
        assert_eq!(window.active_count(), 0);

        // A silent epoch resets too, even though nothing is emitted.
        assert_eq!(window.push(block(3, 2), false), None);
        assert_eq!(window.push(block(4, 2), false), None);
        assert_eq!(window.len(), 0);
        assert_eq!(window.active_count(), 0);

        // The next epoch starts clean.
        assert_eq!(window.push(block(5, 2), true), None);
        assert_eq!(window.push(block(6, 2), false), Some(vec![5, 5, 6, 6]));
    }

    #[test]
    fn epoch_emission_happens_exactly_at_the_boundary() {
        let mut window = EpochWindow::new(3, 0);
        assert_eq!(window.push(block(1, 2), true), None);
        assert_eq!(window.push(block(2, 2), true), None);
        assert!(window.push(block(3, 2), true).is_some());
    }
}
