use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::SampleBlock;

/// Single-producer/single-consumer block FIFO bridging the backend callback
/// to the pull-based consumer. Unbounded: if the consumer falls behind, the
/// queue grows instead of dropping blocks.
pub fn block_channel() -> (BlockSender, BlockReceiver) {
    let (tx, rx) = unbounded();
    (BlockSender { tx }, BlockReceiver { rx })
}

#[derive(Clone)]
pub struct BlockSender {
    tx: Sender<SampleBlock>,
}

impl BlockSender {
    /// Enqueue a block without blocking. Returns false when the receiving
    /// side is gone.
    pub fn send(&self, block: SampleBlock) -> bool {
        self.tx.send(block).is_ok()
    }

    /// Enqueue the end-of-stream sentinel. A consumer blocked on an empty
    /// queue wakes up and terminates.
    pub fn close(&self) -> bool {
        self.tx.send(SampleBlock::sentinel()).is_ok()
    }
}

pub struct BlockReceiver {
    rx: Receiver<SampleBlock>,
}

impl BlockReceiver {
    /// Discard everything currently queued. Used at stream start to clear
    /// stale blocks.
    pub fn drain(&self) {
        while self.rx.try_recv().is_ok() {}
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Blocking pull iterator over captured blocks. Ends at the sentinel (or
    /// when every sender is gone) and yields nothing afterwards.
    pub fn iter(&self) -> BlockIter<'_> {
        BlockIter {
            rx: &self.rx,
            done: false,
        }
    }
}

pub struct BlockIter<'a> {
    rx: &'a Receiver<SampleBlock>,
    done: bool,
}

impl Iterator for BlockIter<'_> {
    type Item = SampleBlock;

    fn next(&mut self) -> Option<SampleBlock> {
        if self.done {
            return None;
        }
        match self.rx.recv() {
            Ok(block) if block.is_sentinel() => {
                self.done = true;
                None
            }
            Ok(block) => Some(block),
            Err(_) => {
                self.done = true;
                None
            }
        }
    }
}
