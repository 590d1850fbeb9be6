use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::device;
use crate::queue::{block_channel, BlockIter, BlockReceiver, BlockSender};
use crate::SampleBlock;
use auricle_doa::ArrayTopology;
use auricle_foundation::AudioError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub sample_rate_hz: u32,
    pub block_frames: usize,
    pub device: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 16_000,
            // 10 ms at the default rate
            block_frames: 160,
            device: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct CaptureStats {
    pub blocks_captured: AtomicU64,
    pub blocks_dropped: AtomicU64,
    pub last_block_time: RwLock<Option<Instant>>,
}

/// One open hardware input stream for a microphone array.
///
/// The backend callback is the sole producer: it re-chunks incoming sample
/// runs into exact `block_frames`-sized blocks and appends them to the
/// unbounded FIFO, nothing more. The caller is the sole consumer, pulling
/// through `blocks()`. Dropping the session stops the stream and injects the
/// queue sentinel so a blocked consumer always terminates.
pub struct MicArrayCapture {
    stream: Option<Stream>,
    sender: BlockSender,
    receiver: BlockReceiver,
    running: Arc<AtomicBool>,
    sentinel_sent: Arc<AtomicBool>,
    stats: Arc<CaptureStats>,
    topology: ArrayTopology,
    sample_rate: u32,
    block_frames: usize,
    device_name: String,
}

impl MicArrayCapture {
    pub fn open(topology: ArrayTopology, config: &CaptureConfig) -> Result<Self, AudioError> {
        if config.block_frames == 0 {
            return Err(AudioError::Fatal("block frames must be positive".into()));
        }
        let channels = topology.channels();

        let host = cpal::default_host();
        let device = device::find_input_device(&host, channels, config.device.as_deref())?;
        let device_name = device.name().unwrap_or_else(|_| "<unknown>".to_string());
        let (stream_config, sample_format) =
            device::pick_stream_config(&device, channels, config.sample_rate_hz)?;

        let (sender, receiver) = block_channel();
        let running = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(CaptureStats::default());

        let assembler = BlockAssembler::new(
            config.block_frames * channels as usize,
            channels,
            config.sample_rate_hz,
            sender.clone(),
            Arc::clone(&stats),
            Arc::clone(&running),
        );
        let stream = build_input_stream(&device, &stream_config, sample_format, assembler)?;
        // Streams may come up playing; hold until start().
        stream.pause()?;

        tracing::info!(
            device = %device_name,
            channels,
            sample_rate_hz = config.sample_rate_hz,
            block_frames = config.block_frames,
            format = ?sample_format,
            "capture session open"
        );

        Ok(Self {
            stream: Some(stream),
            sender,
            receiver,
            running,
            sentinel_sent: Arc::new(AtomicBool::new(false)),
            stats,
            topology,
            sample_rate: config.sample_rate_hz,
            block_frames: config.block_frames,
            device_name,
        })
    }

    /// Clear stale queued blocks and begin the hardware stream.
    pub fn start(&mut self) -> Result<(), AudioError> {
        self.receiver.drain();
        self.running.store(true, Ordering::SeqCst);
        if let Some(stream) = &self.stream {
            stream.play()?;
        }
        tracing::info!(device = %self.device_name, "capture stream started");
        Ok(())
    }

    /// Blocking pull iterator over captured blocks; ends after `stop()` once
    /// the queued backlog and the sentinel have been consumed.
    pub fn blocks(&self) -> BlockIter<'_> {
        self.receiver.iter()
    }

    /// Halt the hardware stream and enqueue exactly one sentinel. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(stream) = self.stream.take() {
            drop(stream);
        }
        if !self.sentinel_sent.swap(true, Ordering::SeqCst) {
            self.sender.close();
            tracing::info!(device = %self.device_name, "capture stream stopped");
        }
    }

    /// Handle that injects the sentinel from another thread, so a consumer
    /// blocked on an empty queue can always be released. The stream itself
    /// is torn down by `stop()`/`Drop` on the owning thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
            sender: self.sender.clone(),
            sentinel_sent: Arc::clone(&self.sentinel_sent),
        }
    }

    pub fn stats(&self) -> Arc<CaptureStats> {
        Arc::clone(&self.stats)
    }

    pub fn topology(&self) -> ArrayTopology {
        self.topology
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn block_frames(&self) -> usize {
        self.block_frames
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl Drop for MicArrayCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
    sender: BlockSender,
    sentinel_sent: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if !self.sentinel_sent.swap(true, Ordering::SeqCst) {
            self.sender.close();
        }
    }
}

/// Callback-side re-chunker. cpal does not guarantee buffers of exactly the
/// requested size, so incoming runs accumulate and leave in exact
/// block-sized pieces; the remainder carries over to the next callback.
struct BlockAssembler {
    pending: Vec<i16>,
    block_samples: usize,
    channels: u16,
    sample_rate: u32,
    sender: BlockSender,
    stats: Arc<CaptureStats>,
    running: Arc<AtomicBool>,
}

impl BlockAssembler {
    fn new(
        block_samples: usize,
        channels: u16,
        sample_rate: u32,
        sender: BlockSender,
        stats: Arc<CaptureStats>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            pending: Vec::with_capacity(block_samples * 2),
            block_samples,
            channels,
            sample_rate,
            sender,
            stats,
            running,
        }
    }

    fn push_samples(&mut self, data: &[i16]) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        self.pending.extend_from_slice(data);
        while self.pending.len() >= self.block_samples {
            let rest = self.pending.split_off(self.block_samples);
            let samples = std::mem::replace(&mut self.pending, rest);
            let block = SampleBlock {
                samples,
                channels: self.channels,
                sample_rate: self.sample_rate,
                timestamp: Instant::now(),
            };
            if self.sender.send(block) {
                self.stats.blocks_captured.fetch_add(1, Ordering::Relaxed);
            } else {
                self.stats.blocks_dropped.fetch_add(1, Ordering::Relaxed);
            }
            *self.stats.last_block_time.write() = Some(Instant::now());
        }
    }
}

fn build_input_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
    mut assembler: BlockAssembler,
) -> Result<Stream, AudioError> {
    let err_fn = |err: cpal::StreamError| {
        // Post-start stream faults are fatal and unrecovered.
        tracing::error!("audio stream error: {}", err);
    };

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                assembler.push_samples(data);
            },
            err_fn,
            None,
        )?,
        SampleFormat::F32 => {
            let mut converted: Vec<i16> = Vec::new();
            device.build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    converted.clear();
                    converted.reserve(data.len());
                    for &s in data {
                        converted.push((s.clamp(-1.0, 1.0) * 32767.0).round() as i16);
                    }
                    assembler.push_samples(&converted);
                },
                err_fn,
                None,
            )?
        }
        other => {
            return Err(AudioError::FormatNotSupported {
                format: format!("{:?}", other),
            });
        }
    };

    Ok(stream)
}
