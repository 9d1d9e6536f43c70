//! Audio capture module using cpal

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, SampleRate, Stream, StreamConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::audio::queue::{AudioBlock, BlockSender, PushOutcome};
use crate::config::AudioConfig;
use crate::error::{AudioError, Result};

/// Counters shared between the capture callbacks and the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub blocks_captured: u64,
    pub blocks_dropped: u64,
    pub stream_faults: u64,
    pub last_fault: Option<String>,
}

/// Splits arbitrary callback buffers into blocks of exactly `block_size` samples
pub struct BlockChunker {
    block_size: usize,
    channels: usize,
    carry: Vec<f32>,
    next_sequence: u64,
}

impl BlockChunker {
    pub fn new(block_size: usize, channels: u16) -> Self {
        Self {
            block_size,
            channels: channels.max(1) as usize,
            carry: Vec::with_capacity(block_size),
            next_sequence: 0,
        }
    }

    /// Downmix interleaved `data` to mono and return every completed block
    pub fn feed(&mut self, data: &[f32]) -> Vec<AudioBlock> {
        if self.channels > 1 {
            let channels = self.channels;
            self.carry.extend(
                data.chunks(channels)
                    .map(|chunk| chunk.iter().sum::<f32>() / channels as f32),
            );
        } else {
            self.carry.extend_from_slice(data);
        }

        let mut blocks = Vec::new();
        while self.carry.len() >= self.block_size {
            let rest = self.carry.split_off(self.block_size);
            let samples = std::mem::replace(&mut self.carry, rest);
            blocks.push(AudioBlock::new(self.next_sequence, samples));
            self.next_sequence += 1;
        }
        blocks
    }

    /// Samples waiting for the next block
    pub fn pending(&self) -> usize {
        self.carry.len()
    }
}

/// Audio capture handle
pub struct AudioCapture {
    config: AudioConfig,
    host: Host,
    device: Option<Device>,
    stream: Option<Stream>,
    is_running: Arc<AtomicBool>,
    stats: Arc<Mutex<CaptureStats>>,
    actual_sample_rate: u32,
}

impl AudioCapture {
    /// Create a new audio capture instance
    pub fn new(config: AudioConfig) -> Result<Self> {
        let host = cpal::default_host();

        Ok(Self {
            config,
            host,
            device: None,
            stream: None,
            is_running: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(Mutex::new(CaptureStats::default())),
            actual_sample_rate: 0,
        })
    }

    /// List available audio input devices
    pub fn list_devices(&self) -> Result<Vec<String>> {
        let devices = self
            .host
            .input_devices()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;

        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Initialize the audio capture device
    pub fn init(&mut self) -> Result<()> {
        let device = if let Some(ref device_name) = self.config.device {
            self.find_device_by_name(device_name)?
        } else {
            self.host
                .default_input_device()
                .ok_or(AudioError::NoInputDevice)?
        };

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Using audio input device: {}", device_name);

        let supported_configs = device
            .supported_input_configs()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;

        let mut best_config = None;
        for cfg in supported_configs {
            debug!(
                "Supported config: channels={}, sample_rate={:?}-{:?}, format={:?}",
                cfg.channels(),
                cfg.min_sample_rate(),
                cfg.max_sample_rate(),
                cfg.sample_format()
            );

            if cfg.sample_format() != cpal::SampleFormat::F32 {
                continue;
            }

            if cfg.channels() == self.config.channels {
                let target_rate = SampleRate(self.config.sample_rate);
                if cfg.min_sample_rate() <= target_rate && target_rate <= cfg.max_sample_rate() {
                    best_config = Some(cfg.with_sample_rate(target_rate));
                } else {
                    // Processing side resamples
                    best_config = Some(cfg.with_max_sample_rate());
                }
                break;
            }
            if best_config.is_none() {
                best_config = Some(cfg.with_max_sample_rate());
            }
        }

        let supported_config = best_config.ok_or_else(|| {
            AudioError::UnsupportedFormat("No f32 input configuration found".to_string())
        })?;

        self.actual_sample_rate = supported_config.sample_rate().0;
        self.config.channels = supported_config.channels();
        info!(
            "Audio config: {} channels @ {} Hz (target: {} Hz), block size {}",
            supported_config.channels(),
            self.actual_sample_rate,
            self.config.sample_rate,
            self.config.block_size
        );

        self.device = Some(device);
        Ok(())
    }

    /// Get the actual sample rate of the capture device
    pub fn actual_sample_rate(&self) -> u32 {
        self.actual_sample_rate
    }

    /// Device buffer size is left to the backend; `BlockChunker` sets the block size
    fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            channels: self.config.channels,
            sample_rate: SampleRate(self.actual_sample_rate),
            buffer_size: cpal::BufferSize::Default,
        }
    }

    /// Start capturing audio into `queue`
    pub fn start(&mut self, queue: BlockSender) -> Result<()> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| AudioError::DeviceConfig("Device not initialized".to_string()))?;

        let config = self.stream_config();

        let is_running = self.is_running.clone();
        let data_stats = self.stats.clone();
        let fault_stats = self.stats.clone();
        let mut chunker = BlockChunker::new(self.config.block_size as usize, self.config.channels);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !is_running.load(Ordering::Relaxed) {
                        return;
                    }

                    for block in chunker.feed(data) {
                        let outcome = queue.push(block);
                        let mut stats = data_stats.lock();
                        match outcome {
                            PushOutcome::Queued => stats.blocks_captured += 1,
                            PushOutcome::Dropped => {
                                stats.blocks_dropped += 1;
                                warn!("Block queue full - dropping samples");
                            }
                            PushOutcome::Disconnected => {}
                        }
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    let mut stats = fault_stats.lock();
                    stats.stream_faults += 1;
                    stats.last_fault = Some(err.to_string());
                },
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamPlay(e.to_string()))?;

        self.is_running.store(true, Ordering::Relaxed);
        self.stream = Some(stream);

        info!("Audio capture started");
        Ok(())
    }

    /// Stop capturing audio
    pub fn stop(&mut self) {
        self.is_running.store(false, Ordering::Relaxed);
        if self.stream.take().is_some() {
            info!("Audio capture stopped");
        }
    }

    /// Check if capture is running
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    /// Snapshot of the capture counters
    pub fn stats(&self) -> CaptureStats {
        self.stats.lock().clone()
    }

    fn find_device_by_name(&self, name: &str) -> Result<Device> {
        let devices = self
            .host
            .input_devices()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;

        for device in devices {
            if let Ok(device_name) = device.name() {
                if device_name.contains(name) {
                    return Ok(device);
                }
            }
        }

        Err(AudioError::DeviceNotFound(name.to_string()).into())
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
