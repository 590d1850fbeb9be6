use serde::{Deserialize, Serialize};

use crate::SpeechDetector;

/// Root-mean-square level of a frame, normalized to [0, 1].
pub fn rms(frame: &[i16]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_squares: i64 = frame
        .iter()
        .map(|&sample| {
            let s = sample as i64;
            s * s
        })
        .sum();
    let mean_square = sum_squares as f64 / frame.len() as f64;
    (mean_square.sqrt() / 32768.0) as f32
}

/// Frame level in dBFS, floored at -100 for silence.
pub fn dbfs(frame: &[i16]) -> f32 {
    let level = rms(frame);
    if level <= 1e-10 {
        return -100.0;
    }
    20.0 * level.log10()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyConfig {
    /// Frames at or above this level count as speech.
    pub onset_dbfs: f32,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self { onset_dbfs: -40.0 }
    }
}

/// Energy-threshold speech detector. A stand-in for a real VAD model: frames
/// whose level reaches the onset threshold count as active.
pub struct EnergySpeechDetector {
    config: EnergyConfig,
}

impl EnergySpeechDetector {
    pub fn new(config: EnergyConfig) -> Self {
        Self { config }
    }
}

impl SpeechDetector for EnergySpeechDetector {
    fn is_speech(&mut self, mono: &[i16], _sample_rate: u32) -> bool {
        dbfs(mono) >= self.config.onset_dbfs
    }
}
