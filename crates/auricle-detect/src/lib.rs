pub mod energy;

pub use energy::{dbfs, rms, EnergyConfig, EnergySpeechDetector};

/// Keyword-spotting collaborator. Fed the reference channel of each captured
/// block; a positive score is the trigger event for the sliding window.
pub trait KeywordSpotter: Send {
    fn run_detection(&mut self, mono: &[i16]) -> f32;
}

/// Voice-activity collaborator. Classifies a single-channel block; feeds the
/// epoch-gated window's active counter.
pub trait SpeechDetector: Send {
    fn is_speech(&mut self, mono: &[i16], sample_rate: u32) -> bool;
}
