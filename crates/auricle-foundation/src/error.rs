use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("no input device with {channels} channel(s)")]
    DeviceNotFound { channels: u16 },

    #[error("format not supported: {format}")]
    FormatNotSupported { format: String },

    #[error("device enumeration error: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("device name error: {0}")]
    DeviceName(#[from] cpal::DeviceNameError),

    #[error("supported stream configs error: {0}")]
    SupportedStreamConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("build stream error: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("play stream error: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("pause stream error: {0}")]
    PauseStream(#[from] cpal::PauseStreamError),

    #[error("fatal error, cannot recover: {0}")]
    Fatal(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("audio subsystem error: {0}")]
    Audio(#[from] AudioError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("worker error: {0}")]
    Worker(#[from] std::io::Error),

    #[error("signal handler error: {0}")]
    Signal(String),
}
