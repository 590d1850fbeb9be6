use auricle_foundation::AudioError;
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host, SampleFormat, SampleRate, StreamConfig};

/// Select the first input device exposing exactly `channels` input channels,
/// or the named device when a preference is given. Absence is fatal.
pub fn find_input_device(
    host: &Host,
    channels: u16,
    preferred: Option<&str>,
) -> Result<Device, AudioError> {
    let mut matching = None;

    for device in host.input_devices()? {
        let name = device.name().unwrap_or_else(|_| "<unknown>".to_string());
        let supported = supports_channels(&device, channels);
        tracing::info!(device = %name, matches = supported, "input device");

        if !supported {
            continue;
        }
        match preferred {
            Some(wanted) => {
                if name == wanted
                    || name.to_lowercase().contains(&wanted.to_lowercase())
                {
                    tracing::info!(device = %name, "using preferred input device");
                    return Ok(device);
                }
            }
            None => {
                if matching.is_none() {
                    tracing::info!(device = %name, "using input device");
                    matching = Some(device);
                }
            }
        }
    }

    matching.ok_or(AudioError::DeviceNotFound { channels })
}

fn supports_channels(device: &Device, channels: u16) -> bool {
    device
        .supported_input_configs()
        .map(|mut configs| configs.any(|range| range.channels() == channels))
        .unwrap_or(false)
}

/// Pick a stream config for the requested channel count and rate. Native
/// i16 is preferred; f32 is accepted and converted in the callback.
pub fn pick_stream_config(
    device: &Device,
    channels: u16,
    sample_rate_hz: u32,
) -> Result<(StreamConfig, SampleFormat), AudioError> {
    let rate = SampleRate(sample_rate_hz);
    let mut fallback = None;

    for range in device.supported_input_configs()? {
        if range.channels() != channels
            || rate < range.min_sample_rate()
            || rate > range.max_sample_rate()
        {
            continue;
        }
        match range.sample_format() {
            SampleFormat::I16 => {
                return Ok((stream_config(channels, rate), SampleFormat::I16));
            }
            SampleFormat::F32 if fallback.is_none() => {
                fallback = Some(SampleFormat::F32);
            }
            _ => {}
        }
    }

    match fallback {
        Some(format) => Ok((stream_config(channels, rate), format)),
        None => Err(AudioError::FormatNotSupported {
            format: format!("{channels} ch i16/f32 @ {sample_rate_hz} Hz"),
        }),
    }
}

fn stream_config(channels: u16, sample_rate: SampleRate) -> StreamConfig {
    StreamConfig {
        channels,
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    }
}
