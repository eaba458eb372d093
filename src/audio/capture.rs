//! Microphone capture for push-to-talk turns.
//!
//! The input stream lives inside [`AudioCapture`]; dropping it stops the
//! stream and releases the device. [`record_clip`] keeps the whole capture
//! inside one blocking task, so the device is released on every path out of
//! it: normal stop, device error or encoding error.

use std::io::Cursor;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::HeapRb;
use tracing::{error, info};

use crate::error::CaptureError;
use crate::services::ports::AudioClip;

/// Rates tried in order. 16 kHz is plenty for speech and keeps uploads small.
const PREFERRED_RATES: [u32; 4] = [16000, 32000, 48000, 8000];
pub const MAX_RECORDING: Duration = Duration::from_secs(60);

fn device_error(e: impl std::fmt::Display) -> CaptureError {
    CaptureError::Device(e.to_string())
}

/// The default input device and the stream config chosen for it.
pub struct InputDevice {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
    pub sample_rate: u32,
    pub channels: u16,
}

impl InputDevice {
    pub fn default_input() -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoInputDevice)?;

        info!("Audio Input Device: {}", device.name().unwrap_or_default());

        let mut selected = None;
        for &rate in &PREFERRED_RATES {
            let configs = device.supported_input_configs().map_err(device_error)?;
            for range in configs {
                if range.min_sample_rate().0 <= rate && range.max_sample_rate().0 >= rate {
                    selected = Some(range.with_sample_rate(cpal::SampleRate(rate)));
                    break;
                }
            }
            if selected.is_some() {
                break;
            }
        }

        let config = match selected {
            Some(c) => c,
            None => device.default_input_config().map_err(device_error)?,
        };
        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        info!("Audio Config Selected: Rate={}Hz, Channels={}", sample_rate, channels);

        Ok(Self {
            device,
            config,
            sample_rate,
            channels,
        })
    }
}

/// A running input stream writing mono samples into a ring buffer.
pub struct AudioCapture {
    _stream: cpal::Stream,
    pub sample_rate: u32,
}

impl AudioCapture {
    pub fn start<P>(input: InputDevice, mut producer: P) -> Result<Self, CaptureError>
    where
        P: Producer<Item = f32> + Send + 'static,
    {
        let channels = usize::from(input.channels.max(1));
        let err_fn = |err| error!("an error occurred on stream: {}", err);

        let stream = match input.config.sample_format() {
            cpal::SampleFormat::F32 => input
                .device
                .build_input_stream(
                    &input.config.clone().into(),
                    move |data: &[f32], _: &_| write_input_data(data, channels, &mut producer),
                    err_fn,
                    None,
                )
                .map_err(device_error)?,
            cpal::SampleFormat::I16 => input
                .device
                .build_input_stream(
                    &input.config.clone().into(),
                    move |data: &[i16], _: &_| write_input_data_i16(data, channels, &mut producer),
                    err_fn,
                    None,
                )
                .map_err(device_error)?,
            other => return Err(CaptureError::UnsupportedFormat(format!("{:?}", other))),
        };

        stream.play().map_err(device_error)?;

        Ok(Self {
            _stream: stream,
            sample_rate: input.sample_rate,
        })
    }
}

// Only the first channel is kept. When the buffer is full, samples are dropped.
fn write_input_data<P>(input: &[f32], channels: usize, producer: &mut P)
where
    P: Producer<Item = f32>,
{
    for frame in input.chunks(channels) {
        if producer.try_push(frame[0]).is_err() {
            break;
        }
    }
}

fn write_input_data_i16<P>(input: &[i16], channels: usize, producer: &mut P)
where
    P: Producer<Item = f32>,
{
    for frame in input.chunks(channels) {
        let sample = frame[0] as f32 / i16::MAX as f32;
        if producer.try_push(sample).is_err() {
            break;
        }
    }
}

/// 16-bit mono PCM WAV in memory.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, CaptureError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

fn record_blocking(duration: Duration) -> Result<AudioClip, CaptureError> {
    let input = InputDevice::default_input()?;
    let capacity = (input.sample_rate as usize) * (duration.as_secs() as usize + 1);
    let (producer, mut consumer) = HeapRb::<f32>::new(capacity.max(1)).split();

    let capture = AudioCapture::start(input, producer)?;
    let sample_rate = capture.sample_rate;
    std::thread::sleep(duration);
    drop(capture);

    let samples: Vec<f32> = consumer.pop_iter().collect();
    info!("captured {} samples at {}Hz", samples.len(), sample_rate);
    Ok(AudioClip::wav(encode_wav(&samples, sample_rate)?))
}

/// Records from the default microphone for `duration` (capped at
/// [`MAX_RECORDING`]) and returns a WAV clip.
pub async fn record_clip(duration: Duration) -> Result<AudioClip, CaptureError> {
    let duration = duration.min(MAX_RECORDING);
    tokio::task::spawn_blocking(move || record_blocking(duration)).await?
}
