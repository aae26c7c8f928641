// Audio engine - CPAL output stream and click playback
//
// The callback drains pending commands, then renders the active click
// (if any) into the output buffer at the shared volume. All click
// buffers are rendered up front; the callback never allocates.
//
// The stream is built for the device's preferred sample format (F32
// native, I16/U16 via `FromSample<f32>`): internally everything is f32
// and conversion happens when writing the output frame.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::audio::click::{ClickBank, ClickType, SoundType};
use crate::engine::scheduler::{BeatSink, SinkError};
use crate::messaging::channels::{
    CommandConsumer, CommandProducer, SharedNotificationProducer, notify,
};
use crate::messaging::command::Command;
use crate::messaging::notification::{Notification, NotificationCategory};

/// Audio engine construction errors
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no audio output device found")]
    NoOutputDevice,
    #[error("failed to query the output configuration: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build the output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("failed to start the output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
    #[error("unsupported sample format: {0:?}")]
    UnsupportedFormat(SampleFormat),
}

/// Thread-safe f32 parameter shared between the UI and the audio
/// callback, stored as raw bits in an atomic u32
#[derive(Clone, Debug)]
pub struct AtomicF32 {
    inner: Arc<AtomicU32>,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            inner: Arc::new(AtomicU32::new(value.to_bits())),
        }
    }

    /// Set the value (UI thread)
    pub fn set(&self, value: f32) {
        self.inner.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Get the value (audio thread)
    pub fn get(&self) -> f32 {
        f32::from_bits(self.inner.load(Ordering::Relaxed))
    }
}

/// Click currently being rendered by the callback
struct ActiveClick {
    click: ClickType,
    offset: usize,
}

/// State owned by the audio callback
struct CallbackState {
    clicks: CommandConsumer,
    controls: CommandConsumer,
    banks: Vec<ClickBank>,
    sound: SoundType,
    volume: AtomicF32,
    active: Option<ActiveClick>,
}

impl CallbackState {
    fn drain_commands(&mut self) {
        use ringbuf::traits::Consumer;

        while let Some(command) = self.controls.try_pop() {
            self.handle(command);
        }
        while let Some(command) = self.clicks.try_pop() {
            self.handle(command);
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Click { position } => {
                let click = if position == 0 {
                    ClickType::Accent
                } else {
                    ClickType::Regular
                };
                // A new click cuts off the tail of the previous one;
                // at 250 BPM they are 240 ms apart, clicks last 10 ms
                self.active = Some(ActiveClick { click, offset: 0 });
            }
            Command::SetSound(sound) => {
                self.sound = sound;
            }
        }
    }

    fn next_sample(&mut self) -> f32 {
        let Some(active) = self.active.as_mut() else {
            return 0.0;
        };

        let samples = self.banks[self.sound.index()].click(active.click);
        if active.offset < samples.len() {
            let sample = samples[active.offset];
            active.offset += 1;
            sample
        } else {
            self.active = None;
            0.0
        }
    }
}

/// Owner of the output stream. Keeping this value alive keeps the stream
/// playing; dropping it tears the stream down.
pub struct AudioEngine {
    _device: Device,
    _stream: Stream,
    sample_rate: f32,
    pub volume: AtomicF32,
}

impl AudioEngine {
    /// Open the default output device and start the stream.
    ///
    /// `clicks` carries beat triggers from the scheduler's sink,
    /// `controls` carries sound-type changes from the UI. Stream errors
    /// after startup are reported through the notification channel.
    pub fn new(
        clicks: CommandConsumer,
        controls: CommandConsumer,
        notification_tx: SharedNotificationProducer,
        initial_volume: f32,
        initial_sound: SoundType,
    ) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;

        let supported_config = device.default_output_config()?;
        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let config: StreamConfig = supported_config.into();

        let volume = AtomicF32::new(initial_volume.clamp(0.0, 1.0));
        let state = CallbackState {
            clicks,
            controls,
            banks: SoundType::ALL
                .iter()
                .map(|&sound| ClickBank::new(sound, sample_rate))
                .collect(),
            sound: initial_sound,
            volume: volume.clone(),
            active: None,
        };

        let stream = match sample_format {
            SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &config, channels, state, notification_tx)
            }
            SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &config, channels, state, notification_tx)
            }
            SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &config, channels, state, notification_tx)
            }
            other => return Err(AudioError::UnsupportedFormat(other)),
        }?;

        stream.play()?;

        Ok(Self {
            _device: device,
            _stream: stream,
            sample_rate,
            volume,
        })
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        mut state: CallbackState,
        notification_tx: SharedNotificationProducer,
    ) -> Result<Stream, AudioError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                state.drain_commands();
                let volume = state.volume.get();

                for frame in data.chunks_mut(channels) {
                    let value = T::from_sample(state.next_sample() * volume);
                    for out in frame.iter_mut() {
                        *out = value;
                    }
                }
            },
            move |err| {
                notify(
                    &notification_tx,
                    Notification::error(
                        NotificationCategory::Audio,
                        format!("Audio stream error: {err}"),
                    ),
                );
            },
            None,
        )?;

        Ok(stream)
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

/// Beat sink backed by the click command channel.
///
/// `trigger` only enqueues; the audio callback does the playing. A full
/// queue (the callback stalled or the stream died) is reported as a
/// failure, which the scheduler rate-limits and survives.
pub struct AudioBeatSink {
    clicks: CommandProducer,
}

impl AudioBeatSink {
    pub fn new(clicks: CommandProducer) -> Self {
        Self { clicks }
    }
}

impl BeatSink for AudioBeatSink {
    fn trigger(&mut self, position: u8) -> Result<(), SinkError> {
        use ringbuf::traits::Producer;

        self.clicks
            .try_push(Command::Click { position })
            .map_err(|_| SinkError::QueueFull)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::channels::create_command_channel;

    #[test]
    fn test_atomic_f32_round_trip() {
        let value = AtomicF32::new(0.5);
        assert_eq!(value.get(), 0.5);

        let handle = value.clone();
        handle.set(0.25);
        assert_eq!(value.get(), 0.25);
    }

    #[test]
    fn test_callback_state_plays_click_to_completion() {
        let (mut click_tx, click_rx) = create_command_channel(8);
        let (_control_tx, control_rx) = create_command_channel(8);

        let sample_rate = 48000.0;
        let mut state = CallbackState {
            clicks: click_rx,
            controls: control_rx,
            banks: SoundType::ALL
                .iter()
                .map(|&sound| ClickBank::new(sound, sample_rate))
                .collect(),
            sound: SoundType::Sine,
            volume: AtomicF32::new(1.0),
            active: None,
        };

        // Silent until a click arrives
        assert_eq!(state.next_sample(), 0.0);

        {
            use ringbuf::traits::Producer;
            click_tx
                .try_push(Command::Click { position: 0 })
                .expect("push click");
        }
        state.drain_commands();

        // 480 click samples, mostly non-zero, then silence again
        let click_len = state.banks[0].click_len();
        let non_zero = (0..click_len)
            .filter(|_| state.next_sample().abs() > 0.0001)
            .count();
        assert!(non_zero > click_len * 3 / 4);
        assert_eq!(state.next_sample(), 0.0);
    }

    #[test]
    fn test_sound_change_selects_bank() {
        let (_click_tx, click_rx) = create_command_channel(8);
        let (mut control_tx, control_rx) = create_command_channel(8);

        let mut state = CallbackState {
            clicks: click_rx,
            controls: control_rx,
            banks: SoundType::ALL
                .iter()
                .map(|&sound| ClickBank::new(sound, 44100.0))
                .collect(),
            sound: SoundType::Sine,
            volume: AtomicF32::new(1.0),
            active: None,
        };

        {
            use ringbuf::traits::Producer;
            control_tx
                .try_push(Command::SetSound(SoundType::Square))
                .expect("push sound change");
        }
        state.drain_commands();
        assert_eq!(state.sound, SoundType::Square);
    }

    #[test]
    fn test_sink_reports_full_queue() {
        let (click_tx, _click_rx) = create_command_channel(1);
        let mut sink = AudioBeatSink::new(click_tx);

        assert!(sink.trigger(0).is_ok());
        // Nothing drains the queue in this test, so the second trigger
        // must fail without panicking
        assert_eq!(sink.trigger(1), Err(SinkError::QueueFull));
    }
}
