/// CPAL-based output device running on a dedicated audio thread
use crate::error::{DeviceError, Result};
use crate::render::{render, BoundSource, Playhead};
use cadence_core::{AudioDevice, DecodedAudio, DeviceEvent, SourceToken};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Stream;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, trace, warn};

/// Interval between position reports while playing
const POSITION_TICK: Duration = Duration::from_millis(250);

/// Commands sent to the audio thread
#[derive(Debug)]
enum DeviceCommand {
    Bind {
        token: SourceToken,
        audio: Arc<DecodedAudio>,
    },
    Unbind,
    Play,
    Pause,
    Seek {
        token: SourceToken,
        position: Duration,
    },
    SetVolume(f32),
    Shutdown,
}

/// Format the output stream was opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// The process-wide audio output
///
/// **Architecture**: a dedicated thread builds and owns the CPAL stream, so the
/// stream never crosses threads. This handle talks to it over a channel and
/// the thread pushes [`DeviceEvent`]s back through the sender given to
/// [`CpalDevice::open`].
pub struct CpalDevice {
    command_tx: Sender<DeviceCommand>,
    format: OutputFormat,
    audio_thread: Option<JoinHandle<()>>,
}

impl CpalDevice {
    /// Open the default output device of the default host
    ///
    /// # Errors
    /// Returns an error if no device is found or the stream cannot be built
    pub fn open(events: UnboundedSender<DeviceEvent>) -> Result<Self> {
        let (command_tx, command_rx) = unbounded::<DeviceCommand>();
        let (ready_tx, ready_rx) = bounded::<Result<OutputFormat>>(1);

        let audio_thread = thread::Builder::new()
            .name("cadence-audio".to_string())
            .spawn(move || audio_thread_run(command_rx, events, ready_tx))?;

        let format = ready_rx.recv().map_err(|_| DeviceError::ThreadGone)??;
        info!(
            sample_rate = format.sample_rate,
            channels = format.channels,
            "Audio output opened"
        );

        Ok(Self {
            command_tx,
            format,
            audio_thread: Some(audio_thread),
        })
    }

    /// Sample rate tracks should be decoded to
    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn send(&self, command: DeviceCommand) -> cadence_core::Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| DeviceError::ThreadGone.into())
    }
}

impl AudioDevice for CpalDevice {
    fn bind(&mut self, token: SourceToken, audio: Arc<DecodedAudio>) -> cadence_core::Result<()> {
        if audio.sample_rate != self.format.sample_rate {
            warn!(
                source_rate = audio.sample_rate,
                device_rate = self.format.sample_rate,
                "Source rate differs from device rate, pitch will be off"
            );
        }
        self.send(DeviceCommand::Bind { token, audio })
    }

    fn unbind(&mut self) -> cadence_core::Result<()> {
        self.send(DeviceCommand::Unbind)
    }

    fn play(&mut self) -> cadence_core::Result<()> {
        self.send(DeviceCommand::Play)
    }

    fn pause(&mut self) -> cadence_core::Result<()> {
        self.send(DeviceCommand::Pause)
    }

    fn seek(&mut self, token: SourceToken, position: Duration) -> cadence_core::Result<()> {
        self.send(DeviceCommand::Seek { token, position })
    }

    fn set_volume(&mut self, volume: f32) -> cadence_core::Result<()> {
        let volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        self.send(DeviceCommand::SetVolume(volume))
    }
}

impl Drop for CpalDevice {
    fn drop(&mut self) {
        let _ = self.command_tx.send(DeviceCommand::Shutdown);
        if let Some(handle) = self.audio_thread.take() {
            if handle.join().is_err() {
                error!("Audio thread panicked");
            }
        }
    }
}

fn lock(playhead: &Mutex<Playhead>) -> MutexGuard<'_, Playhead> {
    playhead.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build the output stream on the current thread
fn open_stream(playhead: &Arc<Mutex<Playhead>>) -> Result<(Stream, OutputFormat)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(DeviceError::DeviceNotFound)?;

    let supported = device.default_output_config()?;
    let sample_rate = supported.sample_rate();
    let config = supported.config();
    let channels = config.channels;

    let for_callback = Arc::clone(playhead);
    let out_channels = usize::from(channels);
    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            render(&mut lock(&for_callback), data, out_channels);
        },
        |err| error!(error = %err, "Audio stream error"),
        None,
    )?;
    stream.play()?;

    Ok((
        stream,
        OutputFormat {
            sample_rate,
            channels,
        },
    ))
}

/// Audio thread main loop
///
/// Owns the stream for its whole life. Between commands it wakes every
/// [`POSITION_TICK`] to report the play head and a finished source.
fn audio_thread_run(
    command_rx: Receiver<DeviceCommand>,
    events: UnboundedSender<DeviceEvent>,
    ready_tx: Sender<Result<OutputFormat>>,
) {
    let playhead = Arc::new(Mutex::new(Playhead::default()));

    let (_stream, format) = match open_stream(&playhead) {
        Ok(opened) => opened,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    if ready_tx.send(Ok(format)).is_err() {
        return;
    }

    loop {
        match command_rx.recv_timeout(POSITION_TICK) {
            Ok(DeviceCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(command) => apply(&mut lock(&playhead), command, &events),
            Err(RecvTimeoutError::Timeout) => {}
        }
        report(&mut lock(&playhead), &events);
    }

    debug!("Audio thread stopped");
}

fn apply(playhead: &mut Playhead, command: DeviceCommand, events: &UnboundedSender<DeviceEvent>) {
    match command {
        DeviceCommand::Bind { token, audio } => {
            let seconds = audio.duration().as_secs_f64();
            playhead.source = Some(BoundSource::new(token, audio));
            playhead.playing = false;
            debug!(token = token.0, seconds, "Source bound");
            let _ = events.send(DeviceEvent::DurationResolved { token, seconds });
        }
        DeviceCommand::Unbind => {
            playhead.source = None;
            playhead.playing = false;
        }
        DeviceCommand::Play => {
            if let Some(source) = playhead.source.as_mut() {
                if source.ended {
                    source.seek_seconds(0.0);
                }
                playhead.playing = true;
            }
        }
        DeviceCommand::Pause => playhead.playing = false,
        DeviceCommand::Seek { token, position } => {
            if let Some(source) = playhead.source.as_mut() {
                source.token = token;
                source.seek_seconds(position.as_secs_f64());
                let _ = events.send(DeviceEvent::PositionChanged {
                    token: source.token,
                    seconds: source.seconds(),
                });
            }
        }
        DeviceCommand::SetVolume(volume) => playhead.volume = volume,
        DeviceCommand::Shutdown => {}
    }
}

/// Push position and end-of-source events for the current binding
fn report(playhead: &mut Playhead, events: &UnboundedSender<DeviceEvent>) {
    let playing = playhead.playing;
    let Some(source) = playhead.source.as_mut() else {
        return;
    };

    if source.ended {
        if !source.end_reported {
            source.end_reported = true;
            debug!(token = source.token.0, "Source ended");
            let _ = events.send(DeviceEvent::Ended {
                token: source.token,
            });
        }
    } else if playing {
        trace!(token = source.token.0, seconds = source.seconds(), "Position");
        let _ = events.send(DeviceEvent::PositionChanged {
            token: source.token,
            seconds: source.seconds(),
        });
    }
}
