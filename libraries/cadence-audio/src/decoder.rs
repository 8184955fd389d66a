/// Audio decoder implementation using Symphonia
use crate::error::{AudioError, Result};
use crate::resample::resample;
use cadence_core::{DecodedAudio, TrackDecoder};
use std::io::Cursor;
use symphonia::core::audio::{AudioBuffer, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Sample rate assumed when the codec does not report one
const FALLBACK_RATE: u32 = 44_100;

/// ITU-R BS.775-1 coefficient for center and surround channels (-3dB)
const CENTER_MIX: f32 = 0.707;

/// Audio decoder using Symphonia
///
/// Supports: MP3, FLAC, OGG, WAV, AAC
///
/// Decodes a complete in-memory file into interleaved stereo f32. When a
/// target rate is set, the result is converted to that rate so the output
/// device can play it without further processing.
#[derive(Debug, Clone, Default)]
pub struct SymphoniaDecoder {
    target_rate: Option<u32>,
}

impl SymphoniaDecoder {
    /// Create a decoder that keeps each file's native sample rate
    pub fn new() -> Self {
        Self { target_rate: None }
    }

    /// Create a decoder that resamples everything to `rate`
    pub fn with_target_rate(rate: u32) -> Self {
        Self {
            target_rate: Some(rate),
        }
    }

    pub fn target_rate(&self) -> Option<u32> {
        self.target_rate
    }

    /// Decode `bytes` into stereo samples.
    ///
    /// `mime_hint` is passed to the format probe; the container is still
    /// detected from its content when the hint is absent or wrong.
    pub fn decode_bytes(&self, bytes: &[u8], mime_hint: Option<&str>) -> Result<DecodedAudio> {
        if bytes.is_empty() {
            return Err(AudioError::EmptyInput);
        }

        let source = Cursor::new(bytes.to_vec());
        let mss = MediaSourceStream::new(Box::new(source), Default::default());

        let mut hint = Hint::new();
        if let Some(mime) = mime_hint {
            hint.mime_type(mime);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::UnsupportedFormat(format!("Failed to probe stream: {}", e)))?;

        let mut format = probed.format;

        let track = format.default_track().ok_or(AudioError::NoAudioTrack)?;
        let sample_rate = track.codec_params.sample_rate.unwrap_or(FALLBACK_RATE);
        let track_id = track.id;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::DecodeError(format!("Failed to create decoder: {}", e)))?;

        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                // A new track or chained stream begins; only the first one is played
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    return Err(AudioError::DecodeError(format!(
                        "Error reading packet: {}",
                        e
                    )));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!(error = %e, "Skipping corrupt packet");
                    continue;
                }
                Err(e) => return Err(AudioError::DecodeError(e.to_string())),
            };

            let mut planar = AudioBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
            decoded.convert(&mut planar);
            append_stereo(&planar, &mut samples);
        }

        if samples.is_empty() {
            return Err(AudioError::NoFrames);
        }

        let audio = match self.target_rate {
            Some(target) if target != sample_rate => {
                debug!(from = sample_rate, to = target, "Resampling decoded track");
                DecodedAudio::new(resample(&samples, 2, sample_rate, target)?, target, 2)
            }
            _ => DecodedAudio::new(samples, sample_rate, 2),
        };

        debug!(
            frames = audio.frames(),
            sample_rate = audio.sample_rate,
            seconds = audio.duration().as_secs_f64(),
            "Decoded track"
        );
        Ok(audio)
    }
}

impl TrackDecoder for SymphoniaDecoder {
    fn decode(&self, bytes: &[u8], mime_hint: Option<&str>) -> cadence_core::Result<DecodedAudio> {
        self.decode_bytes(bytes, mime_hint).map_err(Into::into)
    }
}

/// Append one planar packet to `out` as interleaved stereo
fn append_stereo(planar: &AudioBuffer<f32>, out: &mut Vec<f32>) {
    let channels = planar.spec().channels.count();
    let frames = planar.frames();
    out.reserve(frames * 2);

    let mut frame = Vec::with_capacity(channels);
    for i in 0..frames {
        frame.clear();
        frame.extend((0..channels).map(|ch| planar.chan(ch)[i]));
        let [left, right] = downmix_frame(&frame);
        out.push(left);
        out.push(right);
    }
}

/// Fold one frame of any channel count down to stereo.
///
/// Layouts follow the usual channel order: L, R, C, LFE, SL, SR for 5.1;
/// L, R, SL, SR for quad; L, R, C for three channels. Channels beyond the
/// sixth are dropped.
pub(crate) fn downmix_frame(frame: &[f32]) -> [f32; 2] {
    let [l, r] = match *frame {
        [] => [0.0, 0.0],
        [mono] => [mono, mono],
        [l, r] => [l, r],
        [l, r, c] => {
            let c = c * CENTER_MIX;
            [l + c, r + c]
        }
        [l, r, sl, sr] => [l + sl * CENTER_MIX, r + sr * CENTER_MIX],
        [l, r, c, sl, sr] => {
            let c = c * CENTER_MIX;
            [l + c + sl * CENTER_MIX, r + c + sr * CENTER_MIX]
        }
        [l, r, c, lfe, sl, sr, ..] => {
            let shared = (c + lfe) * CENTER_MIX;
            [l + shared + sl * CENTER_MIX, r + shared + sr * CENTER_MIX]
        }
    };
    [l.clamp(-1.0, 1.0), r.clamp(-1.0, 1.0)]
}
