//! Playhead shared between the audio callback and the command thread

use cadence_core::{DecodedAudio, SourceToken};
use std::sync::Arc;

/// A decoded track bound to the output
#[derive(Debug)]
pub(crate) struct BoundSource {
    pub token: SourceToken,
    pub audio: Arc<DecodedAudio>,
    /// Next frame to play
    pub frame: usize,
    /// Played through to the last frame
    pub ended: bool,
    /// `Ended` already sent for this pass
    pub end_reported: bool,
}

impl BoundSource {
    pub fn new(token: SourceToken, audio: Arc<DecodedAudio>) -> Self {
        Self {
            token,
            audio,
            frame: 0,
            ended: false,
            end_reported: false,
        }
    }

    pub fn seconds(&self) -> f64 {
        if self.audio.sample_rate == 0 {
            return 0.0;
        }
        self.frame as f64 / f64::from(self.audio.sample_rate)
    }

    /// Move the play head, clamped to the source length
    pub fn seek_seconds(&mut self, seconds: f64) {
        let target = (seconds.max(0.0) * f64::from(self.audio.sample_rate)) as usize;
        self.frame = target.min(self.audio.frames());
        self.ended = false;
        self.end_reported = false;
    }
}

#[derive(Debug)]
pub(crate) struct Playhead {
    pub source: Option<BoundSource>,
    pub playing: bool,
    pub volume: f32,
}

impl Default for Playhead {
    fn default() -> Self {
        Self {
            source: None,
            playing: false,
            volume: 1.0,
        }
    }
}

/// Fill one device buffer from the playhead.
///
/// Writes silence when paused, unbound or past the end. Reaching the end
/// stops playback and marks the source ended.
pub(crate) fn render(playhead: &mut Playhead, output: &mut [f32], out_channels: usize) {
    let out_channels = out_channels.max(1);
    let volume = playhead.volume;

    let Some(source) = playhead.source.as_mut().filter(|_| playhead.playing) else {
        output.fill(0.0);
        return;
    };

    let src_channels = usize::from(source.audio.channels).max(1);
    let total = source.audio.frames();

    for out_frame in output.chunks_mut(out_channels) {
        if source.frame >= total {
            out_frame.fill(0.0);
            continue;
        }
        let start = source.frame * src_channels;
        map_frame(
            &source.audio.samples[start..start + src_channels],
            out_frame,
            volume,
        );
        source.frame += 1;
    }

    if source.frame >= total {
        source.ended = true;
        playhead.playing = false;
    }
}

/// Map one source frame onto the device's channel layout.
///
/// Mono fans out to every output; stereo folds to mono on a single-channel
/// device; otherwise channels map one to one and extra outputs stay silent.
pub(crate) fn map_frame(src: &[f32], out: &mut [f32], gain: f32) {
    match (src.len(), out.len()) {
        (_, 0) => {}
        (0, _) => out.fill(0.0),
        (1, _) => out.fill(src[0] * gain),
        (n, 1) => out[0] = src.iter().sum::<f32>() / n as f32 * gain,
        _ => {
            for (i, sample) in out.iter_mut().enumerate() {
                *sample = src.get(i).map_or(0.0, |s| s * gain);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound(frames: usize, rate: u32) -> Playhead {
        let samples = (0..frames).flat_map(|i| [i as f32, -(i as f32)]).collect();
        Playhead {
            source: Some(BoundSource::new(
                SourceToken(1),
                Arc::new(DecodedAudio::new(samples, rate, 2)),
            )),
            playing: true,
            volume: 1.0,
        }
    }

    #[test]
    fn stereo_to_stereo_is_copied() {
        let mut out = [0.0; 2];
        map_frame(&[0.5, -0.5], &mut out, 1.0);
        assert_eq!(out, [0.5, -0.5]);
    }

    #[test]
    fn stereo_to_surround_pads_with_silence() {
        let mut out = [9.0; 6];
        map_frame(&[0.5, -0.5], &mut out, 1.0);
        assert_eq!(out, [0.5, -0.5, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn stereo_to_mono_averages() {
        let mut out = [0.0; 1];
        map_frame(&[0.5, 0.25], &mut out, 1.0);
        assert_eq!(out, [0.375]);
    }

    #[test]
    fn mono_fans_out_with_gain() {
        let mut out = [0.0; 4];
        map_frame(&[0.8], &mut out, 0.5);
        assert_eq!(out, [0.4; 4]);
    }

    #[test]
    fn paused_renders_silence_without_moving() {
        let mut playhead = bound(10, 100);
        playhead.playing = false;
        let mut out = [1.0; 8];
        render(&mut playhead, &mut out, 2);
        assert_eq!(out, [0.0; 8]);
        assert_eq!(playhead.source.as_ref().unwrap().frame, 0);
    }

    #[test]
    fn unbound_renders_silence() {
        let mut playhead = Playhead {
            playing: true,
            ..Playhead::default()
        };
        let mut out = [1.0; 4];
        render(&mut playhead, &mut out, 2);
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn render_advances_and_applies_volume() {
        let mut playhead = bound(10, 100);
        playhead.volume = 0.5;
        let mut out = [0.0; 6];
        render(&mut playhead, &mut out, 2);
        assert_eq!(out, [0.0, 0.0, 0.5, -0.5, 1.0, -1.0]);

        let source = playhead.source.as_ref().unwrap();
        assert_eq!(source.frame, 3);
        assert!(!source.ended);
        assert!(playhead.playing);
    }

    #[test]
    fn reaching_the_end_stops_and_marks_ended() {
        let mut playhead = bound(3, 100);
        let mut out = [1.0; 10];
        render(&mut playhead, &mut out, 2);

        assert_eq!(&out[6..], &[0.0; 4]);
        assert!(playhead.source.as_ref().unwrap().ended);
        assert!(!playhead.playing);
    }

    #[test]
    fn seek_clamps_and_clears_end() {
        let mut playhead = bound(100, 100);
        let source = playhead.source.as_mut().unwrap();
        source.ended = true;
        source.end_reported = true;

        source.seek_seconds(0.5);
        assert_eq!(source.frame, 50);
        assert!(!source.ended && !source.end_reported);

        source.seek_seconds(60.0);
        assert_eq!(source.frame, 100);

        source.seek_seconds(-1.0);
        assert_eq!(source.frame, 0);
        assert_eq!(source.seconds(), 0.0);
    }
}
