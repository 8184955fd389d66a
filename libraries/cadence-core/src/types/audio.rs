//! Decoded audio and device event types

use std::time::Duration;

/// A fully decoded track held in memory
///
/// Samples are interleaved f32 in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Play length at the native sample rate
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }
}

/// Identifies one binding of a buffer to the audio device
///
/// A fresh token is issued every time the engine binds a new source, so events
/// from an earlier binding can be told apart and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceToken(pub u64);

/// Notifications pushed by the audio device
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceEvent {
    /// Play head moved (device-driven granularity)
    PositionChanged { token: SourceToken, seconds: f64 },
    /// Length of the bound source became known
    DurationResolved { token: SourceToken, seconds: f64 },
    /// The bound source played to its end
    Ended { token: SourceToken },
}

impl DeviceEvent {
    /// Binding that produced this event
    pub fn token(&self) -> SourceToken {
        match self {
            Self::PositionChanged { token, .. }
            | Self::DurationResolved { token, .. }
            | Self::Ended { token } => *token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_from_frames() {
        let audio = DecodedAudio::new(vec![0.0; 88_200], 44_100, 2);
        assert_eq!(audio.frames(), 44_100);
        assert_eq!(audio.duration(), Duration::from_secs(1));
    }

    #[test]
    fn degenerate_audio_has_zero_duration() {
        assert_eq!(DecodedAudio::new(vec![0.0; 4], 0, 2).duration(), Duration::ZERO);
        assert_eq!(DecodedAudio::new(vec![0.0; 4], 44_100, 0).frames(), 0);
    }

    #[test]
    fn event_token_accessor() {
        let token = SourceToken(7);
        assert_eq!(DeviceEvent::Ended { token }.token(), token);
        assert_eq!(
            DeviceEvent::PositionChanged { token, seconds: 1.0 }.token(),
            token
        );
    }
}
