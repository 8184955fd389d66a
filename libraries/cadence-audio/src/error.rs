/// Audio decoding errors
use thiserror::Error;

/// Result type alias using `AudioError`
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio error types
#[derive(Error, Debug)]
pub enum AudioError {
    /// Zero-length input
    #[error("No audio bytes to decode")]
    EmptyInput,

    /// Container not recognized by any registered format reader
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Container holds no decodable audio track
    #[error("No audio tracks found")]
    NoAudioTrack,

    /// Decoding error
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Stream decoded to zero frames
    #[error("Stream contained no audio frames")]
    NoFrames,

    /// Invalid sample rate for conversion
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// Sample rate conversion failed
    #[error("Resampling failed: {0}")]
    Resampling(String),
}

impl From<AudioError> for cadence_core::CadenceError {
    fn from(err: AudioError) -> Self {
        cadence_core::CadenceError::decode(err.to_string())
    }
}
