/// Audio output errors
use thiserror::Error;

/// Result type for audio output operations
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Audio output errors
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No output device on the default host
    #[error("Audio device not found")]
    DeviceNotFound,

    /// Default output configuration could not be read
    #[error("Device configuration error: {0}")]
    ConfigError(String),

    /// Failed to build output stream
    #[error("Failed to build output stream: {0}")]
    StreamBuildError(String),

    /// Failed to start the stream
    #[error("Failed to play stream: {0}")]
    PlayError(String),

    /// The audio thread could not be started
    #[error("Failed to spawn audio thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The audio thread has exited
    #[error("Audio thread is not running")]
    ThreadGone,
}

impl From<cpal::BuildStreamError> for DeviceError {
    fn from(err: cpal::BuildStreamError) -> Self {
        DeviceError::StreamBuildError(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for DeviceError {
    fn from(err: cpal::PlayStreamError) -> Self {
        DeviceError::PlayError(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for DeviceError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        DeviceError::ConfigError(err.to_string())
    }
}

impl From<DeviceError> for cadence_core::CadenceError {
    fn from(err: DeviceError) -> Self {
        cadence_core::CadenceError::device(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::CadenceError;

    #[test]
    fn converts_to_device_error() {
        let err: CadenceError = DeviceError::ThreadGone.into();
        assert!(matches!(err, CadenceError::Device(msg) if msg.contains("not running")));
    }
}
