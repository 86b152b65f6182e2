//! Error types shared across the assistant.

use thiserror::Error;

/// Failure talking to the generative model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConverseError {
    /// Missing or rejected credentials. Distinct from transient failures so the
    /// user can be told to fix their setup instead of retrying.
    #[error("invalid API configuration: {0}")]
    Configuration(String),
    #[error("AI service returned status {status:?}: {message}")]
    Service { status: Option<u16>, message: String },
    #[error("could not reach the AI service: {0}")]
    Network(String),
    #[error("malformed response from the AI service: {0}")]
    Malformed(String),
    #[error("nothing to send: empty prompt and no attached file")]
    EmptyRequest,
}

impl ConverseError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, ConverseError::Configuration(_))
    }
}

#[derive(Debug, Error)]
pub enum AudioDecodeError {
    #[error("invalid base64 audio payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("{len} bytes is not a whole number of 16-bit frames for {channels} channel(s)")]
    Format { len: usize, channels: u16 },
    #[error("channel count must be at least 1")]
    NoChannels,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("unsupported file type {mime}; only PDF documents are accepted")]
    UnsupportedFileType { mime: String },
    #[error("cannot attach a file while a reply is pending")]
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceError {
    #[error("a recording session is already active")]
    AlreadyRecording,
    #[error("no recording session is active")]
    NotRecording,
    #[error("speech recognition is not available")]
    Unavailable,
    #[error("voice input is disabled right now")]
    Busy,
}

/// Why the controller refused to start a turn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("a turn is already in progress")]
    Busy,
    #[error("nothing to send")]
    Empty,
    #[error("unknown service: {0}")]
    UnknownService(String),
    #[error("no turn is in flight")]
    NotInFlight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converse_error_display() {
        let err = ConverseError::Configuration("API key not valid".to_string());
        assert_eq!(err.to_string(), "invalid API configuration: API key not valid");
        assert!(err.is_configuration());

        let err = ConverseError::Service {
            status: Some(503),
            message: "overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "AI service returned status Some(503): overloaded");
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_audio_decode_error_display() {
        let err = AudioDecodeError::Format { len: 3, channels: 1 };
        assert_eq!(
            err.to_string(),
            "3 bytes is not a whole number of 16-bit frames for 1 channel(s)"
        );
    }

    #[test]
    fn test_upload_error_display() {
        let err = UploadError::UnsupportedFileType {
            mime: "text/plain".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unsupported file type text/plain; only PDF documents are accepted"
        );
    }
}
