use std::fmt;

use thiserror::Error;

/// Error codes reported by a recognition service mid-session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecognitionErrorCode {
    NoSpeech,
    Aborted,
    AudioCapture,
    Network,
    NotAllowed,
    ServiceNotAllowed,
    LanguageNotSupported,
    Other(String),
}

impl RecognitionErrorCode {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "no-speech" => Self::NoSpeech,
            "aborted" => Self::Aborted,
            "audio-capture" => Self::AudioCapture,
            "network" => Self::Network,
            "not-allowed" => Self::NotAllowed,
            "service-not-allowed" => Self::ServiceNotAllowed,
            "language-not-supported" => Self::LanguageNotSupported,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::NoSpeech => "no-speech",
            Self::Aborted => "aborted",
            Self::AudioCapture => "audio-capture",
            Self::Network => "network",
            Self::NotAllowed => "not-allowed",
            Self::ServiceNotAllowed => "service-not-allowed",
            Self::LanguageNotSupported => "language-not-supported",
            Self::Other(code) => code,
        }
    }

    /// Benign codes are followed by an ordinary end-of-session signal and
    /// must not tear the session down on their own.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::NoSpeech | Self::Aborted)
    }
}

impl fmt::Display for RecognitionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure raised by an external session when asked to start.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SessionFault {
    pub message: String,
}

impl SessionFault {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech recognition is not available in this runtime")]
    CapabilityMissing,
    #[error("failed to start recognition session: {reason}")]
    SessionStartFailure { reason: String },
    #[error("failed to restart recognition session: {reason}")]
    SessionRestartFailure { reason: String },
    #[error("recognition session failed: {code}")]
    RecognitionRuntimeError { code: RecognitionErrorCode },
}

impl SpeechError {
    pub fn kind(&self) -> &'static str {
        match self {
            SpeechError::CapabilityMissing => "capability_missing",
            SpeechError::SessionStartFailure { .. } => "session_start_failure",
            SpeechError::SessionRestartFailure { .. } => "session_restart_failure",
            SpeechError::RecognitionRuntimeError { .. } => "recognition_runtime_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_round_trip() {
        for code in [
            "no-speech",
            "aborted",
            "audio-capture",
            "network",
            "not-allowed",
            "service-not-allowed",
            "language-not-supported",
        ] {
            assert_eq!(RecognitionErrorCode::from_code(code).as_str(), code);
        }
        assert_eq!(
            RecognitionErrorCode::from_code("bad-grammar"),
            RecognitionErrorCode::Other("bad-grammar".into())
        );
    }

    #[test]
    fn only_silence_and_abort_are_benign() {
        assert!(RecognitionErrorCode::NoSpeech.is_benign());
        assert!(RecognitionErrorCode::Aborted.is_benign());
        assert!(!RecognitionErrorCode::Network.is_benign());
        assert!(!RecognitionErrorCode::Other("x".into()).is_benign());
    }

    #[test]
    fn errors_render_their_context() {
        let err = SpeechError::RecognitionRuntimeError {
            code: RecognitionErrorCode::NotAllowed,
        };
        assert_eq!(err.to_string(), "recognition session failed: not-allowed");
        assert_eq!(err.kind(), "recognition_runtime_error");
    }
}
