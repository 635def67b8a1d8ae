//! Per-sprite speech activity monitoring on top of an external
//! continuous speech-recognition service.

pub mod error;
pub mod monitor;
pub mod provider;
pub mod timeout;

pub use error::{RecognitionErrorCode, SessionFault, SpeechError};
pub use monitor::{SessionState, SpeechActivityMonitor};
pub use provider::{
    RecognitionCapability, RecognitionEvent, RecognitionProvider, RecognitionResult,
    RecognitionSession, RecognitionSink, SessionId, SessionOptions,
};
pub use timeout::SilenceTimeout;

#[cfg(test)]
pub(crate) mod testing;
