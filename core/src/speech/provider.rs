//! Seams to the external speech-recognition service.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::scene::event::{EventSender, SceneEvent};
use crate::scene::registry::SpriteId;

use super::error::{RecognitionErrorCode, SessionFault, SpeechError};

/// Session settings requested from the provider. The monitor only works with
/// continuous sessions that report interim results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub continuous: bool,
    pub interim_results: bool,
    pub language: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            continuous: true,
            interim_results: true,
            language: None,
        }
    }
}

/// One entry of a result batch. Only finality matters to the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub is_final: bool,
    pub transcript: Option<String>,
}

impl RecognitionResult {
    pub fn interim() -> Self {
        Self {
            is_final: false,
            transcript: None,
        }
    }

    pub fn final_result() -> Self {
        Self {
            is_final: true,
            transcript: None,
        }
    }
}

/// Callbacks a recognition session raises, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Started,
    Results(Vec<RecognitionResult>),
    Error(RecognitionErrorCode),
    Ended,
}

/// A live recognition session bound to one sprite.
pub trait RecognitionSession: Send {
    fn start(&mut self) -> Result<(), SessionFault>;
    fn stop(&mut self);
}

/// Factory for recognition sessions. Events produced by a session are
/// delivered through the [`RecognitionSink`] handed over at creation.
pub trait RecognitionProvider: Send + Sync {
    fn open_session(
        &self,
        options: &SessionOptions,
        sink: RecognitionSink,
    ) -> Result<Box<dyn RecognitionSession>, SessionFault>;
}

/// Outcome of probing the runtime for speech recognition support.
#[derive(Clone, Default)]
pub struct RecognitionCapability {
    provider: Option<Arc<dyn RecognitionProvider>>,
}

impl RecognitionCapability {
    pub fn available(provider: Arc<dyn RecognitionProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    pub fn missing() -> Self {
        Self { provider: None }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    pub fn provider(&self) -> Result<&Arc<dyn RecognitionProvider>, SpeechError> {
        self.provider.as_ref().ok_or(SpeechError::CapabilityMissing)
    }
}

impl fmt::Debug for RecognitionCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognitionCapability")
            .field("available", &self.is_available())
            .finish()
    }
}

/// Identifies one opened recognition session of a sprite. Every reopen gets a
/// fresh id, so callbacks from an earlier run can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl SessionId {
    pub(crate) fn next(self) -> Self {
        SessionId(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Where a session reports its callbacks. Cheap to clone; sends never block.
#[derive(Debug, Clone)]
pub struct RecognitionSink {
    sprite: SpriteId,
    session: SessionId,
    events: EventSender,
}

impl RecognitionSink {
    pub fn new(sprite: SpriteId, session: SessionId, events: EventSender) -> Self {
        Self {
            sprite,
            session,
            events,
        }
    }

    pub fn sprite(&self) -> SpriteId {
        self.sprite
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn emit(&self, event: RecognitionEvent) {
        let delivered = self.events.send(SceneEvent::Recognition {
            sprite: self.sprite,
            session: self.session,
            event,
        });
        if !delivered {
            debug!(
                target: "speech_monitor",
                sprite = %self.sprite,
                "scene closed, dropping recognition event"
            );
        }
    }

    pub fn started(&self) {
        self.emit(RecognitionEvent::Started);
    }

    pub fn result(&self, is_final: bool) {
        self.emit(RecognitionEvent::Results(vec![RecognitionResult {
            is_final,
            transcript: None,
        }]));
    }

    pub fn results(&self, batch: Vec<RecognitionResult>) {
        self.emit(RecognitionEvent::Results(batch));
    }

    pub fn error(&self, code: &str) {
        self.emit(RecognitionEvent::Error(RecognitionErrorCode::from_code(code)));
    }

    pub fn ended(&self) {
        self.emit(RecognitionEvent::Ended);
    }
}
