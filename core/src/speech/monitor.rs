use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::scene::event::EventSender;
use crate::scene::registry::SpriteId;
use crate::scene::timer::{TimerCommand, TimerToken};
use crate::telemetry::events::record_speech_transition;

use super::error::{RecognitionErrorCode, SpeechError};
use super::provider::{
    RecognitionCapability, RecognitionEvent, RecognitionSession, RecognitionSink, SessionId,
    SessionOptions,
};
use super::timeout::SilenceTimeout;

const TARGET: &str = "speech_monitor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Inactive,
    Active,
    Speaking,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Inactive => "inactive",
            SessionState::Active => "active",
            SessionState::Speaking => "speaking",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns the raw callback stream of one recognition session into a
/// debounced talking signal.
///
/// Every failure is handled here: the state is forced to
/// [`SessionState::Inactive`], the error is remembered and returned to the
/// caller for reporting, and nothing is retried except the single restart
/// after a spontaneous end of session.
pub struct SpeechActivityMonitor {
    sprite: SpriteId,
    state: SessionState,
    session: Option<Box<dyn RecognitionSession>>,
    session_id: SessionId,
    silence: SilenceTimeout,
    restart_pending: bool,
    last_error: Option<SpeechError>,
}

impl SpeechActivityMonitor {
    pub fn new(sprite: SpriteId, silence_timeout: Duration) -> Self {
        Self {
            sprite,
            state: SessionState::Inactive,
            session: None,
            session_id: SessionId::default(),
            silence: SilenceTimeout::new(sprite, silence_timeout),
            restart_pending: false,
            last_error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn talking(&self) -> bool {
        self.state == SessionState::Speaking
    }

    pub fn last_error(&self) -> Option<&SpeechError> {
        self.last_error.as_ref()
    }

    pub fn silence_armed(&self) -> bool {
        self.silence.is_armed()
    }

    /// The id of the session whose callbacks are currently accepted.
    pub fn live_session(&self) -> Option<SessionId> {
        self.session.as_ref().map(|_| self.session_id)
    }

    /// Opens a fresh session and starts it. Each call while inactive gets a
    /// new [`SessionId`]; callbacks stamped with an older id are dropped.
    pub fn start(
        &mut self,
        capability: &RecognitionCapability,
        options: &SessionOptions,
        events: &EventSender,
        timers: &mut Vec<TimerCommand>,
    ) -> Result<(), SpeechError> {
        if self.state != SessionState::Inactive {
            debug!(target: TARGET, sprite = %self.sprite, state = %self.state, "session already running");
            return Ok(());
        }

        let provider = match capability.provider() {
            Ok(provider) => provider,
            Err(err) => return Err(self.fail(err, timers)),
        };
        self.session_id = self.session_id.next();
        let sink = RecognitionSink::new(self.sprite, self.session_id, events.clone());
        let mut session = match provider.open_session(options, sink) {
            Ok(session) => session,
            Err(fault) => {
                return Err(self.fail(
                    SpeechError::SessionStartFailure {
                        reason: fault.message,
                    },
                    timers,
                ))
            }
        };

        if let Err(fault) = session.start() {
            return Err(self.fail(
                SpeechError::SessionStartFailure {
                    reason: fault.message,
                },
                timers,
            ));
        }

        self.session = Some(session);
        self.restart_pending = false;
        self.last_error = None;
        self.transition(SessionState::Active);
        info!(target: TARGET, sprite = %self.sprite, session = %self.session_id, "recognition session started");
        Ok(())
    }

    /// Explicit user stop. The session is discarded, so late callbacks from it
    /// are ignored and the next start opens a new one.
    pub fn stop(&mut self, timers: &mut Vec<TimerCommand>) {
        self.silence.cancel(timers);
        self.restart_pending = false;
        if let Some(mut session) = self.session.take() {
            session.stop();
            info!(target: TARGET, sprite = %self.sprite, session = %self.session_id, "recognition session stopped");
        }
        self.transition(SessionState::Inactive);
    }

    /// Applies one callback of session `session`. Callbacks from any session
    /// other than the live one are dropped.
    pub fn handle(
        &mut self,
        session: SessionId,
        event: RecognitionEvent,
        timers: &mut Vec<TimerCommand>,
    ) -> Result<(), SpeechError> {
        if self.live_session() != Some(session) {
            debug!(
                target: TARGET,
                sprite = %self.sprite,
                %session,
                live = ?self.live_session(),
                "dropping callback from a finished session"
            );
            return Ok(());
        }

        match event {
            RecognitionEvent::Started => {
                if self.state != SessionState::Inactive {
                    self.restart_pending = false;
                }
                debug!(target: TARGET, sprite = %self.sprite, "recognition service reported start");
                Ok(())
            }
            RecognitionEvent::Results(batch) => {
                // only the newest result of a batch matters
                if let Some(latest) = batch.last() {
                    self.on_result(latest.is_final, timers);
                }
                Ok(())
            }
            RecognitionEvent::Error(code) => self.on_error(code, timers),
            RecognitionEvent::Ended => self.on_end(timers),
        }
    }

    /// Consumes a silence-timeout expiry. Returns `false` for stale tokens.
    pub fn on_silence_elapsed(&mut self, token: TimerToken) -> bool {
        if !self.silence.elapsed(token) {
            debug!(target: TARGET, sprite = %self.sprite, "ignoring stale silence timeout");
            return false;
        }
        if self.state == SessionState::Speaking {
            self.transition(SessionState::Active);
        }
        true
    }

    fn on_result(&mut self, is_final: bool, timers: &mut Vec<TimerCommand>) {
        if self.state == SessionState::Inactive {
            debug!(target: TARGET, sprite = %self.sprite, "dropping result from inactive session");
            return;
        }

        self.restart_pending = false;
        if is_final {
            self.silence.cancel(timers);
            self.transition(SessionState::Active);
        } else {
            self.silence.arm(timers);
            self.transition(SessionState::Speaking);
        }
    }

    fn on_error(
        &mut self,
        code: RecognitionErrorCode,
        timers: &mut Vec<TimerCommand>,
    ) -> Result<(), SpeechError> {
        if code.is_benign() {
            debug!(target: TARGET, sprite = %self.sprite, %code, "benign recognition error");
            return Ok(());
        }
        if self.state == SessionState::Inactive {
            debug!(target: TARGET, sprite = %self.sprite, %code, "error from inactive session");
            return Ok(());
        }

        if let Some(mut session) = self.session.take() {
            session.stop();
        }
        Err(self.fail(SpeechError::RecognitionRuntimeError { code }, timers))
    }

    fn on_end(&mut self, timers: &mut Vec<TimerCommand>) -> Result<(), SpeechError> {
        if self.state == SessionState::Inactive {
            debug!(target: TARGET, sprite = %self.sprite, "session ended");
            return Ok(());
        }

        self.silence.cancel(timers);
        self.transition(SessionState::Active);

        if self.restart_pending {
            return Err(self.fail(
                SpeechError::SessionRestartFailure {
                    reason: "session ended again before the restart took effect".to_string(),
                },
                timers,
            ));
        }

        self.restart_pending = true;
        let restarted = match self.session.as_mut() {
            Some(session) => session.start(),
            None => {
                return Err(self.fail(
                    SpeechError::SessionRestartFailure {
                        reason: "no session to restart".to_string(),
                    },
                    timers,
                ))
            }
        };

        match restarted {
            Ok(()) => {
                info!(target: TARGET, sprite = %self.sprite, "recognition session restarted after end");
                Ok(())
            }
            Err(fault) => Err(self.fail(
                SpeechError::SessionRestartFailure {
                    reason: fault.message,
                },
                timers,
            )),
        }
    }

    fn fail(&mut self, error: SpeechError, timers: &mut Vec<TimerCommand>) -> SpeechError {
        self.session = None;
        self.silence.cancel(timers);
        self.restart_pending = false;
        self.transition(SessionState::Inactive);
        warn!(target: TARGET, sprite = %self.sprite, %error, "speech monitor disabled");
        self.last_error = Some(error.clone());
        error
    }

    fn transition(&mut self, next: SessionState) {
        if self.state == next {
            return;
        }
        let previous = self.state;
        self.state = next;
        record_speech_transition(self.sprite, previous, next);
    }
}

impl fmt::Debug for SpeechActivityMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechActivityMonitor")
            .field("sprite", &self.sprite)
            .field("state", &self.state)
            .field("live_session", &self.live_session())
            .field("silence", &self.silence)
            .field("restart_pending", &self.restart_pending)
            .field("last_error", &self.last_error)
            .finish()
    }
}
