//! Scripted recognition provider shared by scene and runtime tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::scene::registry::SpriteId;

use super::error::SessionFault;
use super::provider::{
    RecognitionCapability, RecognitionProvider, RecognitionSession, RecognitionSink,
    SessionOptions,
};

#[derive(Default)]
struct Script {
    starts: VecDeque<Result<(), SessionFault>>,
    start_calls: usize,
    stop_calls: usize,
    sinks: Vec<RecognitionSink>,
}

#[derive(Clone, Default)]
pub(crate) struct ScriptedProvider {
    script: Arc<Mutex<Script>>,
}

impl ScriptedProvider {
    /// Lets `successes` starts through, then refuses the next one.
    pub(crate) fn failing_after(successes: usize) -> Self {
        let provider = Self::default();
        {
            let mut script = provider.script.lock().unwrap();
            for _ in 0..successes {
                script.starts.push_back(Ok(()));
            }
            script
                .starts
                .push_back(Err(SessionFault::new("recognition service busy")));
        }
        provider
    }

    pub(crate) fn capability(&self) -> RecognitionCapability {
        RecognitionCapability::available(Arc::new(self.clone()))
    }

    pub(crate) fn start_calls(&self) -> usize {
        self.script.lock().unwrap().start_calls
    }

    pub(crate) fn stop_calls(&self) -> usize {
        self.script.lock().unwrap().stop_calls
    }

    pub(crate) fn opened_sessions(&self) -> usize {
        self.script.lock().unwrap().sinks.len()
    }

    /// The most recent sink handed to a session for `sprite`.
    pub(crate) fn sink(&self, sprite: SpriteId) -> RecognitionSink {
        self.script
            .lock()
            .unwrap()
            .sinks
            .iter()
            .rev()
            .find(|sink| sink.sprite() == sprite)
            .cloned()
            .expect("session opened for sprite")
    }
}

struct ScriptedSession {
    script: Arc<Mutex<Script>>,
}

impl RecognitionSession for ScriptedSession {
    fn start(&mut self) -> Result<(), SessionFault> {
        let mut script = self.script.lock().unwrap();
        script.start_calls += 1;
        script.starts.pop_front().unwrap_or(Ok(()))
    }

    fn stop(&mut self) {
        self.script.lock().unwrap().stop_calls += 1;
    }
}

impl RecognitionProvider for ScriptedProvider {
    fn open_session(
        &self,
        _options: &SessionOptions,
        sink: RecognitionSink,
    ) -> Result<Box<dyn RecognitionSession>, SessionFault> {
        self.script.lock().unwrap().sinks.push(sink);
        Ok(Box::new(ScriptedSession {
            script: Arc::clone(&self.script),
        }))
    }
}
