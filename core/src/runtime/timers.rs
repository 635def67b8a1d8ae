use std::collections::HashMap;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

use crate::scene::{EventSender, SceneEvent, TimerCommand, TimerToken};

const TARGET: &str = "scene_timers";

/// Executes [`TimerCommand`]s as sleeping tasks. A cancelled timer's task is
/// aborted, so it never reaches the queue.
pub(crate) struct TimerDriver {
    events: EventSender,
    pending: HashMap<TimerToken, JoinHandle<()>>,
}

impl TimerDriver {
    pub(crate) fn new(events: EventSender) -> Self {
        Self {
            events,
            pending: HashMap::new(),
        }
    }

    pub(crate) fn execute(&mut self, commands: Vec<TimerCommand>) {
        for command in commands {
            match command {
                TimerCommand::Arm { token, after } => self.arm(token, after),
                TimerCommand::Cancel { token } => self.cancel(token),
            }
        }
    }

    /// Drops bookkeeping for a timer whose expiry was just delivered.
    pub(crate) fn forget(&mut self, token: TimerToken) {
        self.pending.remove(&token);
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }

    fn arm(&mut self, token: TimerToken, after: std::time::Duration) {
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            sleep(after).await;
            if !events.send(SceneEvent::TimerElapsed(token)) {
                debug!(target: TARGET, sprite = %token.sprite, kind = token.kind.as_str(), "scene gone before timer fired");
            }
        });
        if let Some(previous) = self.pending.insert(token, task) {
            previous.abort();
        }
    }

    fn cancel(&mut self, token: TimerToken) {
        if let Some(task) = self.pending.remove(&token) {
            task.abort();
        }
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        for (_, task) in self.pending.drain() {
            task.abort();
        }
    }
}
