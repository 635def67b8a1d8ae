//! Timer bookkeeping shared by the speech monitor and the animation selector.
//!
//! Components never own a live timer. They arm and cancel tokens in a
//! [`TimerSlot`] and push [`TimerCommand`]s into the scene outbox; whoever
//! drives the scene (the tokio runtime, or a test) executes the commands and
//! feeds expiries back as `SceneEvent::TimerElapsed`.

use std::time::Duration;

use serde::Serialize;

use super::registry::SpriteId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    SilenceTimeout,
    RandomCycle,
}

impl TimerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerKind::SilenceTimeout => "silence_timeout",
            TimerKind::RandomCycle => "random_cycle",
        }
    }
}

/// Identifies one arming of one timer. A token stops matching its slot as
/// soon as the slot is re-armed or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub sprite: SpriteId,
    pub kind: TimerKind,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCommand {
    Arm { token: TimerToken, after: Duration },
    Cancel { token: TimerToken },
}

impl TimerCommand {
    pub fn token(&self) -> TimerToken {
        match self {
            TimerCommand::Arm { token, .. } | TimerCommand::Cancel { token } => *token,
        }
    }
}

#[derive(Debug)]
pub(crate) struct TimerSlot {
    sprite: SpriteId,
    kind: TimerKind,
    generation: u64,
    live: Option<TimerToken>,
}

impl TimerSlot {
    pub(crate) fn new(sprite: SpriteId, kind: TimerKind) -> Self {
        Self {
            sprite,
            kind,
            generation: 0,
            live: None,
        }
    }

    /// Arms the slot, cancelling whatever was live before.
    pub(crate) fn arm(&mut self, after: Duration, out: &mut Vec<TimerCommand>) -> TimerToken {
        self.cancel(out);
        self.generation = self.generation.wrapping_add(1);
        let token = TimerToken {
            sprite: self.sprite,
            kind: self.kind,
            generation: self.generation,
        };
        self.live = Some(token);
        out.push(TimerCommand::Arm { token, after });
        token
    }

    pub(crate) fn cancel(&mut self, out: &mut Vec<TimerCommand>) -> bool {
        match self.live.take() {
            Some(token) => {
                out.push(TimerCommand::Cancel { token });
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live.is_some()
    }

    /// Consumes an expiry. Returns `false` for stale tokens.
    pub(crate) fn fire(&mut self, token: TimerToken) -> bool {
        if self.live == Some(token) {
            self.live = None;
            true
        } else {
            false
        }
    }
}
