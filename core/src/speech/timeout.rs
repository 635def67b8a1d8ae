use std::time::Duration;

use crate::scene::registry::SpriteId;
use crate::scene::timer::{TimerCommand, TimerKind, TimerSlot, TimerToken};

/// The debounce window that keeps `speaking` alive between interim results.
/// At most one timeout is live per session.
#[derive(Debug)]
pub struct SilenceTimeout {
    slot: TimerSlot,
    duration: Duration,
}

impl SilenceTimeout {
    pub fn new(sprite: SpriteId, duration: Duration) -> Self {
        Self {
            slot: TimerSlot::new(sprite, TimerKind::SilenceTimeout),
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn arm(&mut self, timers: &mut Vec<TimerCommand>) -> TimerToken {
        self.slot.arm(self.duration, timers)
    }

    pub fn cancel(&mut self, timers: &mut Vec<TimerCommand>) -> bool {
        self.slot.cancel(timers)
    }

    pub fn is_armed(&self) -> bool {
        self.slot.is_live()
    }

    /// True when `token` is the live arming, which is then consumed.
    pub fn elapsed(&mut self, token: TimerToken) -> bool {
        self.slot.fire(token)
    }
}
