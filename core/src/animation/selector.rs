use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::scene::registry::{Sprite, SpriteId};
use crate::scene::timer::{TimerCommand, TimerKind, TimerSlot, TimerToken};

use super::catalog::{ActiveAnimation, AnimationMode, CatalogSelection, LoopAnimation};

const TARGET: &str = "animation_selector";

/// The three inputs the active animation is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorInputs {
    pub mode: AnimationMode,
    pub selection: CatalogSelection,
    pub talking: bool,
}

impl SelectorInputs {
    pub fn of(sprite: &Sprite) -> Self {
        Self {
            mode: sprite.animation_mode,
            selection: sprite.catalog_selection,
            talking: sprite.talking,
        }
    }

    /// Whether the sprite may animate at all right now.
    pub fn eligible(&self) -> bool {
        matches!(self.mode, AnimationMode::Always) || self.talking
    }
}

/// Resolution of a selection before any random pick is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Still,
    Fixed(LoopAnimation),
    Cycling,
}

pub fn resolve(inputs: SelectorInputs) -> Resolution {
    if !inputs.eligible() {
        return Resolution::Still;
    }

    match inputs.selection {
        CatalogSelection::None => Resolution::Still,
        CatalogSelection::Loop(animation) => Resolution::Fixed(animation),
        CatalogSelection::Random => Resolution::Cycling,
    }
}

pub fn pick_random<R: Rng + ?Sized>(rng: &mut R) -> LoopAnimation {
    LoopAnimation::CATALOG[rng.gen_range(0..LoopAnimation::CATALOG.len())]
}

/// Per-sprite animation state machine. Owns the random re-roll interval and
/// nothing else; the active animation itself lives on the sprite record.
#[derive(Debug)]
pub struct AnimationSelector {
    cycle: TimerSlot,
    interval: Duration,
}

impl AnimationSelector {
    pub fn new(sprite: SpriteId, interval: Duration) -> Self {
        Self {
            cycle: TimerSlot::new(sprite, TimerKind::RandomCycle),
            interval,
        }
    }

    pub fn is_cycling(&self) -> bool {
        self.cycle.is_live()
    }

    /// Recomputes the active animation after any input changed.
    ///
    /// A random selection that is already cycling keeps its current pick;
    /// only the interval re-rolls it.
    pub fn recompute<R: Rng + ?Sized>(
        &mut self,
        inputs: SelectorInputs,
        current: ActiveAnimation,
        rng: &mut R,
        timers: &mut Vec<TimerCommand>,
    ) -> ActiveAnimation {
        match resolve(inputs) {
            Resolution::Still => {
                self.cycle.cancel(timers);
                ActiveAnimation::None
            }
            Resolution::Fixed(animation) => {
                self.cycle.cancel(timers);
                ActiveAnimation::Playing(animation)
            }
            Resolution::Cycling => {
                if self.cycle.is_live() && current.is_playing() {
                    return current;
                }
                self.cycle.arm(self.interval, timers);
                ActiveAnimation::Playing(pick_random(rng))
            }
        }
    }

    /// Handles an expiry of the re-roll interval. Returns the new pick, or
    /// `None` when the token is stale or the sprite stopped being eligible.
    pub fn on_cycle_elapsed<R: Rng + ?Sized>(
        &mut self,
        token: TimerToken,
        inputs: SelectorInputs,
        rng: &mut R,
        timers: &mut Vec<TimerCommand>,
    ) -> Option<ActiveAnimation> {
        if !self.cycle.fire(token) {
            debug!(target: TARGET, sprite = %token.sprite, "ignoring stale random cycle tick");
            return None;
        }

        match resolve(inputs) {
            Resolution::Cycling => {
                self.cycle.arm(self.interval, timers);
                Some(ActiveAnimation::Playing(pick_random(rng)))
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self, timers: &mut Vec<TimerCommand>) {
        self.cycle.cancel(timers);
    }
}
