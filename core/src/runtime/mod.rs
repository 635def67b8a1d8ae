//! Async driver for a [`Scene`]: one worker task drains the event queue and
//! turns timer commands into tokio sleeps.

mod handle;
mod timers;
mod worker;

#[cfg(test)]
mod tests;

pub use handle::{RuntimeError, SceneHandle};

use crate::config::SceneConfig;
use crate::scene::{event_channel, Scene};
use crate::speech::RecognitionCapability;

use self::timers::TimerDriver;
use self::worker::SceneWorker;

pub struct SceneRuntime;

impl SceneRuntime {
    /// Spawns the scene worker on the current tokio runtime.
    pub fn spawn(config: SceneConfig, capability: RecognitionCapability) -> SceneHandle {
        Self::spawn_scene(|events| Scene::new(config, capability, events))
    }

    /// Same as [`SceneRuntime::spawn`] with reproducible random picks.
    pub fn spawn_seeded(
        config: SceneConfig,
        capability: RecognitionCapability,
        seed: u64,
    ) -> SceneHandle {
        Self::spawn_scene(|events| Scene::new(config, capability, events).with_seed(seed))
    }

    fn spawn_scene(build: impl FnOnce(crate::scene::EventSender) -> Scene) -> SceneHandle {
        let (events_tx, events_rx) = event_channel();
        let scene = build(events_tx.clone());
        let updates = scene.update_sender();
        let timers = TimerDriver::new(events_tx.clone());

        let worker = SceneWorker::new(scene, events_rx, timers).spawn();
        SceneHandle::new(events_tx, updates, worker)
    }
}
