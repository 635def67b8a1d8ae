use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::scene::{EventReceiver, Scene, SceneCommand, SceneEvent};

use super::timers::TimerDriver;

const TARGET: &str = "scene_runtime";

pub(crate) struct SceneWorker {
    scene: Scene,
    events: EventReceiver,
    timers: TimerDriver,
}

impl SceneWorker {
    pub(crate) fn new(scene: Scene, events: EventReceiver, timers: TimerDriver) -> Self {
        Self {
            scene,
            events,
            timers,
        }
    }

    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        info!(target: TARGET, "scene worker started");
        self.flush_timers();

        while let Some(event) = self.events.recv().await {
            match event {
                SceneEvent::Command(SceneCommand::Shutdown) => {
                    self.scene.shutdown();
                    self.flush_timers();
                    break;
                }
                SceneEvent::TimerElapsed(token) => {
                    self.timers.forget(token);
                    self.scene.dispatch(SceneEvent::TimerElapsed(token));
                }
                other => self.scene.dispatch(other),
            }
            self.flush_timers();
        }

        info!(target: TARGET, "scene worker stopped");
    }

    fn flush_timers(&mut self) {
        let commands = self.scene.drain_timer_commands();
        if commands.is_empty() {
            return;
        }
        self.timers.execute(commands);
        debug!(target: TARGET, pending = self.timers.pending(), "timer commands applied");
    }
}
