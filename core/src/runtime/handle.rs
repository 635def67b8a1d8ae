use thiserror::Error;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::animation::{AnimationMode, CatalogSelection};
use crate::gesture::{GestureKind, PointerEvent, PointerId};
use crate::scene::{
    EventSender, ImagePlacement, ImageRef, MenuStatus, Point, SceneCommand, SceneEvent,
    SceneUpdate, Sprite, SpriteId,
};
use crate::speech::{SessionState, SpeechError};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("scene runtime is closed")]
    Closed,
}

/// Async front door to a running scene. Dropping it stops the worker, which
/// in turn stops every speech session and timer.
pub struct SceneHandle {
    events: EventSender,
    updates: broadcast::Sender<SceneUpdate>,
    worker: Option<JoinHandle<()>>,
}

impl SceneHandle {
    pub(super) fn new(
        events: EventSender,
        updates: broadcast::Sender<SceneUpdate>,
        worker: JoinHandle<()>,
    ) -> Self {
        Self {
            events,
            updates,
            worker: Some(worker),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SceneUpdate> {
        self.updates.subscribe()
    }

    pub fn pointer(&self, event: PointerEvent) -> Result<(), RuntimeError> {
        self.send(SceneEvent::Pointer(event))
    }

    pub async fn add_sprite(
        &self,
        image: ImageRef,
        placement: ImagePlacement,
    ) -> Result<SpriteId, RuntimeError> {
        self.request(|reply| SceneCommand::AddSprite {
            image,
            placement,
            reply,
        })
        .await
    }

    pub fn remove_sprite(&self, sprite: SpriteId) -> Result<(), RuntimeError> {
        self.command(SceneCommand::RemoveSprite(sprite))
    }

    pub fn set_selected(&self, sprite: Option<SpriteId>) -> Result<(), RuntimeError> {
        self.command(SceneCommand::SetSelected(sprite))
    }

    pub fn toggle_menu(&self, sprite: SpriteId) -> Result<(), RuntimeError> {
        self.command(SceneCommand::ToggleMenu(sprite))
    }

    pub fn set_catalog_selection(
        &self,
        sprite: SpriteId,
        selection: CatalogSelection,
    ) -> Result<(), RuntimeError> {
        self.command(SceneCommand::SetCatalogSelection { sprite, selection })
    }

    pub fn set_animation_mode(
        &self,
        sprite: SpriteId,
        mode: AnimationMode,
    ) -> Result<(), RuntimeError> {
        self.command(SceneCommand::SetAnimationMode { sprite, mode })
    }

    pub fn toggle_animation_mode(&self, sprite: SpriteId) -> Result<(), RuntimeError> {
        self.command(SceneCommand::ToggleAnimationMode(sprite))
    }

    pub fn begin_gesture(
        &self,
        sprite: SpriteId,
        pointer: PointerId,
        kind: GestureKind,
        position: Point,
    ) -> Result<(), RuntimeError> {
        self.command(SceneCommand::BeginGesture {
            sprite,
            pointer,
            kind,
            position,
        })
    }

    /// The outer error is the runtime; the inner one is the speech session.
    pub async fn start_speech(
        &self,
        sprite: SpriteId,
    ) -> Result<Result<(), SpeechError>, RuntimeError> {
        self.request(|reply| SceneCommand::StartSpeech { sprite, reply })
            .await
    }

    pub fn stop_speech(&self, sprite: SpriteId) -> Result<(), RuntimeError> {
        self.command(SceneCommand::StopSpeech(sprite))
    }

    pub async fn sprite(&self, sprite: SpriteId) -> Result<Option<Sprite>, RuntimeError> {
        self.request(|reply| SceneCommand::GetSprite { sprite, reply })
            .await
    }

    pub async fn list_sprites(&self) -> Result<Vec<Sprite>, RuntimeError> {
        self.request(|reply| SceneCommand::ListSprites { reply }).await
    }

    pub async fn session_state(
        &self,
        sprite: SpriteId,
    ) -> Result<Option<SessionState>, RuntimeError> {
        self.request(|reply| SceneCommand::GetSessionState { sprite, reply })
            .await
    }

    pub async fn menu_status(&self, sprite: SpriteId) -> Result<Option<MenuStatus>, RuntimeError> {
        self.request(|reply| SceneCommand::GetMenuStatus { sprite, reply })
            .await
    }

    /// Stops every session and timer, then waits for the worker to exit.
    pub async fn shutdown(mut self) -> Result<(), RuntimeError> {
        self.command(SceneCommand::Shutdown)?;
        if let Some(worker) = self.worker.take() {
            if let Err(err) = worker.await {
                warn!(target: "scene_runtime", %err, "scene worker ended abnormally");
            }
        }
        Ok(())
    }

    fn send(&self, event: SceneEvent) -> Result<(), RuntimeError> {
        if self.events.send(event) {
            Ok(())
        } else {
            Err(RuntimeError::Closed)
        }
    }

    fn command(&self, command: SceneCommand) -> Result<(), RuntimeError> {
        self.send(SceneEvent::Command(command))
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SceneCommand,
    ) -> Result<T, RuntimeError> {
        let (reply, response) = oneshot::channel();
        self.command(build(reply))?;
        response.await.map_err(|_| RuntimeError::Closed)
    }
}

impl Drop for SceneHandle {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}
