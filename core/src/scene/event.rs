//! The single event queue every scene input flows through.

use tokio::sync::{mpsc, oneshot};

use crate::animation::{AnimationMode, CatalogSelection};
use crate::gesture::{GestureKind, PointerEvent, PointerId};
use crate::speech::{RecognitionEvent, SessionId, SessionState, SpeechError};

use super::geometry::{ImagePlacement, Point};
use super::registry::{ImageRef, Sprite, SpriteId};
use super::timer::TimerToken;
use super::MenuStatus;

#[derive(Debug)]
pub enum SceneEvent {
    Pointer(PointerEvent),
    Recognition {
        sprite: SpriteId,
        session: SessionId,
        event: RecognitionEvent,
    },
    TimerElapsed(TimerToken),
    Command(SceneCommand),
}

/// User actions and queries. Replies travel back over oneshot channels.
#[derive(Debug)]
pub enum SceneCommand {
    AddSprite {
        image: ImageRef,
        placement: ImagePlacement,
        reply: oneshot::Sender<SpriteId>,
    },
    RemoveSprite(SpriteId),
    SetSelected(Option<SpriteId>),
    ToggleMenu(SpriteId),
    SetCatalogSelection {
        sprite: SpriteId,
        selection: CatalogSelection,
    },
    SetAnimationMode {
        sprite: SpriteId,
        mode: AnimationMode,
    },
    ToggleAnimationMode(SpriteId),
    BeginGesture {
        sprite: SpriteId,
        pointer: PointerId,
        kind: GestureKind,
        position: Point,
    },
    StartSpeech {
        sprite: SpriteId,
        reply: oneshot::Sender<Result<(), SpeechError>>,
    },
    StopSpeech(SpriteId),
    GetSprite {
        sprite: SpriteId,
        reply: oneshot::Sender<Option<Sprite>>,
    },
    ListSprites {
        reply: oneshot::Sender<Vec<Sprite>>,
    },
    GetSessionState {
        sprite: SpriteId,
        reply: oneshot::Sender<Option<SessionState>>,
    },
    GetMenuStatus {
        sprite: SpriteId,
        reply: oneshot::Sender<Option<MenuStatus>>,
    },
    Shutdown,
}

/// Cloneable, non-blocking send half of the scene queue.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<SceneEvent>,
}

impl EventSender {
    /// Returns `false` once the receiving side is gone.
    pub fn send(&self, event: SceneEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<SceneEvent>,
}

impl EventReceiver {
    pub async fn recv(&mut self) -> Option<SceneEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<SceneEvent> {
        self.rx.try_recv().ok()
    }
}

pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}
