//! The scene: canonical sprite records plus the per-sprite controllers that
//! act on them.
//!
//! [`Scene`] is synchronous and deterministic. Every input arrives as a
//! [`SceneEvent`] (or the equivalent method call), is handled to completion,
//! and leaves any timer work in an outbox of [`TimerCommand`]s for the
//! driver to execute. Controllers never hold copies of geometry or animation
//! state; they read the record from the registry and write results back
//! through it.

pub mod event;
pub mod geometry;
pub mod registry;
pub mod timer;


use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::animation::{
    ActiveAnimation, AnimationMode, AnimationSelector, CatalogSelection, SelectorInputs,
};
use crate::config::SceneConfig;
use crate::gesture::{
    hit_test, GestureController, GestureEnd, GestureKind, PointerEvent, PointerId, PointerPhase,
};
use crate::speech::{
    RecognitionCapability, RecognitionEvent, SessionId, SessionState, SpeechActivityMonitor,
    SpeechError,
};
use crate::telemetry::events::{
    record_animation_change, record_gesture_completed, record_speech_failure,
};

pub use event::{event_channel, EventReceiver, EventSender, SceneCommand, SceneEvent};
pub use geometry::{ImagePlacement, PixelDimensions, Point, Size};
pub use registry::{
    Cursor, ImageRef, RenderState, SceneRegistry, SceneUpdate, Sprite, SpriteId,
};
pub use timer::{TimerCommand, TimerKind, TimerToken};

const TARGET: &str = "scene";

/// Read-out for the sprite's action menu.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuStatus {
    pub speaking: bool,
    pub session: SessionState,
    pub mode: AnimationMode,
    pub selection: CatalogSelection,
    /// `Random` / `Idle` while random is selected, otherwise the active name.
    pub animation_label: String,
    pub last_error: Option<SpeechError>,
}

struct SpriteControllers {
    gesture: GestureController,
    monitor: SpeechActivityMonitor,
    selector: AnimationSelector,
}

impl SpriteControllers {
    fn new(id: SpriteId, config: &SceneConfig) -> Self {
        Self {
            gesture: GestureController::new(config.click_threshold),
            monitor: SpeechActivityMonitor::new(id, config.silence_timeout),
            selector: AnimationSelector::new(id, config.random_cycle_interval),
        }
    }
}

pub struct Scene {
    config: SceneConfig,
    registry: SceneRegistry,
    controllers: HashMap<SpriteId, SpriteControllers>,
    captures: HashMap<PointerId, SpriteId>,
    capability: RecognitionCapability,
    events: EventSender,
    rng: StdRng,
    outbox: Vec<TimerCommand>,
}

impl Scene {
    pub fn new(config: SceneConfig, capability: RecognitionCapability, events: EventSender) -> Self {
        let config = config.validated();
        if !capability.is_available() {
            warn!(
                target: TARGET,
                "speech recognition unavailable, only always-mode animation will play"
            );
        }
        Self {
            registry: SceneRegistry::new(config.clone()),
            config,
            controllers: HashMap::new(),
            captures: HashMap::new(),
            capability,
            events,
            rng: StdRng::from_entropy(),
            outbox: Vec::new(),
        }
    }

    /// Makes random animation picks reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SceneUpdate> {
        self.registry.subscribe()
    }

    pub fn update_sender(&self) -> broadcast::Sender<SceneUpdate> {
        self.registry.update_sender()
    }

    pub fn events(&self) -> EventSender {
        self.events.clone()
    }

    pub fn sprite(&self, id: SpriteId) -> Option<&Sprite> {
        self.registry.get(id)
    }

    pub fn sprites(&self) -> &[Sprite] {
        self.registry.list_all()
    }

    pub fn render_frame(&self) -> Vec<RenderState> {
        self.registry
            .list_all()
            .iter()
            .map(|sprite| self.registry.render_state(sprite))
            .collect()
    }

    /// Timer work produced so far, in order. The driver must execute all of it.
    pub fn drain_timer_commands(&mut self) -> Vec<TimerCommand> {
        std::mem::take(&mut self.outbox)
    }

    pub fn add_sprite(&mut self, image: ImageRef, placement: ImagePlacement) -> SpriteId {
        let id = self.registry.add(image, placement);
        self.controllers
            .insert(id, SpriteControllers::new(id, &self.config));
        self.refresh_animation(id);

        if self.config.auto_start_speech {
            // failures are reported through the diagnostic channel
            let _ = self.start_speech(id);
        }
        id
    }

    /// Stops the sprite's speech session, cancels its timers, releases any
    /// pointer it captured and drops the record. Unknown ids are a no-op.
    pub fn remove_sprite(&mut self, id: SpriteId) {
        if let Some(mut controllers) = self.controllers.remove(&id) {
            controllers.monitor.stop(&mut self.outbox);
            controllers.selector.cancel(&mut self.outbox);
            controllers.gesture.cancel();
        }
        self.captures.retain(|_, held| *held != id);
        self.registry.remove(id);
    }

    pub fn set_selected(&mut self, id: Option<SpriteId>) {
        self.registry.set_selected(id);
    }

    /// Menu button: only a selected sprite has a menu to toggle.
    pub fn toggle_menu(&mut self, id: SpriteId) {
        self.registry.update(id, |sprite| {
            if sprite.selected {
                sprite.menu_open = !sprite.menu_open;
            }
        });
    }

    pub fn set_catalog_selection(&mut self, id: SpriteId, selection: CatalogSelection) {
        self.registry
            .update(id, |sprite| sprite.catalog_selection = selection);
        self.refresh_animation(id);
    }

    pub fn set_animation_mode(&mut self, id: SpriteId, mode: AnimationMode) {
        self.registry.update(id, |sprite| sprite.animation_mode = mode);
        self.refresh_animation(id);
    }

    pub fn toggle_animation_mode(&mut self, id: SpriteId) {
        self.registry
            .update(id, |sprite| sprite.animation_mode = sprite.animation_mode.toggled());
        self.refresh_animation(id);
    }

    /// Starts (or manually restarts) the sprite's recognition session.
    pub fn start_speech(&mut self, id: SpriteId) -> Result<(), SpeechError> {
        let options = self.config.session_options();
        let Some(controllers) = self.controllers.get_mut(&id) else {
            debug!(target: TARGET, sprite = %id, "start speech for unknown sprite");
            return Ok(());
        };

        let result = controllers
            .monitor
            .start(&self.capability, &options, &self.events, &mut self.outbox);
        if let Err(err) = &result {
            self.report_speech_error(id, err);
        }
        self.sync_talking(id);
        result
    }

    pub fn stop_speech(&mut self, id: SpriteId) {
        if let Some(controllers) = self.controllers.get_mut(&id) {
            controllers.monitor.stop(&mut self.outbox);
        }
        self.sync_talking(id);
    }

    pub fn session_state(&self, id: SpriteId) -> Option<SessionState> {
        self.controllers
            .get(&id)
            .map(|controllers| controllers.monitor.state())
    }

    pub fn menu_status(&self, id: SpriteId) -> Option<MenuStatus> {
        let sprite = self.registry.get(id)?;
        let controllers = self.controllers.get(&id)?;
        let inputs = SelectorInputs::of(sprite);
        let animation_label = match sprite.catalog_selection {
            CatalogSelection::Random if inputs.eligible() => "Random".to_string(),
            CatalogSelection::Random => "Idle".to_string(),
            _ => sprite.active_animation.as_str().to_string(),
        };

        Some(MenuStatus {
            speaking: sprite.talking,
            session: controllers.monitor.state(),
            mode: sprite.animation_mode,
            selection: sprite.catalog_selection,
            animation_label,
            last_error: controllers.monitor.last_error().cloned(),
        })
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event.phase {
            PointerPhase::Down => self.pointer_down(event),
            PointerPhase::Move => self.pointer_move(event),
            PointerPhase::Up => self.pointer_up(event),
        }
    }

    /// Begins a gesture on a known sprite, bypassing hit-testing. The pointer
    /// is captured until it is released.
    pub fn begin_gesture(
        &mut self,
        id: SpriteId,
        pointer: PointerId,
        kind: GestureKind,
        position: Point,
    ) -> bool {
        if self.captures.contains_key(&pointer) {
            debug!(target: TARGET, sprite = %id, "pointer already captured");
            return false;
        }
        let Some(sprite) = self.registry.get(id) else {
            return false;
        };
        let Some(controllers) = self.controllers.get_mut(&id) else {
            return false;
        };
        if !controllers.gesture.begin(kind, position, sprite) {
            return false;
        }

        self.captures.insert(pointer, id);
        self.registry.update(id, |sprite| sprite.cursor = kind.cursor());
        true
    }

    /// Feeds one provider callback to the sprite's monitor. Callbacks from a
    /// session that has since been stopped or replaced are dropped there.
    pub fn handle_recognition(
        &mut self,
        id: SpriteId,
        session: SessionId,
        event: RecognitionEvent,
    ) {
        let Some(controllers) = self.controllers.get_mut(&id) else {
            debug!(target: TARGET, sprite = %id, "recognition event for removed sprite");
            return;
        };
        if let Err(err) = controllers.monitor.handle(session, event, &mut self.outbox) {
            self.report_speech_error(id, &err);
        }
        self.sync_talking(id);
    }

    pub fn timer_elapsed(&mut self, token: TimerToken) {
        let id = token.sprite;
        let Some(inputs) = self.registry.get(id).map(SelectorInputs::of) else {
            debug!(target: TARGET, sprite = %id, kind = token.kind.as_str(), "timer for removed sprite");
            return;
        };
        let Some(controllers) = self.controllers.get_mut(&id) else {
            return;
        };

        match token.kind {
            TimerKind::SilenceTimeout => {
                controllers.monitor.on_silence_elapsed(token);
                self.sync_talking(id);
            }
            TimerKind::RandomCycle => {
                if let Some(next) = controllers.selector.on_cycle_elapsed(
                    token,
                    inputs,
                    &mut self.rng,
                    &mut self.outbox,
                ) {
                    self.set_active_animation(id, next);
                }
            }
        }
    }

    pub fn dispatch(&mut self, event: SceneEvent) {
        match event {
            SceneEvent::Pointer(pointer) => self.handle_pointer(pointer),
            SceneEvent::Recognition {
                sprite,
                session,
                event,
            } => self.handle_recognition(sprite, session, event),
            SceneEvent::TimerElapsed(token) => self.timer_elapsed(token),
            SceneEvent::Command(command) => self.apply_command(command),
        }
    }

    /// Stops every session and cancels every timer. Sprites stay in place.
    pub fn shutdown(&mut self) {
        for controllers in self.controllers.values_mut() {
            controllers.monitor.stop(&mut self.outbox);
            controllers.selector.cancel(&mut self.outbox);
            controllers.gesture.cancel();
        }
        self.captures.clear();
        info!(target: TARGET, sprites = self.registry.len(), "scene shut down");
    }

    fn apply_command(&mut self, command: SceneCommand) {
        match command {
            SceneCommand::AddSprite {
                image,
                placement,
                reply,
            } => {
                let id = self.add_sprite(image, placement);
                if reply.send(id).is_err() {
                    debug!(target: TARGET, sprite = %id, "add_sprite caller went away");
                }
            }
            SceneCommand::RemoveSprite(id) => self.remove_sprite(id),
            SceneCommand::SetSelected(id) => self.set_selected(id),
            SceneCommand::ToggleMenu(id) => self.toggle_menu(id),
            SceneCommand::SetCatalogSelection { sprite, selection } => {
                self.set_catalog_selection(sprite, selection)
            }
            SceneCommand::SetAnimationMode { sprite, mode } => {
                self.set_animation_mode(sprite, mode)
            }
            SceneCommand::ToggleAnimationMode(id) => self.toggle_animation_mode(id),
            SceneCommand::BeginGesture {
                sprite,
                pointer,
                kind,
                position,
            } => {
                self.begin_gesture(sprite, pointer, kind, position);
            }
            SceneCommand::StartSpeech { sprite, reply } => {
                let result = self.start_speech(sprite);
                if reply.send(result).is_err() {
                    debug!(target: TARGET, sprite = %sprite, "start_speech caller went away");
                }
            }
            SceneCommand::StopSpeech(id) => self.stop_speech(id),
            SceneCommand::GetSprite { sprite, reply } => {
                if reply.send(self.registry.get(sprite).cloned()).is_err() {
                    debug!(target: TARGET, sprite = %sprite, "sprite query caller went away");
                }
            }
            SceneCommand::ListSprites { reply } => {
                if reply.send(self.registry.list_all().to_vec()).is_err() {
                    debug!(target: TARGET, "sprite list caller went away");
                }
            }
            SceneCommand::GetSessionState { sprite, reply } => {
                if reply.send(self.session_state(sprite)).is_err() {
                    debug!(target: TARGET, sprite = %sprite, "session state caller went away");
                }
            }
            SceneCommand::GetMenuStatus { sprite, reply } => {
                if reply.send(self.menu_status(sprite)).is_err() {
                    debug!(target: TARGET, sprite = %sprite, "menu status caller went away");
                }
            }
            SceneCommand::Shutdown => self.shutdown(),
        }
    }

    fn pointer_down(&mut self, event: PointerEvent) {
        if let Some(held) = self.captures.remove(&event.pointer) {
            warn!(target: TARGET, sprite = %held, "press without release, dropping stale gesture");
            if let Some(controllers) = self.controllers.get_mut(&held) {
                controllers.gesture.cancel();
            }
            self.registry.update(held, |sprite| sprite.cursor = Cursor::Move);
        }

        let hit = hit_test(
            self.registry.list_all(),
            event.position,
            self.config.handle_size,
        );
        let Some(hit) = hit else {
            // pressing empty canvas clears selection and closes menus
            self.registry.set_selected(None);
            return;
        };

        if let Some(selected) = self.registry.selected() {
            if selected != hit.sprite {
                self.registry.set_selected(None);
            }
        }
        self.begin_gesture(hit.sprite, event.pointer, hit.target.gesture(), event.position);
    }

    fn pointer_move(&mut self, event: PointerEvent) {
        let Some(id) = self.captures.get(&event.pointer).copied() else {
            return;
        };
        let Some(controllers) = self.controllers.get_mut(&id) else {
            self.captures.remove(&event.pointer);
            return;
        };
        if let Some(update) = controllers.gesture.update(event.position) {
            self.registry.update(id, |sprite| update.apply(sprite));
        }
    }

    fn pointer_up(&mut self, event: PointerEvent) {
        let Some(id) = self.captures.remove(&event.pointer) else {
            return;
        };
        let Some(controllers) = self.controllers.get_mut(&id) else {
            return;
        };
        let ended = controllers.gesture.end();
        self.registry.update(id, |sprite| sprite.cursor = Cursor::Move);

        match ended {
            GestureEnd::Click => self.click(id),
            GestureEnd::Completed(kind) => {
                if let Some(sprite) = self.registry.get(id) {
                    record_gesture_completed(sprite, kind);
                }
            }
            GestureEnd::Idle => {}
        }
    }

    /// A click toggles selection and the action menu together.
    fn click(&mut self, id: SpriteId) {
        let Some(selected) = self.registry.get(id).map(|sprite| sprite.selected) else {
            return;
        };
        if selected {
            self.registry.update(id, |sprite| {
                sprite.selected = false;
                sprite.menu_open = false;
            });
        } else {
            self.registry.set_selected(Some(id));
            self.registry.update(id, |sprite| sprite.menu_open = true);
        }
    }

    fn sync_talking(&mut self, id: SpriteId) {
        let Some(talking) = self
            .controllers
            .get(&id)
            .map(|controllers| controllers.monitor.talking())
        else {
            return;
        };
        let changed = self
            .registry
            .update(id, |sprite| std::mem::replace(&mut sprite.talking, talking) != talking)
            .unwrap_or(false);
        if changed {
            self.refresh_animation(id);
        }
    }

    fn refresh_animation(&mut self, id: SpriteId) {
        let Some(sprite) = self.registry.get(id) else {
            return;
        };
        let inputs = SelectorInputs::of(sprite);
        let current = sprite.active_animation;
        let Some(controllers) = self.controllers.get_mut(&id) else {
            return;
        };
        let next = controllers
            .selector
            .recompute(inputs, current, &mut self.rng, &mut self.outbox);
        self.set_active_animation(id, next);
    }

    fn set_active_animation(&mut self, id: SpriteId, next: ActiveAnimation) {
        let previous = self
            .registry
            .update(id, |sprite| std::mem::replace(&mut sprite.active_animation, next));
        if let Some(previous) = previous {
            if previous != next {
                record_animation_change(id, previous, next);
            }
        }
    }

    fn report_speech_error(&self, id: SpriteId, error: &SpeechError) {
        record_speech_failure(id, error);
        self.registry.notify(SceneUpdate::SpeechDiagnostic {
            sprite: id,
            error: error.clone(),
        });
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.shutdown();
    }
}
