use std::fmt;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::animation::{ActiveAnimation, AnimationMode, CatalogSelection};
use crate::config::SceneConfig;
use crate::speech::SpeechError;

use super::geometry::{initial_position, initial_size, ImagePlacement, PixelDimensions, Point, Size};

const TARGET: &str = "scene_registry";

/// Process-unique sprite identity. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SpriteId(pub u64);

impl fmt::Display for SpriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sprite-{}", self.0)
    }
}

/// Opaque handle to decoded pixel data owned by the image acquisition layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    data: Bytes,
    dimensions: PixelDimensions,
}

impl ImageRef {
    pub fn new(data: impl Into<Bytes>, dimensions: PixelDimensions) -> Self {
        Self {
            data: data.into(),
            dimensions,
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn dimensions(&self) -> PixelDimensions {
        self.dimensions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cursor {
    #[default]
    Move,
    Resize,
    Rotate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub id: SpriteId,
    pub image: ImageRef,
    pub position: Point,
    pub size: Size,
    pub rotation_degrees: f64,
    pub catalog_selection: CatalogSelection,
    pub animation_mode: AnimationMode,
    pub active_animation: ActiveAnimation,
    pub talking: bool,
    pub selected: bool,
    pub menu_open: bool,
    pub cursor: Cursor,
}

/// What the render surface needs to draw one sprite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderState {
    pub id: SpriteId,
    pub position: Point,
    pub size: Size,
    pub rotation_degrees: f64,
    pub active_animation: ActiveAnimation,
    pub animation_period_ms: u64,
    #[serde(skip)]
    pub image: ImageRef,
    pub selected: bool,
    pub menu_open: bool,
    pub cursor: Cursor,
}

impl RenderState {
    pub fn of(sprite: &Sprite, animation_period_ms: u64) -> Self {
        Self {
            id: sprite.id,
            position: sprite.position,
            size: sprite.size,
            rotation_degrees: sprite.rotation_degrees,
            active_animation: sprite.active_animation,
            animation_period_ms,
            image: sprite.image.clone(),
            selected: sprite.selected,
            menu_open: sprite.menu_open,
            cursor: sprite.cursor,
        }
    }
}

/// Notifications for renderers and other observers of the sprite set.
#[derive(Debug, Clone)]
pub enum SceneUpdate {
    Added(RenderState),
    Changed(RenderState),
    Removed(SpriteId),
    SpeechDiagnostic { sprite: SpriteId, error: SpeechError },
}

/// Owns the canonical sprite records, in insertion order.
pub struct SceneRegistry {
    sprites: Vec<Sprite>,
    next_id: u64,
    updates: broadcast::Sender<SceneUpdate>,
    config: SceneConfig,
}

impl SceneRegistry {
    pub fn new(config: SceneConfig) -> Self {
        let (updates, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            sprites: Vec::new(),
            next_id: 0,
            updates,
            config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SceneUpdate> {
        self.updates.subscribe()
    }

    pub fn update_sender(&self) -> broadcast::Sender<SceneUpdate> {
        self.updates.clone()
    }

    pub fn add(&mut self, image: ImageRef, placement: ImagePlacement) -> SpriteId {
        self.next_id += 1;
        let id = SpriteId(self.next_id);
        let size = initial_size(
            image.dimensions(),
            self.config.max_initial_edge,
            self.config.fallback_size,
        );
        let sprite = Sprite {
            id,
            image,
            position: initial_position(placement, size),
            size,
            rotation_degrees: 0.0,
            catalog_selection: self.config.default_selection,
            animation_mode: AnimationMode::SpeechGated,
            active_animation: ActiveAnimation::None,
            talking: false,
            selected: false,
            menu_open: false,
            cursor: Cursor::Move,
        };

        info!(
            target: TARGET,
            sprite = %id,
            width = size.width,
            height = size.height,
            "sprite added"
        );
        let state = self.render_state(&sprite);
        self.sprites.push(sprite);
        self.notify(SceneUpdate::Added(state));
        id
    }

    /// Unknown ids are a no-op.
    pub fn remove(&mut self, id: SpriteId) -> Option<Sprite> {
        let index = self.sprites.iter().position(|sprite| sprite.id == id)?;
        let removed = self.sprites.remove(index);
        info!(target: TARGET, sprite = %id, "sprite removed");
        self.notify(SceneUpdate::Removed(id));
        Some(removed)
    }

    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.iter().find(|sprite| sprite.id == id)
    }

    pub fn list_all(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Selects `id` and clears every other selection. `None` clears all;
    /// an unknown id changes nothing. Deselected sprites close their menu.
    pub fn set_selected(&mut self, id: Option<SpriteId>) {
        if let Some(target) = id {
            if self.get(target).is_none() {
                debug!(target: TARGET, sprite = %target, "ignoring selection of unknown sprite");
                return;
            }
        }

        let mut changed = Vec::new();
        for sprite in self.sprites.iter_mut() {
            let selected = Some(sprite.id) == id;
            if sprite.selected != selected || (!selected && sprite.menu_open) {
                sprite.selected = selected;
                if !selected {
                    sprite.menu_open = false;
                }
                changed.push(RenderState::of(sprite, self.config.animation_period_ms()));
            }
        }
        for state in changed {
            self.notify(SceneUpdate::Changed(state));
        }
    }

    pub fn selected(&self) -> Option<SpriteId> {
        self.sprites
            .iter()
            .find(|sprite| sprite.selected)
            .map(|sprite| sprite.id)
    }

    /// Mutates one record and notifies renderers if anything changed.
    pub(crate) fn update<R>(&mut self, id: SpriteId, apply: impl FnOnce(&mut Sprite) -> R) -> Option<R> {
        let period = self.config.animation_period_ms();
        let sprite = self.sprites.iter_mut().find(|sprite| sprite.id == id)?;
        let before = sprite.clone();
        let result = apply(sprite);
        if *sprite != before {
            let state = RenderState::of(sprite, period);
            self.notify(SceneUpdate::Changed(state));
        }
        Some(result)
    }

    pub(crate) fn notify(&self, update: SceneUpdate) {
        if self.updates.receiver_count() == 0 {
            return;
        }
        if let Err(err) = self.updates.send(update) {
            debug!(target: TARGET, %err, "no renderer listening for scene update");
        }
    }

    pub fn render_state(&self, sprite: &Sprite) -> RenderState {
        RenderState::of(sprite, self.config.animation_period_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::LoopAnimation;

    fn image() -> ImageRef {
        ImageRef::new(Bytes::from_static(b"png"), PixelDimensions::new(600, 300))
    }

    fn registry() -> SceneRegistry {
        SceneRegistry::new(SceneConfig::default())
    }

    #[test]
    fn new_sprites_use_documented_defaults() {
        let mut registry = registry();
        let id = registry.add(image(), ImagePlacement::DropPoint(Point::new(500.0, 400.0)));
        let sprite = registry.get(id).unwrap();

        assert_eq!(sprite.size, Size::new(300.0, 150.0));
        assert_eq!(sprite.position, Point::new(350.0, 325.0));
        assert_eq!(sprite.animation_mode, AnimationMode::SpeechGated);
        assert_eq!(sprite.active_animation, ActiveAnimation::None);
        assert_eq!(
            sprite.catalog_selection,
            CatalogSelection::Loop(LoopAnimation::Talk)
        );
        assert!(!sprite.talking);
        assert!(!sprite.selected);
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut registry = registry();
        let first = registry.add(image(), ImagePlacement::DropPoint(Point::default()));
        registry.remove(first);
        let second = registry.add(image(), ImagePlacement::DropPoint(Point::default()));

        assert_ne!(first, second);
        assert!(registry.get(first).is_none());
    }

    #[test]
    fn list_preserves_insertion_order() {
        let mut registry = registry();
        let ids: Vec<_> = (0..4)
            .map(|_| registry.add(image(), ImagePlacement::DropPoint(Point::default())))
            .collect();
        registry.remove(ids[1]);

        let listed: Vec<_> = registry.list_all().iter().map(|sprite| sprite.id).collect();
        assert_eq!(listed, vec![ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn removing_unknown_sprite_is_noop() {
        let mut registry = registry();
        registry.add(image(), ImagePlacement::DropPoint(Point::default()));
        assert!(registry.remove(SpriteId(42)).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn selection_is_exclusive() {
        let mut registry = registry();
        let a = registry.add(image(), ImagePlacement::DropPoint(Point::default()));
        let b = registry.add(image(), ImagePlacement::DropPoint(Point::default()));

        registry.set_selected(Some(a));
        registry.update(a, |sprite| sprite.menu_open = true);
        registry.set_selected(Some(b));

        assert!(!registry.get(a).unwrap().selected);
        assert!(!registry.get(a).unwrap().menu_open);
        assert!(registry.get(b).unwrap().selected);
        assert_eq!(registry.selected(), Some(b));

        registry.set_selected(Some(SpriteId(999)));
        assert_eq!(registry.selected(), Some(b));

        registry.set_selected(None);
        assert_eq!(registry.selected(), None);
    }

    #[test]
    fn subscribers_see_added_changed_removed() {
        let mut registry = registry();
        let mut updates = registry.subscribe();

        let id = registry.add(image(), ImagePlacement::DropPoint(Point::default()));
        registry.update(id, |sprite| sprite.rotation_degrees = 45.0);
        registry.update(id, |_| ());
        registry.remove(id);

        assert!(matches!(updates.try_recv(), Ok(SceneUpdate::Added(state)) if state.id == id));
        assert!(matches!(
            updates.try_recv(),
            Ok(SceneUpdate::Changed(state)) if state.rotation_degrees == 45.0
        ));
        assert!(matches!(updates.try_recv(), Ok(SceneUpdate::Removed(removed)) if removed == id));
        assert!(updates.try_recv().is_err());
    }
}
