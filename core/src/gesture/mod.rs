//! Pointer-driven move / resize / rotate gestures for a single sprite.
//!
//! Each sprite owns one [`GestureController`]. A gesture begins on press,
//! updates on every move while the button is held and ends on release. The
//! scene routes moves to whichever sprite captured the pointer, so a drag
//! keeps working after the pointer leaves the sprite's bounds.

mod hit;

pub use hit::{hit_test, Hit, HitTarget};

use serde::Serialize;
use tracing::debug;

use crate::constants::MIN_SPRITE_SIZE;
use crate::scene::geometry::{angle_degrees, center_of, normalize_degrees, Point, Size};
use crate::scene::registry::{Cursor, Sprite};

const TARGET: &str = "gesture_controller";

/// Identifies a physical pointer (mouse, pen, or one touch contact).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct PointerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer: PointerId,
    pub phase: PointerPhase,
    pub position: Point,
}

impl PointerEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self::new(PointerPhase::Down, x, y)
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::new(PointerPhase::Move, x, y)
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::new(PointerPhase::Up, x, y)
    }

    fn new(phase: PointerPhase, x: f64, y: f64) -> Self {
        Self {
            pointer: PointerId::default(),
            phase,
            position: Point::new(x, y),
        }
    }

    pub fn with_pointer(mut self, pointer: PointerId) -> Self {
        self.pointer = pointer;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    Move,
    Resize,
    Rotate,
}

impl GestureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GestureKind::Move => "move",
            GestureKind::Resize => "resize",
            GestureKind::Rotate => "rotate",
        }
    }

    pub fn cursor(&self) -> Cursor {
        match self {
            GestureKind::Move => Cursor::Move,
            GestureKind::Resize => Cursor::Resize,
            GestureKind::Rotate => Cursor::Rotate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    /// Pressed on the body but not yet past the click threshold.
    Pressed { origin: Point, offset: Point },
    Moving { offset: Point },
    Resizing { origin: Point, initial: Size },
    Rotating {
        center: Point,
        start_angle: f64,
        start_rotation: f64,
    },
}

/// Fields a gesture update writes back to the sprite record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeometryUpdate {
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub rotation_degrees: Option<f64>,
}

impl GeometryUpdate {
    pub fn apply(&self, sprite: &mut Sprite) {
        if let Some(position) = self.position {
            sprite.position = position;
        }
        if let Some(size) = self.size {
            sprite.size = size;
        }
        if let Some(rotation) = self.rotation_degrees {
            sprite.rotation_degrees = rotation;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEnd {
    /// Released without ever leaving the click threshold.
    Click,
    Completed(GestureKind),
    /// Nothing was live.
    Idle,
}

#[derive(Debug, Clone)]
pub struct GestureController {
    state: GestureState,
    click_threshold: f64,
}

impl GestureController {
    pub fn new(click_threshold: f64) -> Self {
        Self {
            state: GestureState::Idle,
            click_threshold,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_live(&self) -> bool {
        !matches!(self.state, GestureState::Idle)
    }

    pub fn active_kind(&self) -> Option<GestureKind> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Pressed { .. } | GestureState::Moving { .. } => Some(GestureKind::Move),
            GestureState::Resizing { .. } => Some(GestureKind::Resize),
            GestureState::Rotating { .. } => Some(GestureKind::Rotate),
        }
    }

    /// Starts a gesture. Refused while another gesture on this sprite is live.
    pub fn begin(&mut self, kind: GestureKind, pointer: Point, sprite: &Sprite) -> bool {
        if self.is_live() {
            debug!(target: TARGET, sprite = %sprite.id, ?kind, "gesture already live");
            return false;
        }

        self.state = match kind {
            GestureKind::Move => GestureState::Pressed {
                origin: pointer,
                offset: pointer - sprite.position,
            },
            GestureKind::Resize => GestureState::Resizing {
                origin: pointer,
                initial: sprite.size,
            },
            GestureKind::Rotate => {
                let center = center_of(sprite.position, sprite.size);
                GestureState::Rotating {
                    center,
                    start_angle: angle_degrees(center, pointer),
                    start_rotation: sprite.rotation_degrees,
                }
            }
        };
        true
    }

    pub fn update(&mut self, pointer: Point) -> Option<GeometryUpdate> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Pressed { origin, offset } => {
                if pointer.distance(origin) <= self.click_threshold {
                    return None;
                }
                self.state = GestureState::Moving { offset };
                Some(GeometryUpdate {
                    position: Some(pointer - offset),
                    ..GeometryUpdate::default()
                })
            }
            GestureState::Moving { offset } => Some(GeometryUpdate {
                position: Some(pointer - offset),
                ..GeometryUpdate::default()
            }),
            GestureState::Resizing { origin, initial } => {
                let delta = pointer - origin;
                let size = Size::new(initial.width + delta.x, initial.height + delta.y)
                    .clamp_min(MIN_SPRITE_SIZE);
                Some(GeometryUpdate {
                    size: Some(size),
                    ..GeometryUpdate::default()
                })
            }
            GestureState::Rotating {
                center,
                start_angle,
                start_rotation,
            } => {
                let angle = angle_degrees(center, pointer);
                Some(GeometryUpdate {
                    rotation_degrees: Some(normalize_degrees(start_rotation + angle - start_angle)),
                    ..GeometryUpdate::default()
                })
            }
        }
    }

    pub fn end(&mut self) -> GestureEnd {
        let ended = match self.state {
            GestureState::Idle => GestureEnd::Idle,
            GestureState::Pressed { .. } => GestureEnd::Click,
            GestureState::Moving { .. } => GestureEnd::Completed(GestureKind::Move),
            GestureState::Resizing { .. } => GestureEnd::Completed(GestureKind::Resize),
            GestureState::Rotating { .. } => GestureEnd::Completed(GestureKind::Rotate),
        };
        self.state = GestureState::Idle;
        ended
    }

    /// Drops a live gesture without treating it as a click.
    pub fn cancel(&mut self) {
        self.state = GestureState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::animation::{ActiveAnimation, AnimationMode, CatalogSelection};
    use crate::scene::geometry::PixelDimensions;
    use crate::scene::registry::{ImageRef, SpriteId};

    fn sprite(position: Point, size: Size, rotation: f64) -> Sprite {
        Sprite {
            id: SpriteId(1),
            image: ImageRef::new(Bytes::new(), PixelDimensions::default()),
            position,
            size,
            rotation_degrees: rotation,
            catalog_selection: CatalogSelection::default(),
            animation_mode: AnimationMode::SpeechGated,
            active_animation: ActiveAnimation::None,
            talking: false,
            selected: false,
            menu_open: false,
            cursor: Cursor::Move,
        }
    }

    fn controller() -> GestureController {
        GestureController::new(3.0)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn move_keeps_grab_offset() {
        let target = sprite(Point::new(100.0, 100.0), Size::new(200.0, 200.0), 0.0);
        let mut gestures = controller();

        assert!(gestures.begin(GestureKind::Move, Point::new(150.0, 120.0), &target));
        let update = gestures.update(Point::new(400.0, -80.0)).unwrap();

        assert_eq!(update.position, Some(Point::new(350.0, -100.0)));
        assert_eq!(gestures.end(), GestureEnd::Completed(GestureKind::Move));
        assert!(!gestures.is_live());
    }

    #[test]
    fn release_within_threshold_is_a_click() {
        let target = sprite(Point::new(0.0, 0.0), Size::new(100.0, 100.0), 0.0);
        let mut gestures = controller();

        gestures.begin(GestureKind::Move, Point::new(10.0, 10.0), &target);
        assert_eq!(gestures.update(Point::new(11.0, 12.0)), None);

        assert_eq!(gestures.end(), GestureEnd::Click);
    }

    #[test]
    fn resize_clamps_to_minimum() {
        let target = sprite(Point::new(0.0, 0.0), Size::new(200.0, 200.0), 0.0);
        let mut gestures = controller();

        gestures.begin(GestureKind::Resize, Point::new(200.0, 200.0), &target);
        let update = gestures.update(Point::new(-300.0, -300.0)).unwrap();
        assert_eq!(update.size, Some(Size::new(50.0, 50.0)));

        let update = gestures.update(Point::new(260.0, 150.0)).unwrap();
        assert_eq!(update.size, Some(Size::new(260.0, 150.0)));
    }

    #[test]
    fn resize_survives_extreme_deltas() {
        let target = sprite(Point::new(0.0, 0.0), Size::new(80.0, 120.0), 0.0);
        let mut gestures = controller();
        gestures.begin(GestureKind::Resize, Point::new(0.0, 0.0), &target);

        for pointer in [
            Point::new(f64::MIN, f64::MIN),
            Point::new(-1e12, 1e12),
            Point::new(f64::NAN, -5.0),
            Point::new(-79.0, -119.0),
        ] {
            let size = gestures.update(pointer).unwrap().size.unwrap();
            assert!(size.width >= 50.0 && size.height >= 50.0, "{size:?}");
        }
    }

    #[test]
    fn rotate_adds_delta_to_starting_rotation() {
        // centre at (50, 50)
        let target = sprite(Point::new(0.0, 0.0), Size::new(100.0, 100.0), 350.0);
        let mut gestures = controller();

        gestures.begin(GestureKind::Rotate, Point::new(100.0, 50.0), &target);
        let update = gestures.update(Point::new(50.0, 100.0)).unwrap();

        // a quarter turn clockwise from 350 wraps to 80
        assert!(approx(update.rotation_degrees.unwrap(), 80.0));
    }

    #[test]
    fn rotation_stays_normalized() {
        let target = sprite(Point::new(0.0, 0.0), Size::new(100.0, 100.0), 0.0);
        let mut gestures = controller();
        gestures.begin(GestureKind::Rotate, Point::new(100.0, 50.0), &target);

        for step in 0..720 {
            let theta = (step as f64 * 7.0).to_radians();
            let pointer = Point::new(50.0 + 80.0 * theta.cos(), 50.0 - 80.0 * theta.sin());
            let rotation = gestures.update(pointer).unwrap().rotation_degrees.unwrap();
            assert!((0.0..360.0).contains(&rotation), "{rotation}");
        }
    }

    #[test]
    fn only_one_gesture_at_a_time() {
        let target = sprite(Point::new(0.0, 0.0), Size::new(100.0, 100.0), 0.0);
        let mut gestures = controller();

        assert!(gestures.begin(GestureKind::Resize, Point::new(90.0, 90.0), &target));
        assert!(!gestures.begin(GestureKind::Rotate, Point::new(90.0, 10.0), &target));
        assert_eq!(gestures.active_kind(), Some(GestureKind::Resize));

        gestures.cancel();
        assert_eq!(gestures.end(), GestureEnd::Idle);
    }
}
