use crate::scene::geometry::{to_local, Point};
use crate::scene::registry::{Sprite, SpriteId};

use super::GestureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Body,
    ResizeHandle,
    RotateHandle,
}

impl HitTarget {
    pub fn gesture(&self) -> GestureKind {
        match self {
            HitTarget::Body => GestureKind::Move,
            HitTarget::ResizeHandle => GestureKind::Resize,
            HitTarget::RotateHandle => GestureKind::Rotate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub sprite: SpriteId,
    pub target: HitTarget,
}

/// Finds the topmost sprite under `point`. Later sprites draw on top, so the
/// list is searched back to front. Handles only exist on the selected sprite:
/// resize at the bottom-right corner, rotate at the top-right corner.
pub fn hit_test(sprites: &[Sprite], point: Point, handle_size: f64) -> Option<Hit> {
    sprites.iter().rev().find_map(|sprite| {
        let local = to_local(point, sprite.position, sprite.size, sprite.rotation_degrees);
        let width = sprite.size.width;
        let height = sprite.size.height;
        if !(0.0..=width).contains(&local.x) || !(0.0..=height).contains(&local.y) {
            return None;
        }

        let target = if sprite.selected && local.x >= width - handle_size {
            if local.y >= height - handle_size {
                HitTarget::ResizeHandle
            } else if local.y <= handle_size {
                HitTarget::RotateHandle
            } else {
                HitTarget::Body
            }
        } else {
            HitTarget::Body
        };

        Some(Hit {
            sprite: sprite.id,
            target,
        })
    })
}
