use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::constants::MIN_SPRITE_SIZE;

/// A point in canvas space, the same space pointer coordinates arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Component-wise lower bound. NaN components collapse to `min`.
    pub fn clamp_min(self, min: f64) -> Size {
        Size::new(self.width.max(min), self.height.max(min))
    }

    pub fn half(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Where a freshly accepted image should land on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImagePlacement {
    /// Centred on the point the image was dropped at.
    DropPoint(Point),
    /// Centred in the visible viewport (file picker path).
    Centered { viewport: Size },
}

/// Intrinsic pixel dimensions reported by the image acquisition layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelDimensions {
    pub width: u32,
    pub height: u32,
}

impl PixelDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Aspect-preserving initial size: the long edge never exceeds `max_edge`
/// and neither side drops below [`MIN_SPRITE_SIZE`].
pub(crate) fn initial_size(intrinsic: PixelDimensions, max_edge: f64, fallback: Size) -> Size {
    if intrinsic.is_empty() {
        return fallback.clamp_min(MIN_SPRITE_SIZE);
    }

    let width = f64::from(intrinsic.width);
    let height = f64::from(intrinsic.height);
    let long_edge = width.max(height);
    let scale = if long_edge > max_edge {
        max_edge / long_edge
    } else {
        1.0
    };

    Size::new(width * scale, height * scale).clamp_min(MIN_SPRITE_SIZE)
}

pub(crate) fn initial_position(placement: ImagePlacement, size: Size) -> Point {
    match placement {
        ImagePlacement::DropPoint(point) => point - size.half(),
        ImagePlacement::Centered { viewport } => viewport.half() - size.half(),
    }
}

pub(crate) fn center_of(position: Point, size: Size) -> Point {
    position + size.half()
}

/// Angle of `pointer` around `center` in degrees, clockwise in a y-down space.
pub(crate) fn angle_degrees(center: Point, pointer: Point) -> f64 {
    (pointer.y - center.y).atan2(pointer.x - center.x).to_degrees()
}

/// Folds any angle into `[0, 360)`.
pub(crate) fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }

    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360.0
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Maps a canvas point into the unrotated frame of a box whose top-left
/// corner sits at `position`, so hit-testing can ignore rotation.
pub(crate) fn to_local(point: Point, position: Point, size: Size, rotation_degrees: f64) -> Point {
    let center = center_of(position, size);
    let theta = (-rotation_degrees).to_radians();
    let (sin, cos) = theta.sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    let local = Point::new(dx * cos - dy * sin, dx * sin + dy * cos);
    local + size.half()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn landscape_image_is_capped_on_long_edge() {
        let size = initial_size(PixelDimensions::new(1200, 600), 300.0, Size::new(200.0, 200.0));
        assert_eq!(size, Size::new(300.0, 150.0));
    }

    #[test]
    fn small_image_keeps_intrinsic_size() {
        let size = initial_size(PixelDimensions::new(120, 80), 300.0, Size::new(200.0, 200.0));
        assert_eq!(size, Size::new(120.0, 80.0));
    }

    #[test]
    fn extreme_aspect_ratio_respects_minimum_side() {
        let size = initial_size(PixelDimensions::new(3000, 10), 300.0, Size::new(200.0, 200.0));
        assert_eq!(size, Size::new(300.0, 50.0));
    }

    #[test]
    fn missing_dimensions_use_fallback() {
        let size = initial_size(PixelDimensions::default(), 300.0, Size::new(200.0, 200.0));
        assert_eq!(size, Size::new(200.0, 200.0));
    }

    #[test]
    fn placement_centres_on_drop_point_and_viewport() {
        let size = Size::new(100.0, 60.0);
        assert_eq!(
            initial_position(ImagePlacement::DropPoint(Point::new(400.0, 300.0)), size),
            Point::new(350.0, 270.0)
        );
        assert_eq!(
            initial_position(
                ImagePlacement::Centered {
                    viewport: Size::new(960.0, 540.0)
                },
                size
            ),
            Point::new(430.0, 240.0)
        );
    }

    #[test]
    fn normalize_folds_into_half_open_range() {
        assert!(approx(normalize_degrees(370.0), 10.0));
        assert!(approx(normalize_degrees(-90.0), 270.0));
        assert!(approx(normalize_degrees(720.0), 0.0));
        assert_eq!(normalize_degrees(-1e-15), 0.0);
        assert_eq!(normalize_degrees(f64::NAN), 0.0);
    }

    #[test]
    fn to_local_undoes_rotation() {
        let position = Point::new(0.0, 0.0);
        let size = Size::new(100.0, 50.0);
        // A quarter turn clockwise puts the local right edge at the bottom.
        let local = to_local(Point::new(50.0, 70.0), position, size, 90.0);
        assert!(approx(local.x, 95.0));
        assert!(approx(local.y, 25.0));
    }
}
