/// Neither side of a sprite drops below this, whether placed or resized.
pub const MIN_SPRITE_SIZE: f64 = 50.0;
