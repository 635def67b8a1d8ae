//! Animation catalog and the per-sprite selector that decides which loop,
//! if any, the renderer plays.

pub mod catalog;
pub mod selector;

pub use catalog::{ActiveAnimation, AnimationMode, CatalogSelection, LoopAnimation, UnknownAnimation};
pub use selector::{AnimationSelector, Resolution, SelectorInputs};
