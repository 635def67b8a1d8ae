//! Avatar Sprite Core
//!
//! Interaction and animation control for image sprites placed on a canvas:
//! pointer gestures that move, resize and rotate them, a per-sprite speech
//! activity monitor, and the loop-animation selection that reacts to it.
//!
//! [`scene::Scene`] is the synchronous core; [`runtime::SceneRuntime`] drives
//! it from a tokio task and turns its timer commands into real sleeps.

pub mod animation;
pub mod config;
pub mod constants;
pub mod gesture;
pub mod runtime;
pub mod scene;
pub mod speech;
pub mod telemetry;
