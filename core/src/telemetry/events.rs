use serde::Serialize;
use tracing::{info, warn};

use crate::animation::ActiveAnimation;
use crate::gesture::GestureKind;
use crate::scene::geometry::{Point, Size};
use crate::scene::registry::{Sprite, SpriteId};
use crate::speech::{SessionState, SpeechError};

pub(crate) const TARGET: &str = "telemetry::scene";
pub(crate) const EVENT_SPEECH_TRANSITION: &str = "speech_transition";
pub(crate) const EVENT_SPEECH_FAILURE: &str = "speech_failure";
pub(crate) const EVENT_ANIMATION_CHANGE: &str = "animation_change";
pub(crate) const EVENT_GESTURE_COMPLETED: &str = "gesture_completed";

#[derive(Debug, Serialize)]
pub struct SpeechTransitionEvent {
    pub sprite: SpriteId,
    pub from: SessionState,
    pub to: SessionState,
}

#[derive(Debug, Serialize)]
pub struct SpeechFailureEvent {
    pub sprite: SpriteId,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AnimationChangeEvent {
    pub sprite: SpriteId,
    pub from: ActiveAnimation,
    pub to: ActiveAnimation,
}

#[derive(Debug, Serialize)]
pub struct GestureCompletedEvent {
    pub sprite: SpriteId,
    pub gesture: GestureKind,
    pub position: Point,
    pub size: Size,
    pub rotation_degrees: f64,
}

pub fn record_speech_transition(sprite: SpriteId, from: SessionState, to: SessionState) {
    let event = SpeechTransitionEvent { sprite, from, to };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_SPEECH_TRANSITION,
            sprite = %event.sprite,
            from = event.from.as_str(),
            to = event.to.as_str(),
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_SPEECH_TRANSITION,
            %err,
            "failed to encode speech transition event"
        ),
    }
}

pub fn record_speech_failure(sprite: SpriteId, error: &SpeechError) {
    let event = SpeechFailureEvent {
        sprite,
        kind: error.kind(),
        message: error.to_string(),
    };

    match serde_json::to_string(&event) {
        Ok(payload) => warn!(
            target: TARGET,
            event = EVENT_SPEECH_FAILURE,
            sprite = %event.sprite,
            kind = event.kind,
            payload = %payload,
            "{}",
            event.message
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_SPEECH_FAILURE,
            %err,
            "failed to encode speech failure event"
        ),
    }
}

pub fn record_animation_change(sprite: SpriteId, from: ActiveAnimation, to: ActiveAnimation) {
    let event = AnimationChangeEvent { sprite, from, to };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_ANIMATION_CHANGE,
            sprite = %event.sprite,
            from = event.from.as_str(),
            to = event.to.as_str(),
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_ANIMATION_CHANGE,
            %err,
            "failed to encode animation change event"
        ),
    }
}

pub fn record_gesture_completed(sprite: &Sprite, gesture: GestureKind) {
    let event = GestureCompletedEvent {
        sprite: sprite.id,
        gesture,
        position: sprite.position,
        size: sprite.size,
        rotation_degrees: sprite.rotation_degrees,
    };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_GESTURE_COMPLETED,
            sprite = %event.sprite,
            gesture = event.gesture.as_str(),
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_GESTURE_COMPLETED,
            %err,
            "failed to encode gesture completed event"
        ),
    }
}
