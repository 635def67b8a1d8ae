use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::animation::CatalogSelection;
use crate::constants::MIN_SPRITE_SIZE;
use crate::scene::geometry::Size;
use crate::speech::SessionOptions;

pub const ENV_SILENCE_TIMEOUT_MS: &str = "AVATAR_SILENCE_TIMEOUT_MS";
pub const ENV_RANDOM_CYCLE_MS: &str = "AVATAR_RANDOM_CYCLE_MS";
pub const ENV_SPEECH_AUTOSTART: &str = "AVATAR_SPEECH_AUTOSTART";
pub const ENV_SPEECH_LANG: &str = "AVATAR_SPEECH_LANG";

const TARGET: &str = "config";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub max_initial_edge: f64,
    pub fallback_size: Size,
    #[serde(with = "duration_ms")]
    pub silence_timeout: Duration,
    #[serde(with = "duration_ms")]
    pub random_cycle_interval: Duration,
    pub click_threshold: f64,
    pub handle_size: f64,
    #[serde(with = "duration_ms")]
    pub animation_period: Duration,
    pub default_selection: CatalogSelection,
    pub auto_start_speech: bool,
    pub recognition_language: Option<String>,
    pub event_buffer: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_initial_edge: 300.0,
            fallback_size: Size::new(200.0, 200.0),
            silence_timeout: Duration::from_millis(1_000),
            random_cycle_interval: Duration::from_millis(2_000),
            click_threshold: 3.0,
            handle_size: 24.0,
            animation_period: Duration::from_millis(1_000),
            default_selection: CatalogSelection::default(),
            auto_start_speech: true,
            recognition_language: None,
            event_buffer: 64,
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: SceneConfig =
            serde_json::from_str(raw).context("failed to parse scene config")?;
        Ok(config.validated())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scene config {}", path.display()))?;
        Self::from_json_str(&raw)
    }

    /// Applies `AVATAR_*` environment overrides. Unparseable values are
    /// skipped with a warning.
    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(ENV_SILENCE_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.silence_timeout = Duration::from_millis(ms),
                Err(err) => warn!(target: TARGET, %err, value = %raw, "ignoring {ENV_SILENCE_TIMEOUT_MS}"),
            }
        }
        if let Some(raw) = lookup(ENV_RANDOM_CYCLE_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.random_cycle_interval = Duration::from_millis(ms),
                Err(err) => warn!(target: TARGET, %err, value = %raw, "ignoring {ENV_RANDOM_CYCLE_MS}"),
            }
        }
        if let Some(raw) = lookup(ENV_SPEECH_AUTOSTART) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.auto_start_speech = true,
                "0" | "false" | "no" | "off" => self.auto_start_speech = false,
                other => warn!(target: TARGET, value = %other, "ignoring {ENV_SPEECH_AUTOSTART}"),
            }
        }
        if let Some(raw) = lookup(ENV_SPEECH_LANG) {
            let lang = raw.trim();
            self.recognition_language = (!lang.is_empty()).then(|| lang.to_string());
        }
        self.validated()
    }

    /// Replaces values that would break sprite invariants with defaults.
    pub fn validated(mut self) -> Self {
        let defaults = SceneConfig::default();
        if !(self.max_initial_edge.is_finite() && self.max_initial_edge >= MIN_SPRITE_SIZE) {
            self.max_initial_edge = defaults.max_initial_edge;
        }
        if !(self.click_threshold.is_finite() && self.click_threshold >= 0.0) {
            self.click_threshold = defaults.click_threshold;
        }
        if !(self.handle_size.is_finite() && self.handle_size >= 0.0) {
            self.handle_size = defaults.handle_size;
        }
        if self.silence_timeout.is_zero() {
            self.silence_timeout = defaults.silence_timeout;
        }
        if self.random_cycle_interval.is_zero() {
            self.random_cycle_interval = defaults.random_cycle_interval;
        }
        if self.event_buffer == 0 {
            self.event_buffer = defaults.event_buffer;
        }
        self
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            language: self.recognition_language.clone(),
            ..SessionOptions::default()
        }
    }

    pub fn animation_period_ms(&self) -> u64 {
        self.animation_period.as_millis().min(u64::MAX as u128) as u64
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
