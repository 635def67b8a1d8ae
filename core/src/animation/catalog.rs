use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fixed set of named loop animations the renderer knows how to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopAnimation {
    Talk,
    Walk,
    Wave,
    Jump,
    Spin,
    Pulse,
    Shake,
    Dance,
}

impl LoopAnimation {
    pub const CATALOG: [LoopAnimation; 8] = [
        LoopAnimation::Talk,
        LoopAnimation::Walk,
        LoopAnimation::Wave,
        LoopAnimation::Jump,
        LoopAnimation::Spin,
        LoopAnimation::Pulse,
        LoopAnimation::Shake,
        LoopAnimation::Dance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoopAnimation::Talk => "talk",
            LoopAnimation::Walk => "walk",
            LoopAnimation::Wave => "wave",
            LoopAnimation::Jump => "jump",
            LoopAnimation::Spin => "spin",
            LoopAnimation::Pulse => "pulse",
            LoopAnimation::Shake => "shake",
            LoopAnimation::Dance => "dance",
        }
    }
}

impl fmt::Display for LoopAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown animation `{name}`")]
pub struct UnknownAnimation {
    pub name: String,
}

impl FromStr for LoopAnimation {
    type Err = UnknownAnimation;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        LoopAnimation::CATALOG
            .iter()
            .copied()
            .find(|animation| animation.as_str() == normalized)
            .ok_or_else(|| UnknownAnimation {
                name: value.to_string(),
            })
    }
}

/// What the user picked in the action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CatalogSelection {
    None,
    Random,
    Loop(LoopAnimation),
}

impl CatalogSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogSelection::None => "none",
            CatalogSelection::Random => "random",
            CatalogSelection::Loop(animation) => animation.as_str(),
        }
    }
}

impl Default for CatalogSelection {
    fn default() -> Self {
        CatalogSelection::Loop(LoopAnimation::Talk)
    }
}

impl From<LoopAnimation> for CatalogSelection {
    fn from(animation: LoopAnimation) -> Self {
        CatalogSelection::Loop(animation)
    }
}

impl FromStr for CatalogSelection {
    type Err = UnknownAnimation;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(CatalogSelection::None),
            "random" => Ok(CatalogSelection::Random),
            _ => value.parse().map(CatalogSelection::Loop),
        }
    }
}

impl TryFrom<String> for CatalogSelection {
    type Error = UnknownAnimation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CatalogSelection> for String {
    fn from(selection: CatalogSelection) -> Self {
        selection.as_str().to_string()
    }
}

impl fmt::Display for CatalogSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The animation actually handed to the renderer. `random` cannot be
/// represented here; it is always resolved to a catalog entry first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "String")]
pub enum ActiveAnimation {
    #[default]
    None,
    Playing(LoopAnimation),
}

impl ActiveAnimation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveAnimation::None => "none",
            ActiveAnimation::Playing(animation) => animation.as_str(),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, ActiveAnimation::Playing(_))
    }
}

impl From<ActiveAnimation> for String {
    fn from(active: ActiveAnimation) -> Self {
        active.as_str().to_string()
    }
}

impl fmt::Display for ActiveAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationMode {
    /// Animate regardless of speech activity.
    Always,
    /// Animate only while the sprite is talking.
    #[default]
    SpeechGated,
}

impl AnimationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationMode::Always => "always",
            AnimationMode::SpeechGated => "speech_gated",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            AnimationMode::Always => AnimationMode::SpeechGated,
            AnimationMode::SpeechGated => AnimationMode::Always,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_catalog_names_case_insensitively() {
        assert_eq!("Wave".parse::<LoopAnimation>(), Ok(LoopAnimation::Wave));
        assert_eq!(
            " dance ".parse::<CatalogSelection>(),
            Ok(CatalogSelection::Loop(LoopAnimation::Dance))
        );
        assert_eq!(
            "RANDOM".parse::<CatalogSelection>(),
            Ok(CatalogSelection::Random)
        );
        assert_eq!("none".parse::<CatalogSelection>(), Ok(CatalogSelection::None));
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "moonwalk".parse::<CatalogSelection>().unwrap_err();
        assert_eq!(err.name, "moonwalk");
        assert_eq!(err.to_string(), "unknown animation `moonwalk`");
    }

    #[test]
    fn selection_serializes_as_plain_name() {
        let json = serde_json::to_string(&CatalogSelection::Random).unwrap();
        assert_eq!(json, "\"random\"");
        let parsed: CatalogSelection = serde_json::from_str("\"jump\"").unwrap();
        assert_eq!(parsed, CatalogSelection::Loop(LoopAnimation::Jump));
    }

    #[test]
    fn mode_toggles_between_both_variants() {
        assert_eq!(AnimationMode::Always.toggled(), AnimationMode::SpeechGated);
        assert_eq!(AnimationMode::SpeechGated.toggled(), AnimationMode::Always);
    }
}
