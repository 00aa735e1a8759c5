//! Runtime settings.
//!
//! Read from an optional TOML file with `PITCHTRACK__SECTION__KEY`
//! environment overrides (double underscore separators).

use crate::detection::{ClassCorrection, GOALKEEPER, PLAYER};
use crate::detector::DetectorConfig;
use crate::error::Error;
use crate::render::RenderStyle;
use crate::tracker::IouTrackerConfig;

use serde_derive::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub detector: DetectorSettings,
    pub tracker: TrackerSettings,
    pub cache: CacheSettings,
    pub render: RenderStyle,
    /// TrueType font for overlay text.
    pub font: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub confidence_threshold: f32,
    pub batch_size: usize,
    /// Detector class label to the label it is merged into.
    pub class_aliases: HashMap<String, String>,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        let defaults = DetectorConfig::default();

        Self {
            confidence_threshold: defaults.confidence_threshold,
            batch_size: defaults.batch_size,
            class_aliases: HashMap::from([(GOALKEEPER.to_string(), PLAYER.to_string())]),
        }
    }
}

impl DetectorSettings {
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            confidence_threshold: self.confidence_threshold,
            batch_size: self.batch_size,
        }
    }

    pub fn class_correction(&self) -> ClassCorrection {
        ClassCorrection::new(self.class_aliases.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    pub iou_threshold: f32,
    pub max_age: u32,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        let defaults = IouTrackerConfig::default();

        Self {
            iou_threshold: defaults.iou_threshold,
            max_age: defaults.max_age,
        }
    }
}

impl From<&TrackerSettings> for IouTrackerConfig {
    fn from(s: &TrackerSettings) -> Self {
        IouTrackerConfig {
            iou_threshold: s.iou_threshold,
            max_age: s.max_age,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub path: Option<PathBuf>,
    /// Reuse an existing snapshot instead of detecting again.
    pub read: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            path: None,
            read: true,
        }
    }
}

impl Settings {
    /// Defaults, overridden by `path` (when given) and then by the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("PITCHTRACK")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Color;

    #[test]
    fn defaults_without_sources() {
        let settings = Settings::load(None).unwrap();

        assert_eq!(settings.detector.batch_size, 20);
        assert_eq!(settings.detector.confidence_threshold, 0.1);
        assert_eq!(
            settings.detector.class_aliases.get(GOALKEEPER).map(String::as_str),
            Some(PLAYER)
        );
        assert!(settings.cache.read);
        assert_eq!(settings.render, RenderStyle::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pitchtrack.toml");
        std::fs::write(
            &path,
            r#"
font = "fonts/DejaVuSans.ttf"

[detector]
batch_size = 8

[cache]
path = "stubs/tracks.json"
read = false

[render]
referee_color = [0, 0, 255]

[render.panel]
alpha = 0.5
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();

        assert_eq!(settings.detector.batch_size, 8);
        assert_eq!(settings.detector.confidence_threshold, 0.1);
        assert_eq!(settings.cache.path, Some(PathBuf::from("stubs/tracks.json")));
        assert!(!settings.cache.read);
        assert_eq!(settings.render.referee_color, Color::rgb(0, 0, 255));
        assert_eq!(settings.render.panel.alpha, 0.5);
        assert_eq!(settings.render.panel.left, 1350);
        assert_eq!(settings.font, Some(PathBuf::from("fonts/DejaVuSans.ttf")));
    }
}
