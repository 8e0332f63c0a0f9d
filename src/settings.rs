use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use anyhow::{Context, ensure};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::store::FILE_EXTENSION;

pub const SETTINGS_FILE: &str = "birdbrush.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub title: String,
    pub canvas_size: [u32; 2],
    pub background: Color,
    /// Color painted while the eraser is on
    pub eraser_color: Color,
    pub default_color: Color,
    pub default_width: u32,
    pub min_width: u32,
    pub max_width: u32,
    pub palette: Vec<Color>,
    pub document_path: PathBuf,
    pub export_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "BirdBrush (BBF version 1)".to_string(),
            canvas_size: [700, 700],
            background: Color::named("white"),
            eraser_color: Color::named("white"),
            default_color: Color::named("black"),
            default_width: 2,
            min_width: 1,
            max_width: 50,
            palette: ["black", "red", "green", "blue", "yellow"]
                .into_iter()
                .map(Color::named)
                .collect(),
            document_path: PathBuf::from(format!("drawing.{}", FILE_EXTENSION)),
            export_path: PathBuf::from("drawing.png"),
        }
    }
}

impl Settings {
    pub fn width_range(&self) -> RangeInclusive<u32> {
        self.min_width..=self.max_width
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.min_width >= 1, "min_width must be at least 1");
        ensure!(
            self.width_range().contains(&self.default_width),
            "default_width {} is outside {}..={}",
            self.default_width,
            self.min_width,
            self.max_width
        );
        ensure!(
            self.canvas_size[0] > 0 && self.canvas_size[1] > 0,
            "canvas_size must be non-zero"
        );
        Ok(())
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&contents)
            .with_context(|| format!("parsing settings in {}", path.display()))?;
        settings
            .validate()
            .with_context(|| format!("invalid settings in {}", path.display()))?;
        Ok(settings)
    }

    /// Like [`Settings::load`], but a missing or broken file yields defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("{:#}; using defaults", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::TempPath;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.width_range(), 1..=50);
        assert_eq!(settings.palette.len(), 5);
    }

    #[test]
    fn test_partial_file() {
        let path = TempPath::new("json");
        std::fs::write(&path.0, r##"{ "default_width": 5, "background": "#eeeeee" }"##).unwrap();

        let settings = Settings::load(&path.0).unwrap();
        assert_eq!(settings.default_width, 5);
        assert_eq!(settings.background, Color::from_rgb((0xee, 0xee, 0xee)));
        assert_eq!(settings.max_width, 50);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let path = TempPath::new("json");
        std::fs::write(&path.0, r#"{ "default_width": 99 }"#).unwrap();

        assert!(Settings::load(&path.0).is_err());
        assert_eq!(Settings::load_or_default(&path.0), Settings::default());

        let missing = TempPath::new("json");
        assert_eq!(Settings::load_or_default(&missing.0), Settings::default());
    }
}
