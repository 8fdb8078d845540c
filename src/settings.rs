use std::{fs::File, io::BufReader, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use serde_derive::*;

use crate::{head::HeadLocatorConfig, temperature::CalibrationSettings};

/// Run configuration.
///
/// Every field has a default, so a settings file only
/// needs the values it changes:
///
/// ```json
/// { "save": true, "calibration": { "elevated_above_celsius": 38.0 } }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Persist annotated frames to `output_dir`.
    pub save: bool,
    pub output_dir: PathBuf,

    /// Prefix for relative image paths in the detections.
    pub image_root: Option<PathBuf>,

    pub head: HeadLocatorConfig,
    pub calibration: CalibrationSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            save: false,
            output_dir: PathBuf::from("."),
            image_root: None,
            head: HeadLocatorConfig::default(),
            calibration: CalibrationSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("could not open settings `{}`", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("could not parse settings `{}`", path.display()))
    }

    /// Path of the image named `image_id` in the
    /// detections.
    pub fn image_path(&self, image_id: &str) -> PathBuf {
        match &self.image_root {
            Some(root) => root.join(image_id),
            None => PathBuf::from(image_id),
        }
    }
}
