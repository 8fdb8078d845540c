//! Failure and skip conditions.
//!
//! Only [`ScreeningError`] is a real error. The other two
//! enums describe why a person or a frame was left out,
//! which is an expected outcome and is reported rather
//! than propagated.
use std::path::PathBuf;

use serde_derive::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScreeningError {
    #[error("could not load image `{}`", path.display())]
    ImageUnavailable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("could not read detections from `{}`", path.display())]
    DetectionsUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed detections: {0}")]
    MalformedDetections(#[from] serde_json::Error),

    #[error("could not save annotated image `{}`", path.display())]
    ExportFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Why a bounding box did not yield a head location.
#[derive(Serialize, Debug, Error, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HeadRejection {
    #[error("bounding box lies outside the image")]
    BoxOutOfBounds,

    #[error("no flat intensity run in the head strip")]
    NoHeadCandidate,
}

/// Why temperatures were not computed for a frame.
#[derive(Serialize, Debug, Error, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CalibrationSkip {
    #[error("need at least {required} reliable people to calibrate, found {found}")]
    InsufficientCalibrationPoints { found: usize, required: usize },

    #[error("coldest reference intensity is zero")]
    ZeroCalibrationIntensity,
}
