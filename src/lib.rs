//! Estimate relative head temperatures of people detected
//! in thermal images.
//!
//! The input is a set of person bounding boxes per image
//! (from any detector) and the thermal frames themselves.
//! No camera calibration is needed or used:
//!
//! 1. A [head pixel](head::locate_head) is located inside
//! each box by scanning a thin strip near the top of the
//! box for short runs of near-equal intensity. Boxes
//! without such a run are dropped by the [reliability
//! filter](head::filter_reliable).
//!
//! 2. The coldest head in the frame is [assumed to be at a
//! baseline temperature](temperature) (36.5 C by default)
//! and all heads are scaled linearly against it. Heads
//! above a threshold (37.5 C by default) are classified as
//! elevated. Frames with fewer than two reliable people
//! are left uncalibrated.
//!
//! The [`pipeline`] module runs both steps over a
//! [`DetectionMap`] in parallel, hands calibrated frames to
//! an [`AnnotationSink`](annotate::AnnotationSink) and
//! collects a serializable [`RunReport`].
//!
//! # Usage
//!
//! ```rust
//! # fn test_compile() -> anyhow::Result<()> {
//! use std::path::Path;
//! use thermal_screen::{
//!     annotate::ProcessedImageWriter, DetectionMap, FrameProcessor, Settings,
//! };
//!
//! let detections = DetectionMap::from_path(Path::new("detections.json"))?;
//! let processor = FrameProcessor::new(Settings::default(), ProcessedImageWriter::new("."));
//! let report = processor.run(&detections)?;
//! eprintln!("{} people with elevated temperature", report.stats.elevated);
//! # Ok(())
//! # }
//! ```
//!
//! A single raster can be processed without any I/O:
//!
//! ```rust
//! use ndarray::Array2;
//! use thermal_screen::{
//!     head::{locate_head, HeadLocatorConfig},
//!     BoundingBox, ThermalRaster,
//! };
//!
//! let raster = ThermalRaster::from_intensities(Array2::from_elem((100, 200), 120u16));
//! let head = locate_head(
//!     &raster,
//!     &BoundingBox::new(0, 0, 199, 99),
//!     &HeadLocatorConfig::default(),
//! ).unwrap();
//! assert_eq!(head.intensity, 120);
//! ```

pub mod annotate;
pub mod detections;
pub mod error;
pub mod geometry;
pub mod head;
pub mod image;
pub mod pipeline;
pub mod settings;
pub mod stats;
pub mod temperature;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::detections::DetectionMap;
pub use crate::error::ScreeningError;
pub use crate::geometry::{BoundingBox, PixelLocation};
pub use crate::image::{ThermalImage, ThermalRaster};
pub use crate::pipeline::{FrameProcessor, FrameReport, RunReport};
pub use crate::settings::Settings;
