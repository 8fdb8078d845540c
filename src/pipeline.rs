//! Drive head location and calibration over every image
//! of a detection map.
//!
//! Frames are independent: each worker owns the decoded
//! image it is processing, and the only shared state is
//! the read-only [`Settings`] and the [`AnnotationSink`].
use std::error::Error;

use indicatif::ProgressBar;
use itertools::Itertools;
use rayon::prelude::*;
use serde_derive::*;
use tracing::{debug, info, warn};

use crate::{
    annotate::{AnnotatedFrame, AnnotationSink},
    detections::DetectionMap,
    error::{CalibrationSkip, ScreeningError},
    geometry::BoundingBox,
    head::{filter_reliable, ReliablePerson},
    image::{ThermalImage, ThermalRaster},
    settings::Settings,
    stats::RunStats,
    temperature::{Calibration, Classification, TemperatureEstimate},
};

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FrameOutcome {
    Calibrated {
        calibration: Calibration,
        estimates: Vec<TemperatureEstimate>,
    },
    Uncalibrated {
        reason: CalibrationSkip,
    },
    Unavailable {
        error: String,
    },
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub image: String,
    pub dimensions: Option<(usize, usize)>,
    pub boxes: usize,
    pub reliable: Vec<ReliablePerson>,
    #[serde(flatten)]
    pub outcome: FrameOutcome,
}

impl FrameReport {
    pub fn unavailable(image: &str, boxes: usize, err: &ScreeningError) -> Self {
        let error = std::iter::successors(Some(err as &dyn Error), |&e| e.source()).join(": ");
        FrameReport {
            image: image.into(),
            dimensions: None,
            boxes,
            reliable: vec![],
            outcome: FrameOutcome::Unavailable { error },
        }
    }

    pub fn estimates(&self) -> &[TemperatureEstimate] {
        match &self.outcome {
            FrameOutcome::Calibrated { estimates, .. } => estimates.as_slice(),
            _ => &[],
        }
    }

    pub fn stats(&self) -> RunStats {
        let estimates = self.estimates();
        RunStats {
            images: 1,
            unavailable: matches!(self.outcome, FrameOutcome::Unavailable { .. }) as usize,
            boxes: self.boxes,
            reliable: self.reliable.len(),
            calibrated_images: matches!(self.outcome, FrameOutcome::Calibrated { .. }) as usize,
            estimates: estimates.len(),
            elevated: estimates
                .iter()
                .filter(|e| e.classification == Classification::Elevated)
                .count(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RunReport {
    pub frames: Vec<FrameReport>,
    pub stats: RunStats,
}

impl RunReport {
    pub fn from_frames(frames: Vec<FrameReport>) -> Self {
        let mut stats = RunStats::default();
        for frame in &frames {
            stats += frame.stats();
        }
        RunReport { frames, stats }
    }
}

/// Reliability filter followed by calibration, on an
/// already decoded raster.
pub fn process_raster(
    image_id: &str,
    raster: &ThermalRaster,
    boxes: &[BoundingBox],
    settings: &Settings,
) -> FrameReport {
    let reliable = filter_reliable(raster, boxes, &settings.head);
    let outcome = match Calibration::from_people(&reliable, &settings.calibration) {
        Ok(calibration) => FrameOutcome::Calibrated {
            estimates: calibration.estimate(&reliable, &settings.calibration),
            calibration,
        },
        Err(reason) => {
            debug!(image = image_id, %reason, "temperatures not computed");
            FrameOutcome::Uncalibrated { reason }
        }
    };
    FrameReport {
        image: image_id.into(),
        dimensions: Some(raster.dimensions()),
        boxes: boxes.len(),
        reliable,
        outcome,
    }
}

pub struct FrameProcessor<S> {
    settings: Settings,
    sink: S,
}

impl<S: AnnotationSink> FrameProcessor<S> {
    pub fn new(settings: Settings, sink: S) -> Self {
        FrameProcessor { settings, sink }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Load one image, compute its temperatures and hand
    /// a calibrated frame to the sink.
    pub fn process(&self, image_id: &str, boxes: &[BoundingBox]) -> Result<FrameReport, ScreeningError> {
        let image = ThermalImage::open(&self.settings.image_path(image_id))?;
        let report = process_raster(image_id, &image.raster, boxes, &self.settings);
        if let FrameOutcome::Calibrated { estimates, .. } = &report.outcome {
            self.sink
                .consume(&AnnotatedFrame::new(image_id, &image.source, estimates))?;
        }
        debug!(
            image = image_id,
            boxes = boxes.len(),
            reliable = report.reliable.len(),
            "processed frame"
        );
        Ok(report)
    }

    pub fn run(&self, detections: &DetectionMap) -> Result<RunReport, ScreeningError> {
        self.run_with_progress(detections, ProgressBar::hidden())
    }

    /// Process all images in parallel. Unavailable images
    /// are reported and skipped; any other error stops the
    /// run. Frames are reported in detection map order.
    pub fn run_with_progress(
        &self,
        detections: &DetectionMap,
        bar: ProgressBar,
    ) -> Result<RunReport, ScreeningError> {
        bar.set_length(detections.len() as u64);
        let frames: Vec<_> = detections.iter().collect();
        let reports = frames
            .into_par_iter()
            .map(|(image_id, boxes)| match self.process(image_id, boxes) {
                Err(err @ ScreeningError::ImageUnavailable { .. }) => {
                    warn!(image = image_id, error = %err, "skipping image");
                    Ok(FrameReport::unavailable(image_id, boxes.len(), &err))
                }
                res => res,
            })
            .inspect(|_| bar.inc(1))
            .collect::<Result<Vec<_>, _>>()?;
        bar.finish();

        let report = RunReport::from_frames(reports);
        info!(
            images = report.stats.images,
            calibrated = report.stats.calibrated_images,
            elevated = report.stats.elevated,
            "run complete"
        );
        Ok(report)
    }
}
