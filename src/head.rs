//! Locate a head pixel inside a person box from local
//! intensity flatness.
//!
//! There is no head or pose model here. A short horizontal
//! run of near-equal intensities in a thin strip near the
//! top centre of the box is taken as exposed skin
//! (forehead). Clothing and hair boundaries show up as
//! sharp intensity jumps and break the run.
use ndarray::ArrayView1;
use serde_derive::*;
use tracing::debug;

use crate::{
    error::HeadRejection,
    geometry::{BoundingBox, PixelLocation},
    image::ThermalRaster,
};

/// Parameters of the head scan.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HeadLocatorConfig {
    /// Fraction of each half-width, measured from the box
    /// edges towards the centre, that is skipped.
    pub strip_factor: f64,

    /// Scan rows, as fractions of the box height below
    /// `ymin`.
    pub row_fractions: Vec<f64>,

    /// Length of a flat run, including its first pixel.
    pub run_length: usize,

    /// Largest accepted absolute intensity difference
    /// between the first pixel of a run and the others.
    pub tolerance: u16,
}

impl Default for HeadLocatorConfig {
    fn default() -> Self {
        HeadLocatorConfig {
            strip_factor: 0.9,
            row_fractions: vec![0.10, 0.09, 0.11],
            run_length: 4,
            tolerance: 5,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadEstimate {
    pub location: PixelLocation,
    pub intensity: u16,
}

/// A person box with a usable head reference.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReliablePerson {
    pub bbox: BoundingBox,
    pub head: PixelLocation,
    pub reference: u16,
}

/// Find the head pixel of the person in `bbox`.
///
/// The location is the centroid of all flat-run starts
/// found on the scan rows, rounded to the nearest pixel.
/// The returned intensity is read at that location again,
/// not averaged over the runs.
pub fn locate_head(
    raster: &ThermalRaster,
    bbox: &BoundingBox,
    config: &HeadLocatorConfig,
) -> Result<HeadEstimate, HeadRejection> {
    if !raster.contains(bbox) {
        return Err(HeadRejection::BoxOutOfBounds);
    }

    let (xlo, xhi) = scan_columns(bbox, config.strip_factor);
    let scan_end = xhi - config.run_length as i64;

    let mut candidates = vec![];
    for y in scan_rows(bbox, &config.row_fractions) {
        let row = match raster.row(y) {
            Some(row) => row,
            None => continue,
        };
        for k in xlo.max(0)..scan_end {
            let k = k as usize;
            if is_flat_run(&row, k, config) {
                candidates.push(PixelLocation::new(k, y));
            }
        }
    }

    let location = centroid(&candidates).ok_or(HeadRejection::NoHeadCandidate)?;
    let intensity = raster
        .intensity(location)
        .ok_or(HeadRejection::BoxOutOfBounds)?;
    Ok(HeadEstimate {
        location,
        intensity,
    })
}

/// Run [`locate_head`] on every box, keeping the boxes
/// that yield a head, in input order.
pub fn filter_reliable(
    raster: &ThermalRaster,
    boxes: &[BoundingBox],
    config: &HeadLocatorConfig,
) -> Vec<ReliablePerson> {
    boxes
        .iter()
        .filter_map(|bbox| match locate_head(raster, bbox, config) {
            Ok(head) => Some(ReliablePerson {
                bbox: *bbox,
                head: head.location,
                reference: head.intensity,
            }),
            Err(reason) => {
                debug!(?bbox, %reason, "excluding person");
                None
            }
        })
        .collect()
}

/// Horizontal `[xlo, xhi]` limits of the head strip.
fn scan_columns(bbox: &BoundingBox, strip_factor: f64) -> (i64, i64) {
    let (xmin, xmax) = (bbox.xmin as f64, bbox.xmax as f64);
    let cx = midpoint(bbox.xmin, bbox.xmax) as f64;
    let xlo = (xmin + (cx - xmin) * strip_factor) as i64;
    let xhi = (xmax - (xmax - cx) * strip_factor) as i64;
    (xlo, xhi)
}

fn scan_rows<'a>(bbox: &'a BoundingBox, fractions: &'a [f64]) -> impl Iterator<Item = usize> + 'a {
    let height = bbox.height() as f64;
    fractions
        .iter()
        .map(move |f| (bbox.ymin as f64 + f * height) as i64)
        .filter(|&y| y >= 0)
        .map(|y| y as usize)
}

/// Midpoint of `lo` and `hi`, rounding halves to even.
fn midpoint(lo: i32, hi: i32) -> i64 {
    let sum = lo as i64 + hi as i64;
    let half = sum.div_euclid(2);
    if sum.rem_euclid(2) == 1 && half.rem_euclid(2) == 1 {
        half + 1
    } else {
        half
    }
}

fn within(a: u16, b: u16, tolerance: u16) -> bool {
    let diff = if a > b { a - b } else { b - a };
    diff <= tolerance
}

fn is_flat_run(row: &ArrayView1<'_, u16>, k: usize, config: &HeadLocatorConfig) -> bool {
    let base = match row.get(k) {
        Some(&v) => v,
        None => return false,
    };
    (1..config.run_length).all(|j| {
        row.get(k + j)
            .map_or(false, |&v| within(base, v, config.tolerance))
    })
}

fn centroid(points: &[PixelLocation]) -> Option<PixelLocation> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0usize, 0usize), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(PixelLocation::new(
        (sx as f64 / n).round() as usize,
        (sy as f64 / n).round() as usize,
    ))
}
