//! Pixel-space value types shared by the detector input,
//! the head scan and the annotation overlays.
use serde_derive::*;

/// Axis-aligned person box in pixel coordinates, as
/// produced by the upstream detector.
///
/// Serialized as a `[xmin, ymin, xmax, ymax]` array. Both
/// corners are inclusive. Nothing is assumed about the
/// box until it is checked against a raster with
/// [`BoundingBox::fits_within`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl BoundingBox {
    pub fn new(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        BoundingBox {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn width(&self) -> i32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> i32 {
        self.ymax - self.ymin
    }

    /// True if the corners are ordered and both lie inside
    /// an image of `width x height` pixels.
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        let inside = |lo: i32, hi: i32, extent: usize| {
            lo >= 0 && lo <= hi && (hi as i64) < extent as i64
        };
        inside(self.xmin, self.xmax, width) && inside(self.ymin, self.ymax, height)
    }
}

impl From<[i32; 4]> for BoundingBox {
    fn from([xmin, ymin, xmax, ymax]: [i32; 4]) -> Self {
        BoundingBox::new(xmin, ymin, xmax, ymax)
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.xmin, b.ymin, b.xmax, b.ymax]
    }
}

/// A `(column, row)` pixel position.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelLocation {
    pub x: usize,
    pub y: usize,
}

impl PixelLocation {
    pub fn new(x: usize, y: usize) -> Self {
        PixelLocation { x, y }
    }

    /// `(row, col)` index into an `ndarray` raster.
    pub fn index(&self) -> (usize, usize) {
        (self.y, self.x)
    }
}
