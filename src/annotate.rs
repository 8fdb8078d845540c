//! Overlays for calibrated frames and the sinks that
//! receive them.
use std::{
    collections::HashSet,
    iter,
    path::{Component, Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut},
    rect::Rect,
};
use itertools::Itertools;
use serde_derive::*;
use tracing::{info, warn};

use crate::{
    error::ScreeningError,
    geometry::{BoundingBox, PixelLocation},
    temperature::{Classification, TemperatureEstimate},
};

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const HEAD_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const NORMAL_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const ELEVATED_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Label anchor offset above the box, in pixels.
const LABEL_OFFSET: i32 = 10;
const TAG_SIZE: u32 = 6;

/// Everything drawn for one person.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Overlay {
    pub bbox: BoundingBox,
    pub head: PixelLocation,
    pub label: String,
    pub label_anchor: (i32, i32),
    pub classification: Classification,
}

impl Overlay {
    pub fn from_estimate(estimate: &TemperatureEstimate) -> Self {
        let bbox = estimate.person.bbox;
        Overlay {
            bbox,
            head: estimate.person.head,
            label: estimate.label(),
            label_anchor: (bbox.xmin, bbox.ymin - LABEL_OFFSET),
            classification: estimate.classification,
        }
    }

    pub fn tag_color(&self) -> Rgb<u8> {
        match self.classification {
            Classification::Normal => NORMAL_COLOR,
            Classification::Elevated => ELEVATED_COLOR,
        }
    }

    /// Draw the box outline, head marker and the coloured
    /// classification tag at the label anchor.
    pub fn draw(&self, canvas: &mut RgbImage) {
        let b = &self.bbox;
        let outline = Rect::at(b.xmin, b.ymin)
            .of_size((b.width() + 1) as u32, (b.height() + 1) as u32);
        draw_hollow_rect_mut(canvas, outline, BOX_COLOR);

        let head = (self.head.x as i32, self.head.y as i32);
        draw_hollow_circle_mut(canvas, head, 1, HEAD_COLOR);

        let (tx, ty) = self.label_anchor;
        draw_filled_rect_mut(
            canvas,
            Rect::at(tx, ty).of_size(TAG_SIZE, TAG_SIZE),
            self.tag_color(),
        );
    }
}

/// A calibrated frame ready for display or export.
pub struct AnnotatedFrame<'a> {
    pub image_id: &'a str,
    pub source: &'a DynamicImage,
    pub overlays: Vec<Overlay>,
}

impl<'a> AnnotatedFrame<'a> {
    pub fn new(
        image_id: &'a str,
        source: &'a DynamicImage,
        estimates: &[TemperatureEstimate],
    ) -> Self {
        AnnotatedFrame {
            image_id,
            source,
            overlays: estimates.iter().map(Overlay::from_estimate).collect(),
        }
    }

    pub fn render(&self) -> RgbImage {
        let mut canvas = self.source.to_rgb8();
        for overlay in &self.overlays {
            overlay.draw(&mut canvas);
        }
        canvas
    }
}

/// Receives every calibrated frame of a run. Called from
/// worker threads, one frame at a time per thread.
pub trait AnnotationSink: Sync {
    fn consume(&self, frame: &AnnotatedFrame<'_>) -> Result<(), ScreeningError>;
}

/// Sink for runs that only want the report.
pub struct DiscardAnnotations;

impl AnnotationSink for DiscardAnnotations {
    fn consume(&self, _frame: &AnnotatedFrame<'_>) -> Result<(), ScreeningError> {
        Ok(())
    }
}

/// Writes `<stem>_processed.<ext>` into a directory.
///
/// Each output path is claimed once per writer. An image
/// whose name is already taken gets its parent folders
/// prefixed to the stem instead.
pub struct ProcessedImageWriter {
    output_dir: PathBuf,
    claimed: Mutex<HashSet<PathBuf>>,
}

impl ProcessedImageWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        ProcessedImageWriter {
            output_dir: output_dir.into(),
            claimed: Mutex::default(),
        }
    }

    pub fn processed_path(&self, image_id: &str) -> PathBuf {
        let (_, stem, ext) = name_parts(image_id);
        self.output_dir.join(format!("{}_processed.{}", stem, ext))
    }

    /// Reserve an output path for `image_id` that no other
    /// image of this run has been given.
    pub fn claim(&self, image_id: &str) -> PathBuf {
        let (folders, stem, ext) = name_parts(image_id);
        let preferred = self.processed_path(image_id);
        let prefix = if folders.is_empty() {
            String::new()
        } else {
            format!("{}_", folders)
        };
        let fallbacks = (1..).map(|n| {
            let suffix = if n == 1 { String::new() } else { format!("_{}", n) };
            self.output_dir
                .join(format!("{}{}_processed{}.{}", prefix, stem, suffix, ext))
        });

        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);
        let path = iter::once(preferred.clone())
            .chain(fallbacks)
            .find(|path| !claimed.contains(path))
            .unwrap_or_else(|| preferred.clone());
        if path != preferred {
            warn!(
                image = image_id,
                taken = %preferred.display(),
                path = %path.display(),
                "processed image name already used"
            );
        }
        claimed.insert(path.clone());
        path
    }
}

// `(parent folders joined by '_', stem, extension)`
fn name_parts(image_id: &str) -> (String, String, String) {
    let path = Path::new(image_id);
    let folders = path
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy()),
            _ => None,
        })
        .join("_");
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".into());
    let ext = path
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".into());
    (folders, stem, ext)
}

impl AnnotationSink for ProcessedImageWriter {
    fn consume(&self, frame: &AnnotatedFrame<'_>) -> Result<(), ScreeningError> {
        let path = self.claim(frame.image_id);
        frame
            .render()
            .save(&path)
            .map_err(|source| ScreeningError::ExportFailed {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), "saved annotated image");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::head::ReliablePerson;
    use image::GrayImage;

    fn estimate(bbox: BoundingBox, celsius: f64, classification: Classification) -> TemperatureEstimate {
        TemperatureEstimate {
            person: ReliablePerson {
                bbox,
                head: PixelLocation::new(
                    ((bbox.xmin + bbox.xmax) / 2) as usize,
                    (bbox.ymin + 3) as usize,
                ),
                reference: 100,
            },
            celsius,
            classification,
        }
    }

    #[test]
    fn processed_path_keeps_stem_and_extension() {
        let writer = ProcessedImageWriter::new("out");
        assert_eq!(
            writer.processed_path("frames/FLIR_0001.jpeg"),
            Path::new("out").join("FLIR_0001_processed.jpeg")
        );
        assert_eq!(
            writer.processed_path("raw_frame"),
            Path::new("out").join("raw_frame_processed.png")
        );
    }

    #[test]
    fn same_stem_in_other_folder_gets_distinct_path() {
        let writer = ProcessedImageWriter::new("out");
        let first = writer.claim("a/x.png");
        let second = writer.claim("b/x.png");
        let third = writer.claim("nested/b/x.png");

        assert_eq!(first, Path::new("out").join("x_processed.png"));
        assert_eq!(second, Path::new("out").join("b_x_processed.png"));
        assert_eq!(third, Path::new("out").join("nested_b_x_processed.png"));
        assert_eq!(writer.claim("./x.png"), Path::new("out").join("x_processed_2.png"));
    }

    #[test]
    fn overlay_carries_label_and_tag() {
        let e = estimate(BoundingBox::new(20, 30, 40, 60), 38.04, Classification::Elevated);
        let overlay = Overlay::from_estimate(&e);

        assert_eq!(overlay.label, "38.0 C");
        assert_eq!(overlay.label_anchor, (20, 20));
        assert_eq!(overlay.tag_color(), ELEVATED_COLOR);
    }

    #[test]
    fn render_draws_on_a_copy() {
        let source = DynamicImage::ImageLuma8(GrayImage::new(64, 64));
        let estimates = [
            estimate(BoundingBox::new(10, 15, 30, 50), 36.5, Classification::Normal),
            estimate(BoundingBox::new(0, 0, 63, 63), 40.0, Classification::Elevated),
        ];
        let frame = AnnotatedFrame::new("a.png", &source, &estimates);
        let canvas = frame.render();

        assert_eq!(canvas.dimensions(), (64, 64));
        assert_eq!(*canvas.get_pixel(10, 15), BOX_COLOR);
        assert_eq!(*canvas.get_pixel(63, 63), BOX_COLOR);
        // normal tag at (10, 5)
        assert_eq!(*canvas.get_pixel(12, 7), NORMAL_COLOR);
        // elevated tag is clipped at the top edge
        assert_eq!(*canvas.get_pixel(3, 0), BOX_COLOR);
        assert_eq!(*canvas.get_pixel(32, 32), Rgb([0, 0, 0]));
        assert_eq!(source.to_rgb8().get_pixel(10, 15), &Rgb([0, 0, 0]));
    }
}
