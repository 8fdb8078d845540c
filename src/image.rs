use std::path::Path;

use image::{DynamicImage, ImageBuffer, Pixel};
use ndarray::{Array2, ArrayView1};

use crate::{
    error::ScreeningError,
    geometry::{BoundingBox, PixelLocation},
};

/// Single-channel radiometric proxy of a thermal frame.
///
/// Values are channel 0 of the frame in BGR order: the
/// blue channel of colour sources and the luma of grey
/// ones. They are widened to `u16` so that 8-bit and 16-bit
/// sources share one representation. Indexed as `[row, col]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalRaster {
    intensities: Array2<u16>,
}

impl ThermalRaster {
    pub fn from_intensities(intensities: Array2<u16>) -> Self {
        ThermalRaster { intensities }
    }

    pub fn from_dynamic(image: &DynamicImage) -> Self {
        use DynamicImage::*;
        #[allow(unreachable_patterns)]
        let intensities = match image {
            ImageLuma8(buf) => channel(buf, 0),
            ImageLumaA8(buf) => channel(buf, 0),
            ImageRgb8(buf) => channel(buf, BLUE),
            ImageRgba8(buf) => channel(buf, BLUE),
            ImageBgr8(buf) => channel(buf, 0),
            ImageBgra8(buf) => channel(buf, 0),
            ImageLuma16(buf) => channel(buf, 0),
            ImageLumaA16(buf) => channel(buf, 0),
            ImageRgb16(buf) => channel(buf, BLUE),
            ImageRgba16(buf) => channel(buf, BLUE),
            other => channel(&other.to_rgba8(), BLUE),
        };
        ThermalRaster { intensities }
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (usize, usize) {
        let (ht, wid) = self.intensities.dim();
        (wid, ht)
    }

    pub fn contains(&self, bbox: &BoundingBox) -> bool {
        let (wid, ht) = self.dimensions();
        bbox.fits_within(wid, ht)
    }

    pub fn intensity(&self, at: PixelLocation) -> Option<u16> {
        self.intensities.get(at.index()).copied()
    }

    pub fn row(&self, y: usize) -> Option<ArrayView1<'_, u16>> {
        (y < self.intensities.nrows()).then(|| self.intensities.row(y))
    }

    pub fn intensities(&self) -> &Array2<u16> {
        &self.intensities
    }
}

// Blue in RGB(A) layouts.
const BLUE: usize = 2;

fn channel<P>(buffer: &ImageBuffer<P, Vec<P::Subpixel>>, index: usize) -> Array2<u16>
where
    P: Pixel + 'static,
    P::Subpixel: Into<u16> + 'static,
{
    let (wid, ht) = buffer.dimensions();
    Array2::from_shape_fn((ht as usize, wid as usize), |(row, col)| {
        buffer.get_pixel(col as u32, row as u32).channels()[index].into()
    })
}

/// A decoded frame: the source pixels (kept for annotation)
/// and the raster the head scan reads from.
pub struct ThermalImage {
    pub source: DynamicImage,
    pub raster: ThermalRaster,
}

impl ThermalImage {
    pub fn from_dynamic(source: DynamicImage) -> Self {
        let raster = ThermalRaster::from_dynamic(&source);
        ThermalImage { source, raster }
    }

    pub fn open(path: &Path) -> Result<Self, ScreeningError> {
        let source = image::open(path).map_err(|source| ScreeningError::ImageUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_dynamic(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Bgr, GrayImage, Luma, Rgb, RgbImage, Rgba};

    #[test]
    fn rgb_raster_reads_blue() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, Rgb([40, 90, 200]));
        let raster = ThermalRaster::from_dynamic(&DynamicImage::ImageRgb8(img));

        assert_eq!(raster.dimensions(), (3, 2));
        assert_eq!(raster.intensity(PixelLocation::new(2, 1)), Some(200));
        assert_eq!(raster.intensity(PixelLocation::new(0, 0)), Some(0));
    }

    #[test]
    fn colour_layouts_agree_on_blue() {
        let rgb = RgbImage::from_pixel(2, 2, Rgb([10, 20, 200]));
        let bgr = ImageBuffer::from_pixel(2, 2, Bgr([200u8, 20, 10]));
        let rgba16 = ImageBuffer::from_pixel(2, 2, Rgba([10u16, 20, 4000, 65535]));
        let at = PixelLocation::new(1, 1);

        let rgb = ThermalRaster::from_dynamic(&DynamicImage::ImageRgb8(rgb));
        let bgr = ThermalRaster::from_dynamic(&DynamicImage::ImageBgr8(bgr));
        let rgba16 = ThermalRaster::from_dynamic(&DynamicImage::ImageRgba16(rgba16));

        assert_eq!(rgb.intensity(at), Some(200));
        assert_eq!(bgr.intensity(at), Some(200));
        assert_eq!(rgba16.intensity(at), Some(4000));
    }

    #[test]
    fn out_of_range_reads_are_none() {
        let img = GrayImage::from_pixel(4, 4, Luma([7]));
        let raster = ThermalRaster::from_dynamic(&DynamicImage::ImageLuma8(img));

        assert_eq!(raster.intensity(PixelLocation::new(3, 3)), Some(7));
        assert_eq!(raster.intensity(PixelLocation::new(4, 0)), None);
        assert_eq!(raster.intensity(PixelLocation::new(0, 4)), None);
        assert!(raster.row(3).is_some());
        assert!(raster.row(4).is_none());
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = ThermalImage::open(Path::new("does/not/exist.png"))
            .err()
            .expect("open should fail");
        assert!(matches!(err, ScreeningError::ImageUnavailable { .. }));
    }
}
