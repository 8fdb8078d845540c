use criterion::*;
use ndarray::Array2;
use thermal_screen::{
    head::{filter_reliable, locate_head, HeadLocatorConfig},
    temperature::{normalize, CalibrationSettings},
    BoundingBox, ThermalRaster,
};

/// 640x512 frame (a common thermal sensor size) with soft
/// horizontal gradients so that flat runs are scattered.
fn synthetic_raster() -> ThermalRaster {
    ThermalRaster::from_intensities(Array2::from_shape_fn((512, 640), |(row, col)| {
        (2000 + (row / 7) * 3 + (col / 5) * 2 + (col % 3)) as u16
    }))
}

fn boxes() -> Vec<BoundingBox> {
    (0..12)
        .map(|i| {
            let x = 10 + i * 50;
            BoundingBox::new(x, 40, x + 45, 500)
        })
        .collect()
}

fn head_locator(c: &mut Criterion) {
    let raster = synthetic_raster();
    let config = HeadLocatorConfig::default();
    let boxes = boxes();

    c.bench_function("locate_head", |b| {
        b.iter(|| locate_head(black_box(&raster), black_box(&boxes[3]), &config))
    });

    c.bench_function("filter_and_normalize", |b| {
        let calibration = CalibrationSettings::default();
        b.iter(|| {
            let people = filter_reliable(black_box(&raster), &boxes, &config);
            normalize(&people, &calibration)
        })
    });
}

criterion_group! {
    name = screening;
    config = Criterion::default().sample_size(20);
    targets = head_locator
}

criterion_main!(screening);
