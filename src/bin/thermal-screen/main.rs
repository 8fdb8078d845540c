mod args;

use std::{
    fs::{create_dir_all, File},
    io::{stdout, BufWriter, Write},
};

use anyhow::{Context, Result};
use tracing::info;

use args::Args;
use thermal_screen::{
    annotate::{AnnotationSink, DiscardAnnotations, ProcessedImageWriter},
    cli::{init_logging, progress_bar},
    DetectionMap, FrameProcessor, RunReport, Settings,
};

fn main() -> Result<()> {
    init_logging();
    let args = Args::from_cmd_line()?;

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("could not configure worker threads")?;
    }

    let settings = args.settings()?;
    let detections = DetectionMap::from_path(&args.detections)?;
    info!(
        images = detections.len(),
        boxes = detections.box_count(),
        "loaded detections"
    );

    let report = if settings.save {
        create_dir_all(&settings.output_dir).with_context(|| {
            format!("could not create `{}`", settings.output_dir.display())
        })?;
        let writer = ProcessedImageWriter::new(&settings.output_dir);
        run(settings, writer, &detections)?
    } else {
        run(settings, DiscardAnnotations, &detections)?
    };

    match &args.report {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("could not create report `{}`", path.display()))?;
            write_report(BufWriter::new(file), &report)?;
        }
        None => write_report(stdout().lock(), &report)?,
    }

    eprintln!(
        "Processed {} images: {} calibrated, {} elevated of {} estimates",
        report.stats.images,
        report.stats.calibrated_images,
        report.stats.elevated,
        report.stats.estimates,
    );
    Ok(())
}

fn run<S: AnnotationSink>(
    settings: Settings,
    sink: S,
    detections: &DetectionMap,
) -> Result<RunReport> {
    let bar = progress_bar(detections.len() as u64);
    Ok(FrameProcessor::new(settings, sink).run_with_progress(detections, bar)?)
}

fn write_report<W: Write>(mut out: W, report: &RunReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
