use anyhow::Result;
use clap::value_t_or_exit;
use std::path::PathBuf;
use thermal_screen::{arg, args_parser, opt, Settings};

pub struct Args {
    pub detections: PathBuf,
    pub config: Option<PathBuf>,
    pub save: bool,
    pub output: Option<PathBuf>,
    pub image_root: Option<PathBuf>,
    pub baseline: Option<f64>,
    pub elevated_above: Option<f64>,
    pub report: Option<PathBuf>,
    pub jobs: Option<usize>,
}

impl Args {
    pub fn from_cmd_line() -> Result<Args> {
        let matches = args_parser!("thermal-screen")
            .about("Estimate relative head temperatures of people detected in thermal images.")
            .arg(
                opt!("save")
                    .short("s")
                    .takes_value(false)
                    .help("Save annotated images as <stem>_processed.<ext>"),
            )
            .arg(
                opt!("output")
                    .short("o")
                    .help("Directory for annotated images.  Default is the working directory"),
            )
            .arg(opt!("image root").help("Directory that relative image paths are resolved against"))
            .arg(opt!("baseline").help("Temperature assigned to the coldest head.  Default is 36.5"))
            .arg(
                opt!("elevated above")
                    .help("Temperatures above this are elevated.  Default is 37.5"),
            )
            .arg(
                opt!("report")
                    .short("r")
                    .help("Write the JSON report here (default: stdout)"),
            )
            .arg(opt!("jobs").short("j").help("Number of worker threads"))
            .arg(
                opt!("config")
                    .short("c")
                    .help("JSON settings file; flags override its values"),
            )
            .arg(
                arg!("detections")
                    .required(true)
                    .help("JSON map from image path to person boxes"),
            )
            .get_matches();

        let path_of = |name: &str| matches.value_of(name).map(PathBuf::from);
        let detections = value_t_or_exit!(matches, "detections", PathBuf);
        let baseline = matches
            .is_present("baseline")
            .then(|| value_t_or_exit!(matches.value_of("baseline"), f64));
        let elevated_above = matches
            .is_present("elevated above")
            .then(|| value_t_or_exit!(matches.value_of("elevated above"), f64));
        let jobs = matches
            .is_present("jobs")
            .then(|| value_t_or_exit!(matches.value_of("jobs"), usize));

        Ok(Args {
            detections,
            config: path_of("config"),
            save: matches.is_present("save"),
            output: path_of("output"),
            image_root: path_of("image root"),
            baseline,
            elevated_above,
            report: path_of("report"),
            jobs,
        })
    }

    /// Settings file (or defaults) with command line
    /// overrides applied.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_json_path(path)?,
            None => Settings::default(),
        };
        settings.save |= self.save;
        if let Some(output) = &self.output {
            settings.output_dir = output.clone();
        }
        if let Some(root) = &self.image_root {
            settings.image_root = Some(root.clone());
        }
        if let Some(baseline) = self.baseline {
            settings.calibration.baseline_celsius = baseline;
        }
        if let Some(elevated_above) = self.elevated_above {
            settings.calibration.elevated_above_celsius = elevated_above;
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn args(config: Option<PathBuf>) -> Args {
        Args {
            detections: PathBuf::from("detections.json"),
            config,
            save: false,
            output: None,
            image_root: None,
            baseline: None,
            elevated_above: None,
            report: None,
            jobs: None,
        }
    }

    #[test]
    fn no_flags_keep_defaults() -> Result<()> {
        assert_eq!(args(None).settings()?, Settings::default());
        Ok(())
    }

    #[test]
    fn flags_override_settings_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = dir.path().join("settings.json");
        fs::write(
            &config,
            r#"{
                "save": false,
                "output_dir": "from_file",
                "image_root": "frames",
                "calibration": { "baseline_celsius": 36.0, "elevated_above_celsius": 38.0 }
            }"#,
        )?;

        let file_only = args(Some(config.clone())).settings()?;
        assert!(!file_only.save);
        assert_eq!(file_only.output_dir, PathBuf::from("from_file"));
        assert_eq!(file_only.calibration.baseline_celsius, 36.0);
        assert_eq!(file_only.calibration.elevated_above_celsius, 38.0);

        let merged = Args {
            save: true,
            output: Some(PathBuf::from("from_flag")),
            baseline: Some(36.8),
            elevated_above: Some(37.2),
            ..args(Some(config))
        }
        .settings()?;
        assert!(merged.save);
        assert_eq!(merged.output_dir, PathBuf::from("from_flag"));
        assert_eq!(merged.image_root, Some(PathBuf::from("frames")));
        assert_eq!(merged.calibration.baseline_celsius, 36.8);
        assert_eq!(merged.calibration.elevated_above_celsius, 37.2);
        Ok(())
    }

    #[test]
    fn save_in_file_survives_missing_flag() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = dir.path().join("settings.json");
        fs::write(&config, r#"{ "save": true }"#)?;

        assert!(args(Some(config)).settings()?.save);
        Ok(())
    }
}
