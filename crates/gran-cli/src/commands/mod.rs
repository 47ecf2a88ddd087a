//! CLI command implementations

pub mod batch;
pub mod curve;
pub mod stats;

use anyhow::{Context, Result};
use clap::Args;
use gran_analysis::{Calibration, GranulometryParams, Progress, StepProgress};
use gran_core::Image;
use gran_ops::{Enhancement, Operation, Shape, SizeKind};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// Analysis parameters: an optional YAML file overridden by flags.
#[derive(Args, Debug, Default, Clone)]
pub struct ParamArgs {
    /// YAML parameter file
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Operator: erosion, dilation, opening, closing
    #[arg(long)]
    pub op: Option<Operation>,

    /// Structuring element: square, disk, octagon, diamond,
    /// line-horiz, line-vert, line-diag-up, line-diag-down, cube, ball
    #[arg(long)]
    pub shape: Option<Shape>,

    /// Size convention: diameter or radius
    #[arg(long)]
    pub size_kind: Option<SizeKind>,

    /// Largest element size in pixels
    #[arg(long)]
    pub max: Option<u32>,

    /// Size increment in pixels
    #[arg(long)]
    pub step: Option<u32>,

    /// Contrast preprocessing: none, normalize, equalize
    #[arg(long)]
    pub enhance: Option<Enhancement>,

    /// Spatial resolution (unit per pixel)
    #[arg(long)]
    pub resolution: Option<String>,

    /// Unit name for calibrated sizes
    #[arg(long)]
    pub unit: Option<String>,
}

impl ParamArgs {
    /// Merges the parameter file and flags, then validates the result.
    pub fn resolve(&self) -> Result<GranulometryParams> {
        let mut params = match &self.params {
            Some(path) => GranulometryParams::from_yaml_file(path)
                .with_context(|| format!("Failed to read parameters: {}", path.display()))?,
            None => GranulometryParams::default(),
        };

        if let Some(op) = self.op {
            params.operation = op;
        }
        if let Some(shape) = self.shape {
            params.shape = shape;
        }
        if let Some(kind) = self.size_kind {
            params.size_kind = kind;
        }
        if let Some(max) = self.max {
            params.max_size = max;
        }
        if let Some(step) = self.step {
            params.step = step;
        }
        if let Some(enhancement) = self.enhance {
            params.enhancement = enhancement;
        }
        if self.resolution.is_some() || self.unit.is_some() {
            let resolution = match &self.resolution {
                Some(r) => r.clone(),
                None => params.calibration.resolution.to_string(),
            };
            let unit = self
                .unit
                .clone()
                .unwrap_or_else(|| params.calibration.unit.clone());
            params.calibration = Calibration::parse(&resolution, &unit)?;
        }

        params.validate().context("Invalid parameters")?;
        Ok(params)
    }
}

/// Load an image from path as 8-bit range grayscale
pub fn load_image(path: &Path) -> Result<Image> {
    let decoded = gran_io::read(path)
        .with_context(|| format!("Failed to load: {}", path.display()))?;
    Ok(gran_analysis::batch::to_gray8(decoded))
}

/// Progress bar counting operator applications.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    /// Bar over `total` steps; hidden when `visible` is false.
    pub fn new(total: u64, visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new(total)
        } else {
            ProgressBar::hidden()
        };
        let template = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}";
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar }
    }

    /// Clears the bar.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Progress for BarProgress {
    fn step(&self, progress: &StepProgress<'_>) {
        self.bar.inc(1);
        self.bar
            .set_message(format!("{} size {}", progress.label, progress.size));
    }
}

/// Size-only column headers for printed tables.
pub fn size_label(size: f64, integer: bool) -> String {
    gran_io::table::format_size_header(size, integer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_flags() {
        let params = ParamArgs::default().resolve().unwrap();
        assert_eq!(params, GranulometryParams::default());
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        std::fs::write(&path, "operation: opening\nshape: disk\nmax_size: 21\nstep: 2\n").unwrap();

        let args = ParamArgs {
            params: Some(path),
            shape: Some(Shape::Octagon),
            step: Some(4),
            ..Default::default()
        };
        let params = args.resolve().unwrap();
        assert_eq!(params.operation, Operation::Opening);
        assert_eq!(params.shape, Shape::Octagon);
        assert_eq!(params.max_size, 21);
        assert_eq!(params.step, 4);
    }

    #[test]
    fn test_calibration_flags() {
        let args = ParamArgs {
            resolution: Some("0.5".into()),
            unit: Some("um".into()),
            ..Default::default()
        };
        let params = args.resolve().unwrap();
        assert_eq!(params.calibration.resolution, 0.5);
        assert_eq!(params.calibration.unit, "um");

        let bad = ParamArgs {
            resolution: Some("fast".into()),
            ..Default::default()
        };
        assert!(bad.resolve().is_err());
    }

    #[test]
    fn test_invalid_series_rejected() {
        let args = ParamArgs {
            shape: Some(Shape::Diamond),
            max: Some(10),
            step: Some(2),
            ..Default::default()
        };
        assert!(args.resolve().is_err());
    }
}
