//! Run parameters and the size series they generate.
//!
//! [`GranulometryParams`] is the single configuration value of a run. It is
//! serde-serializable so runs can be described in YAML:
//!
//! ```yaml
//! operation: closing
//! shape: disk
//! size_kind: diameter
//! max_size: 21
//! step: 2
//! enhancement: normalize
//! calibration:
//!   resolution: 0.5
//!   unit: um
//! ```

use crate::calibration::Calibration;
use crate::{GranError, GranResult};
use gran_core::Image;
use gran_ops::{Enhancement, Operation, Shape, SizeKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Strictly increasing raw sizes `start, start + step, ...`.
///
/// Holds `steps + 1` sizes: the origin (the untransformed image) followed by
/// one size per operator application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSeries {
    start: u32,
    step: u32,
    steps: u32,
}

impl SizeSeries {
    /// Builds the series for `max_size` and `step`.
    ///
    /// The number of operator applications is `max_size / step`. The
    /// origin is the identity size of `kind` (diameter 1, radius 0).
    ///
    /// # Errors
    ///
    /// [`GranError::InvalidParameter`] when `step` is 0, when `max_size`
    /// is below `step`, or for a diamond sized by diameter with an even
    /// `max_size` or an odd `step`.
    pub fn new(shape: Shape, kind: SizeKind, max_size: u32, step: u32) -> GranResult<Self> {
        if step == 0 {
            return Err(GranError::invalid("step must be at least 1"));
        }
        if max_size < step {
            return Err(GranError::invalid(format!(
                "max size {} is smaller than step {}",
                max_size, step
            )));
        }
        if shape == Shape::Diamond && kind == SizeKind::Diameter {
            if max_size % 2 == 0 {
                return Err(GranError::invalid(format!(
                    "diamond requires an odd max diameter, got {}",
                    max_size
                )));
            }
            if step % 2 != 0 {
                return Err(GranError::invalid(format!(
                    "diamond requires an even diameter step, got {}",
                    step
                )));
            }
        }
        Ok(Self {
            start: kind.identity_size(),
            step,
            steps: max_size / step,
        })
    }

    /// Size of the untransformed sample.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Increment between samples.
    pub fn step(&self) -> u32 {
        self.step
    }

    /// Number of operator applications.
    pub fn steps(&self) -> usize {
        self.steps as usize
    }

    /// Number of samples, origin included.
    pub fn len(&self) -> usize {
        self.steps as usize + 1
    }

    /// Always `false`: the origin is always present.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Raw size of sample `i`.
    pub fn size(&self, i: usize) -> u32 {
        self.start + i as u32 * self.step
    }

    /// All raw sizes, origin first.
    pub fn sizes(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len()).map(|i| self.size(i))
    }
}

fn yaml_error(e: serde_yaml::Error) -> GranError {
    GranError::invalid(format!("parameters: {}", e))
}

fn calibration_from_yaml(raw: serde_yaml::Value) -> GranResult<Calibration> {
    serde_yaml::from_value(raw.clone()).map_err(|e| {
        let input = match raw.get("resolution") {
            Some(serde_yaml::Value::String(s)) => s.clone(),
            Some(v) => serde_yaml::to_string(v)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            None => String::new(),
        };
        GranError::CalibrationParse {
            input,
            reason: e.to_string(),
        }
    })
}

/// Parameters shared by every image of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GranulometryParams {
    /// Operator applied at each size.
    pub operation: Operation,
    /// Structuring element shape.
    pub shape: Shape,
    /// Whether sizes are diameters or radii.
    pub size_kind: SizeKind,
    /// Largest size, in pixels.
    pub max_size: u32,
    /// Size increment, in pixels.
    pub step: u32,
    /// Contrast preprocessing.
    pub enhancement: Enhancement,
    /// Reporting calibration.
    pub calibration: Calibration,
}

impl Default for GranulometryParams {
    fn default() -> Self {
        Self {
            operation: Operation::Closing,
            shape: Shape::Square,
            size_kind: SizeKind::Diameter,
            max_size: 51,
            step: 1,
            enhancement: Enhancement::None,
            calibration: Calibration::default(),
        }
    }
}

impl GranulometryParams {
    /// Size series of these parameters.
    pub fn series(&self) -> GranResult<SizeSeries> {
        SizeSeries::new(self.shape, self.size_kind, self.max_size, self.step)
    }

    /// Validates parameters independently of any image.
    pub fn validate(&self) -> GranResult<()> {
        self.series()?;
        self.calibration.validate()
    }

    /// Validates parameters against the dimensionality of `image`.
    ///
    /// Volumetric images are sized by radius only; volumetric shapes need a
    /// volumetric image.
    pub fn validate_for(&self, image: &Image) -> GranResult<()> {
        self.validate()?;
        if image.is_3d() && self.size_kind != SizeKind::Radius {
            return Err(GranError::invalid(
                "3D images must be sized by radius",
            ));
        }
        if self.shape.is_3d() && !image.is_3d() {
            return Err(GranError::invalid(format!(
                "{} requires a 3D image",
                self.shape
            )));
        }
        Ok(())
    }

    /// Parses parameters from YAML. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// - [`GranError::CalibrationParse`] for a malformed `calibration` block
    /// - [`GranError::InvalidParameter`] for any other malformed field
    pub fn from_yaml_str(text: &str) -> GranResult<Self> {
        let mut doc: serde_yaml::Value = serde_yaml::from_str(text).map_err(yaml_error)?;
        let calibration = doc
            .as_mapping_mut()
            .and_then(|m| m.remove("calibration"))
            .map(calibration_from_yaml)
            .transpose()?;

        let mut params: Self = if doc.is_null() {
            Self::default()
        } else {
            serde_yaml::from_value(doc).map_err(yaml_error)?
        };
        if let Some(calibration) = calibration {
            params.calibration = calibration;
        }
        Ok(params)
    }

    /// Reads parameters from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> GranResult<Self> {
        trace!(path = %path.as_ref().display(), "GranulometryParams::from_yaml_file");
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }

    /// Renders parameters as YAML.
    pub fn to_yaml(&self) -> GranResult<String> {
        serde_yaml::to_string(self).map_err(|e| GranError::invalid(e.to_string()))
    }

    /// Default result file name for a run over the directory `dir_name`.
    ///
    /// `<dir>_[norm_|eq_]<op><shape><max>[s<step>].txt`, where `<op>` is the
    /// first two letters of the operation and the step suffix is omitted
    /// for a step of 1.
    ///
    /// ```rust
    /// use gran_analysis::GranulometryParams;
    /// use gran_ops::{Enhancement, Operation, Shape};
    ///
    /// let mut p = GranulometryParams::default();
    /// assert_eq!(p.default_file_name("images"), "images_ClSq51.txt");
    ///
    /// p.operation = Operation::Opening;
    /// p.shape = Shape::Diamond;
    /// p.max_size = 9;
    /// p.step = 2;
    /// p.enhancement = Enhancement::Equalize;
    /// assert_eq!(p.default_file_name("images"), "images_eq_OpDmd9s2.txt");
    /// ```
    pub fn default_file_name(&self, dir_name: &str) -> String {
        let op: String = self.operation.label().chars().take(2).collect();
        let step = if self.step == 1 {
            String::new()
        } else {
            format!("s{}", self.step)
        };
        format!(
            "{}_{}{}{}{}{}.txt",
            dir_name,
            self.enhancement.file_prefix(),
            op,
            self.shape.code(),
            self.max_size,
            step
        )
    }
}
