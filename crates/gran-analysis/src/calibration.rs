//! Spatial calibration of reported sizes.
//!
//! Calibration only relabels sizes: the structuring element is always built
//! from the raw pixel size, and the stored size is `raw * resolution`.

use crate::{GranError, GranResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit of an uncalibrated run.
pub const PIXEL_UNIT: &str = "pixel";

/// Physical size of one pixel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Units per pixel.
    pub resolution: f64,
    /// Unit name, e.g. "um".
    pub unit: String,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            unit: PIXEL_UNIT.to_string(),
        }
    }
}

impl Calibration {
    /// Creates a calibration.
    ///
    /// # Errors
    ///
    /// [`GranError::CalibrationParse`] if `resolution` is not finite and
    /// positive.
    pub fn new(resolution: f64, unit: impl Into<String>) -> GranResult<Self> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(GranError::CalibrationParse {
                input: resolution.to_string(),
                reason: "resolution must be a positive number".into(),
            });
        }
        let unit = unit.into();
        let unit = if unit.trim().is_empty() {
            PIXEL_UNIT.to_string()
        } else {
            unit.trim().to_string()
        };
        Ok(Self { resolution, unit })
    }

    /// Parses a resolution typed by a user.
    ///
    /// ```rust
    /// use gran_analysis::Calibration;
    ///
    /// let cal = Calibration::parse("0.5", "um").unwrap();
    /// assert_eq!(cal.scale(4), 2.0);
    /// assert!(Calibration::parse("abc", "um").is_err());
    /// ```
    pub fn parse(resolution: &str, unit: &str) -> GranResult<Self> {
        let value: f64 = resolution
            .trim()
            .parse()
            .map_err(|_| GranError::CalibrationParse {
                input: resolution.to_string(),
                reason: "not a number".into(),
            })?;
        Self::new(value, unit).map_err(|_| GranError::CalibrationParse {
            input: resolution.to_string(),
            reason: "resolution must be a positive number".into(),
        })
    }

    /// Checks the fields, for values that bypassed [`Calibration::new`]
    /// (deserialized or struct literals).
    pub fn validate(&self) -> GranResult<()> {
        Self::new(self.resolution, self.unit.clone()).map(|_| ())
    }

    /// Returns `true` for one unit per pixel in pixels.
    pub fn is_identity(&self) -> bool {
        self.resolution == 1.0 && self.unit == PIXEL_UNIT
    }

    /// Reported size of a raw pixel size.
    #[inline]
    pub fn scale(&self, raw: u32) -> f64 {
        raw as f64 * self.resolution
    }
}

impl fmt::Display for Calibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/pixel", self.resolution, self.unit)
    }
}
