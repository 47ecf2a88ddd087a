//! Contrast enhancement applied before measuring a curve.
//!
//! Both enhancements work on the 8-bit intensity range: values are binned to
//! the nearest integer in `0..=255` and remapped through a 256-entry lookup
//! table.
//!
//! - [`normalize`] - linear stretch between saturated percentiles
//! - [`equalize`] - histogram equalization with square-root weighting

use crate::{OpsError, OpsResult};
use gran_core::Image;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Percentage of saturated pixels used by [`Enhancement::Normalize`].
pub const DEFAULT_SATURATION: f64 = 0.05;

const LEVELS: usize = 256;

/// Optional contrast preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Enhancement {
    /// Leave intensities untouched.
    #[default]
    None,
    /// Stretch to the full range, saturating 0.05% of the pixels.
    Normalize,
    /// Histogram equalization.
    Equalize,
}

impl Enhancement {
    /// All enhancements, in display order.
    pub const ALL: [Enhancement; 3] = [
        Enhancement::None,
        Enhancement::Normalize,
        Enhancement::Equalize,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Enhancement::None => "None",
            Enhancement::Normalize => "Normalize",
            Enhancement::Equalize => "Equalize",
        }
    }

    /// Labels of all enhancements.
    pub fn all_labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|e| e.label()).collect()
    }

    /// Prefix added to default output file names.
    pub fn file_prefix(self) -> &'static str {
        match self {
            Enhancement::None => "",
            Enhancement::Normalize => "norm_",
            Enhancement::Equalize => "eq_",
        }
    }

    /// Applies the enhancement, returning a new image.
    pub fn apply(self, image: &Image) -> OpsResult<Image> {
        enhance(image, self)
    }
}

impl fmt::Display for Enhancement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Enhancement {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(Enhancement::None),
            "normalize" | "norm" => Ok(Enhancement::Normalize),
            "equalize" | "eq" => Ok(Enhancement::Equalize),
            _ => Err(OpsError::UnknownLabel {
                kind: "enhancement",
                label: s.to_string(),
            }),
        }
    }
}

/// Applies `enhancement` to `image`.
pub fn enhance(image: &Image, enhancement: Enhancement) -> OpsResult<Image> {
    match enhancement {
        Enhancement::None => Ok(image.clone()),
        Enhancement::Normalize => normalize(image, DEFAULT_SATURATION),
        Enhancement::Equalize => equalize(image),
    }
}

/// Linear contrast stretch.
///
/// `saturated` is the total percentage of pixels allowed to clip, split
/// evenly between the dark and bright tails.
///
/// # Errors
///
/// Returns [`OpsError::InvalidParameter`] if `saturated` is outside
/// `[0, 100)`.
pub fn normalize(image: &Image, saturated: f64) -> OpsResult<Image> {
    if !(0.0..100.0).contains(&saturated) {
        return Err(OpsError::InvalidParameter(format!(
            "saturation must be in [0, 100), got {}",
            saturated
        )));
    }
    let hist = histogram(image);
    let total: u64 = hist.iter().sum();
    let threshold = (total as f64 * saturated / 200.0) as u64;

    let Some((lo, hi)) = saturated_bounds(&hist, threshold) else {
        debug!("normalize: degenerate histogram, image unchanged");
        return Ok(image.clone());
    };
    trace!(lo, hi, threshold, "normalize");

    let max_out = (LEVELS - 1) as f64;
    let mut lut = [0.0f32; LEVELS];
    for (i, slot) in lut.iter_mut().enumerate() {
        *slot = if i <= lo {
            0.0
        } else if i >= hi {
            max_out as f32
        } else {
            ((i - lo) as f64 / (hi - lo) as f64 * max_out).floor() as f32
        };
    }
    apply_lut(image, &lut)
}

/// Histogram equalization using square-root weighted bin counts.
pub fn equalize(image: &Image) -> OpsResult<Image> {
    let hist = histogram(image);
    let weight = |i: usize| (hist[i] as f64).sqrt();
    let last = LEVELS - 1;

    let mut sum = weight(0) + weight(last);
    for i in 1..last {
        sum += 2.0 * weight(i);
    }
    if sum <= 0.0 {
        return Ok(image.clone());
    }
    let scale = last as f64 / sum;
    trace!(sum, "equalize");

    let mut lut = [0.0f32; LEVELS];
    let mut acc = 0.0;
    for (i, slot) in lut.iter_mut().enumerate().take(last).skip(1) {
        let delta = weight(i);
        acc += delta;
        *slot = (acc * scale).round() as f32;
        acc += delta;
    }
    lut[last] = last as f32;
    apply_lut(image, &lut)
}

fn bin(v: f32) -> usize {
    (v.round().clamp(0.0, (LEVELS - 1) as f32)) as usize
}

fn histogram(image: &Image) -> [u64; LEVELS] {
    let mut hist = [0u64; LEVELS];
    for &v in image.data() {
        hist[bin(v)] += 1;
    }
    hist
}

/// First bins from each end whose cumulative count exceeds `threshold`.
fn saturated_bounds(hist: &[u64; LEVELS], threshold: u64) -> Option<(usize, usize)> {
    let mut count = 0;
    let lo = hist.iter().position(|&h| {
        count += h;
        count > threshold
    })?;
    let mut count = 0;
    let hi = LEVELS
        - 1
        - hist.iter().rev().position(|&h| {
            count += h;
            count > threshold
        })?;
    (hi > lo).then_some((lo, hi))
}

fn apply_lut(image: &Image, lut: &[f32; LEVELS]) -> OpsResult<Image> {
    Ok(image.with_data(image.data().iter().map(|&v| lut[bin(v)]).collect())?)
}
