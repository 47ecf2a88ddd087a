//! Volume curves and their normalized derivative.
//!
//! A [`VolumeCurve`] samples the image volume after applying one operator
//! with elements of increasing size. Sample 0 is the untransformed image.
//! Every later sample is computed from the original image, never from the
//! previous step's output.
//!
//! [`derivate`] turns the curve into a [`DistributionCurve`]: the
//! percentage of the total volume variation gained or lost at each size.
//!
//! ```text
//! volume:        v0    v1    v2   ...  v(n-2)  v(n-1)
//! distribution:        d1    d2   ...  d(n-2)
//! d(i) = 100 * (v(i) - v(i-1)) / (v(n-1) - v0)
//! ```
//!
//! The last volume is only a normalization anchor, so the distribution has
//! `n - 2` samples and sums to `100 * (v(n-2) - v0) / (v(n-1) - v0)`.

use crate::params::GranulometryParams;
use crate::progress::{Progress, StepProgress};
use crate::volume::measure_volume;
use crate::{GranError, GranResult};
use gran_core::Image;
use gran_ops::{Morphology, Operation, SizeKind};
use serde::Serialize;
#[allow(unused_imports)]
use tracing::{debug, trace, warn};

/// One `(size, value)` point of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// Reported (calibrated) size.
    pub size: f64,
    /// Volume or percentage at that size.
    pub value: f64,
}

/// Common read access to curves, including plot series.
pub trait Curve {
    /// Samples in increasing size order.
    fn samples(&self) -> &[Sample];

    /// Number of samples.
    fn len(&self) -> usize {
        self.samples().len()
    }

    /// Returns `true` if the curve has no samples.
    fn is_empty(&self) -> bool {
        self.samples().is_empty()
    }

    /// Sizes of all samples.
    fn sizes(&self) -> Vec<f64> {
        self.samples().iter().map(|s| s.size).collect()
    }

    /// Values of all samples.
    fn values(&self) -> Vec<f64> {
        self.samples().iter().map(|s| s.value).collect()
    }

    /// Plot series `(x, y)`.
    fn xy(&self) -> (Vec<f64>, Vec<f64>) {
        (self.sizes(), self.values())
    }

    /// Largest value, for axis limits.
    fn y_max(&self) -> Option<f64> {
        self.samples()
            .iter()
            .map(|s| s.value)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
    }
}

/// Image volume as a function of structuring element size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeCurve {
    samples: Vec<Sample>,
    size_kind: SizeKind,
    resolution: f64,
}

impl VolumeCurve {
    /// Builds a curve from samples.
    ///
    /// # Errors
    ///
    /// [`GranError::InvalidParameter`] if sizes are not strictly increasing.
    pub fn new(samples: Vec<Sample>, size_kind: SizeKind, resolution: f64) -> GranResult<Self> {
        if samples.windows(2).any(|w| w[1].size <= w[0].size) {
            return Err(GranError::invalid("curve sizes must be strictly increasing"));
        }
        Ok(Self {
            samples,
            size_kind,
            resolution,
        })
    }

    /// Builds an uncalibrated diameter curve from `(size, volume)` pairs.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> GranResult<Self> {
        let samples = pairs
            .iter()
            .map(|&(size, value)| Sample { size, value })
            .collect();
        Self::new(samples, SizeKind::Diameter, 1.0)
    }

    /// How sizes were interpreted when the curve was computed.
    pub fn size_kind(&self) -> SizeKind {
        self.size_kind
    }

    /// Units per pixel of the reported sizes.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Volumes in sample order.
    pub fn volumes(&self) -> Vec<f64> {
        self.values()
    }

    /// Diameter of each sample's element, in calibrated units.
    ///
    /// Radius curves report `(2r + 1) * resolution`; diameter curves return
    /// their sizes unchanged.
    pub fn equivalent_diameters(&self) -> Vec<f64> {
        match self.size_kind {
            SizeKind::Diameter => self.sizes(),
            SizeKind::Radius => self
                .samples
                .iter()
                .map(|s| 2.0 * s.size + self.resolution)
                .collect(),
        }
    }
}

impl Curve for VolumeCurve {
    fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

/// Percentage of volume variation per size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionCurve {
    samples: Vec<Sample>,
}

impl DistributionCurve {
    /// Builds a distribution from samples.
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Sum of all percentages.
    pub fn total(&self) -> f64 {
        self.samples.iter().map(|s| s.value).sum()
    }
}

impl Curve for DistributionCurve {
    fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

/// Computes the volume curve of `image`.
///
/// Applies `params.operation` to the original image once per size of the
/// series, reporting each step to `progress` and stopping with
/// [`GranError::Cancelled`] when it asks to. Stored sizes are calibrated;
/// elements are always built from raw pixel sizes.
///
/// # Errors
///
/// - [`GranError::InvalidParameter`] for an invalid series or a
///   shape/sizing that does not fit the image dimensionality
/// - [`GranError::Cancelled`] when `progress` reports cancellation
pub fn compute_volume_curve<B: Morphology>(
    image: &Image,
    backend: &B,
    params: &GranulometryParams,
    label: &str,
    progress: &dyn Progress,
) -> GranResult<VolumeCurve> {
    params.validate_for(image)?;
    let series = params.series()?;
    let cal = &params.calibration;
    trace!(
        label,
        op = %params.operation,
        shape = %params.shape,
        steps = series.steps(),
        "compute_volume_curve"
    );

    let mut samples = Vec::with_capacity(series.len());
    samples.push(Sample {
        size: cal.scale(series.start()),
        value: measure_volume(image),
    });

    let total = series.steps();
    for i in 1..=total {
        let raw = series.size(i);
        let element = backend.structuring_element(params.shape, raw, params.size_kind)?;
        let result = backend.apply(image, params.operation, &element)?;
        let volume = measure_volume(&result);
        let size = cal.scale(raw);
        debug!(label, size = raw, volume, "step {}/{}", i, total);

        if let Some(prev) = samples.last() {
            check_direction(params.operation, prev.value, volume, label, size);
        }
        samples.push(Sample {
            size,
            value: volume,
        });

        progress.step(&StepProgress {
            label,
            size,
            step: i,
            total,
        });
        if progress.is_cancelled() {
            debug!(label, step = i, "cancelled");
            return Err(GranError::Cancelled);
        }
    }

    VolumeCurve::new(samples, params.size_kind, cal.resolution)
}

/// Warns when a volume moves against the operator's expected direction.
fn check_direction(op: Operation, prev: f64, next: f64, label: &str, size: f64) {
    let wrong = if op.is_anti_extensive() {
        next > prev
    } else {
        next < prev
    };
    if wrong {
        warn!(label, size, prev, next, op = %op, "non-monotonic volume curve");
    }
}

/// Normalized derivative of a volume curve.
///
/// # Errors
///
/// [`GranError::DegenerateCurve`] for fewer than 3 samples or equal first
/// and last volumes.
///
/// ```rust
/// use gran_analysis::{derivate, Curve, VolumeCurve};
///
/// let vc = VolumeCurve::from_pairs(&[(1.0, 100.0), (2.0, 70.0), (3.0, 40.0), (4.0, 0.0)]).unwrap();
/// let dist = derivate(&vc).unwrap();
/// assert_eq!(dist.sizes(), vec![2.0, 3.0]);
/// assert_eq!(dist.values(), vec![30.0, 30.0]);
/// ```
pub fn derivate(curve: &VolumeCurve) -> GranResult<DistributionCurve> {
    let s = curve.samples();
    let n = s.len();
    if n < 3 {
        return Err(GranError::DegenerateCurve(format!(
            "{} samples, at least 3 required",
            n
        )));
    }
    let v0 = s[0].value;
    let vf = s[n - 1].value;
    if vf == v0 {
        return Err(GranError::DegenerateCurve(format!(
            "first and last volumes are equal ({})",
            v0
        )));
    }

    let samples = s
        .windows(2)
        .take(n - 2)
        .map(|w| Sample {
            size: w[1].size,
            value: 100.0 * (w[1].value - w[0].value) / (vf - v0),
        })
        .collect();
    Ok(DistributionCurve::new(samples))
}
