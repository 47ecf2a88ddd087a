//! # gran-analysis
//!
//! Grayscale granulometry: how much of an image's intensity is removed (or
//! added) by a morphological operator as the structuring element grows.
//!
//! # Pipeline
//!
//! ```text
//! Image --operator at sizes s0..sn--> VolumeCurve --derivate--> DistributionCurve
//!                                                                  |
//!                                                             summarize
//!                                                                  v
//!                                                             SummaryRow
//! ```
//!
//! - [`measure_volume`] - sum of intensities in `f64`
//! - [`compute_volume_curve`] - the size loop, one sample per size
//! - [`derivate`] - normalized percentage variation per size
//! - [`summarize`] - mean, standard deviation and geometric mean
//! - [`aggregate`] - the whole pipeline over a batch of images
//!
//! The morphology itself is reached through the [`gran_ops::Morphology`]
//! trait, so any backend that builds elements and applies the four
//! operators can drive the pipeline.
//!
//! # Example
//!
//! ```rust
//! use gran_analysis::{compute_volume_curve, derivate, summarize, Curve, GranulometryParams};
//! use gran_analysis::progress::NoProgress;
//! use gran_core::Image;
//! use gran_ops::{FlatMorphology, Operation, Shape};
//!
//! let mut data = vec![0.0f32; 32 * 32];
//! for y in 4..10 {
//!     for x in 4..10 {
//!         data[y * 32 + x] = 200.0;
//!     }
//! }
//! let image = Image::from_data(32, 32, data)?;
//!
//! let params = GranulometryParams {
//!     operation: Operation::Opening,
//!     shape: Shape::Square,
//!     max_size: 8,
//!     step: 2,
//!     ..Default::default()
//! };
//! let curve = compute_volume_curve(&image, &FlatMorphology, &params, "block", &NoProgress)?;
//! assert_eq!(curve.len(), 5);
//!
//! let dist = derivate(&curve)?;
//! assert_eq!(dist.len(), 3);
//! let stats = summarize("block", &dist)?;
//! assert_eq!(stats.mean, 7.0);
//! # Ok::<(), gran_analysis::GranError>(())
//! ```
//!
//! # Features
//!
//! - `parallel` (default) - concurrent batches and row-parallel morphology

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod batch;
pub mod calibration;
pub mod curve;
pub mod params;
pub mod progress;
pub mod stats;
pub mod volume;

pub use batch::{aggregate, BatchOptions, BatchResult, BatchRow, FileSource, ImageSource, MemorySource};
pub use calibration::Calibration;
pub use curve::{compute_volume_curve, derivate, Curve, DistributionCurve, Sample, VolumeCurve};
pub use error::{GranError, GranResult};
pub use params::{GranulometryParams, SizeSeries};
pub use progress::{CancelToken, NoProgress, Progress, StepProgress};
pub use stats::{summarize, summarize_table, SummaryRow};
pub use volume::measure_volume;
