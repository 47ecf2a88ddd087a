//! Batch aggregation over a list of images.
//!
//! Every image is processed with the same parameters, so all rows share
//! one size axis. A [`BatchRow`] keeps the volume curve, distribution and
//! summary of one image together; tables are views over the rows and are
//! aligned by construction.
//!
//! The first failing image aborts the batch. With
//! [`BatchOptions::parallel`] images are processed concurrently and rows
//! are still returned in input order.

use crate::curve::{compute_volume_curve, derivate, Curve, DistributionCurve, VolumeCurve};
use crate::params::GranulometryParams;
use crate::progress::Progress;
use crate::stats::{summarize, summary_table, SummaryRow};
use crate::{GranError, GranResult};
use gran_core::Image;
use gran_io::table::format_size_header;
use gran_io::{Decoded, RunSummary, SampleDepth, Table};
use gran_ops::Morphology;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
#[allow(unused_imports)]
use tracing::{debug, info, trace};

/// Ordered collection of images to analyse.
///
/// Implementations load lazily so a batch holds at most one decoded image
/// per worker.
pub trait ImageSource: Sync {
    /// Number of images.
    fn len(&self) -> usize;

    /// Returns `true` if the source holds no images.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Label of image `index`, used as the row name.
    fn label(&self, index: usize) -> String;

    /// Loads image `index`.
    fn load(&self, index: usize) -> GranResult<Image>;
}

/// Images already held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    items: Vec<(String, Image)>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a labelled image.
    pub fn push(&mut self, label: impl Into<String>, image: Image) {
        self.items.push((label.into(), image));
    }
}

impl FromIterator<(String, Image)> for MemorySource {
    fn from_iter<I: IntoIterator<Item = (String, Image)>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl ImageSource for MemorySource {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn label(&self, index: usize) -> String {
        self.items[index].0.clone()
    }

    fn load(&self, index: usize) -> GranResult<Image> {
        Ok(self.items[index].1.clone())
    }
}

/// Image files decoded on demand.
///
/// Decoded images are brought to 8-bit gray levels with [`to_gray8`].
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    paths: Vec<PathBuf>,
}

impl FileSource {
    /// Creates a source over explicit paths, kept in the given order.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Every image of `dir`, sorted by file name.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> GranResult<Self> {
        Ok(Self::new(gran_io::list_images(dir)?))
    }

    /// Every image matching a glob pattern, sorted by path.
    pub fn from_glob(pattern: &str) -> GranResult<Self> {
        Ok(Self::new(gran_io::glob_images(pattern)?))
    }

    /// Paths in processing order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl ImageSource for FileSource {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn label(&self, index: usize) -> String {
        let path = &self.paths[index];
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }

    fn load(&self, index: usize) -> GranResult<Image> {
        Ok(to_gray8(gran_io::read(&self.paths[index])?))
    }
}

/// Converts a decoded image to 8-bit gray levels.
///
/// 8-bit sources keep their intensities; color luma is rounded to the
/// nearest level. 16-bit and float sources are stretched from their
/// min-max range to 0-255.
pub fn to_gray8(decoded: Decoded) -> Image {
    let Decoded { image, depth } = decoded;
    match depth {
        SampleDepth::U8 => image.map(|v| v.round().clamp(0.0, 255.0)),
        SampleDepth::U16 | SampleDepth::F32 => {
            debug!(dims = ?image.dims(), ?depth, "rescaling to 8-bit range");
            image.to_byte_range()
        }
    }
}

/// Batch execution options.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Process images concurrently (needs the `parallel` feature).
    pub parallel: bool,
}

/// Results of one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRow {
    /// Image label.
    pub label: String,
    /// Volume curve.
    pub volume: VolumeCurve,
    /// Size distribution.
    pub distribution: DistributionCurve,
    /// Distribution statistics.
    pub summary: SummaryRow,
}

/// Results of a batch, one row per input image in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    params: GranulometryParams,
    rows: Vec<BatchRow>,
}

impl BatchResult {
    /// Parameters every row was computed with.
    pub fn params(&self) -> &GranulometryParams {
        &self.params
    }

    /// Rows in input order.
    pub fn rows(&self) -> &[BatchRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the batch has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row labels in input order.
    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }

    fn size_headers(&self, sizes: Vec<f64>) -> Vec<String> {
        let integer = self.params.calibration.is_identity();
        sizes
            .into_iter()
            .map(|s| format_size_header(s, integer))
            .collect()
    }

    /// Volumes per image, one column per size.
    pub fn volume_table(&self) -> GranResult<Table> {
        let sizes = self.rows.first().map(|r| r.volume.sizes()).unwrap_or_default();
        let mut table = Table::new(self.size_headers(sizes));
        for row in &self.rows {
            table.push_row(row.label.clone(), row.volume.volumes())?;
        }
        Ok(table)
    }

    /// Distribution percentages per image, one column per size.
    pub fn distribution_table(&self) -> GranResult<Table> {
        let sizes = self
            .rows
            .first()
            .map(|r| r.distribution.sizes())
            .unwrap_or_default();
        let mut table = Table::new(self.size_headers(sizes));
        for row in &self.rows {
            table.push_row(row.label.clone(), row.distribution.values())?;
        }
        Ok(table)
    }

    /// Mean, standard deviation and geometric mean per image.
    pub fn summary_table(&self) -> GranResult<Table> {
        let rows: Vec<SummaryRow> = self.rows.iter().map(|r| r.summary.clone()).collect();
        summary_table(&rows)
    }

    /// Run summary describing parameters and inputs.
    pub fn run_summary(&self, files: &[PathBuf]) -> RunSummary {
        let p = &self.params;
        let mut summary = RunSummary::now()
            .field("Operation", p.operation)
            .field("Structuring element", p.shape)
            .field("Size kind", p.size_kind)
            .field("Max size", p.max_size)
            .field("Step", p.step)
            .field("Contrast enhancement", p.enhancement)
            .field("Spatial resolution", &p.calibration);
        summary.files = files.to_vec();
        summary
    }
}

/// Runs the granulometry of every image of `source`.
///
/// For each image: load, enhance, compute the volume curve, derive the
/// distribution and summarize it.
///
/// # Errors
///
/// - [`GranError::InvalidParameter`] for invalid parameters or an empty
///   source
/// - the first per-image failure, wrapped in [`GranError::InImage`]
/// - [`GranError::Cancelled`] when `progress` asks to stop
pub fn aggregate<S, B>(
    source: &S,
    backend: &B,
    params: &GranulometryParams,
    options: BatchOptions,
    progress: &dyn Progress,
) -> GranResult<BatchResult>
where
    S: ImageSource + ?Sized,
    B: Morphology,
{
    params.validate()?;
    if source.is_empty() {
        return Err(GranError::invalid("no images to analyse"));
    }
    info!(
        images = source.len(),
        op = %params.operation,
        shape = %params.shape,
        max_size = params.max_size,
        step = params.step,
        parallel = options.parallel,
        "starting batch"
    );

    let process = |index: usize| -> GranResult<BatchRow> {
        let label = source.label(index);
        process_one(source, backend, params, index, &label, progress)
            .map_err(|e| e.in_image(label))
    };

    #[cfg(feature = "parallel")]
    let rows: GranResult<Vec<BatchRow>> = if options.parallel {
        (0..source.len()).into_par_iter().map(process).collect()
    } else {
        (0..source.len()).map(process).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let rows: GranResult<Vec<BatchRow>> = (0..source.len()).map(process).collect();

    let rows = rows?;
    info!(rows = rows.len(), "batch complete");
    Ok(BatchResult {
        params: params.clone(),
        rows,
    })
}

fn process_one<S, B>(
    source: &S,
    backend: &B,
    params: &GranulometryParams,
    index: usize,
    label: &str,
    progress: &dyn Progress,
) -> GranResult<BatchRow>
where
    S: ImageSource + ?Sized,
    B: Morphology,
{
    if progress.is_cancelled() {
        return Err(GranError::Cancelled);
    }
    let image = source.load(index)?;
    let image = params.enhancement.apply(&image)?;
    let volume = compute_volume_curve(&image, backend, params, label, progress)?;
    let distribution = derivate(&volume)?;
    let summary = summarize(label, &distribution)?;
    debug!(label, mean = summary.mean, "image done");
    Ok(BatchRow {
        label: label.to_string(),
        volume,
        distribution,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use gran_ops::{FlatMorphology, Operation, Shape};

    fn blob(size: u32, side: u32) -> Image {
        let mut data = vec![0.0f32; (size * size) as usize];
        for y in 0..side {
            for x in 0..side {
                data[(y * size + x + size + 1) as usize] = 100.0;
            }
        }
        Image::from_data(size, size, data).unwrap()
    }

    fn params() -> GranulometryParams {
        GranulometryParams {
            operation: Operation::Opening,
            shape: Shape::Square,
            max_size: 9,
            step: 3,
            ..Default::default()
        }
    }

    fn source() -> MemorySource {
        vec![
            ("small".to_string(), blob(16, 3)),
            ("large".to_string(), blob(16, 6)),
            ("medium".to_string(), blob(16, 5)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_rows_follow_input_order() {
        for parallel in [false, true] {
            let res = aggregate(
                &source(),
                &FlatMorphology,
                &params(),
                BatchOptions { parallel },
                &NoProgress,
            )
            .unwrap();
            assert_eq!(res.labels(), vec!["small", "large", "medium"]);
        }
    }

    #[test]
    fn test_tables_share_headers() {
        let res = aggregate(&source(), &FlatMorphology, &params(), BatchOptions::default(), &NoProgress)
            .unwrap();
        let vt = res.volume_table().unwrap();
        let dt = res.distribution_table().unwrap();
        let st = res.summary_table().unwrap();
        assert_eq!(vt.headers(), &["1", "4", "7", "10"]);
        assert_eq!(dt.headers(), &["4", "7"]);
        assert_eq!((vt.len(), dt.len(), st.len()), (3, 3, 3));
        for t in [&vt, &dt, &st] {
            let labels: Vec<_> = t.rows().iter().map(|r| r.label.as_str()).collect();
            assert_eq!(labels, vec!["small", "large", "medium"]);
        }
    }

    #[test]
    fn test_calibrated_headers() {
        let mut p = params();
        p.calibration = crate::Calibration::new(0.5, "um").unwrap();
        let res = aggregate(&source(), &FlatMorphology, &p, BatchOptions::default(), &NoProgress)
            .unwrap();
        assert_eq!(res.volume_table().unwrap().headers(), &["0.50", "2.00", "3.50", "5.00"]);
    }

    #[test]
    fn test_failure_names_image() {
        let mut src = source();
        src.push("flat", Image::filled(16, 16, 5.0));
        let err = aggregate(&src, &FlatMorphology, &params(), BatchOptions::default(), &NoProgress)
            .unwrap_err();
        assert!(err.is_degenerate_curve());
        assert!(err.to_string().contains("'flat'"));
    }

    #[test]
    fn test_empty_source() {
        let err = aggregate(
            &MemorySource::new(),
            &FlatMorphology,
            &params(),
            BatchOptions::default(),
            &NoProgress,
        )
        .unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    fn decoded(values: Vec<f32>, depth: SampleDepth) -> Decoded {
        let image = Image::from_data(values.len() as u32, 1, values).unwrap();
        Decoded { image, depth }
    }

    #[test]
    fn test_to_gray8_keeps_byte_levels() {
        let gray = to_gray8(decoded(vec![0.0, 17.0, 255.0], SampleDepth::U8));
        assert_eq!(gray.data(), &[0.0, 17.0, 255.0]);

        // luma of (101,100,100) and (111,110,110) is not stretched
        let luma = to_gray8(decoded(vec![100.2126, 110.2126], SampleDepth::U8));
        assert_eq!(luma.data(), &[100.0, 110.0]);
    }

    #[test]
    fn test_to_gray8_stretches_wide_sources() {
        let wide = to_gray8(decoded(vec![0.0, 1000.0], SampleDepth::U16));
        assert_eq!(wide.data(), &[0.0, 255.0]);

        // 16-bit data is rescaled even when it would fit in a byte
        let low = to_gray8(decoded(vec![10.0, 20.0], SampleDepth::U16));
        assert_eq!(low.data(), &[0.0, 233.0]);

        let float = to_gray8(decoded(vec![0.25, 0.75], SampleDepth::F32));
        assert_eq!(float.data(), &[0.0, 255.0]);
    }

    #[test]
    fn test_run_summary_lists_files() {
        let res = aggregate(&source(), &FlatMorphology, &params(), BatchOptions::default(), &NoProgress)
            .unwrap();
        let text = res.run_summary(&[PathBuf::from("a.png")]).render();
        assert!(text.contains("Operation:\tOpening"));
        assert!(text.contains("Max size:\t9"));
        assert!(text.contains("a.png"));
    }
}
