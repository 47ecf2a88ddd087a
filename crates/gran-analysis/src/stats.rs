//! Summary statistics of size distributions.
//!
//! Distribution percentages are read as a discrete probability mass over
//! element sizes:
//!
//! ```text
//! mean     = sum(p * s) / 100
//! std      = sqrt(sum((s - mean)^2 * p) / 100)
//! geommean = exp(sum(p / 100 * ln(s)))
//! ```
//!
//! The geometric mean needs every size to be positive. A distribution with
//! a zero size fails instead of being clamped. Negative percentages from a
//! non-monotonic curve can make the variance negative, which also fails.

use crate::curve::{Curve, DistributionCurve, Sample};
use crate::{GranError, GranResult};
use gran_io::Table;
use serde::Serialize;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Negative variance below this magnitude is rounding noise.
const VARIANCE_TOLERANCE: f64 = 1e-9;

/// Column headers of the summary table.
pub const SUMMARY_HEADERS: [&str; 3] = ["mean", "std", "geommean"];

/// Statistics of one distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    /// Label of the source row.
    pub label: String,
    /// Mean size.
    pub mean: f64,
    /// Standard deviation of the size.
    pub std: f64,
    /// Geometric mean size.
    pub geommean: f64,
}

impl SummaryRow {
    /// Values in [`SUMMARY_HEADERS`] order.
    pub fn values(&self) -> Vec<f64> {
        vec![self.mean, self.std, self.geommean]
    }
}

/// Computes mean, standard deviation and geometric mean of `dist`.
///
/// # Errors
///
/// [`GranError::UndefinedStatistic`] if any size is zero or negative, or
/// if negative percentages make the variance negative.
pub fn summarize(label: &str, dist: &DistributionCurve) -> GranResult<SummaryRow> {
    summarize_samples(label, dist.samples())
}

fn summarize_samples(label: &str, samples: &[Sample]) -> GranResult<SummaryRow> {
    trace!(label, samples = samples.len(), "summarize");
    if let Some(bad) = samples.iter().find(|s| s.size <= 0.0) {
        return Err(GranError::UndefinedStatistic(format!(
            "geometric mean of '{}' needs positive sizes, found {}",
            label, bad.size
        )));
    }

    let mean = samples.iter().map(|s| s.value * s.size).sum::<f64>() / 100.0;
    let var = samples
        .iter()
        .map(|s| (s.size - mean).powi(2) * s.value)
        .sum::<f64>()
        / 100.0;
    if var < -VARIANCE_TOLERANCE {
        return Err(GranError::UndefinedStatistic(format!(
            "standard deviation of '{}' has negative variance {}",
            label, var
        )));
    }
    let log_mean = samples
        .iter()
        .map(|s| s.value / 100.0 * s.size.ln())
        .sum::<f64>();

    Ok(SummaryRow {
        label: label.to_string(),
        mean,
        std: var.max(0.0).sqrt(),
        geommean: log_mean.exp(),
    })
}

/// Recomputes summary rows from an exported distribution table.
///
/// Column headers are parsed as sizes.
pub fn summarize_table(table: &Table) -> GranResult<Vec<SummaryRow>> {
    let sizes = table.numeric_headers()?;
    table
        .rows()
        .iter()
        .map(|row| {
            let samples: Vec<Sample> = sizes
                .iter()
                .zip(&row.values)
                .map(|(&size, &value)| Sample { size, value })
                .collect();
            summarize_samples(&row.label, &samples)
        })
        .collect()
}

/// Builds the summary table of `rows`.
pub fn summary_table(rows: &[SummaryRow]) -> GranResult<Table> {
    let mut table = Table::new(SUMMARY_HEADERS.iter().map(|h| h.to_string()).collect());
    for row in rows {
        table.push_row(row.label.clone(), row.values())?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn dist(pairs: &[(f64, f64)]) -> DistributionCurve {
        DistributionCurve::new(
            pairs
                .iter()
                .map(|&(size, value)| Sample { size, value })
                .collect(),
        )
    }

    #[test]
    fn test_point_mass() {
        let row = summarize("a", &dist(&[(2.0, 0.0), (5.0, 100.0), (8.0, 0.0)])).unwrap();
        assert_abs_diff_eq!(row.mean, 5.0);
        assert_abs_diff_eq!(row.std, 0.0);
        assert_abs_diff_eq!(row.geommean, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_two_point_distribution() {
        let row = summarize("b", &dist(&[(2.0, 50.0), (8.0, 50.0)])).unwrap();
        assert_abs_diff_eq!(row.mean, 5.0);
        assert_abs_diff_eq!(row.std, 3.0);
        assert_abs_diff_eq!(row.geommean, 4.0, epsilon = 1e-12);
        assert_eq!(row.values(), vec![5.0, 3.0, row.geommean]);
    }

    #[test]
    fn test_zero_size_is_undefined() {
        let err = summarize("c", &dist(&[(0.0, 40.0), (2.0, 60.0)])).unwrap_err();
        assert!(err.is_undefined_statistic());
    }

    #[test]
    fn test_negative_variance_is_undefined() {
        let err = summarize("d", &dist(&[(2.0, 150.0), (8.0, -50.0)])).unwrap_err();
        assert!(err.is_undefined_statistic());
        assert!(err.to_string().contains("'d'"));
    }

    #[test]
    fn test_negative_entry_with_positive_variance() {
        let row = summarize("e", &dist(&[(3.0, 50.0), (5.0, -20.0), (7.0, 50.0)])).unwrap();
        assert_abs_diff_eq!(row.mean, 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(row.std, 4.8f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_summarize_table() {
        let mut t = Table::new(vec!["3".into(), "5".into()]);
        t.push_row("x", vec![50.0, 50.0]).unwrap();
        t.push_row("y", vec![0.0, 100.0]).unwrap();
        let rows = summarize_table(&t).unwrap();
        assert_eq!(rows.len(), 2);
        assert_abs_diff_eq!(rows[0].mean, 4.0);
        assert_abs_diff_eq!(rows[1].mean, 5.0);
        assert_eq!(rows[1].label, "y");

        let out = summary_table(&rows).unwrap();
        assert_eq!(out.headers(), &["mean", "std", "geommean"]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_summarize_table_bad_header() {
        let t = Table::new(vec!["big".into()]);
        assert!(summarize_table(&t).unwrap_err().is_io_error());
    }
}
