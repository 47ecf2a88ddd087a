//! Plain-text run summary written next to the result tables.

use crate::IoResult;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Suffix of the volume table file.
pub const VOLUMES_SUFFIX: &str = ".vols.txt";
/// Suffix of the granulometry (distribution) table file.
pub const DISTRIBUTION_SUFFIX: &str = ".gr.txt";
/// Suffix of the summary statistics table file.
pub const STATS_SUFFIX: &str = ".stats.txt";

/// Parameters and inputs of one analysis run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Ordered `(name, value)` parameter lines.
    pub fields: Vec<(String, String)>,
    /// Input files, in processing order.
    pub files: Vec<PathBuf>,
    /// Analysis time, seconds since the Unix epoch.
    pub timestamp: u64,
}

impl RunSummary {
    /// Creates an empty summary stamped with the current time.
    pub fn now() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            timestamp,
            ..Self::default()
        }
    }

    /// Adds a parameter line.
    pub fn field(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((name.into(), value.to_string()));
        self
    }

    /// Renders the summary text.
    pub fn render(&self) -> String {
        let mut out = String::from("Granulometry analysis\n\n");
        for (name, value) in &self.fields {
            let _ = writeln!(out, "{}:\t{}", name, value);
        }
        let _ = writeln!(out, "\nImages ({}):", self.files.len());
        for f in &self.files {
            let _ = writeln!(out, "\t{}", f.display());
        }
        let _ = writeln!(out, "\nAnalysed at (unix time):\t{}", self.timestamp);
        out
    }

    /// Writes the summary to `path`.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> IoResult<()> {
        trace!(path = %path.as_ref().display(), "RunSummary::write");
        std::fs::write(path, self.render())?;
        Ok(())
    }
}

/// Derives a sibling path by replacing the `.txt` extension of `base` with
/// `suffix`.
///
/// ```rust
/// use gran_io::summary::{sibling_path, DISTRIBUTION_SUFFIX};
///
/// let p = sibling_path("out/imgs_ClSq51.txt", DISTRIBUTION_SUFFIX);
/// assert_eq!(p.to_str(), Some("out/imgs_ClSq51.gr.txt"));
/// ```
pub fn sibling_path<P: AsRef<Path>>(base: P, suffix: &str) -> PathBuf {
    let base = base.as_ref();
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    base.with_file_name(format!("{}{}", stem, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let mut s = RunSummary::now()
            .field("Operation", "Closing")
            .field("Max size", 51);
        s.files = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];
        let text = s.render();
        assert!(text.contains("Operation:\tClosing"));
        assert!(text.contains("Max size:\t51"));
        assert!(text.contains("Images (2):"));
        assert!(text.contains("\tb.png"));
        assert!(s.timestamp > 0);
    }

    #[test]
    fn test_sibling_paths() {
        assert_eq!(
            sibling_path("r/x_OpDsk9.txt", VOLUMES_SUFFIX),
            PathBuf::from("r/x_OpDsk9.vols.txt")
        );
        assert_eq!(
            sibling_path("plain", STATS_SUFFIX),
            PathBuf::from("plain.stats.txt")
        );
    }

    #[test]
    fn test_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.txt");
        RunSummary::now().field("Step", 2).write(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Granulometry analysis"));
    }
}
