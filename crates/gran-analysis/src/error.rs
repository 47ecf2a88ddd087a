//! Error types for granulometry runs.
//!
//! Every variant is fatal to the current run: a batch that hits one stops
//! and surfaces it, so result tables never hold misaligned or undefined rows.

use gran_io::IoError;
use gran_ops::OpsError;
use thiserror::Error;

/// Result type alias using [`GranError`].
pub type GranResult<T> = std::result::Result<T, GranError>;

/// Errors raised by the granulometry pipeline.
#[derive(Debug, Error)]
pub enum GranError {
    /// Bad run parameter: size series, shape/dimension mix, unknown label.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Volume curve cannot be normalized (too short or flat).
    #[error("degenerate volume curve: {0}")]
    DegenerateCurve(String),

    /// Statistic has no defined value for this distribution.
    #[error("undefined statistic: {0}")]
    UndefinedStatistic(String),

    /// Decoding, listing or export failure.
    #[error(transparent)]
    Io(#[from] IoError),

    /// Resolution text is not a positive number.
    #[error("cannot parse calibration '{input}': {reason}")]
    CalibrationParse {
        /// Text that failed to parse
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// Run stopped through a cancel token.
    #[error("run cancelled")]
    Cancelled,

    /// Failure while processing one image of a batch.
    #[error("image '{label}': {source}")]
    InImage {
        /// Label of the failing image
        label: String,
        /// Underlying error
        #[source]
        source: Box<GranError>,
    },

    /// Image buffer error.
    #[error(transparent)]
    Image(#[from] gran_core::Error),
}

impl GranError {
    /// Creates an [`GranError::InvalidParameter`] error.
    #[inline]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Attaches the label of the image being processed.
    pub fn in_image(self, label: impl Into<String>) -> Self {
        match self {
            // cancellation is not tied to an image
            Self::Cancelled => Self::Cancelled,
            other => Self::InImage {
                label: label.into(),
                source: Box::new(other),
            },
        }
    }

    /// Innermost error, looking through [`GranError::InImage`].
    pub fn root(&self) -> &GranError {
        match self {
            Self::InImage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns `true` for [`GranError::InvalidParameter`].
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self.root(), Self::InvalidParameter(_))
    }

    /// Returns `true` for [`GranError::DegenerateCurve`].
    pub fn is_degenerate_curve(&self) -> bool {
        matches!(self.root(), Self::DegenerateCurve(_))
    }

    /// Returns `true` for [`GranError::UndefinedStatistic`].
    pub fn is_undefined_statistic(&self) -> bool {
        matches!(self.root(), Self::UndefinedStatistic(_))
    }

    /// Returns `true` for [`GranError::Io`].
    pub fn is_io_error(&self) -> bool {
        matches!(self.root(), Self::Io(_))
    }

    /// Returns `true` for [`GranError::CalibrationParse`].
    pub fn is_calibration_error(&self) -> bool {
        matches!(self.root(), Self::CalibrationParse { .. })
    }

    /// Returns `true` for [`GranError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Self::Cancelled)
    }
}

impl From<OpsError> for GranError {
    fn from(e: OpsError) -> Self {
        match e {
            OpsError::Image(inner) => Self::Image(inner),
            other => Self::InvalidParameter(other.to_string()),
        }
    }
}

impl From<std::io::Error> for GranError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(IoError::Io(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ops_labels_become_invalid_parameter() {
        let err: GranError = OpsError::UnknownLabel {
            kind: "shape",
            label: "blob".into(),
        }
        .into();
        assert!(err.is_invalid_parameter());
        assert!(err.to_string().contains("blob"));
    }

    #[test]
    fn test_in_image_keeps_kind() {
        let err = GranError::DegenerateCurve("flat".into()).in_image("a.png");
        assert!(err.is_degenerate_curve());
        assert!(err.to_string().starts_with("image 'a.png'"));
        assert!(GranError::Cancelled.in_image("x").is_cancelled());
        assert!(matches!(GranError::Cancelled.in_image("x"), GranError::Cancelled));
    }

    #[test]
    fn test_io_conversion() {
        let err: GranError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.is_io_error());
    }
}
