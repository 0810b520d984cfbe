//! Error types shared by ingestion, configuration and block extraction.

/**
 * File: /src/error.rs
 * Created Date: Monday, March 2nd 2026
 * Author: Zihan
 * -----
 * Last Modified: Monday, 9th March 2026
 * Modified By: Zihan
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-03-02		Zihan	Error enum for dense block detection
 * 2026-03-09		Zihan	Keep the serde_json error as the source
 */

use std::error::Error;
use std::fmt;
use std::io;

/// Errors raised by the dense block detection library
#[derive(Debug)]
pub enum DenseBlockError {
    /// Density measure selector not in `ari`, `geo`, `susp`, `es_<alpha>`
    UnknownMeasure(String),
    /// Entry-surplus penalty must be finite and strictly positive
    InvalidAlpha(f64),
    /// Lower size bound is greater than the upper size bound
    InvalidBounds { lower: usize, upper: usize },
    /// Tensor construction received inconsistent data
    InvalidTensor(String),
    /// Any other configuration problem detected before extraction starts
    InvalidConfiguration(String),
    Io(io::Error),
    /// Block summary could not be serialized
    Json(serde_json::Error),
}

impl fmt::Display for DenseBlockError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DenseBlockError::UnknownMeasure(name) => write!(
                f,
                "Unknown density measure '{}' (expected one of ari, geo, susp, es_<alpha>)",
                name
            ),
            DenseBlockError::InvalidAlpha(alpha) => {
                write!(f, "Entry surplus alpha must be greater than zero, got {}", alpha)
            }
            DenseBlockError::InvalidBounds { lower, upper } => write!(
                f,
                "Upper bound {} must be greater than or equal to lower bound {}",
                upper, lower
            ),
            DenseBlockError::InvalidTensor(msg) => write!(f, "Invalid tensor: {}", msg),
            DenseBlockError::InvalidConfiguration(msg) => {
                write!(f, "Invalid configuration: {}", msg)
            }
            DenseBlockError::Io(e) => write!(f, "I/O error: {}", e),
            DenseBlockError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl Error for DenseBlockError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DenseBlockError::Io(e) => Some(e),
            DenseBlockError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DenseBlockError {
    fn from(e: io::Error) -> Self {
        DenseBlockError::Io(e)
    }
}

impl From<serde_json::Error> for DenseBlockError {
    fn from(e: serde_json::Error) -> Self {
        DenseBlockError::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_measure_display() {
        let error = DenseBlockError::UnknownMeasure("median".to_string());
        let error_str = format!("{}", error);
        assert!(error_str.contains("median"));
        assert!(error_str.contains("es_<alpha>"));
    }

    #[test]
    fn test_invalid_bounds_display() {
        let error = DenseBlockError::InvalidBounds { lower: 10, upper: 3 };
        let error_str = format!("{}", error);
        assert!(error_str.contains("10"));
        assert!(error_str.contains("3"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing.tsv");
        let err: DenseBlockError = io_err.into();
        match err {
            DenseBlockError::Io(ref inner) => assert_eq!(inner.kind(), io::ErrorKind::NotFound),
            _ => panic!("Expected Io error variant"),
        }
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: DenseBlockError = json_err.into();
        match err {
            DenseBlockError::Json(_) => {}
            _ => panic!("Expected Json error variant"),
        }
        assert!(err.source().is_some());
    }
}
