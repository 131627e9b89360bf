//! Coverage module
//!
//! Provides:
//! - Cobertura XML parsing (first `line-rate` marker)
//! - LCOV parsing (aggregate of LH/LF records)
//! - Minimum threshold validation
//! - Regression check against a baseline

mod cobertura;
mod lcov;
mod regression;
mod threshold;

pub use cobertura::*;
pub use lcov::*;
pub use regression::*;
pub use threshold::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Binary floating-point slack absorbed before truncating to a percentage
const PERCENT_EPSILON: f64 = 1e-9;

/// Fraction of executable lines covered, always within [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct CoverageRatio(f64);

impl CoverageRatio {
    /// Returns `None` for NaN, infinities and values outside [0, 1]
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Integer percentage, truncated toward zero.
    ///
    /// `0.57 * 100.0` is `56.99999999999999` in f64, so a tiny epsilon is added
    /// before truncating; the result never exceeds 100.
    pub fn percent(self) -> u32 {
        let scaled = self.0 * 100.0 + PERCENT_EPSILON;
        (scaled.trunc() as u32).min(100)
    }

    /// Parse a decimal ratio such as `0.4521`
    pub fn parse(text: &str) -> Option<Self> {
        text.trim().parse::<f64>().ok().and_then(Self::new)
    }
}

impl fmt::Display for CoverageRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supported coverage report formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Cobertura,
    Lcov,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Cobertura => write!(f, "cobertura"),
            ReportFormat::Lcov => write!(f, "lcov"),
        }
    }
}

/// Why a coverage report could not produce a ratio
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("coverage report not found: {}", .path.display())]
    Missing { path: PathBuf },

    #[error("coverage report {} is unparseable: {reason}", .path.display())]
    Unparseable { path: PathBuf, reason: String },
}

/// Parse the aggregate line coverage ratio from a report file
pub fn parse_report(path: &Path, format: ReportFormat) -> Result<CoverageRatio, ReportError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ReportError::Missing { path: path.to_path_buf() })
        }
        Err(e) => {
            return Err(ReportError::Unparseable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };

    let parsed = match format {
        ReportFormat::Cobertura => parse_cobertura_string(&content),
        ReportFormat::Lcov => parse_lcov_string(&content),
    };

    parsed.map_err(|reason| ReportError::Unparseable {
        path: path.to_path_buf(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ratio_bounds() {
        assert!(CoverageRatio::new(0.0).is_some());
        assert!(CoverageRatio::new(1.0).is_some());
        assert!(CoverageRatio::new(-0.01).is_none());
        assert!(CoverageRatio::new(1.01).is_none());
        assert!(CoverageRatio::new(f64::NAN).is_none());
    }

    #[test]
    fn test_percent_truncates() {
        assert_eq!(CoverageRatio::new(0.459).unwrap().percent(), 45);
        assert_eq!(CoverageRatio::new(0.999).unwrap().percent(), 99);
        assert_eq!(CoverageRatio::new(0.57).unwrap().percent(), 57);
        assert_eq!(CoverageRatio::new(0.29).unwrap().percent(), 29);
        assert_eq!(CoverageRatio::new(1.0).unwrap().percent(), 100);
        assert_eq!(CoverageRatio::new(0.0).unwrap().percent(), 0);
    }

    #[test]
    fn test_percent_epsilon_edge() {
        // within 1e-11 below 20% rounds up to 20; further below stays at 19
        assert_eq!(CoverageRatio::new(0.19999999999999).unwrap().percent(), 20);
        assert_eq!(CoverageRatio::new(0.1999999).unwrap().percent(), 19);
    }

    #[test]
    fn test_parse_report_missing() {
        let dir = TempDir::new().unwrap();
        let err = parse_report(&dir.path().join("nope.xml"), ReportFormat::Cobertura).unwrap_err();
        assert!(matches!(err, ReportError::Missing { .. }));
    }

    #[test]
    fn test_parse_report_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cobertura.xml");
        fs::write(&path, r#"<coverage line-rate="0.45"></coverage>"#).unwrap();

        let ratio = parse_report(&path, ReportFormat::Cobertura).unwrap();
        assert_eq!(ratio.value(), 0.45);
    }

    #[test]
    fn test_parse_report_unparseable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cobertura.xml");
        fs::write(&path, "<coverage></coverage>").unwrap();

        let err = parse_report(&path, ReportFormat::Cobertura).unwrap_err();
        assert!(matches!(err, ReportError::Unparseable { .. }));
    }
}
