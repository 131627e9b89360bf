//! Coverage threshold validation

use colored::Colorize;
use serde::Serialize;

use super::CoverageRatio;

/// Result of the minimum coverage check
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdResult {
    pub passed: bool,
    /// Measured coverage as a truncated integer percentage
    pub percent: u32,
    /// Configured minimum percentage
    pub minimum: u32,
}

impl ThresholdResult {
    pub fn print_summary(&self) {
        let delta = self.percent as i64 - self.minimum as i64;
        let status = if self.passed { "✓".green() } else { "✗".red() };
        let delta_str = if delta >= 0 {
            format!("+{}", delta).green()
        } else {
            format!("{}", delta).red()
        };

        println!(
            "  {} Line coverage: {}% (minimum: {}%, {})",
            status, self.percent, self.minimum, delta_str
        );
    }
}

/// Check coverage against a minimum integer percentage.
///
/// The ratio is truncated, so 0.199 is 19% and fails a minimum of 20.
pub fn check_minimum(ratio: CoverageRatio, minimum: u32) -> ThresholdResult {
    let percent = ratio.percent();

    ThresholdResult {
        passed: percent >= minimum,
        percent,
        minimum,
    }
}
