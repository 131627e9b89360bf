//! Coverage regression check against the stored baseline

use colored::Colorize;
use serde::Serialize;

use super::CoverageRatio;

/// Result of comparing the current run to the baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionResult {
    pub passed: bool,
    /// Percentage points lost since the baseline; negative means improvement.
    /// `None` when there was no baseline to compare against.
    pub drop: Option<f64>,
    pub baseline_percent: Option<u32>,
    pub current_percent: u32,
    pub max_drop: u32,
}

impl RegressionResult {
    pub fn print_summary(&self) {
        let (Some(old), Some(drop)) = (self.baseline_percent, self.drop) else {
            println!(
                "  {} No baseline yet, regression check skipped",
                "→".dimmed()
            );
            return;
        };

        let indicator = if drop < 0.0 {
            "↑".green()
        } else if drop > 0.0 {
            if self.passed { "↓".yellow() } else { "↓".red() }
        } else {
            "→".dimmed()
        };

        let change = -drop;
        let change_str = if change > 0.0 {
            format!("+{:.0} pts", change).green()
        } else if change < 0.0 {
            format!("{:.0} pts", change).red()
        } else {
            "0 pts".dimmed()
        };

        println!(
            "  {} Baseline: {}% → {}% ({}, max drop: {} pts)",
            indicator, old, self.current_percent, change_str, self.max_drop
        );
    }
}

/// Compare the current ratio to an optional baseline.
///
/// Both ratios are truncated to integer percentages first; the check fails only
/// when the drop is strictly greater than `max_drop`.
pub fn check_regression(
    current: CoverageRatio,
    baseline: Option<CoverageRatio>,
    max_drop: u32,
) -> RegressionResult {
    let current_percent = current.percent();

    let Some(baseline) = baseline else {
        return RegressionResult {
            passed: true,
            drop: None,
            baseline_percent: None,
            current_percent,
            max_drop,
        };
    };

    let baseline_percent = baseline.percent();
    let drop = baseline_percent as f64 - current_percent as f64;

    RegressionResult {
        passed: drop <= max_drop as f64,
        drop: Some(drop),
        baseline_percent: Some(baseline_percent),
        current_percent,
        max_drop,
    }
}
