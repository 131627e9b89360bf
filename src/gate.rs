//! Gate orchestrator
//!
//! Sequences one gate run as a linear state machine:
//!
//! ```text
//! Start → BuildAndTest → GenerateReport → Parse → CheckThreshold
//!       → CheckRegression → UpdateBaseline → Exit
//! ```
//!
//! A failed external step aborts the run with a [`GateError`]. A report that is
//! missing or unparseable ends the run with a failing verdict and leaves the
//! baseline untouched. Threshold and regression failures skip the remaining
//! checks but still reach `UpdateBaseline`.

use colored::Colorize;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::baseline::{BaselineError, BaselineStore};
use crate::config::{BaselinePolicy, GateSettings};
use crate::coverage::{
    check_minimum, check_regression, parse_report, CoverageRatio, RegressionResult, ReportError,
    ThresholdResult,
};
use crate::error::GateError;
use crate::step::{CommandRunner, Step, StepResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Start,
    BuildAndTest,
    GenerateReport,
    Parse,
    CheckThreshold,
    CheckRegression,
    UpdateBaseline,
    Exit,
}

/// The single terminal result of a gate run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateVerdict {
    Pass,
    FailBelowMinimum,
    FailRegression,
    FailReportMissing,
    FailReportUnparseable,
}

impl GateVerdict {
    pub fn is_pass(self) -> bool {
        self == GateVerdict::Pass
    }
}

impl fmt::Display for GateVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GateVerdict::Pass => "PASS",
            GateVerdict::FailBelowMinimum => "FAIL (below minimum)",
            GateVerdict::FailRegression => "FAIL (regression)",
            GateVerdict::FailReportMissing => "FAIL (report missing)",
            GateVerdict::FailReportUnparseable => "FAIL (report unparseable)",
        };
        write!(f, "{}", label)
    }
}

/// Everything observable about a finished gate run
#[derive(Debug, Clone, Serialize)]
pub struct GateOutcome {
    pub verdict: GateVerdict,
    /// Human-readable explanation of the verdict
    pub reason: String,
    pub ratio: Option<CoverageRatio>,
    /// Baseline as loaded at the start of the run
    pub baseline: Option<CoverageRatio>,
    /// Set when a corrupt baseline was ignored
    pub baseline_warning: Option<String>,
    pub threshold: Option<ThresholdResult>,
    pub regression: Option<RegressionResult>,
    pub baseline_updated: bool,
    pub steps: Vec<StepResult>,
    pub states: Vec<GateState>,
}

impl GateOutcome {
    fn new(baseline: Option<CoverageRatio>, baseline_warning: Option<String>) -> Self {
        Self {
            verdict: GateVerdict::Pass,
            reason: String::new(),
            ratio: None,
            baseline,
            baseline_warning,
            threshold: None,
            regression: None,
            baseline_updated: false,
            steps: Vec::new(),
            states: vec![GateState::Start],
        }
    }

    /// Process exit code: 0 on pass, 1 for every failing verdict
    pub fn exit_code(&self) -> i32 {
        if self.verdict.is_pass() {
            0
        } else {
            1
        }
    }

    fn enter(&mut self, state: GateState) {
        self.states.push(state);
    }
}

/// Runs the coverage gate against one project
pub struct Gate<R: CommandRunner> {
    settings: GateSettings,
    base_dir: PathBuf,
    runner: R,
    quiet: bool,
}

impl<R: CommandRunner> Gate<R> {
    pub fn new(settings: GateSettings, base_dir: &Path, runner: R) -> Self {
        Self {
            settings,
            base_dir: base_dir.to_path_buf(),
            runner,
            quiet: false,
        }
    }

    /// Suppress per-stage status lines (used for `--json` output)
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Full run: external steps, report generation, then evaluation
    pub fn run(&self) -> Result<GateOutcome, GateError> {
        let mut outcome = self.start()?;

        outcome.enter(GateState::BuildAndTest);
        for step in &self.settings.steps {
            let result = self.run_step(step)?;
            outcome.steps.push(result);
        }

        outcome.enter(GateState::GenerateReport);
        self.remove_old_report()?;
        let result = self.run_step(&self.settings.coverage_step)?;
        outcome.steps.push(result);

        self.evaluate_report(outcome)
    }

    /// Evaluate an existing report without running any external step
    pub fn evaluate(&self) -> Result<GateOutcome, GateError> {
        let outcome = self.start()?;
        self.evaluate_report(outcome)
    }

    fn start(&self) -> Result<GateOutcome, GateError> {
        let store = self.store();

        let (baseline, warning) = match store.load() {
            Ok(baseline) => (baseline, None),
            Err(e @ BaselineError::Corrupt { .. }) => {
                let warning = format!("{}; continuing without a baseline", e);
                self.status(format!("{} {}", "⚠".yellow(), warning.yellow()));
                (None, Some(warning))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(GateOutcome::new(baseline, warning))
    }

    fn run_step(&self, step: &Step) -> Result<StepResult, GateError> {
        self.status(format!("{} {}", "→".blue(), step.name.bold()));

        let result = self.runner.run(step, &self.base_dir)?;

        if !result.success {
            self.status(format!(
                "{} {} failed ({}ms)",
                "✗".red().bold(),
                step.name,
                result.duration_ms
            ));
            return Err(GateError::StepFailed {
                step: step.name.clone(),
                code: result.exit_code,
            });
        }

        self.status(format!(
            "{} {} ({}ms)",
            "✓".green(),
            step.name,
            result.duration_ms
        ));
        Ok(result)
    }

    fn evaluate_report(&self, mut outcome: GateOutcome) -> Result<GateOutcome, GateError> {
        outcome.enter(GateState::Parse);
        self.status(format!(
            "{} Reading {} report {}",
            "→".blue(),
            self.settings.format,
            self.settings.report_path.display().to_string().dimmed()
        ));

        let ratio = match parse_report(&self.settings.report_path, self.settings.format) {
            Ok(ratio) => ratio,
            Err(e) => {
                outcome.verdict = match e {
                    ReportError::Missing { .. } => GateVerdict::FailReportMissing,
                    ReportError::Unparseable { .. } => GateVerdict::FailReportUnparseable,
                };
                outcome.reason = e.to_string();
                outcome.enter(GateState::Exit);
                return Ok(outcome);
            }
        };
        outcome.ratio = Some(ratio);

        outcome.enter(GateState::CheckThreshold);
        let threshold = check_minimum(ratio, self.settings.min_coverage);
        outcome.threshold = Some(threshold);
        if !self.quiet {
            threshold.print_summary();
        }

        if !threshold.passed {
            outcome.verdict = GateVerdict::FailBelowMinimum;
            outcome.reason = format!(
                "line coverage {}% (ratio {}) is below the minimum of {}%",
                threshold.percent, ratio, threshold.minimum
            );
        } else {
            outcome.enter(GateState::CheckRegression);
            let regression =
                check_regression(ratio, outcome.baseline, self.settings.max_drop);
            outcome.regression = Some(regression);
            if !self.quiet {
                regression.print_summary();
            }

            if regression.passed {
                outcome.verdict = GateVerdict::Pass;
                outcome.reason = pass_reason(&threshold, &regression);
            } else {
                outcome.verdict = GateVerdict::FailRegression;
                outcome.reason = format!(
                    "line coverage dropped {} points from baseline {}% to {}% (max allowed drop: {})",
                    regression.drop.unwrap_or_default(),
                    regression.baseline_percent.unwrap_or_default(),
                    regression.current_percent,
                    regression.max_drop
                );
            }
        }

        outcome.enter(GateState::UpdateBaseline);
        let should_save = match self.settings.baseline_policy {
            BaselinePolicy::Always => true,
            BaselinePolicy::OnPass => outcome.verdict.is_pass(),
        };
        if should_save {
            self.store().save(ratio)?;
            outcome.baseline_updated = true;
            self.status(format!(
                "{} Baseline updated: {}",
                "→".blue(),
                ratio.to_string().cyan()
            ));
        } else {
            self.status(format!(
                "{} Baseline kept (gate failed, policy is on-pass)",
                "→".dimmed()
            ));
        }

        outcome.enter(GateState::Exit);
        Ok(outcome)
    }

    /// A coverage tool that succeeds without writing must not leave last run's report in place
    fn remove_old_report(&self) -> Result<(), GateError> {
        let path = &self.settings.report_path;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(GateError::StaleReport {
                path: path.clone(),
                source,
            }),
        }
    }

    fn store(&self) -> BaselineStore {
        BaselineStore::new(&self.settings.baseline_path)
    }

    fn status(&self, line: String) {
        if !self.quiet {
            println!("{}", line);
        }
    }
}

fn pass_reason(threshold: &ThresholdResult, regression: &RegressionResult) -> String {
    match (regression.baseline_percent, regression.drop) {
        (Some(old), Some(drop)) => format!(
            "line coverage {}% meets the minimum of {}% (baseline {}%, drop {} of {} allowed)",
            threshold.percent, threshold.minimum, old, drop, regression.max_drop
        ),
        _ => format!(
            "line coverage {}% meets the minimum of {}% (no baseline yet)",
            threshold.percent, threshold.minimum
        ),
    }
}
