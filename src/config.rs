use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::baseline::DEFAULT_BASELINE_PATH;
use crate::coverage::ReportFormat;
use crate::step::Step;

pub const DEFAULT_MIN_COVERAGE: u32 = 20;
pub const DEFAULT_MAX_DROP: u32 = 10;
pub const DEFAULT_REPORT_PATH: &str = "cobertura.xml";
pub const DEFAULT_COVERAGE_CMD: &str = "cargo tarpaulin --out Xml --timeout 120";

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gate: GateConfig,
    /// Build, test and lint steps; replaces the defaults when present
    #[serde(default = "default_steps")]
    pub steps: HashMap<String, StepConfig>,
    #[serde(default)]
    pub coverage: CoverageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Minimum line coverage, integer percent
    #[serde(default = "default_min_coverage")]
    pub min_coverage: u32,
    /// Maximum allowed drop from the baseline, in percentage points
    #[serde(default = "default_max_drop")]
    pub max_drop: u32,
    #[serde(default = "default_report")]
    pub report: String,
    #[serde(default = "default_baseline")]
    pub baseline: String,
    #[serde(default)]
    pub format: ReportFormat,
    #[serde(default)]
    pub baseline_policy: BaselinePolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    pub cmd: String,
    #[serde(default)]
    pub cwd: Option<String>,
    /// Steps run in ascending order, ties broken by name
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoverageConfig {
    #[serde(default = "default_coverage_cmd")]
    pub cmd: String,
    #[serde(default)]
    pub cwd: Option<String>,
}

/// When the baseline is overwritten with the measured ratio
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BaselinePolicy {
    /// After every run that produced a ratio, pass or fail
    #[default]
    Always,
    /// Only when the gate passes
    OnPass,
}

fn default_min_coverage() -> u32 {
    DEFAULT_MIN_COVERAGE
}

fn default_max_drop() -> u32 {
    DEFAULT_MAX_DROP
}

fn default_report() -> String {
    DEFAULT_REPORT_PATH.to_string()
}

fn default_baseline() -> String {
    DEFAULT_BASELINE_PATH.to_string()
}

fn default_coverage_cmd() -> String {
    DEFAULT_COVERAGE_CMD.to_string()
}

fn default_steps() -> HashMap<String, StepConfig> {
    [
        ("build", "cargo build", 0),
        ("test", "cargo test", 1),
        ("lint", "cargo clippy --all-targets -- -D warnings", 2),
    ]
    .into_iter()
    .map(|(name, cmd, order)| {
        (
            name.to_string(),
            StepConfig {
                cmd: cmd.to_string(),
                cwd: None,
                order,
            },
        )
    })
    .collect()
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_coverage: DEFAULT_MIN_COVERAGE,
            max_drop: DEFAULT_MAX_DROP,
            report: default_report(),
            baseline: default_baseline(),
            format: ReportFormat::default(),
            baseline_policy: BaselinePolicy::default(),
        }
    }
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            cmd: default_coverage_cmd(),
            cwd: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gate: GateConfig::default(),
            steps: default_steps(),
            coverage: CoverageConfig::default(),
        }
    }
}

/// Everything a gate run needs, with paths resolved against the project directory
#[derive(Debug, Clone)]
pub struct GateSettings {
    pub min_coverage: u32,
    pub max_drop: u32,
    pub report_path: PathBuf,
    pub baseline_path: PathBuf,
    pub format: ReportFormat,
    pub baseline_policy: BaselinePolicy,
    /// Build, test and lint steps, in execution order
    pub steps: Vec<Step>,
    pub coverage_step: Step,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.gate.min_coverage > 100 {
            anyhow::bail!(
                "min_coverage must be between 0 and 100, got {}",
                self.gate.min_coverage
            );
        }

        for (name, step) in &self.steps {
            if step.cmd.trim().is_empty() {
                anyhow::bail!("Step '{}' has an empty cmd", name);
            }
        }

        if self.coverage.cmd.trim().is_empty() {
            anyhow::bail!("[coverage] cmd must not be empty");
        }

        Ok(())
    }

    /// Steps sorted by `order`, then name
    pub fn ordered_steps(&self) -> Vec<Step> {
        let mut entries: Vec<_> = self.steps.iter().collect();
        entries.sort_by(|(a_name, a), (b_name, b)| a.order.cmp(&b.order).then(a_name.cmp(b_name)));

        entries
            .into_iter()
            .map(|(name, step)| Step {
                name: name.clone(),
                cmd: step.cmd.clone(),
                cwd: step.cwd.clone(),
            })
            .collect()
    }

    pub fn settings(&self, base_dir: &Path) -> GateSettings {
        GateSettings {
            min_coverage: self.gate.min_coverage,
            max_drop: self.gate.max_drop,
            report_path: base_dir.join(&self.gate.report),
            baseline_path: base_dir.join(&self.gate.baseline),
            format: self.gate.format,
            baseline_policy: self.gate.baseline_policy,
            steps: self.ordered_steps(),
            coverage_step: Step {
                name: "coverage".to_string(),
                cmd: self.coverage.cmd.clone(),
                cwd: self.coverage.cwd.clone(),
            },
        }
    }
}
