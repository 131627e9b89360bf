//! External steps: build, test, lint and coverage report generation
//!
//! The gate never interprets tool output; it only needs to know whether a step
//! ran to completion. [`CommandRunner`] is the seam tests replace with a fake.

use colored::Colorize;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use crate::error::GateError;

/// A command to run before the coverage report is evaluated
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub name: String,
    /// Program followed by whitespace-separated arguments; no shell expansion
    pub cmd: String,
    pub cwd: Option<String>,
}

impl Step {
    pub fn new(name: &str, cmd: &str) -> Self {
        Self {
            name: name.to_string(),
            cmd: cmd.to_string(),
            cwd: None,
        }
    }

    /// The program name, i.e. the first word of `cmd`
    pub fn program(&self) -> Option<&str> {
        self.cmd.split_whitespace().next()
    }

    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.cmd.split_whitespace().skip(1)
    }

    pub fn working_dir(&self, base_dir: &Path) -> PathBuf {
        match self.cwd {
            Some(ref cwd) => base_dir.join(cwd),
            None => base_dir.to_path_buf(),
        }
    }
}

/// Result of executing a step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u128,
    pub exit_code: Option<i32>,
}

/// Runs external steps to completion
pub trait CommandRunner {
    /// Run `step` and report how it ended.
    ///
    /// A missing program is an error; a program that exits non-zero is a
    /// `StepResult` with `success == false`.
    fn run(&self, step: &Step, base_dir: &Path) -> Result<StepResult, GateError>;
}

/// Spawns real processes, inheriting stdout and stderr
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    pub verbose: bool,
}

impl SystemRunner {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, step: &Step, base_dir: &Path) -> Result<StepResult, GateError> {
        let program = step.program().ok_or_else(|| GateError::ToolMissing {
            step: step.name.clone(),
            tool: String::new(),
        })?;

        let dir = step.working_dir(base_dir);
        // A missing cwd also surfaces as NotFound from spawn; keep it apart from ToolMissing
        if !dir.is_dir() {
            return Err(GateError::Spawn {
                step: step.name.clone(),
                source: std::io::Error::new(
                    ErrorKind::NotFound,
                    format!("working directory {} does not exist", dir.display()),
                ),
            });
        }

        if self.verbose {
            println!(
                "  {} {} {}",
                "$".dimmed(),
                step.cmd.dimmed(),
                format!("(in {})", dir.display()).dimmed()
            );
        }

        let start = Instant::now();
        let status = Command::new(program)
            .args(step.args())
            .current_dir(&dir)
            .status()
            .map_err(|source| {
                if source.kind() == ErrorKind::NotFound {
                    GateError::ToolMissing {
                        step: step.name.clone(),
                        tool: program.to_string(),
                    }
                } else {
                    GateError::Spawn {
                        step: step.name.clone(),
                        source,
                    }
                }
            })?;

        Ok(StepResult {
            name: step.name.clone(),
            success: status.success(),
            duration_ms: start.elapsed().as_millis(),
            exit_code: status.code(),
        })
    }
}
