//! Final gate summary, human-readable or JSON

use anyhow::Result;
use colored::Colorize;

use crate::gate::GateOutcome;

pub fn print_summary(outcome: &GateOutcome) {
    println!("{}", "─".repeat(50).dimmed());

    let total_time: u128 = outcome.steps.iter().map(|s| s.duration_ms).sum();
    if !outcome.steps.is_empty() {
        println!(
            "  {} {} step(s) completed ({}ms)",
            "•".dimmed(),
            outcome.steps.len(),
            total_time
        );
    }

    if let Some(ref warning) = outcome.baseline_warning {
        println!("  {} {}", "⚠".yellow(), warning.yellow());
    }

    if outcome.verdict.is_pass() {
        println!(
            "{} {}: {}",
            "✓".green().bold(),
            outcome.verdict.to_string().green().bold(),
            outcome.reason
        );
    } else {
        println!(
            "{} {}: {}",
            "✗".red().bold(),
            outcome.verdict.to_string().red().bold(),
            outcome.reason
        );
    }
}

pub fn to_json(outcome: &GateOutcome) -> Result<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BaselinePolicy, GateSettings};
    use crate::coverage::ReportFormat;
    use crate::gate::Gate;
    use crate::step::{Step, SystemRunner};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_json_outcome() {
        let dir = TempDir::new().unwrap();
        let report_path = dir.path().join("cobertura.xml");
        let baseline_path = dir.path().join(".coverage-baseline");
        fs::write(&report_path, r#"<coverage line-rate="0.1"/>"#).unwrap();

        let settings = GateSettings {
            min_coverage: 20,
            max_drop: 10,
            report_path,
            baseline_path,
            format: ReportFormat::Cobertura,
            baseline_policy: BaselinePolicy::Always,
            steps: Vec::new(),
            coverage_step: Step::new("coverage", "true"),
        };
        let outcome = Gate::new(settings, dir.path(), SystemRunner::default())
            .with_quiet(true)
            .evaluate()
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&to_json(&outcome).unwrap()).unwrap();
        assert_eq!(json["verdict"], "fail_below_minimum");
        assert_eq!(json["ratio"], 0.1);
        assert_eq!(json["threshold"]["percent"], 10);
        assert_eq!(json["baseline_updated"], true);
        assert_eq!(json["states"][0], "start");
    }
}
