use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use covgate::config::Config;
use covgate::gate::{Gate, GateOutcome};
use covgate::summary;
use covgate::{BaselinePolicy, BaselineStore, GateSettings, ReportFormat, SystemRunner};

const CONFIG_FILE: &str = "covgate.toml";

#[derive(Parser)]
#[command(name = "covgate")]
#[command(about = "Coverage gate: build, test, lint, measure coverage and fail on low or regressing coverage")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (default: covgate.toml, optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run build, test and lint steps, generate the coverage report and evaluate it
    Run {
        #[command(flatten)]
        gate: GateArgs,

        /// Echo each command before running it
        #[arg(short, long)]
        verbose: bool,
    },

    /// Evaluate an existing coverage report without running any step
    Check {
        #[command(flatten)]
        gate: GateArgs,
    },

    /// Inspect or reset the stored coverage baseline
    Baseline {
        #[command(subcommand)]
        action: BaselineAction,

        /// Path to the baseline file
        #[arg(long, global = true)]
        baseline: Option<PathBuf>,
    },

    /// List the configured steps
    Steps,
}

#[derive(Subcommand)]
enum BaselineAction {
    /// Print the stored baseline
    Show,
    /// Delete the stored baseline; the next run starts fresh
    Reset,
}

#[derive(Args)]
struct GateArgs {
    /// Minimum line coverage, integer percent
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    min_coverage: Option<u32>,

    /// Maximum allowed coverage drop from the baseline, in percentage points
    #[arg(long)]
    max_drop: Option<u32>,

    /// Path to the coverage report
    #[arg(long)]
    report: Option<PathBuf>,

    /// Path to the baseline file
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Coverage report format
    #[arg(long, value_enum)]
    format: Option<ReportFormat>,

    /// Only overwrite the baseline when the gate passes
    #[arg(long)]
    save_baseline_on_pass: bool,

    /// Print the outcome as JSON instead of the colored summary
    #[arg(long)]
    json: bool,
}

impl GateArgs {
    fn apply(&self, settings: &mut GateSettings, base_dir: &Path) {
        if let Some(min) = self.min_coverage {
            settings.min_coverage = min;
        }
        if let Some(max) = self.max_drop {
            settings.max_drop = max;
        }
        if let Some(ref report) = self.report {
            settings.report_path = base_dir.join(report);
        }
        if let Some(ref baseline) = self.baseline {
            settings.baseline_path = base_dir.join(baseline);
        }
        if let Some(format) = self.format {
            settings.format = format;
        }
        if self.save_baseline_on_pass {
            settings.baseline_policy = BaselinePolicy::OnPass;
        }
    }
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    let (config, base_dir) = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { gate, verbose } => cmd_run(&config, &base_dir, &gate, verbose),
        Commands::Check { gate } => cmd_check(&config, &base_dir, &gate),
        Commands::Baseline { action, baseline } => {
            cmd_baseline(&config, &base_dir, action, baseline.as_deref())
        }
        Commands::Steps => cmd_steps(&config, &base_dir),
    }
}

/// Load the config file and return it with the directory paths are resolved against.
///
/// An explicit `--config` must exist; the default `covgate.toml` is optional.
fn load_config(explicit: Option<&Path>) -> Result<(Config, PathBuf)> {
    let cwd = std::env::current_dir().context("Could not determine current directory")?;

    let config_path = match explicit {
        Some(path) => std::fs::canonicalize(path)
            .with_context(|| format!("Could not find config file: {}", path.display()))?,
        None => {
            let default = cwd.join(CONFIG_FILE);
            if !default.exists() {
                return Ok((Config::default(), cwd));
            }
            default
        }
    };

    let base_dir = config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or(cwd);

    let config = Config::load(&config_path)
        .with_context(|| format!("Could not load {}", config_path.display()))?;

    Ok((config, base_dir))
}

fn cmd_run(config: &Config, base_dir: &Path, args: &GateArgs, verbose: bool) -> Result<i32> {
    let mut settings = config.settings(base_dir);
    args.apply(&mut settings, base_dir);

    if !args.json {
        print_banner(&settings);
    }

    let gate = Gate::new(settings, base_dir, SystemRunner::new(verbose)).with_quiet(args.json);
    let outcome = gate.run()?;

    report(&outcome, args.json)
}

fn cmd_check(config: &Config, base_dir: &Path, args: &GateArgs) -> Result<i32> {
    let mut settings = config.settings(base_dir);
    args.apply(&mut settings, base_dir);

    if !args.json {
        print_banner(&settings);
    }

    let gate = Gate::new(settings, base_dir, SystemRunner::default()).with_quiet(args.json);
    let outcome = gate.evaluate()?;

    report(&outcome, args.json)
}

fn report(outcome: &GateOutcome, json: bool) -> Result<i32> {
    if json {
        println!("{}", summary::to_json(outcome)?);
    } else {
        summary::print_summary(outcome);
    }

    Ok(outcome.exit_code())
}

fn cmd_baseline(
    config: &Config,
    base_dir: &Path,
    action: BaselineAction,
    baseline: Option<&Path>,
) -> Result<i32> {
    let path = match baseline {
        Some(path) => base_dir.join(path),
        None => config.settings(base_dir).baseline_path,
    };
    let store = BaselineStore::new(&path);

    match action {
        BaselineAction::Show => match store.load()? {
            Some(ratio) => println!(
                "{} {} ({}%)",
                "Baseline:".bold(),
                ratio.to_string().cyan(),
                ratio.percent()
            ),
            None => println!(
                "  {} {}",
                "No baseline at".dimmed(),
                path.display().to_string().dimmed()
            ),
        },
        BaselineAction::Reset => {
            if store.clear()? {
                println!("{} Baseline removed: {}", "✓".green(), path.display());
            } else {
                println!("  {}", "No baseline to remove".dimmed());
            }
        }
    }

    Ok(0)
}

fn cmd_steps(config: &Config, base_dir: &Path) -> Result<i32> {
    let settings = config.settings(base_dir);

    println!("\n{}", "Steps:".bold());

    if settings.steps.is_empty() {
        println!("  {}", "No build steps defined".dimmed());
    }

    for step in settings.steps.iter().chain(std::iter::once(&settings.coverage_step)) {
        println!("  {} {}", "•".green(), step.name.cyan());
        println!("    {} {}", "cmd:".dimmed(), step.cmd);

        if let Some(ref cwd) = step.cwd {
            println!("    {} {}", "cwd:".dimmed(), cwd);
        }
    }

    println!();
    println!("{}", "Gate:".bold());
    println!("    {} {}%", "min coverage:".dimmed(), settings.min_coverage);
    println!("    {} {} pts", "max drop:".dimmed(), settings.max_drop);
    println!(
        "    {} {} ({})",
        "report:".dimmed(),
        settings.report_path.display(),
        settings.format
    );
    println!("    {} {}", "baseline:".dimmed(), settings.baseline_path.display());

    Ok(0)
}

fn print_banner(settings: &GateSettings) {
    println!("{}", "━".repeat(50).dimmed());
    println!(
        "  {} {}",
        "Coverage Gate".bold().cyan(),
        format!("min {}%, max drop {} pts", settings.min_coverage, settings.max_drop).dimmed()
    );
    println!("{}", "━".repeat(50).dimmed());
}
