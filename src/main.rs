//! quality-gate - deterministic CI quality gate with optional AI insights

use anyhow::Result;
use clap::Parser;
use quality_gate::config::Config;
use quality_gate::insight::{InsightGenerator, OpenAiClient, ProviderSettings};
use quality_gate::model::percentage;
use quality_gate::pipeline::{self, RunOutcome};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exit code used by `--enforce` when the gate fails
const GATE_FAILED_EXIT_CODE: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "quality-gate",
    about = "Deterministic CI quality gate for test and coverage reports",
    long_about = "Reads a JUnit test report and a Cobertura coverage report,\n\
                  applies fixed pass/fail rules, and writes markdown and JSON\n\
                  reports. An optional AI narrative explains the result but\n\
                  never changes it.",
    version
)]
struct Args {
    /// Directory holding the input artifacts and receiving the reports
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,

    /// JUnit XML report (defaults to <artifacts-dir>/junit.xml)
    #[arg(long)]
    junit: Option<PathBuf>,

    /// Coverage XML report (defaults to <artifacts-dir>/coverage.xml)
    #[arg(long)]
    coverage: Option<PathBuf>,

    /// Minimum line coverage percentage (default: 80.0)
    #[arg(long)]
    threshold: Option<f64>,

    /// TOML config file (defaults to ./quality-gate.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the AI insight step
    #[arg(long)]
    no_insight: bool,

    /// Seconds to wait for the AI provider (default: 60)
    #[arg(long)]
    insight_timeout: Option<u64>,

    /// Exit with status 2 when the gate fails
    #[arg(long)]
    enforce: bool,

    /// Do not echo the reports to stdout
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(dir) = &self.artifacts_dir {
            config.artifacts_dir = dir.clone();
        }
        if let Some(junit) = &self.junit {
            config.junit_path = Some(junit.clone());
        }
        if let Some(coverage) = &self.coverage {
            config.coverage_path = Some(coverage.clone());
        }
        if let Some(threshold) = self.threshold {
            config.coverage_threshold = percentage("threshold", threshold)?;
        }
        if let Some(secs) = self.insight_timeout {
            config.insight_timeout_secs = secs;
        }
        if self.no_insight {
            config.insight = false;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config)?;

    let generator = if config.insight {
        let settings = ProviderSettings::from_env();
        info!(
            provider = settings.kind.label(),
            endpoint = %settings.endpoint,
            model = %settings.model,
            "AI insight provider selected"
        );
        match InsightGenerator::from_settings(&settings) {
            Ok(generator) => Some(generator),
            Err(err) => {
                eprintln!("AI insight generation failed [{}]: {}", err.kind(), err);
                None
            }
        }
    } else {
        None
    };

    let outcome = pipeline::run::<OpenAiClient>(&config, generator.as_ref()).await?;

    if let Some(err) = &outcome.insight_error {
        eprintln!("AI insight generation failed [{}]: {}", err.kind(), err);
    }

    if !args.quiet {
        print_outcome(&outcome)?;
    }

    Ok(ExitCode::from(exit_status(args.enforce, outcome.output.passed())))
}

/// Only `--enforce` lets a failing gate change the exit status.
fn exit_status(enforce: bool, passed: bool) -> u8 {
    if enforce && !passed {
        GATE_FAILED_EXIT_CODE
    } else {
        0
    }
}

fn print_outcome(outcome: &RunOutcome) -> Result<()> {
    if let Some(insight) = &outcome.insight {
        println!("\nAI INSIGHT:\n");
        println!("{}", serde_json::to_string_pretty(insight)?);
    }

    println!("\nJSON OUTPUT:\n");
    println!("{}", outcome.json);

    println!("\nMARKDOWN REPORT:\n");
    println!("{}", outcome.markdown);

    let saved_to = outcome
        .json_path
        .parent()
        .map(|dir| dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf()))
        .unwrap_or_default();
    println!("\nReports saved to {}", saved_to.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("quality-gate").chain(argv.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gate.toml");
        fs::write(
            &path,
            "artifacts_dir = \"from-file\"\ncoverage_threshold = 70.0\ninsight_timeout_secs = 5\n",
        )
        .unwrap();
        let mut config = Config::load(Some(path.as_path())).unwrap();

        let args = parse(&[
            "--artifacts-dir",
            "from-cli",
            "--junit",
            "reports/tests.xml",
            "--threshold",
            "92.5",
            "--insight-timeout",
            "30",
            "--no-insight",
        ]);
        args.apply(&mut config).unwrap();

        assert_eq!(config.artifacts_dir, PathBuf::from("from-cli"));
        assert_eq!(config.junit_path(), PathBuf::from("reports/tests.xml"));
        assert_eq!(config.coverage_path(), PathBuf::from("from-cli/coverage.xml"));
        assert_eq!(config.coverage_threshold, 92.5);
        assert_eq!(config.insight_timeout_secs, 30);
        assert!(!config.insight);
    }

    #[test]
    fn test_absent_flags_keep_file_values() {
        let mut config = Config {
            coverage_threshold: 70.0,
            insight_timeout_secs: 5,
            ..Config::default()
        };
        parse(&[]).apply(&mut config).unwrap();
        assert_eq!(config.coverage_threshold, 70.0);
        assert_eq!(config.insight_timeout_secs, 5);
        assert!(config.insight);
    }

    #[test]
    fn test_threshold_out_of_range_is_rejected() {
        let mut config = Config::default();
        assert!(parse(&["--threshold", "120"]).apply(&mut config).is_err());
        assert!(parse(&["--threshold=-1"]).apply(&mut config).is_err());
        assert_eq!(config.coverage_threshold, Config::default().coverage_threshold);
    }

    #[test]
    fn test_non_numeric_threshold_is_a_usage_error() {
        assert!(Args::try_parse_from(["quality-gate", "--threshold", "high"]).is_err());
    }

    #[test]
    fn test_exit_status_only_fails_when_enforced() {
        assert_eq!(exit_status(true, false), GATE_FAILED_EXIT_CODE);
        assert_eq!(exit_status(true, true), 0);
        assert_eq!(exit_status(false, false), 0);
        assert_eq!(exit_status(false, true), 0);
    }
}
