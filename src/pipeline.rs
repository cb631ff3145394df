//! End-to-end gate run
//!
//! read artifacts -> normalize -> decide -> render -> persist -> optional
//! insight -> re-render and persist with the insight attached.
//!
//! Artifact problems fall back to a zero-valued input, validation problems
//! abort before anything is written, and insight problems never affect the
//! deterministic reports.

use crate::config::Config;
use crate::error::{InsightError, NormalizeError, ValidationError};
use crate::gate::decide;
use crate::insight::{ChatProvider, InsightGenerator};
use crate::model::{AiInsight, AnalysisInput, AnalysisOutput};
use crate::normalize::build_input;
use crate::render::{render_json, render_markdown};
use crate::util::write_atomic;
use anyhow::Context;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Everything a caller needs after a run.
#[derive(Debug)]
pub struct RunOutcome {
    pub output: AnalysisOutput,
    pub insight: Option<AiInsight>,
    /// Why no insight was attached, when one was requested
    pub insight_error: Option<InsightError>,
    /// True when the artifacts could not be read and zero metrics were used
    pub used_fallback: bool,
    pub markdown: String,
    pub json: String,
    pub markdown_path: PathBuf,
    pub json_path: PathBuf,
}

/// Normalize the configured artifacts, substituting the zero-valued input
/// when they are missing or unreadable.
pub fn load_input(config: &Config) -> Result<(AnalysisInput, bool), ValidationError> {
    let junit = config.junit_path();
    let coverage = config.coverage_path();

    match build_input(&junit, &coverage, config.coverage_threshold) {
        Ok(input) => Ok((input, false)),
        Err(NormalizeError::Artifact(err)) => {
            warn!(error = %err, "failed to parse artifacts, using empty metrics");
            Ok((AnalysisInput::fallback(config.coverage_threshold)?, true))
        }
        Err(NormalizeError::Validation(err)) => Err(err),
    }
}

struct RenderedReports {
    markdown: String,
    json: String,
}

fn persist(
    config: &Config,
    output: &AnalysisOutput,
    insight: Option<&AiInsight>,
) -> anyhow::Result<RenderedReports> {
    let markdown = render_markdown(output, insight);
    let json = render_json(output, insight).context("Failed to serialize report")?;

    let markdown_path = config.markdown_report_path();
    let json_path = config.json_report_path();
    write_atomic(&markdown_path, &markdown)
        .with_context(|| format!("Failed to write {}", markdown_path.display()))?;
    write_atomic(&json_path, &json)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;

    Ok(RenderedReports { markdown, json })
}

pub async fn run<P: ChatProvider>(
    config: &Config,
    generator: Option<&InsightGenerator<P>>,
) -> anyhow::Result<RunOutcome> {
    let (input, used_fallback) = load_input(config).context("Report metrics failed validation")?;
    let output = decide(&input);
    info!(
        overall = output.summary().overall_status.as_str(),
        risk = output.risk_level().as_str(),
        fallback = used_fallback,
        "quality gate decided"
    );

    fs::create_dir_all(&config.artifacts_dir).with_context(|| {
        format!(
            "Failed to create artifacts directory {}",
            config.artifacts_dir.display()
        )
    })?;
    let mut reports = persist(config, &output, None)?;

    let mut insight = None;
    let mut insight_error = None;
    if let Some(generator) = generator {
        info!(model = generator.model(), "requesting AI insight");
        let limit = config.insight_timeout_secs;
        let result = timeout(
            Duration::from_secs(limit),
            generator.generate_insight(&output),
        )
        .await
        .unwrap_or(Err(InsightError::Timeout(limit)));

        match result {
            Ok(generated) => {
                // The base reports are already on disk; keep them if this fails.
                match persist(config, &output, Some(&generated)) {
                    Ok(with_insight) => reports = with_insight,
                    Err(err) => {
                        let detail = format!("{:#}", err);
                        warn!(
                            error = %detail,
                            "failed to write reports with AI insight, keeping base reports"
                        );
                    }
                }
                insight = Some(generated);
            }
            Err(err) => insight_error = Some(err),
        }
    }

    Ok(RunOutcome {
        output,
        insight,
        insight_error,
        used_fallback,
        markdown: reports.markdown,
        json: reports.json,
        markdown_path: config.markdown_report_path(),
        json_path: config.json_report_path(),
    })
}
