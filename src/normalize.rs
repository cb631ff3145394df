//! Report normalization
//!
//! Turns JUnit-style test reports and Cobertura-style coverage reports into
//! the canonical `AnalysisInput`. Parse failures are surfaced to the caller;
//! choosing a fallback is the orchestrator's job.

use crate::error::{ArtifactParseError, NormalizeError, ValidationError};
use crate::model::{AnalysisInput, CoverageMetrics, TestMetrics};
use roxmltree::{Document, Node};
use std::fs;
use std::path::Path;

const SUITE_TAG: &str = "testsuite";
const CONTAINER_TAG: &str = "testsuites";

/// Raw counts as they appear in the report, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SuiteCounts {
    pub tests: i64,
    pub failures: i64,
    pub errors: i64,
}

impl SuiteCounts {
    pub fn failed(&self) -> i64 {
        self.failures.saturating_add(self.errors)
    }

    /// Not clamped: `errors > tests` yields a negative pass count that
    /// validation rejects.
    pub fn passed(&self) -> i64 {
        self.tests.saturating_sub(self.failed())
    }

    pub fn into_metrics(self) -> Result<TestMetrics, ValidationError> {
        TestMetrics::new(self.tests, self.passed(), self.failed())
    }
}

/// Read both artifacts and build the canonical input.
pub fn build_input(
    test_report_path: &Path,
    coverage_report_path: &Path,
    threshold: f64,
) -> Result<AnalysisInput, NormalizeError> {
    let test_xml = read_artifact(test_report_path)?;
    let coverage_xml = read_artifact(coverage_report_path)?;

    let counts = parse_test_report(&test_xml, &test_report_path.display().to_string())?;
    let percent =
        parse_coverage_report(&coverage_xml, &coverage_report_path.display().to_string())?;

    Ok(AnalysisInput::new(
        counts.into_metrics()?,
        CoverageMetrics::new(percent, threshold)?,
    ))
}

fn read_artifact(path: &Path) -> Result<String, ArtifactParseError> {
    fs::read_to_string(path).map_err(|source| ArtifactParseError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Extract suite counts from a test report. A `testsuites` container uses
/// its first `testsuite` child; a container without one counts as empty.
pub fn parse_test_report(xml: &str, origin: &str) -> Result<SuiteCounts, ArtifactParseError> {
    let doc = parse_document(xml, origin)?;
    let root = doc.root_element();

    let suite = if root.has_tag_name(CONTAINER_TAG) {
        match root
            .children()
            .find(|node| node.is_element() && node.has_tag_name(SUITE_TAG))
        {
            Some(suite) => suite,
            None => return Ok(SuiteCounts::default()),
        }
    } else {
        root
    };

    Ok(SuiteCounts {
        tests: int_attribute(suite, "tests", origin)?,
        failures: int_attribute(suite, "failures", origin)?,
        errors: int_attribute(suite, "errors", origin)?,
    })
}

/// Extract line coverage as a percentage rounded to two decimals.
pub fn parse_coverage_report(xml: &str, origin: &str) -> Result<f64, ArtifactParseError> {
    let doc = parse_document(xml, origin)?;
    let line_rate = float_attribute(doc.root_element(), "line-rate", origin)?;
    Ok(round2(line_rate * 100.0))
}

fn parse_document<'a>(xml: &'a str, origin: &str) -> Result<Document<'a>, ArtifactParseError> {
    Document::parse(xml).map_err(|source| ArtifactParseError::Xml {
        origin: origin.to_string(),
        source,
    })
}

fn int_attribute(
    node: Node<'_, '_>,
    attribute: &'static str,
    origin: &str,
) -> Result<i64, ArtifactParseError> {
    match node.attribute(attribute) {
        None => Ok(0),
        Some(raw) => raw.trim().parse().map_err(|_| ArtifactParseError::Attribute {
            origin: origin.to_string(),
            attribute,
            value: raw.to_string(),
        }),
    }
}

fn float_attribute(
    node: Node<'_, '_>,
    attribute: &'static str,
    origin: &str,
) -> Result<f64, ArtifactParseError> {
    match node.attribute(attribute) {
        None => Ok(0.0),
        Some(raw) => raw.trim().parse().map_err(|_| ArtifactParseError::Attribute {
            origin: origin.to_string(),
            attribute,
            value: raw.to_string(),
        }),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
