//! Canonical quality-gate data model
//!
//! `AnalysisInput` is what the normalizer produces, `AnalysisOutput` is the
//! decision record, and `AiInsight` is the optional narrative that rides
//! alongside it. The decision record is never built from insight data.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Coverage threshold used when no configuration overrides it.
pub const DEFAULT_COVERAGE_THRESHOLD: f64 = 80.0;

/// Test execution counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTestMetrics")]
pub struct TestMetrics {
    total: u64,
    passed: u64,
    failed: u64,
}

impl TestMetrics {
    /// Build validated counts. Every count must be non-negative and
    /// `passed + failed` must equal `total`.
    pub fn new(total: i64, passed: i64, failed: i64) -> Result<Self, ValidationError> {
        let total = non_negative("total", total)?;
        let passed = non_negative("passed", passed)?;
        let failed = non_negative("failed", failed)?;

        if passed.checked_add(failed) != Some(total) {
            return Err(ValidationError::InconsistentCounts {
                total,
                passed,
                failed,
            });
        }

        Ok(Self {
            total,
            passed,
            failed,
        })
    }

    pub fn empty() -> Self {
        Self {
            total: 0,
            passed: 0,
            failed: 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn passed(&self) -> u64 {
        self.passed
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }
}

#[derive(Deserialize)]
struct RawTestMetrics {
    total: i64,
    passed: i64,
    failed: i64,
}

impl TryFrom<RawTestMetrics> for TestMetrics {
    type Error = ValidationError;

    fn try_from(raw: RawTestMetrics) -> Result<Self, Self::Error> {
        TestMetrics::new(raw.total, raw.passed, raw.failed)
    }
}

fn non_negative(field: &'static str, value: i64) -> Result<u64, ValidationError> {
    u64::try_from(value).map_err(|_| ValidationError::NegativeCount { field, value })
}

/// Measured line coverage paired with the policy threshold, both percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoverageMetrics")]
pub struct CoverageMetrics {
    percent: f64,
    threshold: f64,
}

impl CoverageMetrics {
    pub fn new(percent: f64, threshold: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            percent: percentage("percent", percent)?,
            threshold: percentage("threshold", threshold)?,
        })
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

#[derive(Deserialize)]
struct RawCoverageMetrics {
    percent: f64,
    threshold: f64,
}

impl TryFrom<RawCoverageMetrics> for CoverageMetrics {
    type Error = ValidationError;

    fn try_from(raw: RawCoverageMetrics) -> Result<Self, Self::Error> {
        CoverageMetrics::new(raw.percent, raw.threshold)
    }
}

/// Reject values outside [0, 100], including NaN and infinities.
pub fn percentage(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::PercentOutOfRange { field, value })
    }
}

/// Canonical input to the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub tests: TestMetrics,
    pub coverage: CoverageMetrics,
}

impl AnalysisInput {
    pub fn new(tests: TestMetrics, coverage: CoverageMetrics) -> Self {
        Self { tests, coverage }
    }

    /// Zero-valued input used when the report artifacts cannot be read.
    pub fn fallback(threshold: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            tests: TestMetrics::empty(),
            coverage: CoverageMetrics::new(0.0, threshold)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            Status::Pass
        } else {
            Status::Fail
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
        }
    }
}

/// Shared scale for risk levels and recommendation severities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Low,
    /// Valid in the schema but not produced by the current rules.
    Medium,
    High,
}

pub type RiskLevel = Level;
pub type Severity = Level;

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "LOW",
            Level::Medium => "MEDIUM",
            Level::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub test_status: Status,
    pub coverage_status: Status,
    pub overall_status: Status,
}

/// Flattened presentation view of `AnalysisInput`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub total_tests: u64,
    pub passed: u64,
    pub failed: u64,
    pub coverage_percent: f64,
    pub coverage_threshold: f64,
}

impl From<&AnalysisInput> for QualityMetrics {
    fn from(input: &AnalysisInput) -> Self {
        Self {
            total_tests: input.tests.total(),
            passed: input.tests.passed(),
            failed: input.tests.failed(),
            coverage_percent: input.coverage.percent(),
            coverage_threshold: input.coverage.threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub message: String,
    pub severity: Severity,
}

/// The decision record. Fields are private so nothing downstream can
/// rewrite a verdict once the engine has produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    summary: QualitySummary,
    metrics: QualityMetrics,
    risk_level: RiskLevel,
    #[serde(default)]
    recommendations: Vec<Recommendation>,
}

impl AnalysisOutput {
    pub(crate) fn new(
        summary: QualitySummary,
        metrics: QualityMetrics,
        risk_level: RiskLevel,
        recommendations: Vec<Recommendation>,
    ) -> Self {
        Self {
            summary,
            metrics,
            risk_level,
            recommendations,
        }
    }

    pub fn summary(&self) -> &QualitySummary {
        &self.summary
    }

    pub fn metrics(&self) -> &QualityMetrics {
        &self.metrics
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        &self.recommendations
    }

    pub fn passed(&self) -> bool {
        self.summary.overall_status == Status::Pass
    }
}

/// Narrative produced by the language model. Explanatory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AiInsight {
    pub executive_summary: String,
    pub risk_explanation: String,
    pub improvement_suggestions: Vec<String>,
}
