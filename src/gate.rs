//! Deterministic quality-gate rules
//!
//! `decide` is pure: same input, same record, no I/O.

use crate::model::{
    AnalysisInput, AnalysisOutput, Level, QualityMetrics, QualitySummary, Recommendation, Status,
};

pub const FAILING_GATE_MESSAGE: &str = "Resolve failing tests before deployment.";

pub fn decide(input: &AnalysisInput) -> AnalysisOutput {
    let test_status = Status::from_passed(input.tests.failed() == 0);
    let coverage_status =
        Status::from_passed(input.coverage.percent() >= input.coverage.threshold());
    let overall_status =
        Status::from_passed(test_status == Status::Pass && coverage_status == Status::Pass);

    // One fixed recommendation whatever caused the failure.
    let (risk_level, recommendations) = match overall_status {
        Status::Pass => (Level::Low, Vec::new()),
        Status::Fail => (
            Level::High,
            vec![Recommendation {
                message: FAILING_GATE_MESSAGE.to_string(),
                severity: Level::High,
            }],
        ),
    };

    AnalysisOutput::new(
        QualitySummary {
            test_status,
            coverage_status,
            overall_status,
        },
        QualityMetrics::from(input),
        risk_level,
        recommendations,
    )
}
