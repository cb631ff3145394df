//! Report rendering
//!
//! Markdown for humans, JSON for machines. The insight is only ever attached
//! next to the decision record, never folded into it.

use crate::model::{AiInsight, AnalysisOutput};
use serde::Serialize;

/// JSON key carrying the insight in the structured record.
pub const INSIGHT_KEY: &str = "ai_insights";

#[derive(Serialize)]
struct ReportRecord<'a> {
    #[serde(flatten)]
    output: &'a AnalysisOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    ai_insights: Option<&'a AiInsight>,
}

pub fn render_json(
    output: &AnalysisOutput,
    insight: Option<&AiInsight>,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ReportRecord {
        output,
        ai_insights: insight,
    })
}

pub fn render_markdown(output: &AnalysisOutput, insight: Option<&AiInsight>) -> String {
    let summary = output.summary();
    let metrics = output.metrics();
    let mut lines: Vec<String> = Vec::new();

    lines.push("# Quality Gate Report".to_string());
    lines.push(String::new());

    lines.push("## Summary".to_string());
    lines.push(format!("- Test Status: **{}**", summary.test_status.as_str()));
    lines.push(format!("- Coverage Status: **{}**", summary.coverage_status.as_str()));
    lines.push(format!("- Overall Status: **{}**", summary.overall_status.as_str()));
    lines.push(format!("- Risk Level: **{}**", output.risk_level().as_str()));
    lines.push(String::new());

    lines.push("## Metrics".to_string());
    lines.push(format!("- Total Tests: {}", metrics.total_tests));
    lines.push(format!("- Passed: {}", metrics.passed));
    lines.push(format!("- Failed: {}", metrics.failed));
    lines.push(format!(
        "- Coverage: {}% (Threshold: {}%)",
        format_percent(metrics.coverage_percent),
        format_percent(metrics.coverage_threshold)
    ));
    lines.push(String::new());

    if !output.recommendations().is_empty() {
        lines.push("## Recommendations".to_string());
        for rec in output.recommendations() {
            lines.push(format!("- [{}] {}", rec.severity.as_str(), rec.message));
        }
        lines.push(String::new());
    }

    if let Some(insight) = insight {
        lines.push("## AI Insights".to_string());
        lines.push(String::new());
        lines.push("### Executive Summary".to_string());
        lines.push(insight.executive_summary.trim().to_string());
        lines.push(String::new());
        lines.push("### Risk Explanation".to_string());
        lines.push(insight.risk_explanation.trim().to_string());
        lines.push(String::new());

        if !insight.improvement_suggestions.is_empty() {
            lines.push("### Improvement Suggestions".to_string());
            for suggestion in &insight.improvement_suggestions {
                lines.push(format!("- {}", suggestion.trim()));
            }
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

/// Whole numbers keep one decimal place (`80.0`), others print as-is.
fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::decide;
    use crate::model::{AnalysisInput, CoverageMetrics, TestMetrics};

    fn output(total: i64, passed: i64, failed: i64, percent: f64) -> AnalysisOutput {
        decide(&AnalysisInput::new(
            TestMetrics::new(total, passed, failed).unwrap(),
            CoverageMetrics::new(percent, 80.0).unwrap(),
        ))
    }

    fn insight(suggestions: &[&str]) -> AiInsight {
        AiInsight {
            executive_summary: "One test is failing.".to_string(),
            risk_explanation: "Shipping with a failing test is risky.".to_string(),
            improvement_suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_markdown_for_failing_gate() {
        let report = render_markdown(&output(4, 3, 1, 96.3), None);
        let expected = "# Quality Gate Report

## Summary
- Test Status: **FAIL**
- Coverage Status: **PASS**
- Overall Status: **FAIL**
- Risk Level: **HIGH**

## Metrics
- Total Tests: 4
- Passed: 3
- Failed: 1
- Coverage: 96.3% (Threshold: 80.0%)

## Recommendations
- [HIGH] Resolve failing tests before deployment.
";
        assert_eq!(report, expected);
    }

    #[test]
    fn test_markdown_omits_empty_recommendations() {
        let report = render_markdown(&output(10, 10, 0, 85.0), None);
        assert!(report.contains("- Coverage: 85.0% (Threshold: 80.0%)"));
        assert!(!report.contains("## Recommendations"));
        assert!(!report.contains("## AI Insights"));
    }

    #[test]
    fn test_markdown_with_insight() {
        let report = render_markdown(&output(4, 3, 1, 96.3), Some(&insight(&["Fix test_login"])));
        let insights_at = report.find("## AI Insights").unwrap();
        assert!(report.find("## Recommendations").unwrap() < insights_at);
        assert!(report.contains("### Executive Summary\nOne test is failing."));
        assert!(report.contains("### Risk Explanation\nShipping with a failing test is risky."));
        assert!(report.contains("### Improvement Suggestions\n- Fix test_login\n"));
    }

    #[test]
    fn test_markdown_omits_empty_suggestions() {
        let report = render_markdown(&output(4, 3, 1, 96.3), Some(&insight(&[])));
        assert!(report.contains("## AI Insights"));
        assert!(!report.contains("### Improvement Suggestions"));
    }

    #[test]
    fn test_json_round_trip() {
        let record = output(10, 10, 0, 79.99);
        let json = render_json(&record, None).unwrap();
        let parsed: AnalysisOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get(INSIGHT_KEY).is_none());
        assert_eq!(value["summary"]["coverage_status"], "FAIL");
        assert_eq!(value["risk_level"], "HIGH");
    }

    #[test]
    fn test_json_keeps_insight_as_sibling() {
        let record = output(4, 3, 1, 96.3);
        let json = render_json(&record, Some(&insight(&["a", "b"]))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[INSIGHT_KEY]["improvement_suggestions"][1], "b");
        assert!(value["summary"].get("executive_summary").is_none());

        let parsed: AnalysisOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(80.0), "80.0");
        assert_eq!(format_percent(96.3), "96.3");
        assert_eq!(format_percent(79.99), "79.99");
        assert_eq!(format_percent(0.0), "0.0");
    }
}
