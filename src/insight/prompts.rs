use crate::model::AnalysisOutput;

pub const INSIGHT_SYSTEM: &str = "You are a precise and structured software quality analyst.";

const INSIGHT_INSTRUCTIONS: &str = r#"You are a strict software quality analyst.

You must analyze the structured CI result below.
You are NOT allowed to change pass/fail decisions, the risk level, or the recommendations.
Explain the result; do not re-judge it.

Return JSON only, with exactly these three keys and nothing else:

{
  "executive_summary": string,
  "risk_explanation": string,
  "improvement_suggestions": [string]
}

Do not include markdown.
Do not include explanations outside JSON.
Keep every string on a single line."#;

/// User prompt: fixed instructions followed by the decision record.
pub fn insight_user_prompt(output: &AnalysisOutput) -> serde_json::Result<String> {
    let record = serde_json::to_string_pretty(output)?;
    Ok(format!("{}\n\nCI RESULT:\n{}\n", INSIGHT_INSTRUCTIONS, record))
}
