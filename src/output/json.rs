use crate::error::Result;
use crate::EvaluationReport;

/// Render an evaluation report as pretty JSON.
pub fn render(report: &EvaluationReport) -> Result<String> {
    let json = serde_json::to_string_pretty(report)?;
    Ok(json)
}

/// Render several reports as one JSON array.
pub fn render_all(reports: &[EvaluationReport]) -> Result<String> {
    let json = serde_json::to_string_pretty(reports)?;
    Ok(json)
}
