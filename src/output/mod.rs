pub mod console;
pub mod json;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::EvaluationReport;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Json,
}

impl OutputFormat {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "console" | "text" => Some(Self::Console),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Render an evaluation report into the specified format.
pub fn render(report: &EvaluationReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Console => Ok(console::render(report)),
        OutputFormat::Json => json::render(report),
    }
}

/// Render the reports of a multi-snapshot run. JSON output is a single
/// array; console output is each report in turn.
pub fn render_all(reports: &[EvaluationReport], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Console => Ok(reports.iter().map(console::render).collect()),
        OutputFormat::Json => json::render_all(reports).map(|mut json| {
            json.push('\n');
            json
        }),
    }
}
