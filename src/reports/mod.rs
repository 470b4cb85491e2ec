pub mod renderer;

pub use renderer::render_merged_document;

use crate::types::PipelineReport;
use anyhow::Result;

/// Serializes a pipeline report for output. The markdown body is the
/// report itself; json and text wrap it with run metadata.
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn supports(format: &str) -> bool {
        matches!(format.to_lowercase().as_str(), "markdown" | "json" | "text")
    }

    pub fn generate(&self, report: &PipelineReport, format: &str) -> Result<String> {
        match format.to_lowercase().as_str() {
            "markdown" => Ok(report.markdown.clone()),
            "json" => Ok(serde_json::to_string_pretty(report)?),
            "text" => Ok(self.generate_text(report)),
            _ => Err(anyhow::anyhow!("Unsupported format: {}", format)),
        }
    }

    fn generate_text(&self, report: &PipelineReport) -> String {
        format!(
            "PR Review Report {}\nModel: {}\nGenerated at: {}\n\n{}\n",
            report.id,
            report.model,
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.markdown
        )
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}
