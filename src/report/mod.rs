mod fix_diff;
mod json;
mod sarif;
mod text;

pub use fix_diff::{line_diff, FixDiffRenderer};
pub use json::JsonReporter;
pub use sarif::SarifReporter;
pub use text::TextReporter;

use crate::lint::Incident;
use crate::project::Project;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Sarif,
}

impl ReportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "terminal" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "sarif" => Some(ReportFormat::Sarif),
            _ => None,
        }
    }
}

/// Writes lint results to stdout or a file
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
    incremental: bool,
    show_fixes: bool,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            output_path,
            incremental: false,
            show_fixes: false,
        }
    }

    pub fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    pub fn with_fixes(mut self, show_fixes: bool) -> Self {
        self.show_fixes = show_fixes;
        self
    }

    /// Render the report without writing it anywhere
    pub fn render(&self, project: &Project, incidents: &[Incident], color: bool) -> Result<String> {
        let mut rendered = match self.format {
            ReportFormat::Text => TextReporter::new()
                .with_color(color)
                .with_incremental(self.incremental)
                .render(project, incidents),
            ReportFormat::Json => JsonReporter::new().render(incidents).into_diagnostic()?,
            ReportFormat::Sarif => SarifReporter::new().render(incidents).into_diagnostic()?,
        };

        if self.show_fixes && self.format == ReportFormat::Text {
            let diffs = FixDiffRenderer::new().render(project, incidents);
            if !diffs.is_empty() {
                if !rendered.ends_with('\n') {
                    rendered.push('\n');
                }
                rendered.push('\n');
                rendered.push_str(&diffs);
            }
        }
        Ok(rendered)
    }

    pub fn report(&self, project: &Project, incidents: &[Incident]) -> Result<()> {
        match &self.output_path {
            Some(path) => {
                let rendered = self.render(project, incidents, false)?;
                std::fs::write(path, ensure_newline(rendered)).into_diagnostic()?;
                println!("Report written to: {}", path.display());
            }
            None => {
                let color = console::colors_enabled();
                let rendered = self.render(project, incidents, color)?;
                print!("{}", ensure_newline(rendered));
            }
        }
        Ok(())
    }
}

fn ensure_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_parse_format() {
        assert_eq!(ReportFormat::parse("SARIF"), Some(ReportFormat::Sarif));
        assert_eq!(ReportFormat::parse("terminal"), Some(ReportFormat::Text));
        assert_eq!(ReportFormat::parse("xml"), None);
    }

    #[test]
    fn test_report_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");
        let project = Project::new(dir.path(), vec![], Config::default());
        Reporter::new(ReportFormat::Json, Some(output.clone()))
            .report(&project, &[])
            .unwrap();
        let written = std::fs::read_to_string(output).unwrap();
        assert!(written.contains("\"total_issues\": 0"));
    }
}
