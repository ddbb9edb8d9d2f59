use crate::lint::{Incident, Severity};
use serde::Serialize;

/// JSON reporter for programmatic output
pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, incidents: &[Incident]) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&JsonReport::from_incidents(incidents))
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonReport {
    version: &'static str,
    total_issues: usize,
    issues: Vec<JsonIssue>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonIssue {
    id: &'static str,
    severity: &'static str,
    category: &'static str,
    priority: u8,
    message: String,
    file: String,
    line: usize,
    column: usize,
    related: Vec<JsonRelated>,
    fixes: Vec<String>,
}

#[derive(Serialize)]
struct JsonRelated {
    file: String,
    line: usize,
    message: Option<String>,
}

#[derive(Serialize)]
struct JsonSummary {
    errors: usize,
    warnings: usize,
    infos: usize,
}

impl JsonReport {
    fn from_incidents(incidents: &[Incident]) -> Self {
        let mut errors = 0;
        let mut warnings = 0;
        let mut infos = 0;

        let issues = incidents
            .iter()
            .map(|incident| {
                match incident.severity {
                    Severity::Error | Severity::Fatal => errors += 1,
                    Severity::Warning => warnings += 1,
                    Severity::Informational => infos += 1,
                }

                JsonIssue {
                    id: incident.issue.id,
                    severity: incident.severity.as_str(),
                    category: incident.issue.category.as_str(),
                    priority: incident.issue.priority,
                    message: incident.message.clone(),
                    file: incident.location.display_path(),
                    line: incident.location.line(),
                    column: incident.location.column() + 1,
                    related: incident
                        .location
                        .related()
                        .map(|r| JsonRelated {
                            file: r.display_path(),
                            line: r.line(),
                            message: r.message.clone(),
                        })
                        .collect(),
                    fixes: incident
                        .fix
                        .as_ref()
                        .map(|f| f.options().into_iter().map(|(name, _)| name.to_string()).collect())
                        .unwrap_or_default(),
                }
            })
            .collect();

        Self {
            version: "1.0",
            total_issues: incidents.len(),
            issues,
            summary: JsonSummary { errors, warnings, infos },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::{Category, Issue, Location};
    use std::path::Path;

    static SAMPLE: Issue = Issue {
        id: "Sample",
        brief: "Sample issue",
        explanation: "",
        category: Category::Messages,
        priority: 9,
        severity: Severity::Fatal,
    };

    #[test]
    fn test_json_summary_counts_fatal_as_error() {
        let incident = Incident::new(&SAMPLE, Location::file_only(Path::new("AndroidManifest.xml")), "Broken");
        let json = JsonReporter::new().render(&[incident]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_issues"], 1);
        assert_eq!(value["summary"]["errors"], 1);
        assert_eq!(value["issues"][0]["id"], "Sample");
        assert_eq!(value["issues"][0]["category"], "Correctness:Messages");
        assert_eq!(value["issues"][0]["severity"], "fatal");
    }
}
