use crate::lint::{Incident, Location, Severity};
use crate::project::Project;
use colored::Colorize;
use std::fmt::Write;

/// Plain text reporter
///
/// Produces the classic lint layout: a header per incident, the offending
/// source line with a marker underneath, related locations indented by four
/// spaces, and a final error/warning count.
pub struct TextReporter {
    color: bool,
    incremental: bool,
}

impl TextReporter {
    pub fn new() -> Self {
        Self {
            color: false,
            incremental: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Related locations print as file only, as when a single file is re-checked
    pub fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    pub fn render(&self, project: &Project, incidents: &[Incident]) -> String {
        if incidents.is_empty() {
            return "No warnings.".to_string();
        }

        let mut out = String::new();
        for incident in incidents {
            self.render_incident(&mut out, project, incident);
        }

        let errors = incidents.iter().filter(|i| i.severity.is_error()).count();
        let warnings = incidents.iter().filter(|i| i.severity == Severity::Warning).count();
        let _ = writeln!(out, "{} errors, {} warnings", errors, warnings);
        out
    }

    fn render_incident(&self, out: &mut String, project: &Project, incident: &Incident) {
        let location = &incident.location;
        let position = match &location.span {
            Some(span) => format!("{}:{}", location.display_path(), span.line),
            None => location.display_path(),
        };
        let label = self.severity_label(incident.severity);
        let id = if self.color {
            format!("[{}]", incident.issue.id).dimmed().to_string()
        } else {
            format!("[{}]", incident.issue.id)
        };
        let _ = writeln!(out, "{}: {}: {} {}", position, label, incident.message, id);

        if let Some((source, marker)) = source_excerpt(project, location) {
            let _ = writeln!(out, "{}", source);
            let _ = writeln!(out, "{}", marker);
        }

        for related in location.related() {
            let message = related.message.as_deref().unwrap_or("<No location-specific message>");
            match &related.span {
                Some(span) if !self.incremental => {
                    let _ = writeln!(out, "    {}:{}: {}", related.display_path(), span.line, message);
                }
                _ => {
                    let _ = writeln!(out, "    {}: {}", related.display_path(), message);
                }
            }
        }
    }

    fn severity_label(&self, severity: Severity) -> String {
        let label = severity.label();
        if !self.color {
            return label.to_string();
        }
        match severity {
            Severity::Error | Severity::Fatal => label.red().bold().to_string(),
            Severity::Warning => label.yellow().bold().to_string(),
            Severity::Informational => label.blue().to_string(),
        }
    }
}

impl Default for TextReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// The source line of a location and the marker line underneath it
fn source_excerpt(project: &Project, location: &Location) -> Option<(String, String)> {
    let span = location.span.as_ref()?;
    let file = project.file(&location.file)?;
    let line = file.contents.lines().nth(span.line - 1)?;
    let line_length = line.chars().count();

    let width = if span.end_line == span.line {
        span.end_column.saturating_sub(span.column)
    } else {
        line_length.saturating_sub(span.column)
    };
    let marker = if width == 0 {
        "^".to_string()
    } else {
        "~".repeat(width)
    };

    Some((
        line.trim_end().to_string(),
        format!("{}{}", " ".repeat(span.column), marker),
    ))
}
