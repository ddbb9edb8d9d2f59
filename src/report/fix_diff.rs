use crate::fix::apply_edits;
use crate::lint::{Incident, TextEdit};
use crate::project::Project;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;
use tracing::debug;

/// Renders the quick fixes of incidents as small line diffs
pub struct FixDiffRenderer {
    /// Unchanged lines shown around each change
    window: usize,
}

impl FixDiffRenderer {
    pub fn new() -> Self {
        Self { window: 0 }
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn render(&self, project: &Project, incidents: &[Incident]) -> String {
        let mut out = String::new();
        for incident in incidents {
            let Some(fix) = &incident.fix else {
                continue;
            };
            for (name, edits) in fix.options() {
                let _ = writeln!(
                    out,
                    "Fix for {} line {}: {}:",
                    incident.location.display_path(),
                    incident.location.line(),
                    name
                );
                self.render_edits(&mut out, project, &incident.location.file, edits);
            }
        }
        out
    }

    fn render_edits(&self, out: &mut String, project: &Project, primary: &Path, edits: &[TextEdit]) {
        let mut by_file: BTreeMap<&Path, Vec<&TextEdit>> = BTreeMap::new();
        for edit in edits {
            by_file.entry(edit.file.as_path()).or_default().push(edit);
        }

        for (path, edits) in by_file {
            let Some(file) = project.file(path) else {
                debug!("Fix refers to unknown file {}", path.display());
                continue;
            };
            let updated = match apply_edits(path, &file.contents, &edits) {
                Ok(updated) => updated,
                Err(e) => {
                    debug!("Cannot render fix: {}", e);
                    continue;
                }
            };
            if path != primary {
                let _ = writeln!(out, "{}:", crate::lint::display_path(path));
            }
            out.push_str(&line_diff(&file.contents, &updated, self.window));
        }
    }
}

impl Default for FixDiffRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Diff of the changed block between two texts
///
/// The common leading and trailing lines are stripped; what remains is shown
/// as removed and added lines, with up to `window` unchanged lines of context
/// on each side. Line numbers are 1-based and refer to the first printed line.
pub fn line_diff(before: &str, after: &str, window: usize) -> String {
    let old: Vec<&str> = before.lines().collect();
    let new: Vec<&str> = after.lines().collect();

    let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
    if prefix == old.len() && prefix == new.len() {
        return String::new();
    }
    let max_suffix = old.len().min(new.len()) - prefix;
    let suffix = old
        .iter()
        .rev()
        .zip(new.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let context_start = prefix.saturating_sub(window);
    let context_end = (old.len() - suffix + window).min(old.len());
    let new_start = context_start;

    let mut out = String::new();
    let _ = writeln!(out, "@@ -{} +{}", context_start + 1, new_start + 1);
    for line in &old[context_start..prefix] {
        let _ = writeln!(out, "  {}", line);
    }
    for line in &old[prefix..old.len() - suffix] {
        let _ = writeln!(out, "- {}", line);
    }
    for line in &new[prefix..new.len() - suffix] {
        let _ = writeln!(out, "+ {}", line);
    }
    for line in &old[old.len() - suffix..context_end] {
        let _ = writeln!(out, "  {}", line);
    }
    out
}
