//! Applying quick fixes to files on disk

mod editor;

pub use editor::{apply_edits, FileEditor, FixError};

use crate::lint::{Incident, TextEdit};
use crate::project::Project;
use crate::report::FixDiffRenderer;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Select};
use miette::{IntoDiagnostic, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Applies the fixes attached to incidents, optionally asking first
pub struct FixApplier {
    interactive: bool,
    dry_run: bool,
}

impl FixApplier {
    pub fn new(interactive: bool, dry_run: bool) -> Self {
        Self { interactive, dry_run }
    }

    /// Apply fixes and return how many were applied (or would be, in a dry run)
    pub fn apply(&self, project: &Project, incidents: &[Incident]) -> Result<usize> {
        let fixable: Vec<&Incident> = incidents.iter().filter(|i| i.fix.is_some()).collect();
        if fixable.is_empty() {
            println!("{}", "No fixes available.".green());
            return Ok(0);
        }

        if self.dry_run {
            println!("{}", "Dry run - would apply:".yellow().bold());
            print!("{}", FixDiffRenderer::new().render(project, incidents));
            return Ok(fixable.len());
        }

        let mut by_file: BTreeMap<PathBuf, Vec<&TextEdit>> = BTreeMap::new();
        let mut applied = 0;
        for incident in fixable {
            let Some(edits) = self.choose(incident)? else {
                continue;
            };
            for edit in edits {
                by_file.entry(edit.file.clone()).or_default().push(edit);
            }
            applied += 1;
        }

        let editor = FileEditor::new(project.root());
        for (file, edits) in by_file {
            let edits = drop_overlapping(edits);
            debug!("Applying {} edits to {}", edits.len(), file.display());
            match editor.apply(&file, &edits) {
                Ok(()) => println!("  {} {}", "✓".green(), file.display()),
                Err(e) => println!("  {} {}", "✗".red(), e),
            }
        }

        Ok(applied)
    }

    /// Pick the edits to apply for one incident, `None` to skip it
    fn choose<'a>(&self, incident: &'a Incident) -> Result<Option<&'a [TextEdit]>> {
        let Some(fix) = &incident.fix else {
            return Ok(None);
        };
        let options = fix.options();

        if !self.interactive {
            return Ok(options.first().map(|(_, edits)| *edits));
        }

        let mut items: Vec<String> = options.iter().map(|(name, _)| name.to_string()).collect();
        items.push("Skip".to_string());
        let prompt = format!(
            "{}:{}: {}",
            incident.location.display_path(),
            incident.location.line(),
            incident.message
        );
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(&items)
            .default(0)
            .interact()
            .into_diagnostic()?;

        Ok(options.get(selection).map(|(_, edits)| *edits))
    }
}

/// Keep edits that do not overlap an earlier one
fn drop_overlapping(mut edits: Vec<&TextEdit>) -> Vec<&TextEdit> {
    edits.sort_by_key(|e| (e.range.start, e.range.end));
    let mut kept: Vec<&TextEdit> = Vec::new();
    for edit in edits {
        match kept.last() {
            Some(last) if edit.range.start < last.range.end || (edit.range == last.range && edit.range.is_empty()) => {
                warn!("Skipping overlapping fix in {}", edit.file.display());
            }
            _ => kept.push(edit),
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_drop_overlapping() {
        let path = Path::new("a.xml");
        let a = TextEdit::new(path, 0..4, "x");
        let b = TextEdit::new(path, 2..6, "y");
        let c = TextEdit::new(path, 6..8, "z");
        let kept = drop_overlapping(vec![&c, &b, &a]);
        assert_eq!(kept, vec![&a, &c]);
    }
}
