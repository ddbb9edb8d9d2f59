//! Core lint model: issues, locations, incidents and the driver that runs
//! detectors over a project.

mod driver;
mod incident;
mod issue;
mod location;

pub use driver::{all_issues, find_issue, LintDriver};
pub use incident::{Incident, LintFix, TextEdit};
pub use issue::{Category, Issue, Severity};
pub use location::{display_path, Location, Span};
