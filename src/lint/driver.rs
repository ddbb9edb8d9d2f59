use super::{Incident, Issue};
use crate::detectors::{self, Detector};
use crate::project::Project;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Runs detectors over a project and post-processes their incidents
pub struct LintDriver {
    detectors: Vec<Box<dyn Detector>>,

    /// When set, only these issues are reported
    only: Option<Vec<&'static Issue>>,
}

impl LintDriver {
    pub fn new() -> Self {
        Self {
            detectors: detectors::all(),
            only: None,
        }
    }

    /// Restrict the run to the given issues
    pub fn with_issues(mut self, issues: &[&'static Issue]) -> Self {
        self.only = Some(issues.to_vec());
        self
    }

    fn is_selected(&self, issue: &Issue) -> bool {
        match &self.only {
            Some(only) => only.iter().any(|i| i.id == issue.id),
            None => true,
        }
    }

    /// Run all applicable detectors
    ///
    /// Incidents are filtered and re-graded according to the project
    /// configuration and returned sorted by file, line, column, issue id and
    /// message.
    pub fn analyze(&self, project: &Project) -> Vec<Incident> {
        let start = Instant::now();
        let config = project.config();

        let mut incidents: Vec<Incident> = self
            .detectors
            .par_iter()
            .filter(|d| {
                d.issues()
                    .iter()
                    .any(|issue| self.is_selected(issue) && config.severity_for(issue).is_some())
            })
            .flat_map(|d| {
                let found = d.detect(project);
                debug!("{}: {} incidents", d.name(), found.len());
                found
            })
            .filter(|incident| self.is_selected(incident.issue))
            .filter_map(|incident| {
                let severity = config.severity_for(incident.issue)?;
                Some(incident.with_severity(severity))
            })
            .collect();

        incidents.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        incidents.dedup_by(|a, b| a.sort_key() == b.sort_key());

        info!("Lint finished in {:.2?}: {} incidents", start.elapsed(), incidents.len());
        incidents
    }
}

impl Default for LintDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Every issue a built-in detector can report, sorted by id
pub fn all_issues() -> Vec<&'static Issue> {
    let mut issues: Vec<&'static Issue> = detectors::all()
        .iter()
        .flat_map(|d| d.issues().iter().copied())
        .collect();
    issues.sort_by_key(|i| i.id);
    issues
}

pub fn find_issue(id: &str) -> Option<&'static Issue> {
    all_issues().into_iter().find(|i| i.id.eq_ignore_ascii_case(id))
}
