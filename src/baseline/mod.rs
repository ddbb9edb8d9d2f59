//! Baselines of known incidents
//!
//! A baseline records the incidents of a run so later runs only report what
//! is new. Incidents are matched by issue id, file and message; the line may
//! drift a little as surrounding code changes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::SystemTime;
use thiserror::Error;

use crate::lint::Incident;

#[derive(Error, Debug)]
pub enum BaselineError {
    #[error("Failed to read baseline file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse baseline: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Baseline version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

const BASELINE_VERSION: u32 = 1;

/// Lines an incident may move before it no longer matches its baseline entry
const LINE_TOLERANCE: usize = 10;

/// Identity of an incident across runs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncidentFingerprint {
    pub id: String,
    pub file: String,
    pub message: String,

    /// 1-based line, 0 when the incident has no position
    pub line: usize,
}

impl IncidentFingerprint {
    pub fn from_incident(incident: &Incident) -> Self {
        Self {
            id: incident.issue.id.to_string(),
            file: incident.location.display_path(),
            message: incident.message.clone(),
            line: incident.location.line(),
        }
    }

    pub fn matches(&self, incident: &Incident) -> bool {
        if self.id != incident.issue.id
            || self.message != incident.message
            || self.file != incident.location.display_path()
        {
            return false;
        }
        match (self.line, incident.location.line()) {
            (0, _) | (_, 0) => true,
            (recorded, current) => recorded.abs_diff(current) <= LINE_TOLERANCE,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Baseline {
    pub version: u32,

    /// Seconds since the Unix epoch
    pub created_at: u64,

    pub incidents: Vec<IncidentFingerprint>,
}

impl Baseline {
    pub fn from_incidents(incidents: &[Incident]) -> Self {
        let created_at = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            version: BASELINE_VERSION,
            created_at,
            incidents: incidents.iter().map(IncidentFingerprint::from_incident).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, BaselineError> {
        let reader = BufReader::new(fs::File::open(path)?);
        let baseline: Self = serde_json::from_reader(reader)?;
        if baseline.version != BASELINE_VERSION {
            return Err(BaselineError::VersionMismatch {
                expected: BASELINE_VERSION,
                found: baseline.version,
            });
        }
        Ok(baseline)
    }

    pub fn save(&self, path: &Path) -> Result<(), BaselineError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(fs::File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn contains(&self, incident: &Incident) -> bool {
        self.incidents.iter().any(|fp| fp.matches(incident))
    }

    /// Incidents not covered by the baseline
    pub fn filter_new(&self, incidents: Vec<Incident>) -> Vec<Incident> {
        incidents.into_iter().filter(|i| !self.contains(i)).collect()
    }

    pub fn stats(&self, incidents: &[Incident]) -> BaselineStats {
        let baselined = incidents.iter().filter(|i| self.contains(i)).count();
        BaselineStats {
            total_in_baseline: self.incidents.len(),
            baselined_found: baselined,
            new_incidents: incidents.len() - baselined,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BaselineStats {
    pub total_in_baseline: usize,

    /// Current incidents matched by the baseline
    pub baselined_found: usize,

    pub new_incidents: usize,
}

impl std::fmt::Display for BaselineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} new incidents ({} baselined, {} in baseline file)",
            self.new_incidents, self.baselined_found, self.total_in_baseline
        )
    }
}
