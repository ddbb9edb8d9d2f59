//! Lint detectors
//!
//! Each detector declares the issues it can report and inspects the whole
//! [`Project`] at once. Detectors are independent and run in parallel.

mod annotations;
mod duplicate_resource;
mod manifest;
pub mod string_format;

pub use annotations::SupportAnnotationDetector;
pub use duplicate_resource::DuplicateResourceDetector;
pub use manifest::ManifestDetector;
pub use string_format::StringFormatDetector;

use crate::lint::{Incident, Issue};
use crate::project::Project;

/// Trait for lint detectors
pub trait Detector: Send + Sync {
    /// Human-readable name used in logs
    fn name(&self) -> &'static str;

    /// Issues this detector can report
    fn issues(&self) -> &'static [&'static Issue];

    /// Run the detector over the project and return found incidents
    fn detect(&self, project: &Project) -> Vec<Incident>;
}

/// Every built-in detector
pub fn all() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(DuplicateResourceDetector::new()),
        Box::new(ManifestDetector::new()),
        Box::new(StringFormatDetector::new()),
        Box::new(SupportAnnotationDetector::new()),
    ]
}
