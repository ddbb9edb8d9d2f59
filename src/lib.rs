//! droidlint - Fast lint checks for Android resources, manifests and sources
//!
//! The pipeline:
//! 1. **File Discovery** - Find manifests, resource XML, Java, Kotlin and Gradle files
//! 2. **Parsing** - Parse XML with quick-xml and sources with tree-sitter
//! 3. **Detection** - Run the detectors over the whole project in parallel
//! 4. **Reporting** - Print incidents as text, JSON or SARIF, optionally with fixes

pub mod baseline;
pub mod config;
pub mod detectors;
pub mod discovery;
pub mod fix;
pub mod lint;
pub mod parser;
pub mod project;
pub mod report;
pub mod testing;
pub mod watch;

pub use baseline::Baseline;
pub use config::Config;
pub use discovery::FileFinder;
pub use fix::FixApplier;
pub use lint::{Incident, Issue, LintDriver, Severity};
pub use project::Project;
pub use report::{ReportFormat, Reporter};
