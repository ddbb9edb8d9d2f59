//! In-memory lint harness for detector tests
//!
//! ```no_run
//! use droidlint::detectors::DuplicateResourceDetector;
//! use droidlint::testing::{lint, xml};
//!
//! lint()
//!     .files(vec![xml(
//!         "res/values/strings.xml",
//!         r#"
//!         <resources>
//!             <string name="app_name">App</string>
//!         </resources>
//!         "#,
//!     )])
//!     .issues(DuplicateResourceDetector::ISSUES)
//!     .run()
//!     .expect_clean();
//! ```

use crate::config::Config;
use crate::lint::{Incident, Issue, LintDriver};
use crate::project::{Project, ProjectFile};
use crate::report::{FixDiffRenderer, TextReporter};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// A fixture file: a project-relative path and its text
#[derive(Debug, Clone)]
pub struct TestFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Fixture at an explicit path
pub fn xml(path: &str, text: &str) -> TestFile {
    TestFile {
        path: PathBuf::from(path),
        contents: trim_indent(text),
    }
}

/// Java source placed at `src/<package>/<Class>.java`
pub fn java(text: &str) -> TestFile {
    let contents = trim_indent(text);
    let path = source_path(&contents, "java", java_class_pattern());
    TestFile { path, contents }
}

pub fn java_at(path: &str, text: &str) -> TestFile {
    xml(path, text)
}

/// Kotlin source placed at `src/<package>/<Class>.kt`
pub fn kotlin(text: &str) -> TestFile {
    let contents = trim_indent(text);
    let path = source_path(&contents, "kt", kotlin_class_pattern());
    TestFile { path, contents }
}

/// `build.gradle` at the project root
pub fn gradle(text: &str) -> TestFile {
    xml("build.gradle", text)
}

/// `AndroidManifest.xml` at the project root
pub fn manifest(text: &str) -> TestFile {
    xml("AndroidManifest.xml", text)
}

fn package_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?m)^\s*package\s+([\w.]+)").expect("valid package pattern"))
}

fn java_class_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b(?:class|interface|enum)\s+([A-Za-z_]\w*)").expect("valid class pattern")
    })
}

fn kotlin_class_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(?:class|object|interface)\s+([A-Za-z_]\w*)").expect("valid class pattern"))
}

fn source_path(contents: &str, extension: &str, class_pattern: &Regex) -> PathBuf {
    let mut path = PathBuf::from("src");
    if let Some(captures) = package_pattern().captures(contents) {
        for segment in captures[1].split('.') {
            path.push(segment);
        }
    }
    let name = class_pattern
        .captures(contents)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "test".to_string());
    path.push(format!("{}.{}", name, extension));
    path
}

/// Remove the common leading indentation and the blank first and last lines
pub fn trim_indent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.trim().is_empty()).map(|i| i + 1).unwrap_or(start);
    let lines = &lines[start..end];

    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = lines
        .iter()
        .map(|l| if l.len() >= indent { &l[indent..] } else { l.trim_start() })
        .collect::<Vec<_>>()
        .join("\n");
    out.push('\n');
    out
}

/// Start configuring a lint run
pub fn lint() -> LintTest {
    LintTest::default()
}

#[derive(Default)]
pub struct LintTest {
    files: Vec<TestFile>,
    issues: Option<Vec<&'static Issue>>,
    incremental: Option<PathBuf>,
    library: bool,
    config: Option<Config>,
}

impl LintTest {
    pub fn files(mut self, files: Vec<TestFile>) -> Self {
        self.files.extend(files);
        self
    }

    /// Only report these issues
    pub fn issues(mut self, issues: &[&'static Issue]) -> Self {
        self.issues = Some(issues.to_vec());
        self
    }

    /// Re-check a single file: only its incidents are reported and related
    /// locations print without line numbers
    pub fn incremental(mut self, path: &str) -> Self {
        self.incremental = Some(PathBuf::from(path));
        self
    }

    pub fn library(mut self, library: bool) -> Self {
        self.library = library;
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn run(self) -> LintResult {
        let mut config = self.config.unwrap_or_default();
        config.android.library |= self.library;

        let files = self
            .files
            .into_iter()
            .map(|f| ProjectFile::new(f.path, f.contents))
            .collect();
        let project = Project::new("/project", files, config);

        let driver = match &self.issues {
            Some(issues) => LintDriver::new().with_issues(issues),
            None => LintDriver::new(),
        };
        let mut incidents = driver.analyze(&project);
        if let Some(path) = &self.incremental {
            incidents.retain(|i| i.location.file == *path);
        }

        LintResult {
            project,
            incidents,
            incremental: self.incremental.is_some(),
            window: 0,
        }
    }
}

/// Outcome of a harness run
pub struct LintResult {
    project: Project,
    incidents: Vec<Incident>,
    incremental: bool,
    window: usize,
}

impl LintResult {
    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// The text report
    pub fn report(&self) -> String {
        TextReporter::new()
            .with_incremental(self.incremental)
            .render(&self.project, &self.incidents)
    }

    /// Assert the text report, ignoring indentation of `expected` and trailing newlines
    #[track_caller]
    pub fn expect(&self, expected: &str) -> &Self {
        let actual = self.report();
        assert_eq!(actual.trim_end(), trim_indent(expected).trim_end());
        self
    }

    #[track_caller]
    pub fn expect_clean(&self) -> &Self {
        assert_eq!(self.report(), "No warnings.");
        self
    }

    #[track_caller]
    pub fn expect_contains(&self, expected: &str) -> &Self {
        let actual = self.report();
        let expected = trim_indent(expected);
        assert!(
            actual.contains(expected.trim_end()),
            "report does not contain:\n{}\nactual report:\n{}",
            expected,
            actual
        );
        self
    }

    /// Unchanged lines to show around fix diffs
    pub fn window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    #[track_caller]
    pub fn expect_fix_diffs(&self, expected: &str) -> &Self {
        let actual = FixDiffRenderer::new()
            .with_window(self.window)
            .render(&self.project, &self.incidents);
        assert_eq!(actual.trim_end(), trim_indent(expected).trim_end());
        self
    }

    /// Assert the number of reported incidents
    #[track_caller]
    pub fn expect_count(&self, errors: usize, warnings: usize) -> &Self {
        let actual_errors = self.incidents.iter().filter(|i| i.severity.is_error()).count();
        let actual_warnings = self.incidents.len() - actual_errors;
        assert_eq!((actual_errors, actual_warnings), (errors, warnings), "report:\n{}", self.report());
        self
    }

    pub fn file(&self, path: &str) -> Option<&str> {
        self.project.file(Path::new(path)).map(|f| f.contents.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_indent() {
        let text = "\n        <resources>\n            <string/>\n        </resources>\n        ";
        assert_eq!(trim_indent(text), "<resources>\n    <string/>\n</resources>\n");
    }

    #[test]
    fn test_java_path_from_package_and_class() {
        let file = java("package test.pkg;\n\npublic class Foo {}\n");
        assert_eq!(file.path, PathBuf::from("src/test/pkg/Foo.java"));

        let file = kotlin("package test.pkg\n\nfun main() {}\n");
        assert_eq!(file.path, PathBuf::from("src/test/pkg/test.kt"));
    }

    #[test]
    fn test_empty_project_is_clean() {
        lint().files(vec![]).run().expect_clean();
    }
}
