use super::{Issue, Location, Severity};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// A single text replacement produced by a quick fix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub file: PathBuf,
    pub range: Range<usize>,
    pub replacement: String,
}

impl TextEdit {
    pub fn new(file: &Path, range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            file: file.to_path_buf(),
            range,
            replacement: replacement.into(),
        }
    }

    pub fn insert(file: &Path, offset: usize, text: impl Into<String>) -> Self {
        Self::new(file, offset..offset, text)
    }
}

/// A suggested automatic correction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintFix {
    /// Named set of edits applied together
    Edits { name: String, edits: Vec<TextEdit> },

    /// Mutually exclusive options; each is rendered and applied on its own
    Alternatives(Vec<LintFix>),
}

impl LintFix {
    pub fn replace(name: impl Into<String>, file: &Path, range: Range<usize>, replacement: impl Into<String>) -> Self {
        LintFix::Edits {
            name: name.into(),
            edits: vec![TextEdit::new(file, range, replacement)],
        }
    }

    /// Flatten alternatives into the list of concrete fixes
    pub fn options(&self) -> Vec<(&str, &[TextEdit])> {
        match self {
            LintFix::Edits { name, edits } => vec![(name.as_str(), edits.as_slice())],
            LintFix::Alternatives(fixes) => fixes.iter().flat_map(|f| f.options()).collect(),
        }
    }
}

/// A reported occurrence of an issue
#[derive(Debug, Clone)]
pub struct Incident {
    pub issue: &'static Issue,

    /// Effective severity after configuration overrides
    pub severity: Severity,

    pub message: String,

    pub location: Location,

    pub fix: Option<LintFix>,
}

impl Incident {
    pub fn new(issue: &'static Issue, location: Location, message: impl Into<String>) -> Self {
        Self {
            issue,
            severity: issue.severity,
            message: message.into(),
            location,
            fix: None,
        }
    }

    pub fn with_fix(mut self, fix: LintFix) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Ordering key: file, line, column, issue id, message
    pub fn sort_key(&self) -> (String, usize, usize, &'static str, &str) {
        (
            self.location.display_path(),
            self.location.line(),
            self.location.column(),
            self.issue.id,
            self.message.as_str(),
        )
    }
}
