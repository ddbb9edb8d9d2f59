use serde::{Deserialize, Serialize};

/// Severity of a reported issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Informational,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Informational => "informational",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    /// Label used in the text report. Fatal issues print as errors.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Informational => "Information",
            Severity::Warning => "Warning",
            Severity::Error | Severity::Fatal => "Error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }

    /// Parse a severity name from configuration. `None` means "ignore".
    pub fn parse(s: &str) -> Option<Option<Severity>> {
        match s.to_lowercase().as_str() {
            "fatal" => Some(Some(Severity::Fatal)),
            "error" => Some(Some(Severity::Error)),
            "warning" => Some(Some(Severity::Warning)),
            "informational" | "info" => Some(Some(Severity::Informational)),
            "ignore" | "off" => Some(None),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Broad grouping of issues, used by `--list-issues` and SARIF output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Correctness,
    Messages,
    Security,
    Usability,
    Icons,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Correctness => "Correctness",
            Category::Messages => "Correctness:Messages",
            Category::Security => "Security",
            Category::Usability => "Usability",
            Category::Icons => "Usability:Icons",
        }
    }
}

/// A category of problem a detector can report
///
/// Issues are declared as statics next to the detector that reports them and
/// referenced by `&'static Issue` everywhere else.
#[derive(Debug)]
pub struct Issue {
    /// Stable identifier, e.g. `DuplicateDefinition`
    pub id: &'static str,

    /// One-line summary
    pub brief: &'static str,

    /// Longer explanation shown by `--list-issues`
    pub explanation: &'static str,

    pub category: Category,

    /// Priority from 1 (lowest) to 10 (highest)
    pub priority: u8,

    /// Severity used unless configuration overrides it
    pub severity: Severity,
}

impl PartialEq for Issue {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Issue {}
