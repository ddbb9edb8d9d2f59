use crate::lint::{Issue, Severity};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration for a lint run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target directories to analyze
    pub targets: Vec<PathBuf>,

    /// Patterns to exclude from analysis
    pub exclude: Vec<String>,

    /// When non-empty, only these issue ids are checked
    pub check: Vec<String>,

    /// Issue ids that are never reported
    pub disable: Vec<String>,

    /// Per-issue severity overrides (fatal, error, warning, informational, ignore)
    pub severity: BTreeMap<String, String>,

    /// Report configuration
    pub report: ReportConfig,

    /// Android-specific configuration
    pub android: AndroidConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: text, json, sarif
    pub format: String,

    /// Print quick-fix diffs after the report
    pub show_fixes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidConfig {
    /// Treat the project as a library even if Gradle says otherwise
    pub library: bool,

    /// Path patterns identifying test sources
    pub test_source_patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: vec![],
            exclude: vec![
                "**/build/**".to_string(),
                "**/generated/**".to_string(),
                "**/.gradle/**".to_string(),
                "**/.idea/**".to_string(),
            ],
            check: vec![],
            disable: vec![],
            severity: BTreeMap::new(),
            report: ReportConfig::default(),
            android: AndroidConfig::default(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            show_fixes: false,
        }
    }
}

impl Default for AndroidConfig {
    fn default() -> Self {
        Self {
            library: false,
            test_source_patterns: vec![
                "**/src/test/java/**".to_string(),
                "**/src/test/kotlin/**".to_string(),
                "**/src/androidTest/**".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load configuration from a YAML or TOML file
    ///
    /// Files without a recognised extension are tried as YAML, then TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = match path.extension().and_then(|e| e.to_str()) {
            Some("yml" | "yaml") => parse_yaml(&contents)?,
            Some("toml") => parse_toml(&contents)?,
            _ => parse_yaml(&contents).or_else(|_| parse_toml(&contents))?,
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// The first of `.droidlint.{yml,yaml,toml}` or `droidlint.{yml,yaml,toml}`
    /// found in the project root, or the defaults
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let found = ["", "."]
            .iter()
            .rev()
            .flat_map(|prefix| {
                ["yml", "yaml", "toml"]
                    .iter()
                    .map(move |ext| project_root.join(format!("{}droidlint.{}", prefix, ext)))
            })
            .find(|path| path.is_file());

        match found {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Reject severity overrides that don't name a known severity
    pub fn validate(&self) -> Result<()> {
        for (id, value) in &self.severity {
            if Severity::parse(value).is_none() {
                return Err(miette::miette!(
                    "Unknown severity `{}` for issue {} (expected fatal, error, warning, informational or ignore)",
                    value,
                    id
                ));
            }
        }
        Ok(())
    }

    /// Whether a path is excluded from discovery
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().replace('\\', "/");
        self.exclude.iter().any(|pattern| glob_match(pattern, &path_str))
    }

    pub fn is_test_source(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().replace('\\', "/");
        self.android
            .test_source_patterns
            .iter()
            .any(|pattern| glob_match(pattern, &path_str))
    }

    /// Effective severity of an issue, or `None` when it should not be reported
    pub fn severity_for(&self, issue: &Issue) -> Option<Severity> {
        if self.disable.iter().any(|id| id == issue.id) {
            return None;
        }
        if !self.check.is_empty() && !self.check.iter().any(|id| id == issue.id) {
            return None;
        }
        match self.severity.get(issue.id).and_then(|s| Severity::parse(s)) {
            Some(overridden) => overridden,
            None => Some(issue.severity),
        }
    }
}

fn parse_yaml(contents: &str) -> Result<Config> {
    serde_yaml::from_str(contents)
        .into_diagnostic()
        .wrap_err("Failed to parse YAML config")
}

fn parse_toml(contents: &str) -> Result<Config> {
    toml::from_str(contents)
        .into_diagnostic()
        .wrap_err("Failed to parse TOML config")
}

/// Match a `/`-separated path against a glob
///
/// `**` spans any number of whole segments and `*` any run of characters
/// inside one segment. A pattern without `/` is matched against the file name
/// only, so `*.xml` applies at any depth.
fn glob_match(pattern: &str, path: &str) -> bool {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if !pattern.contains('/') {
        return segments.last().is_some_and(|name| segment_match(pattern, name));
    }
    let parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    segments_match(&parts, &segments)
}

fn segments_match(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&"**", rest)) => (0..=path.len()).any(|skip| segments_match(rest, &path[skip..])),
        Some((first, rest)) => match path.split_first() {
            Some((segment, remaining)) => segment_match(first, segment) && segments_match(rest, remaining),
            None => false,
        },
    }
}

fn segment_match(pattern: &str, text: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == text,
        Some((prefix, rest)) => {
            let Some(text) = text.strip_prefix(prefix) else {
                return false;
            };
            (0..=text.len())
                .filter(|&i| text.is_char_boundary(i))
                .any(|i| segment_match(rest, &text[i..]))
        }
    }
}
