use crate::lint::{all_issues, display_path, Incident, LintFix, Location, Severity, TextEdit};
use serde::Serialize;

/// SARIF reporter for CI/CD integration (GitHub, Azure DevOps, etc.)
pub struct SarifReporter;

impl SarifReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, incidents: &[Incident]) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&SarifReport::from_incidents(incidents))
    }
}

impl Default for SarifReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// SARIF 2.1.0 format
#[derive(Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: &'static str,
    version: &'static str,
    runs: Vec<SarifRun>,
}

#[derive(Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize)]
struct SarifDriver {
    name: &'static str,
    version: &'static str,
    rules: Vec<SarifRule>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRule {
    id: &'static str,
    short_description: SarifMessage,
    full_description: SarifMessage,
    default_configuration: SarifConfiguration,
    properties: SarifRuleProperties,
}

#[derive(Serialize)]
struct SarifRuleProperties {
    category: &'static str,
    priority: u8,
}

#[derive(Serialize)]
struct SarifConfiguration {
    level: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    rule_id: &'static str,
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    related_locations: Vec<SarifLocation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fixes: Vec<SarifFix>,
}

/// A quick fix; each alternative becomes its own fix
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifFix {
    description: SarifMessage,
    artifact_changes: Vec<SarifArtifactChange>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifArtifactChange {
    artifact_location: SarifArtifactLocation,
    replacements: Vec<SarifReplacement>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifReplacement {
    deleted_region: SarifOffsetRegion,
    #[serde(skip_serializing_if = "Option::is_none")]
    inserted_content: Option<SarifContent>,
}

/// Region addressed by offset into the file
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifOffsetRegion {
    char_offset: usize,
    char_length: usize,
}

#[derive(Serialize)]
struct SarifContent {
    text: String,
}

#[derive(Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifLocation {
    physical_location: SarifPhysicalLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<SarifMessage>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifPhysicalLocation {
    artifact_location: SarifArtifactLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<SarifRegion>,
}

#[derive(Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRegion {
    start_line: usize,
    start_column: usize,
    end_line: usize,
    end_column: usize,
}

fn level(severity: Severity) -> &'static str {
    match severity {
        Severity::Error | Severity::Fatal => "error",
        Severity::Warning => "warning",
        Severity::Informational => "note",
    }
}

fn sarif_location(location: &Location) -> SarifLocation {
    SarifLocation {
        physical_location: SarifPhysicalLocation {
            artifact_location: SarifArtifactLocation {
                uri: location.display_path(),
            },
            region: location.span.as_ref().map(|span| SarifRegion {
                start_line: span.line,
                start_column: span.column + 1,
                end_line: span.end_line,
                end_column: span.end_column + 1,
            }),
        },
        message: location.message.clone().map(|text| SarifMessage { text }),
    }
}

fn sarif_fixes(fix: &LintFix) -> Vec<SarifFix> {
    fix.options()
        .into_iter()
        .map(|(name, edits)| {
            let mut changes: Vec<SarifArtifactChange> = Vec::new();
            for edit in edits {
                let uri = display_path(&edit.file);
                let replacement = sarif_replacement(edit);
                match changes.iter_mut().find(|c| c.artifact_location.uri == uri) {
                    Some(change) => change.replacements.push(replacement),
                    None => changes.push(SarifArtifactChange {
                        artifact_location: SarifArtifactLocation { uri },
                        replacements: vec![replacement],
                    }),
                }
            }
            SarifFix {
                description: SarifMessage { text: name.to_string() },
                artifact_changes: changes,
            }
        })
        .collect()
}

fn sarif_replacement(edit: &TextEdit) -> SarifReplacement {
    SarifReplacement {
        deleted_region: SarifOffsetRegion {
            char_offset: edit.range.start,
            char_length: edit.range.len(),
        },
        inserted_content: (!edit.replacement.is_empty()).then(|| SarifContent {
            text: edit.replacement.clone(),
        }),
    }
}

impl SarifReport {
    fn from_incidents(incidents: &[Incident]) -> Self {
        let rules = all_issues()
            .into_iter()
            .map(|issue| SarifRule {
                id: issue.id,
                short_description: SarifMessage {
                    text: issue.brief.to_string(),
                },
                full_description: SarifMessage {
                    text: issue.explanation.to_string(),
                },
                default_configuration: SarifConfiguration {
                    level: level(issue.severity),
                },
                properties: SarifRuleProperties {
                    category: issue.category.as_str(),
                    priority: issue.priority,
                },
            })
            .collect();

        let results = incidents
            .iter()
            .map(|incident| SarifResult {
                rule_id: incident.issue.id,
                level: level(incident.severity),
                message: SarifMessage {
                    text: incident.message.clone(),
                },
                locations: vec![sarif_location(&incident.location)],
                related_locations: incident.location.related().map(sarif_location).collect(),
                fixes: incident.fix.as_ref().map(sarif_fixes).unwrap_or_default(),
            })
            .collect();

        SarifReport {
            schema: "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
            version: "2.1.0",
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: "droidlint",
                        version: env!("CARGO_PKG_VERSION"),
                        rules,
                    },
                },
                results,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::{Category, Issue};
    use std::path::Path;

    static SAMPLE: Issue = Issue {
        id: "Sample",
        brief: "Sample issue",
        explanation: "",
        category: Category::Messages,
        priority: 5,
        severity: Severity::Error,
    };

    #[test]
    fn test_sarif_lists_rules() {
        let sarif = SarifReporter::new().render(&[]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&sarif).unwrap();
        assert_eq!(value["version"], "2.1.0");
        let rules = value["runs"][0]["tool"]["driver"]["rules"].as_array().unwrap();
        assert!(rules.iter().any(|r| r["id"] == "DuplicateDefinition"));
        assert!(value["runs"][0]["results"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_fix_replacements() {
        let contents = "<resources>\n    <string name=\"a\">Don't</string>\n</resources>\n";
        let path = Path::new("res/values/strings.xml");
        let offset = contents.find('\'').unwrap();
        let incident = Incident::new(
            &SAMPLE,
            Location::new(path, contents, offset..offset + 1),
            "Apostrophe not preceded by \\",
        )
        .with_fix(LintFix::replace("Escape Apostrophe", path, offset..offset, "\\"));

        let sarif = SarifReporter::new().render(&[incident]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&sarif).unwrap();
        let result = &value["runs"][0]["results"][0];
        assert_eq!(result["ruleId"], "Sample");
        assert_eq!(result["locations"][0]["physicalLocation"]["region"]["startLine"], 2);

        let fix = &result["fixes"][0];
        assert_eq!(fix["description"]["text"], "Escape Apostrophe");
        let change = &fix["artifactChanges"][0];
        assert_eq!(change["artifactLocation"]["uri"], "res/values/strings.xml");
        assert_eq!(change["replacements"][0]["deletedRegion"]["charOffset"], offset);
        assert_eq!(change["replacements"][0]["deletedRegion"]["charLength"], 0);
        assert_eq!(change["replacements"][0]["insertedContent"]["text"], "\\");
    }
}
