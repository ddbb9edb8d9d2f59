//! Duplicate resource definitions, mistyped references and bad escapes in
//! values files

use super::Detector;
use crate::lint::{Category, Incident, Issue, LintFix, Location, Severity};
use crate::parser::xml::{normalize_name, ResourceDefinition, XmlElement};
use crate::project::{Project, ProjectFile};
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::path::Path;

pub static DUPLICATE: Issue = Issue {
    id: "DuplicateDefinition",
    brief: "Duplicate definitions of resources",
    explanation: "You can define a resource multiple times in different resource folders; that's \
        how string translations are done, for example. However, defining the same resource more \
        than once in the same resource folder is likely an error, for example attempting to add a \
        new resource without realizing that the name is already used, and so on.",
    category: Category::Correctness,
    priority: 6,
    severity: Severity::Error,
};

pub static TYPE_MISMATCH: Issue = Issue {
    id: "ReferenceType",
    brief: "Incorrect reference types",
    explanation: "When you generate a resource alias, the resource you are pointing to must be of \
        the same type as the alias.",
    category: Category::Correctness,
    priority: 8,
    severity: Severity::Fatal,
};

pub static STRING_ESCAPING: Issue = Issue {
    id: "StringEscaping",
    brief: "Invalid string escapes",
    explanation: "Apostrophes (') must always be escaped (with a \\\\), unless they appear in a \
        string which is itself escaped in double quotes (\").",
    category: Category::Messages,
    priority: 9,
    severity: Severity::Error,
};

/// Detector for problems inside values resource folders
pub struct DuplicateResourceDetector;

/// First definition seen for a (type, name) pair in a folder
struct Seen<'a> {
    file: &'a ProjectFile,
    definition: &'a ResourceDefinition,
}

impl DuplicateResourceDetector {
    pub const ISSUES: &'static [&'static Issue] = &[&DUPLICATE, &TYPE_MISMATCH, &STRING_ESCAPING];

    pub fn new() -> Self {
        Self
    }

    fn check_duplicates(&self, project: &Project, incidents: &mut Vec<Incident>) {
        let mut folders: BTreeMap<&Path, Vec<(&ProjectFile, &ResourceDefinition)>> = BTreeMap::new();
        for (file, values) in project.values_files() {
            let Some(folder) = file.resource_folder() else {
                continue;
            };
            let entry = folders.entry(folder).or_default();
            entry.extend(values.definitions.iter().map(|d| (file, d)));
        }

        for definitions in folders.values() {
            let mut seen: HashMap<(&str, String), Seen> = HashMap::new();
            for &(file, definition) in definitions {
                if definition.resource_type == "id" {
                    continue;
                }
                let key = (definition.resource_type.as_str(), definition.normalized_name());
                match seen.get(&key) {
                    Some(first) => {
                        let mut message = format!("`{}` has already been defined in this folder", definition.name);
                        if first.definition.name != definition.name {
                            message.push_str(&format!(" as `{}`", first.definition.name));
                        }
                        let secondary = Location::new(
                            &first.file.path,
                            &first.file.contents,
                            first.definition.name_range.clone(),
                        )
                        .with_message("Previously defined here");
                        let location = Location::new(&file.path, &file.contents, definition.name_range.clone())
                            .with_secondary(secondary);
                        incidents.push(Incident::new(&DUPLICATE, location, message));
                    }
                    None => {
                        seen.insert(key, Seen { file, definition });
                    }
                }
            }
        }
    }

    fn check_styleable(&self, file: &ProjectFile, definition: &ResourceDefinition, incidents: &mut Vec<Incident>) {
        let mut seen: HashMap<String, Range<usize>> = HashMap::new();
        for attr in definition.element.children_named("attr") {
            let Some(name) = attr.attribute("name") else {
                continue;
            };
            let normalized = normalize_name(&name.value);
            match seen.get(&normalized) {
                Some(first) => {
                    let secondary =
                        Location::new(&file.path, &file.contents, first.clone()).with_message("Previously defined here");
                    incidents.push(Incident::new(
                        &DUPLICATE,
                        Location::new(&file.path, &file.contents, name.range.clone()).with_secondary(secondary),
                        format!("`{}` has already been defined in this `<declare-styleable>`", name.value),
                    ));
                }
                None => {
                    seen.insert(normalized, name.range.clone());
                }
            }
        }
    }

    fn check_reference_type(&self, file: &ProjectFile, definition: &ResourceDefinition, incidents: &mut Vec<Incident>) {
        let element = &definition.element;
        match element.tag.as_str() {
            "string-array" | "integer-array" => {
                let expected = if element.tag == "string-array" { "string" } else { "integer" };
                for item in element.children_named("item") {
                    check_reference(file, item, &[expected], incidents);
                }
            }
            _ => {
                if let Some(allowed) = allowed_reference_types(&definition.resource_type) {
                    check_reference(file, element, allowed, incidents);
                }
            }
        }
    }

    fn check_escaping(&self, file: &ProjectFile, definition: &ResourceDefinition, incidents: &mut Vec<Incident>) {
        match definition.element.tag.as_str() {
            "string" => check_escapes(file, &definition.element, incidents),
            "string-array" | "plurals" => {
                for item in definition.element.children_named("item") {
                    check_escapes(file, item, incidents);
                }
            }
            _ => {}
        }
    }
}

impl Default for DuplicateResourceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for DuplicateResourceDetector {
    fn name(&self) -> &'static str {
        "DuplicateResource"
    }

    fn issues(&self) -> &'static [&'static Issue] {
        Self::ISSUES
    }

    fn detect(&self, project: &Project) -> Vec<Incident> {
        let mut incidents = Vec::new();
        self.check_duplicates(project, &mut incidents);

        for (file, values) in project.values_files() {
            for definition in &values.definitions {
                if definition.resource_type == "styleable" {
                    self.check_styleable(file, definition, &mut incidents);
                }
                self.check_reference_type(file, definition, &mut incidents);
                self.check_escaping(file, definition, &mut incidents);
            }
        }
        incidents
    }
}

/// Reference types a value of the given resource type may alias
fn allowed_reference_types(resource_type: &str) -> Option<&'static [&'static str]> {
    match resource_type {
        "string" => Some(&["string"]),
        "color" => Some(&["color"]),
        "dimen" => Some(&["dimen"]),
        "bool" => Some(&["bool"]),
        "integer" => Some(&["integer"]),
        "drawable" => Some(&["drawable", "color", "mipmap"]),
        _ => None,
    }
}

/// Range of an element's text without surrounding whitespace
fn trimmed_content(contents: &str, element: &XmlElement) -> Range<usize> {
    let raw = &contents[element.content_range.clone()];
    let start = element.content_range.start + (raw.len() - raw.trim_start().len());
    start..start + raw.trim().len()
}

fn check_reference(file: &ProjectFile, element: &XmlElement, allowed: &[&str], incidents: &mut Vec<Incident>) {
    let value = element.text.trim();
    let Some(reference) = value.strip_prefix('@') else {
        return;
    };
    if value == "@null" || value == "@empty" {
        return;
    }
    let reference = reference.trim_start_matches('+');
    let Some((kind, _name)) = reference.split_once('/') else {
        return;
    };
    let kind = kind.rsplit(':').next().unwrap_or(kind);
    if allowed.contains(&kind) {
        return;
    }

    let location = Location::new(&file.path, &file.contents, trimmed_content(&file.contents, element));
    incidents.push(Incident::new(
        &TYPE_MISMATCH,
        location,
        format!(
            "Unexpected resource reference type; expected value of type `@{}/`",
            allowed[0]
        ),
    ));
}

/// Report the first escaping problem in the raw text of a string value
fn check_escapes(file: &ProjectFile, element: &XmlElement, incidents: &mut Vec<Incident>) {
    let content = element.content_range.clone();
    let raw = &file.contents[content.clone()];
    if raw.trim_start().starts_with('@') || raw.trim_start().starts_with('?') {
        return;
    }

    if let Some((range, problem)) = find_escape_problem(raw) {
        let absolute = content.start + range.start..content.start + range.end;
        let location = Location::new(&file.path, &file.contents, absolute.clone());
        let incident = match problem {
            EscapeProblem::Apostrophe => Incident::new(&STRING_ESCAPING, location, "Apostrophe not preceded by \\")
                .with_fix(LintFix::replace("Escape Apostrophe", &file.path, absolute, "\\'")),
            EscapeProblem::UnicodeEscape => Incident::new(
                &STRING_ESCAPING,
                location,
                "Bad character in \\u unicode escape sequence",
            ),
        };
        incidents.push(incident);
    }
}

#[derive(Debug, PartialEq, Eq)]
enum EscapeProblem {
    Apostrophe,
    UnicodeEscape,
}

/// Scan raw XML content, skipping markup and tracking quoted sections
fn find_escape_problem(raw: &str) -> Option<(Range<usize>, EscapeProblem)> {
    let mut quoted = false;
    let mut chars = raw.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let rest = &raw[i..];
        match c {
            '<' => {
                let end = if rest.starts_with("<!--") {
                    rest.find("-->").map(|e| e + 3)
                } else if rest.starts_with("<![CDATA[") {
                    rest.find("]]>").map(|e| e + 3)
                } else {
                    rest.find('>').map(|e| e + 1)
                };
                let skip_to = i + end.unwrap_or(rest.len());
                while chars.peek().is_some_and(|&(j, _)| j < skip_to) {
                    chars.next();
                }
            }
            '\\' => match chars.next() {
                Some((_, 'u')) => {
                    let digits: Vec<(usize, char)> = raw[i + 2..].char_indices().take(4).collect();
                    let valid = digits.len() == 4 && digits.iter().all(|(_, d)| d.is_ascii_hexdigit());
                    if !valid {
                        let end = i + 2 + digits.last().map(|(j, d)| j + d.len_utf8()).unwrap_or(0);
                        return Some((i..end, EscapeProblem::UnicodeEscape));
                    }
                    for _ in 0..4 {
                        chars.next();
                    }
                }
                _ => {}
            },
            '"' => quoted = !quoted,
            '&' if rest.starts_with("&quot;") => {
                quoted = !quoted;
                for _ in 0..5 {
                    chars.next();
                }
            }
            '&' if rest.starts_with("&apos;") => {
                if !quoted {
                    return Some((i..i + 6, EscapeProblem::Apostrophe));
                }
                for _ in 0..5 {
                    chars.next();
                }
            }
            '\'' if !quoted => return Some((i..i + 1, EscapeProblem::Apostrophe)),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_scanner() {
        assert_eq!(find_escape_problem("Don't"), Some((3..4, EscapeProblem::Apostrophe)));
        assert_eq!(find_escape_problem("Don\\'t"), None);
        assert_eq!(find_escape_problem("\"Don't\""), None);
        assert_eq!(find_escape_problem("&quot;Don't&quot;"), None);
        assert_eq!(find_escape_problem("Don&apos;t"), Some((3..9, EscapeProblem::Apostrophe)));
        assert_eq!(find_escape_problem("<xliff:g id='x'>%s</xliff:g>"), None);
        assert_eq!(find_escape_problem("\\u12"), Some((0..4, EscapeProblem::UnicodeEscape)));
        assert_eq!(find_escape_problem("\\u00e9t\\u00E9"), None);
    }

    #[test]
    fn test_allowed_reference_types() {
        assert_eq!(allowed_reference_types("drawable"), Some(&["drawable", "color", "mipmap"][..]));
        assert!(allowed_reference_types("style").is_none());
    }
}
