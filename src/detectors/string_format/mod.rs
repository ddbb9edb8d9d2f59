//! Checks format strings in resources and the calls that use them

mod format;

pub use format::{
    classify, format_specifiers, get_format_argument_count, get_format_argument_type, is_locale_specific,
    strip_quotes, ConversionClass, FormatSpecifier, FormatStringKind, FORMAT_PATTERN,
};

use super::Detector;
use crate::lint::{Category, Incident, Issue, LintFix, Location, Severity};
use crate::parser::xml::ResourceDefinition;
use crate::parser::{normalize_type, unbox, CallSite, Expr, ExprKind, Receiver};
use crate::project::{Project, ProjectFile};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

pub static INVALID: Issue = Issue {
    id: "StringFormatInvalid",
    brief: "Invalid format string",
    explanation: "If a string contains a '%' character, then the string may be a formatting string \
        which will be passed to `String.format` from Java code to replace each '%' occurrence with \
        specific values. Format strings must use valid conversions, translations must agree on the \
        conversion used for each argument, and strings that are not format strings must not be \
        passed to `String.format`.",
    category: Category::Messages,
    priority: 9,
    severity: Severity::Error,
};

pub static ARG_COUNT: Issue = Issue {
    id: "StringFormatCount",
    brief: "Formatting argument types incomplete or inconsistent",
    explanation: "When a formatted string takes arguments, the number of arguments should be the \
        same in all translations; otherwise some locales will drop or misplace values.",
    category: Category::Messages,
    priority: 5,
    severity: Severity::Warning,
};

pub static ARG_TYPES: Issue = Issue {
    id: "StringFormatMatches",
    brief: "`String.format` string doesn't match the XML format string",
    explanation: "The format string resource used by a `String.format` or `getString` call must \
        expect the number of arguments supplied, and each conversion must accept the type of the \
        value passed for it. Mismatches throw at runtime or produce garbled output.",
    category: Category::Messages,
    priority: 9,
    severity: Severity::Error,
};

/// A `<string>` resource and what its text looks like to a formatter
struct FormatString<'a> {
    file: &'a ProjectFile,
    definition: &'a ResourceDefinition,
    kind: FormatStringKind,
    specifiers: Vec<FormatSpecifier>,
    text: String,
}

impl FormatString<'_> {
    fn count(&self) -> usize {
        get_format_argument_count(&self.text, None)
    }

    fn specifier(&self, index: usize) -> Option<&FormatSpecifier> {
        self.specifiers.iter().find(|s| !s.is_literal() && s.index == index)
    }

    fn spec_text(&self, spec: &FormatSpecifier) -> &str {
        &self.text[spec.range.clone()]
    }

    /// The string's content, trimmed
    fn content_location(&self) -> Location {
        let element = &self.definition.element;
        let raw = &self.file.contents[element.content_range.clone()];
        let leading = raw.len() - raw.trim_start().len();
        let start = element.content_range.start + leading;
        let end = (start + raw.trim().len()).max(start);
        if start == end {
            return Location::new(&self.file.path, &self.file.contents, self.definition.name_range.clone());
        }
        Location::new(&self.file.path, &self.file.contents, start..end)
    }

    /// Byte range of a specifier in the file, when it appears verbatim
    fn raw_range(&self, spec: &FormatSpecifier) -> Option<Range<usize>> {
        let content = &self.definition.element.content_range;
        let needle = self.spec_text(spec);
        let raw = &self.file.contents[content.clone()];
        let occurrence = self.text[..spec.range.start].matches(needle).count();
        raw.match_indices(needle)
            .nth(occurrence)
            .map(|(offset, _)| content.start + offset..content.start + offset + needle.len())
    }

    fn spec_location(&self, spec: &FormatSpecifier) -> Location {
        match self.raw_range(spec) {
            Some(range) => Location::new(&self.file.path, &self.file.contents, range),
            None => self.content_location(),
        }
    }
}

/// Detector for format strings and their uses
pub struct StringFormatDetector;

impl StringFormatDetector {
    pub const ISSUES: &'static [&'static Issue] = &[&INVALID, &ARG_COUNT, &ARG_TYPES];

    pub fn new() -> Self {
        Self
    }

    fn collect<'a>(&self, project: &'a Project) -> BTreeMap<String, Vec<FormatString<'a>>> {
        let mut strings: BTreeMap<String, Vec<FormatString<'a>>> = BTreeMap::new();
        for (file, values) in project.values_files() {
            for definition in values.strings() {
                let text = strip_quotes(&definition.element.text);
                let formatted = definition.element.attribute("formatted").map(|a| a.value.as_str());
                let kind = if formatted == Some("false") {
                    FormatStringKind::NotFormat
                } else {
                    classify(&text)
                };
                if kind == FormatStringKind::Plain {
                    continue;
                }
                strings.entry(definition.normalized_name()).or_default().push(FormatString {
                    file,
                    definition,
                    specifiers: format_specifiers(&text),
                    kind,
                    text,
                });
            }
        }
        strings
    }

    fn check_definitions(&self, name: &str, strings: &[FormatString], incidents: &mut Vec<Incident>) {
        for string in strings {
            if let FormatStringKind::Invalid(spec) = &string.kind {
                let location = string
                    .specifiers
                    .iter()
                    .find(|s| string.spec_text(s) == spec)
                    .map(|s| string.spec_location(s))
                    .unwrap_or_else(|| string.content_location());
                incidents.push(Incident::new(
                    &INVALID,
                    location,
                    format!(
                        "Incorrect formatting string `{}`; missing conversion character in '`{}`'",
                        string.definition.name, spec
                    ),
                ));
            }
        }

        let formats: Vec<&FormatString> = strings.iter().filter(|s| s.kind == FormatStringKind::Format).collect();
        let Some((first, rest)) = formats.split_first() else {
            return;
        };

        let first_count = first.count();
        if let Some(other) = rest.iter().find(|s| s.count() != first_count) {
            let secondary = first.content_location().with_message("Conflicting number of arguments here");
            incidents.push(Incident::new(
                &ARG_COUNT,
                other.content_location().with_secondary(secondary),
                format!(
                    "Inconsistent number of arguments in formatting string `{}`; found both {} here and {} in {}",
                    name,
                    other.count(),
                    first_count,
                    first.file.folder_and_name()
                ),
            ));
        }

        let indices: BTreeSet<usize> = formats
            .iter()
            .flat_map(|s| s.specifiers.iter().filter(|spec| !spec.is_literal()).map(|spec| spec.index))
            .filter(|&index| index > 0)
            .collect();
        for index in indices {
            let mut seen: Option<(&FormatString, &FormatSpecifier)> = None;
            for string in &formats {
                let Some(spec) = string.specifier(index) else {
                    continue;
                };
                match seen {
                    None => seen = Some((string, spec)),
                    Some((prior, prior_spec)) if prior_spec.class().is_incompatible(spec.class()) => {
                        let secondary = prior.spec_location(prior_spec).with_message("Conflicting argument type here");
                        incidents.push(Incident::new(
                            &INVALID,
                            string.spec_location(spec).with_secondary(secondary),
                            format!(
                                "Inconsistent formatting types for argument #{} in format string `{}` ('{}'): Found both '`{}`' here and '`{}`' in {}",
                                index,
                                name,
                                string.spec_text(spec),
                                spec.conversion,
                                prior_spec.conversion,
                                prior.file.folder_and_name()
                            ),
                        ));
                        return;
                    }
                    Some(_) => {}
                }
            }
        }
    }

    fn check_call(
        &self,
        file: &ProjectFile,
        call: &CallSite,
        strings: &BTreeMap<String, Vec<FormatString>>,
        incidents: &mut Vec<Incident>,
    ) {
        let Some((resource, supplied_from)) = format_call(call) else {
            return;
        };
        let Some(definitions) = strings.get(resource) else {
            return;
        };
        let call_location = || Location::new(&file.path, &file.contents, call.range.clone());

        let formats: Vec<&FormatString> = definitions.iter().filter(|s| s.kind == FormatStringKind::Format).collect();
        if formats.is_empty() {
            if definitions.iter().any(|s| s.kind == FormatStringKind::NotFormat) {
                incidents.push(Incident::new(
                    &INVALID,
                    call_location(),
                    format!(
                        "Format string '`{}`' is not a valid format string so it should not be passed to `String.format`",
                        definitions[0].definition.name
                    ),
                ));
            }
            return;
        }

        let supplied = &call.args[supplied_from..];
        let passes_array = supplied.len() == 1
            && (supplied[0].type_name.as_deref().is_some_and(|t| t.ends_with("[]"))
                || matches!(supplied[0].kind, ExprKind::ArrayInit { .. }));
        if passes_array {
            return;
        }

        for string in &formats {
            let required = string.count();
            if required != supplied.len() {
                let secondary = string
                    .content_location()
                    .with_message(format!("This definition requires {} arguments", required));
                incidents.push(Incident::new(
                    &ARG_TYPES,
                    call_location().with_secondary(secondary),
                    format!(
                        "Wrong argument count, format string `{}` requires `{}` but format call supplies `{}`",
                        string.definition.name,
                        required,
                        supplied.len()
                    ),
                ));
                return;
            }
        }

        for string in &formats {
            for (offset, arg) in supplied.iter().enumerate() {
                let index = offset + 1;
                let Some(spec) = string.specifier(index) else {
                    continue;
                };
                let Some(type_name) = argument_type(arg) else {
                    continue;
                };
                if accepts(spec, &type_name) {
                    continue;
                }

                let mut message = format!(
                    "Wrong argument type for formatting argument '#{}' in `{}`: conversion is '`{}`', received `{}` (argument #{} in method call)",
                    index,
                    string.definition.name,
                    string.spec_text(spec),
                    type_name,
                    supplied_from + offset + 1
                );
                let suggestion = suggested_conversion(&type_name);
                if let Some(suggestion) = suggestion {
                    message.push_str(&format!(" (Did you mean formatting character `{}`?)", suggestion));
                }

                let secondary = string.spec_location(spec).with_message("Conflicting argument declaration here");
                let mut incident = Incident::new(&ARG_TYPES, call_location().with_secondary(secondary), message);
                if let (Some(suggestion), Some(range)) = (suggestion, string.raw_range(spec)) {
                    let replacement = format!("%{}${}", index, suggestion);
                    incident = incident.with_fix(LintFix::replace(
                        format!("Replace with {}", replacement),
                        &string.file.path,
                        range,
                        replacement,
                    ));
                }
                incidents.push(incident);
                return;
            }
        }
    }
}

impl Default for StringFormatDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for StringFormatDetector {
    fn name(&self) -> &'static str {
        "StringFormat"
    }

    fn issues(&self) -> &'static [&'static Issue] {
        Self::ISSUES
    }

    fn detect(&self, project: &Project) -> Vec<Incident> {
        let strings = self.collect(project);
        let mut incidents = Vec::new();

        for (name, definitions) in &strings {
            let display = definitions.first().map(|s| s.definition.name.as_str()).unwrap_or(name);
            self.check_definitions(display, definitions, &mut incidents);
        }

        for unit in project.units() {
            let Some(file) = project.file(&unit.path) else {
                continue;
            };
            for call in &unit.calls {
                self.check_call(file, call, &strings, &mut incidents);
            }
        }

        incidents
    }
}

/// Resource name of the format string a call formats, and the index of the
/// first formatting argument
///
/// Recognises `String.format([locale,] getString(R.string.x), ...)` and
/// `getString(R.string.x, ...)` on any receiver.
fn format_call(call: &CallSite) -> Option<(&str, usize)> {
    match call.name.as_str() {
        "format" if is_string_class(call) => {
            let format_index = match call.args.first() {
                Some(first) if is_locale(first) => 1,
                _ => 0,
            };
            let format_arg = call.args.get(format_index)?;
            let ExprKind::Call { name, args } = &format_arg.kind else {
                return None;
            };
            if name != "getString" && name != "getText" {
                return None;
            }
            let (kind, resource) = args.first()?.resource_reference()?;
            (kind == "string").then_some((resource, format_index + 1))
        }
        "getString" if call.args.len() >= 2 => {
            let (kind, resource) = call.args[0].resource_reference()?;
            (kind == "string").then_some((resource, 1))
        }
        _ => None,
    }
}

fn is_string_class(call: &CallSite) -> bool {
    let written = call.receiver_text.as_deref();
    matches!(written, Some("String") | Some("java.lang.String"))
        || matches!(&call.receiver, Receiver::Type(t) if t == "String" || t == "java.lang.String")
}

fn is_locale(expr: &Expr) -> bool {
    if expr.type_name.as_deref().is_some_and(|t| t == "Locale" || t.ends_with(".Locale")) {
        return true;
    }
    match &expr.kind {
        ExprKind::Name(path) => path.starts_with("Locale.") || path.starts_with("java.util.Locale."),
        ExprKind::Call { name, .. } => name == "getDefault",
        ExprKind::New(type_name) => type_name == "Locale" || type_name.ends_with(".Locale"),
        _ => false,
    }
}

fn argument_type(arg: &Expr) -> Option<String> {
    let written = arg.type_name.as_deref()?;
    Some(unbox(&normalize_type(written)).to_string())
}

fn is_integral(type_name: &str) -> bool {
    matches!(type_name, "int" | "long" | "short" | "byte" | "BigInteger" | "java.math.BigInteger")
}

fn is_floating(type_name: &str) -> bool {
    matches!(type_name, "float" | "double" | "BigDecimal" | "java.math.BigDecimal")
}

/// Whether a conversion accepts a value of the given (unboxed) type
fn accepts(spec: &FormatSpecifier, type_name: &str) -> bool {
    match spec.class() {
        ConversionClass::Boolean => type_name == "boolean",
        ConversionClass::Integer => is_integral(type_name),
        ConversionClass::Float => is_floating(type_name),
        ConversionClass::Character => matches!(type_name, "char" | "byte" | "short" | "int"),
        _ => true,
    }
}

fn suggested_conversion(type_name: &str) -> Option<char> {
    match type_name {
        "boolean" => Some('b'),
        "char" => Some('c'),
        "String" | "java.lang.String" | "CharSequence" => Some('s'),
        t if is_integral(t) => Some('d'),
        t if is_floating(t) => Some('f'),
        _ => None,
    }
}
