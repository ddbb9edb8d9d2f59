//! Helpers for `java.util.Formatter` style format strings

use regex::Regex;
use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::OnceLock;

/// `%[argument_index$][flags][width][.precision][t]conversion`
pub const FORMAT_PATTERN: &str = r"%(\d+\$)?([-+#, 0(<]*)?(\d+)?(\.\d+)?([tT])?([a-zA-Z%])";

fn format_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(FORMAT_PATTERN).expect("valid format pattern"))
}

/// A single format specifier found in a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpecifier {
    /// 1-based argument index; 0 for `%%` and `%n`
    pub index: usize,

    /// Whether the index was written explicitly as `%k$`
    pub explicit: bool,

    pub flags: String,

    /// `t` or `T` date/time prefix
    pub date: bool,

    pub conversion: char,

    /// Byte range of the specifier in the string
    pub range: Range<usize>,
}

impl FormatSpecifier {
    /// Specifiers that do not consume an argument
    pub fn is_literal(&self) -> bool {
        self.conversion == '%' || self.conversion == 'n'
    }

    pub fn class(&self) -> ConversionClass {
        if self.date {
            ConversionClass::DateTime
        } else {
            ConversionClass::of(self.conversion)
        }
    }
}

/// Broad category of a conversion character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionClass {
    String,
    Character,
    Integer,
    Float,
    Boolean,
    Hash,
    DateTime,
    Percent,
    Newline,
    Unknown,
}

impl ConversionClass {
    pub fn of(conversion: char) -> Self {
        match conversion {
            's' | 'S' => ConversionClass::String,
            'c' | 'C' => ConversionClass::Character,
            'd' | 'o' | 'x' | 'X' => ConversionClass::Integer,
            'e' | 'E' | 'f' | 'g' | 'G' | 'a' | 'A' => ConversionClass::Float,
            'b' | 'B' => ConversionClass::Boolean,
            'h' | 'H' => ConversionClass::Hash,
            't' | 'T' => ConversionClass::DateTime,
            '%' => ConversionClass::Percent,
            'n' => ConversionClass::Newline,
            _ => ConversionClass::Unknown,
        }
    }

    /// Whether two conversions for the same argument cannot both be right
    pub fn is_incompatible(self, other: ConversionClass) -> bool {
        self != other && self != ConversionClass::Unknown && other != ConversionClass::Unknown
    }
}

/// Iterate over the format specifiers of `format` that are not preceded by a
/// `\` escape, assigning argument indices
///
/// Explicit `%k$` indices reset implicit numbering to continue at `k + 1`.
pub fn format_specifiers(format: &str) -> Vec<FormatSpecifier> {
    let regex = format_regex();
    let bytes = format.as_bytes();
    let mut specifiers = Vec::new();

    let mut index = 0;
    let mut scanned = 0;
    let mut next_number = 1;

    while let Some(captures) = regex.captures_at(format, index) {
        let whole = match captures.get(0) {
            Some(m) => m,
            None => break,
        };
        let start = whole.start();

        // Walk up to the match so an escaped '%' can be recognised
        while scanned < start {
            if bytes[scanned] == b'\\' {
                scanned += 1;
            }
            scanned += 1;
        }
        if scanned > start {
            while !format.is_char_boundary(scanned) {
                scanned += 1;
            }
            index = scanned;
            continue;
        }

        let conversion = captures
            .get(6)
            .and_then(|m| m.as_str().chars().next())
            .unwrap_or('%');
        let date = captures.get(5).is_some();
        let flags = captures.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();

        let (number, explicit) = if conversion == '%' || conversion == 'n' {
            (0, false)
        } else if let Some(explicit) = captures.get(1) {
            match explicit_index(explicit.as_str()) {
                Some(number) => {
                    next_number = number.saturating_add(1);
                    (number, true)
                }
                None => (0, true),
            }
        } else {
            let number = next_number;
            next_number = next_number.saturating_add(1);
            (number, false)
        };

        specifiers.push(FormatSpecifier {
            index: number,
            explicit,
            flags,
            date,
            conversion,
            range: start..whole.end(),
        });
        index = whole.end();
    }

    specifiers
}

/// Value of a `k$` argument index, or `None` when it does not fit in a `u32`
fn explicit_index(capture: &str) -> Option<usize> {
    capture.trim_end_matches('$').parse::<u32>().ok().map(|n| n as usize)
}

/// Number of arguments a format string consumes: the highest argument index
/// it references
///
/// Every referenced index is added to `indices` when given.
pub fn get_format_argument_count(format: &str, mut indices: Option<&mut BTreeSet<usize>>) -> usize {
    let mut max = 0;
    for spec in format_specifiers(format).iter().filter(|s| !s.is_literal() && s.index > 0) {
        max = max.max(spec.index);
        if let Some(indices) = indices.as_deref_mut() {
            indices.insert(spec.index);
        }
    }
    max
}

/// Conversion character used for the given 1-based argument
pub fn get_format_argument_type(format: &str, argument: usize) -> Option<String> {
    format_specifiers(format)
        .into_iter()
        .find(|s| !s.is_literal() && s.index == argument)
        .map(|s| s.conversion.to_string())
}

/// Whether formatting the string depends on the locale: decimal integers,
/// floating point numbers and dates are rendered differently per locale
pub fn is_locale_specific(format: &str) -> bool {
    if !format.contains('%') {
        return false;
    }
    format_specifiers(format)
        .iter()
        .any(|s| s.date || matches!(s.conversion, 'd' | 'e' | 'E' | 'f' | 'g' | 'G' | 't' | 'T'))
}

/// Remove the unescaped double quotes Android resource strings use for
/// quoting; `\"` stays as written
pub fn strip_quotes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut escaped = false;
    for c in value.chars() {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            out.push(c);
            escaped = true;
        } else if c != '"' {
            out.push(c);
        }
    }
    out
}

/// Outcome of checking a resource string for format specifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatStringKind {
    /// Contains no `%` at all
    Plain,

    /// A valid format string
    Format,

    /// Uses `%` in a way that is not a format, e.g. "100% sure"
    NotFormat,

    /// Looks like a format but a specifier is missing its conversion character;
    /// carries the offending specifier text
    Invalid(String),
}

/// Classify a resource string
///
/// Every unescaped `%` must begin a specifier with a known conversion. A
/// specifier with an unknown conversion is an error when it carries an
/// explicit argument index, since the author clearly meant a format string;
/// otherwise the `%` is taken as literal text.
pub fn classify(text: &str) -> FormatStringKind {
    if !text.contains('%') {
        return FormatStringKind::Plain;
    }

    let regex = format_regex();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'%' => {
                let captures = match regex.captures_at(text, i) {
                    Some(c) if c.get(0).map(|m| m.start()) == Some(i) => c,
                    _ => return FormatStringKind::NotFormat,
                };
                let conversion = captures
                    .get(6)
                    .and_then(|m| m.as_str().chars().next())
                    .unwrap_or('%');
                let explicit = captures.get(1);
                let date = captures.get(5).is_some();
                let end = captures.get(0).map(|m| m.end()).unwrap_or(i + 1);
                if explicit.is_some_and(|m| explicit_index(m.as_str()).is_none()) {
                    return FormatStringKind::Invalid(text[i..end].to_string());
                }
                let explicit = explicit.is_some();
                let flags = captures.get(2).map(|m| m.as_str()).unwrap_or("");

                if !date && ConversionClass::of(conversion) == ConversionClass::Unknown {
                    if explicit {
                        return FormatStringKind::Invalid(text[i..end].to_string());
                    }
                    return FormatStringKind::NotFormat;
                }
                if !explicit && flags.contains(' ') {
                    // "50% off" parses as `% o`
                    return FormatStringKind::NotFormat;
                }
                i = end;
            }
            _ => i += 1,
        }
    }
    FormatStringKind::Format
}
