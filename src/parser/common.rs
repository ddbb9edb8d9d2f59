//! Language-neutral model of a parsed source file
//!
//! The Java and Kotlin parsers lower tree-sitter syntax trees into these owned
//! structures so detectors never touch syntax nodes. Expression types and call
//! receivers are resolved against local scope while parsing; anything that
//! needs the whole project (superclasses, constants) is resolved later by the
//! detectors through [`crate::project::Project`].

use miette::Result;
use std::ops::Range;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Java,
    Kotlin,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::Kotlin => "kotlin",
        }
    }
}

/// Trait for language-specific parsers
pub trait Parser {
    /// Parse a source file into its owned model
    fn parse(&mut self, path: &Path, contents: &str) -> Result<SourceUnit>;
}

/// Everything detectors need from one Java or Kotlin file
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub language: Language,
    pub package: Option<String>,
    pub imports: Vec<String>,

    /// All classes in the file, nested ones included
    pub classes: Vec<ClassInfo>,

    /// Method calls and constructor invocations in source order
    pub calls: Vec<CallSite>,
}

impl SourceUnit {
    pub fn new(path: &Path, language: Language) -> Self {
        Self {
            path: path.to_path_buf(),
            language,
            package: None,
            imports: Vec::new(),
            classes: Vec::new(),
            calls: Vec::new(),
        }
    }

    pub fn class(&self, qualified_name: &str) -> Option<&ClassInfo> {
        self.classes.iter().find(|c| c.qualified_name == qualified_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Visibility {
    Private,
    PackagePrivate,
    Protected,
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: String,
    pub qualified_name: String,
    pub kind: ClassKind,

    /// Superclass as written (simple or qualified name, generics stripped)
    pub superclass: Option<String>,

    pub annotations: Vec<Annotation>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,

    /// Qualified name of the outermost enclosing class
    pub top_level: String,

    pub range: Range<usize>,
}

impl ClassInfo {
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn annotation(&self, names: &[&str]) -> Option<&Annotation> {
        find_annotation(&self.annotations, names)
    }
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub type_name: String,
    pub annotations: Vec<Annotation>,
    pub is_static: bool,
    pub is_final: bool,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
    pub annotations: Vec<Annotation>,
    pub is_varargs: bool,
}

#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub name: String,

    /// Qualified name of the declaring class
    pub owner: String,

    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub annotations: Vec<Annotation>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_constructor: bool,
    pub range: Range<usize>,
}

impl MethodInfo {
    pub fn is_varargs(&self) -> bool {
        self.parameters.last().map(|p| p.is_varargs).unwrap_or(false)
    }

    /// Whether a call with `count` arguments can bind to this method
    pub fn accepts_arity(&self, count: usize) -> bool {
        let declared = self.parameters.len();
        if self.is_varargs() {
            count + 1 >= declared
        } else {
            count == declared
        }
    }

    /// The parameter an argument at `index` binds to
    pub fn parameter_for_argument(&self, index: usize) -> Option<&Parameter> {
        match self.parameters.get(index) {
            Some(p) => Some(p),
            None if self.is_varargs() => self.parameters.last(),
            None => None,
        }
    }

    pub fn annotation(&self, names: &[&str]) -> Option<&Annotation> {
        find_annotation(&self.annotations, names)
    }
}

/// Annotation usage with its arguments
#[derive(Debug, Clone)]
pub struct Annotation {
    /// Name as written, possibly qualified
    pub name: String,

    /// Named arguments; a lone positional argument is stored as `value`
    pub arguments: Vec<(String, AnnotationValue)>,

    pub range: Range<usize>,
}

impl Annotation {
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn value(&self, key: &str) -> Option<&AnnotationValue> {
        self.arguments.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Find an annotation by simple name, accepting support and androidx packages
pub fn find_annotation<'a>(annotations: &'a [Annotation], names: &[&str]) -> Option<&'a Annotation> {
    annotations.iter().find(|a| {
        let simple = a.simple_name();
        names.contains(&simple) && is_known_annotation_package(&a.name, simple)
    })
}

fn is_known_annotation_package(name: &str, simple: &str) -> bool {
    if name == simple {
        return true;
    }
    let package = &name[..name.len() - simple.len() - 1];
    matches!(
        package,
        "android.support.annotation" | "androidx.annotation" | "android.annotation"
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),

    /// A constant reference such as `Foo.BAR`
    Name(String),

    Array(Vec<AnnotationValue>),
    Other(String),
}

impl AnnotationValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AnnotationValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AnnotationValue::Int(v) => Some(*v as f64),
            AnnotationValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnnotationValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Flatten a single value or an array into its elements
    pub fn elements(&self) -> Vec<&AnnotationValue> {
        match self {
            AnnotationValue::Array(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    /// String or constant-name text of the value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnnotationValue::Str(s) | AnnotationValue::Name(s) | AnnotationValue::Other(s) => Some(s),
            _ => None,
        }
    }
}

/// How the receiver of a call was written, resolved where possible
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// `m()` or `this.m()`
    Implicit,

    /// `super.m()`
    Super,

    /// A receiver of known type: typed variable, class name or `new T()`
    Type(String),

    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
    Bool(bool),
    Null,

    /// Identifier or dotted field access, e.g. `count`, `Foo.BAR`, `R.string.name`
    Name(String),

    /// Nested call such as `getString(R.string.x)`
    Call { name: String, args: Vec<Expr> },

    /// `new T[] { ... }` or `arrayOf(...)`
    ArrayInit { element_type: Option<String>, elements: Vec<Expr> },

    /// `new T(...)`
    New(String),

    Other,
}

/// An argument or initializer expression
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,

    /// Static type, when it can be decided from literals and declarations in scope
    pub type_name: Option<String>,

    pub range: Range<usize>,
}

impl Expr {
    pub fn new(kind: ExprKind, type_name: Option<String>, range: Range<usize>) -> Self {
        Self { kind, type_name, range }
    }

    /// `(type, name)` when the expression is an `R.type.name` reference
    pub fn resource_reference(&self) -> Option<(&str, &str)> {
        let ExprKind::Name(path) = &self.kind else {
            return None;
        };
        let path = path.strip_prefix("android.").unwrap_or(path);
        let mut parts = path.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("R"), Some(kind), Some(name), None) => Some((kind, name)),
            _ => None,
        }
    }
}

/// Method that contains a call
#[derive(Debug, Clone)]
pub struct Caller {
    /// Qualified name of the enclosing class
    pub class: String,

    pub method: String,
    pub annotations: Vec<Annotation>,

    /// Whether the method body calls `checkSelfPermission` or a similar check
    pub checks_permission: bool,
}

#[derive(Debug, Clone)]
pub struct CallSite {
    /// Method name, or the class name for constructor calls
    pub name: String,

    pub receiver: Receiver,

    /// Receiver as written, e.g. `String` or `context`
    pub receiver_text: Option<String>,

    pub args: Vec<Expr>,
    pub is_constructor: bool,

    /// The call is an expression statement and its result is discarded
    pub result_unused: bool,

    /// Exception types caught by enclosing `try` blocks
    pub caught: Vec<String>,

    pub caller: Option<Caller>,

    /// Whole call expression
    pub range: Range<usize>,

    /// Method name (or `new T` for constructors)
    pub name_range: Range<usize>,
}

/// Strip generics, array brackets and whitespace from a written type
pub fn normalize_type(text: &str) -> String {
    let base = text.split('<').next().unwrap_or(text);
    base.chars().filter(|c| !c.is_whitespace()).collect::<String>()
}

/// Extract text from a node
pub fn node_text<'a>(node: tree_sitter::Node<'a>, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// Find all children of a specific kind
pub fn children_of_kind<'a>(node: tree_sitter::Node<'a>, kind: &str) -> Vec<tree_sitter::Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).filter(|child| child.kind() == kind).collect()
}

/// Named children of a node, comments excluded
pub fn named_children(node: tree_sitter::Node) -> Vec<tree_sitter::Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).filter(|n| !n.is_extra()).collect()
}

/// Parse a Java or Kotlin integer literal, including hex, binary and underscores
pub fn parse_int_literal(text: &str) -> Option<i64> {
    let cleaned: String = text
        .trim_end_matches(['l', 'L', 'u', 'U'])
        .chars()
        .filter(|c| *c != '_')
        .collect();
    if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(bin) = cleaned.strip_prefix("0b").or_else(|| cleaned.strip_prefix("0B")) {
        return i64::from_str_radix(bin, 2).ok();
    }
    if cleaned.len() > 1 && cleaned.starts_with('0') && cleaned.chars().all(|c| c.is_ascii_digit()) {
        return i64::from_str_radix(&cleaned[1..], 8).ok();
    }
    cleaned.parse().ok()
}

pub fn parse_float_literal(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim_end_matches(['f', 'F', 'd', 'D'])
        .chars()
        .filter(|c| *c != '_')
        .collect();
    cleaned.parse().ok()
}

/// Decode the body of a string literal, handling the common escapes
pub fn unescape_string_literal(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(name: &str) -> Annotation {
        Annotation {
            name: name.to_string(),
            arguments: vec![],
            range: 0..0,
        }
    }

    #[test]
    fn test_find_annotation_packages() {
        let annotations = vec![annotation("android.support.annotation.UiThread")];
        assert!(find_annotation(&annotations, &["UiThread"]).is_some());

        let annotations = vec![annotation("androidx.annotation.IntRange")];
        assert!(find_annotation(&annotations, &["IntRange"]).is_some());

        let annotations = vec![annotation("com.example.UiThread")];
        assert!(find_annotation(&annotations, &["UiThread"]).is_none());
    }

    #[test]
    fn test_resource_reference() {
        let expr = Expr::new(ExprKind::Name("R.string.app_name".to_string()), None, 0..0);
        assert_eq!(expr.resource_reference(), Some(("string", "app_name")));

        let expr = Expr::new(ExprKind::Name("android.R.drawable.ic".to_string()), None, 0..0);
        assert_eq!(expr.resource_reference(), Some(("drawable", "ic")));

        let expr = Expr::new(ExprKind::Name("Foo.BAR".to_string()), None, 0..0);
        assert_eq!(expr.resource_reference(), None);
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse_int_literal("0x10"), Some(16));
        assert_eq!(parse_int_literal("1_000L"), Some(1000));
        assert_eq!(parse_float_literal("2.5f"), Some(2.5));
        assert_eq!(unescape_string_literal(r#"a\"b\n"#), "a\"b\n");
    }

    #[test]
    fn test_varargs_arity() {
        let param = |name: &str, varargs| Parameter {
            name: name.to_string(),
            type_name: "int".to_string(),
            annotations: vec![],
            is_varargs: varargs,
        };
        let method = MethodInfo {
            name: "m".to_string(),
            owner: "p.A".to_string(),
            parameters: vec![param("a", false), param("rest", true)],
            return_type: None,
            annotations: vec![],
            visibility: Visibility::Public,
            is_static: false,
            is_constructor: false,
            range: 0..0,
        };
        assert!(method.accepts_arity(1));
        assert!(method.accepts_arity(4));
        assert!(!method.accepts_arity(0));
        assert_eq!(method.parameter_for_argument(3).map(|p| p.name.as_str()), Some("rest"));
    }
}
