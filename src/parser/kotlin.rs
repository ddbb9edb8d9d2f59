use super::common::{
    named_children, node_text, parse_float_literal, parse_int_literal, unescape_string_literal, CallSite, Expr,
    ExprKind, Language, Parser, Receiver, SourceUnit,
};
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;
use tree_sitter::{Node, Parser as TsParser};

/// Kotlin source parser using tree-sitter
///
/// Kotlin files contribute call sites only: the string format checks look at
/// `getString`/`String.format` calls in both languages, while the annotation
/// checks work on the Java model.
pub struct KotlinParser {
    parser: TsParser,
}

impl KotlinParser {
    pub fn new() -> Result<Self> {
        let mut parser = TsParser::new();
        parser.set_language(&tree_sitter_kotlin::language()).into_diagnostic()?;
        Ok(Self { parser })
    }
}

impl Parser for KotlinParser {
    fn parse(&mut self, path: &Path, contents: &str) -> Result<SourceUnit> {
        let tree = self
            .parser
            .parse(contents, None)
            .ok_or_else(|| miette::miette!("Failed to parse Kotlin file {}", path.display()))?;
        let root = tree.root_node();

        let mut unit = SourceUnit::new(path, Language::Kotlin);
        for child in named_children(root) {
            match child.kind() {
                "package_header" => {
                    unit.package = named_children(child)
                        .into_iter()
                        .find(|n| n.kind() == "identifier")
                        .map(|n| node_text(n, contents).to_string());
                }
                "import_list" => {
                    for header in named_children(child) {
                        if let Some(id) = named_children(header).into_iter().find(|n| n.kind() == "identifier") {
                            unit.imports.push(node_text(id, contents).to_string());
                        }
                    }
                }
                _ => {}
            }
        }

        let mut lowering = Lowering {
            source: contents,
            variables: HashMap::new(),
            calls: Vec::new(),
        };
        lowering.collect_variables(root);
        lowering.walk(root);
        unit.calls = lowering.calls;

        debug!("Parsed {}: {} calls", path.display(), unit.calls.len());
        Ok(unit)
    }
}

struct Lowering<'a> {
    source: &'a str,

    /// Declared or inferred type per variable name; `None` when declarations disagree
    variables: HashMap<String, Option<String>>,

    calls: Vec<CallSite>,
}

impl<'a> Lowering<'a> {
    fn text(&self, node: Node) -> &'a str {
        &self.source[node.start_byte()..node.end_byte()]
    }

    fn collect_variables(&mut self, node: Node) {
        match node.kind() {
            "property_declaration" => {
                let children = named_children(node);
                let declaration = children.iter().find(|n| n.kind() == "variable_declaration");
                if let Some(declaration) = declaration {
                    let parts = named_children(*declaration);
                    let name = parts.iter().find(|n| n.kind() == "simple_identifier").map(|n| self.text(*n));
                    let declared = parts
                        .iter()
                        .find(|n| matches!(n.kind(), "user_type" | "nullable_type"))
                        .map(|n| kotlin_type(self.text(*n)));
                    let inferred = children
                        .iter()
                        .skip_while(|n| n.kind() != "variable_declaration")
                        .nth(1)
                        .and_then(|value| self.expr(*value).type_name);
                    if let Some(name) = name {
                        self.record(name, declared.or(inferred));
                    }
                }
            }
            "parameter" | "class_parameter" => {
                let parts = named_children(node);
                let name = parts.iter().find(|n| n.kind() == "simple_identifier").map(|n| self.text(*n));
                let declared = parts
                    .iter()
                    .find(|n| matches!(n.kind(), "user_type" | "nullable_type"))
                    .map(|n| kotlin_type(self.text(*n)));
                if let Some(name) = name {
                    self.record(name, declared);
                }
            }
            _ => {}
        }
        for child in named_children(node) {
            self.collect_variables(child);
        }
    }

    fn record(&mut self, name: &str, type_name: Option<String>) {
        match self.variables.get(name) {
            Some(existing) if *existing != type_name => {
                self.variables.insert(name.to_string(), None);
            }
            Some(_) => {}
            None => {
                self.variables.insert(name.to_string(), type_name);
            }
        }
    }

    fn lookup(&self, name: &str) -> Option<String> {
        self.variables.get(name).cloned().flatten()
    }

    fn walk(&mut self, node: Node) {
        if node.kind() == "call_expression" {
            if let Some(call) = self.call(node) {
                self.calls.push(call);
            }
        }
        for child in named_children(node) {
            self.walk(child);
        }
    }

    fn call(&self, node: Node) -> Option<CallSite> {
        let children = named_children(node);
        let callee = *children.first()?;
        let suffix = children.iter().find(|n| n.kind() == "call_suffix")?;

        let (name_node, receiver_node) = match callee.kind() {
            "simple_identifier" => (callee, None),
            "navigation_expression" => {
                let parts = named_children(callee);
                let navigation = parts.iter().find(|n| n.kind() == "navigation_suffix")?;
                let name = named_children(*navigation)
                    .into_iter()
                    .find(|n| n.kind() == "simple_identifier")?;
                (name, parts.first().copied())
            }
            _ => return None,
        };
        let name = self.text(name_node).to_string();
        let receiver = match receiver_node {
            None => Receiver::Implicit,
            Some(r) if r.kind() == "this_expression" => Receiver::Implicit,
            Some(r) if r.kind() == "super_expression" => Receiver::Super,
            Some(r) if r.kind() == "simple_identifier" => {
                let text = self.text(r);
                match self.lookup(text) {
                    Some(type_name) => Receiver::Type(type_name),
                    None if text.starts_with(char::is_uppercase) => Receiver::Type(text.to_string()),
                    None => Receiver::Unknown,
                }
            }
            Some(_) => Receiver::Unknown,
        };

        // A capitalised call without receiver is a constructor call
        let is_constructor = receiver_node.is_none() && name.starts_with(char::is_uppercase);

        Some(CallSite {
            receiver: if is_constructor { Receiver::Type(name.clone()) } else { receiver },
            receiver_text: receiver_node.map(|r| compact(self.text(r))),
            name,
            args: self.arguments(*suffix),
            is_constructor,
            result_unused: node
                .parent()
                .map(|p| p.kind() == "statements" || p.kind() == "source_file")
                .unwrap_or(false),
            caught: Vec::new(),
            caller: None,
            range: node.byte_range(),
            name_range: name_node.byte_range(),
        })
    }

    fn arguments(&self, suffix: Node) -> Vec<Expr> {
        named_children(suffix)
            .into_iter()
            .filter(|n| n.kind() == "value_arguments")
            .flat_map(named_children)
            .filter(|n| n.kind() == "value_argument")
            .filter_map(|arg| named_children(arg).last().map(|value| self.expr(*value)))
            .collect()
    }

    fn expr(&self, node: Node) -> Expr {
        let range = node.byte_range();
        let text = self.text(node);
        let (kind, type_name) = match node.kind() {
            "integer_literal" | "hex_literal" | "bin_literal" => match parse_int_literal(text) {
                Some(v) => (ExprKind::Int(v), Some("int".to_string())),
                None => (ExprKind::Other, Some("int".to_string())),
            },
            "long_literal" => match parse_int_literal(text) {
                Some(v) => (ExprKind::Int(v), Some("long".to_string())),
                None => (ExprKind::Other, Some("long".to_string())),
            },
            "real_literal" => {
                let type_name = if text.ends_with(['f', 'F']) { "float" } else { "double" };
                match parse_float_literal(text) {
                    Some(v) => (ExprKind::Float(v), Some(type_name.to_string())),
                    None => (ExprKind::Other, Some(type_name.to_string())),
                }
            }
            "boolean_literal" => (ExprKind::Bool(text == "true"), Some("boolean".to_string())),
            "character_literal" => {
                let body = text.trim_start_matches('\'').trim_end_matches('\'');
                let c = unescape_string_literal(body).chars().next().unwrap_or('\0');
                (ExprKind::Char(c), Some("char".to_string()))
            }
            "string_literal" => {
                let body = text.trim_start_matches('"').trim_end_matches('"');
                (ExprKind::Str(unescape_string_literal(body)), Some("String".to_string()))
            }
            "prefix_expression" => {
                let operand = named_children(node).last().map(|o| self.expr(*o));
                match (text.starts_with('-'), operand) {
                    (true, Some(Expr { kind: ExprKind::Int(v), type_name, .. })) => (ExprKind::Int(-v), type_name),
                    (true, Some(Expr { kind: ExprKind::Float(v), type_name, .. })) => (ExprKind::Float(-v), type_name),
                    (_, Some(operand)) => (ExprKind::Other, operand.type_name),
                    (_, None) => (ExprKind::Other, None),
                }
            }
            "parenthesized_expression" => {
                return match named_children(node).into_iter().next() {
                    Some(inner) => Expr { range, ..self.expr(inner) },
                    None => Expr::new(ExprKind::Other, None, range),
                };
            }
            "simple_identifier" if text == "null" => (ExprKind::Null, None),
            "simple_identifier" => (ExprKind::Name(text.to_string()), self.lookup(text)),
            "navigation_expression" => {
                let path = compact(text);
                let expr = Expr::new(ExprKind::Name(path), None, range.clone());
                let type_name = expr.resource_reference().map(|_| "int".to_string());
                (expr.kind, type_name)
            }
            "call_expression" => match self.call(node) {
                Some(call) if call.name == "arrayOf" => (
                    ExprKind::ArrayInit {
                        element_type: None,
                        elements: call.args,
                    },
                    None,
                ),
                Some(call) => {
                    let type_name = match call.name.as_str() {
                        "toString" => Some("String".to_string()),
                        _ => None,
                    };
                    (
                        ExprKind::Call {
                            name: call.name,
                            args: call.args,
                        },
                        type_name,
                    )
                }
                None => (ExprKind::Other, None),
            },
            _ if text == "null" => (ExprKind::Null, None),
            _ => (ExprKind::Other, None),
        };
        Expr::new(kind, type_name, range)
    }
}

/// Java name of a Kotlin built-in type, used in type comparisons and messages
fn kotlin_type(text: &str) -> String {
    let base = compact(text);
    let base = base.trim_end_matches('?');
    match base {
        "Int" => "int",
        "Long" => "long",
        "Short" => "short",
        "Byte" => "byte",
        "Float" => "float",
        "Double" => "double",
        "Boolean" => "boolean",
        "Char" => "char",
        other => other.split('<').next().unwrap_or(other),
    }
    .to_string()
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
