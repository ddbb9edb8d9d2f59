use super::common::{
    children_of_kind, named_children, node_text, normalize_type, parse_float_literal, parse_int_literal,
    unescape_string_literal, Annotation, AnnotationValue, CallSite, Caller, ClassInfo, ClassKind, Expr, ExprKind,
    FieldInfo, Language, MethodInfo, Parameter, Parser, Receiver, SourceUnit, Visibility,
};
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;
use tree_sitter::{Node, Parser as TsParser};

/// Calls that count as a runtime permission check in the calling method
const PERMISSION_CHECKS: &[&str] = &[
    "checkSelfPermission",
    "checkPermission",
    "checkCallingPermission",
    "checkCallingOrSelfPermission",
    "enforcePermission",
    "enforceCallingPermission",
    "enforceCallingOrSelfPermission",
];

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "annotation_type_declaration",
    "record_declaration",
];

/// Java source code parser using tree-sitter
pub struct JavaParser {
    parser: TsParser,
}

impl JavaParser {
    pub fn new() -> Result<Self> {
        let mut parser = TsParser::new();
        parser.set_language(&tree_sitter_java::language()).into_diagnostic()?;
        Ok(Self { parser })
    }
}

impl Parser for JavaParser {
    fn parse(&mut self, path: &Path, contents: &str) -> Result<SourceUnit> {
        let tree = self
            .parser
            .parse(contents, None)
            .ok_or_else(|| miette::miette!("Failed to parse Java file {}", path.display()))?;

        let mut lowering = Lowering::new(path, contents);
        lowering.program(tree.root_node());
        let unit = lowering.unit;

        debug!(
            "Parsed {}: {} classes, {} calls",
            path.display(),
            unit.classes.len(),
            unit.calls.len()
        );

        Ok(unit)
    }
}

/// Fields visible from code inside a class
struct ClassScope {
    qualified_name: String,
    fields: HashMap<String, String>,
}

/// Walks one syntax tree and builds its [`SourceUnit`]
struct Lowering<'a> {
    source: &'a str,
    unit: SourceUnit,
    classes: Vec<ClassScope>,

    /// Local variables and parameters, innermost block last
    scopes: Vec<HashMap<String, String>>,

    caller: Option<Caller>,
    caught: Vec<String>,
}

impl<'a> Lowering<'a> {
    fn new(path: &Path, source: &'a str) -> Self {
        Self {
            source,
            unit: SourceUnit::new(path, Language::Java),
            classes: Vec::new(),
            scopes: Vec::new(),
            caller: None,
            caught: Vec::new(),
        }
    }

    fn text(&self, node: Node) -> &'a str {
        &self.source[node.start_byte()..node.end_byte()]
    }

    fn field_text(&self, node: Node, field: &str) -> Option<&'a str> {
        node.child_by_field_name(field).map(|n| self.text(n))
    }

    fn program(&mut self, root: Node) {
        for child in named_children(root) {
            match child.kind() {
                "package_declaration" => {
                    self.unit.package = named_children(child)
                        .into_iter()
                        .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"))
                        .map(|n| self.text(n).to_string());
                }
                "import_declaration" => {
                    let name = named_children(child)
                        .into_iter()
                        .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"))
                        .map(|n| self.text(n).to_string());
                    if let Some(name) = name {
                        if children_of_kind(child, "asterisk").is_empty() {
                            self.unit.imports.push(name);
                        } else {
                            self.unit.imports.push(format!("{}.*", name));
                        }
                    }
                }
                kind if TYPE_DECLARATIONS.contains(&kind) => self.class(child),
                _ => {}
            }
        }
    }

    fn class(&mut self, node: Node) {
        let name = self.field_text(node, "name").unwrap_or("<anonymous>").to_string();
        let qualified_name = match self.classes.last() {
            Some(outer) => format!("{}.{}", outer.qualified_name, name),
            None => match &self.unit.package {
                Some(pkg) => format!("{}.{}", pkg, name),
                None => name.clone(),
            },
        };
        let top_level = self
            .classes
            .first()
            .map(|c| c.qualified_name.clone())
            .unwrap_or_else(|| qualified_name.clone());
        let kind = match node.kind() {
            "interface_declaration" => ClassKind::Interface,
            "enum_declaration" => ClassKind::Enum,
            "annotation_type_declaration" => ClassKind::Annotation,
            _ => ClassKind::Class,
        };
        let superclass = node
            .child_by_field_name("superclass")
            .and_then(|s| named_children(s).into_iter().next())
            .map(|t| normalize_type(self.text(t)));
        let annotations = self.annotations(node);
        let members = node.child_by_field_name("body").map(members).unwrap_or_default();

        // Field types first so method bodies can resolve them
        let mut field_types = HashMap::new();
        for member in &members {
            if matches!(member.kind(), "field_declaration" | "constant_declaration") {
                let type_name = self.field_text(*member, "type").map(normalize_type).unwrap_or_default();
                for declarator in children_of_kind(*member, "variable_declarator") {
                    if let Some(field) = self.field_text(declarator, "name") {
                        field_types.insert(field.to_string(), type_name.clone());
                    }
                }
            } else if member.kind() == "enum_constant" {
                if let Some(constant) = self.field_text(*member, "name") {
                    field_types.insert(constant.to_string(), name.clone());
                }
            }
        }
        self.classes.push(ClassScope {
            qualified_name: qualified_name.clone(),
            fields: field_types,
        });

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        for member in members {
            match member.kind() {
                "field_declaration" | "constant_declaration" => {
                    fields.extend(self.fields(member, kind == ClassKind::Interface));
                }
                "enum_constant" => {
                    if let Some(constant) = self.field_text(member, "name") {
                        fields.push(FieldInfo {
                            name: constant.to_string(),
                            type_name: name.clone(),
                            annotations: Vec::new(),
                            is_static: true,
                            is_final: true,
                            initializer: None,
                        });
                    }
                    self.walk_detached(member);
                }
                "method_declaration" | "constructor_declaration" => {
                    methods.push(self.method(member, &qualified_name, kind == ClassKind::Interface));
                }
                nested if TYPE_DECLARATIONS.contains(&nested) => self.class(member),
                "static_initializer" | "block" => self.walk_detached(member),
                _ => {}
            }
        }

        self.classes.pop();
        self.unit.classes.push(ClassInfo {
            name,
            qualified_name,
            kind,
            superclass,
            annotations,
            fields,
            methods,
            top_level,
            range: node.byte_range(),
        });
    }

    fn fields(&mut self, node: Node, in_interface: bool) -> Vec<FieldInfo> {
        let type_name = self.field_text(node, "type").map(normalize_type).unwrap_or_default();
        let modifiers = self.modifiers(node);
        let annotations = self.annotations(node);
        let is_static = in_interface || modifiers.contains(&"static");
        let is_final = in_interface || modifiers.contains(&"final");

        let mut fields = Vec::new();
        for declarator in children_of_kind(node, "variable_declarator") {
            let Some(name) = self.field_text(declarator, "name") else {
                continue;
            };
            let initializer = declarator.child_by_field_name("value").map(|value| {
                self.walk_detached(value);
                self.expr(value)
            });
            fields.push(FieldInfo {
                name: name.to_string(),
                type_name: type_name.clone(),
                annotations: annotations.clone(),
                is_static,
                is_final,
                initializer,
            });
        }
        fields
    }

    fn method(&mut self, node: Node, owner: &str, in_interface: bool) -> MethodInfo {
        let is_constructor = node.kind() == "constructor_declaration";
        let name = self.field_text(node, "name").unwrap_or("<init>").to_string();
        let modifiers = self.modifiers(node);
        let visibility = if modifiers.contains(&"private") {
            Visibility::Private
        } else if modifiers.contains(&"protected") {
            Visibility::Protected
        } else if modifiers.contains(&"public") || in_interface {
            Visibility::Public
        } else {
            Visibility::PackagePrivate
        };
        let annotations = self.annotations(node);
        let parameters = node
            .child_by_field_name("parameters")
            .map(|p| self.parameters(p))
            .unwrap_or_default();
        let return_type = if is_constructor {
            None
        } else {
            self.field_text(node, "type").map(normalize_type)
        };

        if let Some(body) = node.child_by_field_name("body") {
            let scope = parameters
                .iter()
                .map(|p| {
                    let type_name = if p.is_varargs {
                        format!("{}[]", p.type_name)
                    } else {
                        p.type_name.clone()
                    };
                    (p.name.clone(), type_name)
                })
                .collect();
            let caller = Caller {
                class: owner.to_string(),
                method: name.clone(),
                annotations: annotations.clone(),
                checks_permission: contains_call(body, PERMISSION_CHECKS, self.source),
            };

            let previous_caller = self.caller.replace(caller);
            let previous_caught = std::mem::take(&mut self.caught);
            self.scopes.push(scope);
            self.walk(body);
            self.scopes.pop();
            self.caught = previous_caught;
            self.caller = previous_caller;
        }

        MethodInfo {
            name,
            owner: owner.to_string(),
            parameters,
            return_type,
            annotations,
            visibility,
            is_static: modifiers.contains(&"static"),
            is_constructor,
            range: node.byte_range(),
        }
    }

    fn parameters(&self, node: Node) -> Vec<Parameter> {
        let mut parameters = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "formal_parameter" => {
                    let (Some(name), Some(type_name)) = (self.field_text(child, "name"), self.field_text(child, "type"))
                    else {
                        continue;
                    };
                    parameters.push(Parameter {
                        name: name.to_string(),
                        type_name: normalize_type(type_name),
                        annotations: self.annotations(child),
                        is_varargs: false,
                    });
                }
                "spread_parameter" => {
                    let children = named_children(child);
                    let type_name = children
                        .iter()
                        .find(|n| !matches!(n.kind(), "modifiers" | "variable_declarator"))
                        .map(|n| normalize_type(self.text(*n)));
                    let name = children
                        .iter()
                        .find(|n| n.kind() == "variable_declarator")
                        .and_then(|d| self.field_text(*d, "name"));
                    if let (Some(name), Some(type_name)) = (name, type_name) {
                        parameters.push(Parameter {
                            name: name.to_string(),
                            type_name,
                            annotations: self.annotations(child),
                            is_varargs: true,
                        });
                    }
                }
                _ => {}
            }
        }
        parameters
    }

    fn modifiers(&self, node: Node) -> Vec<&'a str> {
        children_of_kind(node, "modifiers")
            .into_iter()
            .flat_map(|m| {
                let mut cursor = m.walk();
                m.children(&mut cursor)
                    .filter(|c| !matches!(c.kind(), "marker_annotation" | "annotation"))
                    .map(|c| self.text(c))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn annotations(&self, node: Node) -> Vec<Annotation> {
        children_of_kind(node, "modifiers")
            .into_iter()
            .flat_map(named_children)
            .filter(|m| matches!(m.kind(), "marker_annotation" | "annotation"))
            .map(|m| self.annotation(m))
            .collect()
    }

    fn annotation(&self, node: Node) -> Annotation {
        let name = self.field_text(node, "name").map(compact).unwrap_or_default();
        let mut arguments = Vec::new();
        if let Some(args) = node.child_by_field_name("arguments") {
            for arg in named_children(args) {
                if arg.kind() == "element_value_pair" {
                    let key = self.field_text(arg, "key").unwrap_or("value").to_string();
                    if let Some(value) = arg.child_by_field_name("value") {
                        arguments.push((key, self.annotation_value(value)));
                    }
                } else {
                    arguments.push(("value".to_string(), self.annotation_value(arg)));
                }
            }
        }
        Annotation {
            name,
            arguments,
            range: node.byte_range(),
        }
    }

    fn annotation_value(&self, node: Node) -> AnnotationValue {
        if node.kind() == "element_value_array_initializer" {
            return AnnotationValue::Array(
                named_children(node)
                    .into_iter()
                    .map(|n| self.annotation_value(n))
                    .collect(),
            );
        }
        match self.expr(node).kind {
            ExprKind::Int(v) => AnnotationValue::Int(v),
            ExprKind::Float(v) => AnnotationValue::Float(v),
            ExprKind::Bool(b) => AnnotationValue::Bool(b),
            ExprKind::Str(s) => AnnotationValue::Str(s),
            ExprKind::Name(n) => AnnotationValue::Name(n),
            _ => AnnotationValue::Other(compact(self.text(node))),
        }
    }

    /// Walk code outside any method, e.g. field initializers
    fn walk_detached(&mut self, node: Node) {
        let previous = self.caller.take();
        self.walk(node);
        self.caller = previous;
    }

    fn walk(&mut self, node: Node) {
        match node.kind() {
            "method_invocation" => {
                self.method_call(node);
                self.walk_children(node);
            }
            "object_creation_expression" => {
                self.constructor_call(node);
                for child in named_children(node) {
                    if child.kind() == "class_body" {
                        self.anonymous_class(child);
                    } else {
                        self.walk(child);
                    }
                }
            }
            "local_variable_declaration" => {
                self.walk_children(node);
                let type_name = self.field_text(node, "type").map(normalize_type).unwrap_or_default();
                for declarator in children_of_kind(node, "variable_declarator") {
                    if let Some(name) = self.field_text(declarator, "name") {
                        let declared = if type_name == "var" {
                            declarator
                                .child_by_field_name("value")
                                .and_then(|v| self.expr(v).type_name)
                                .unwrap_or_default()
                        } else {
                            type_name.clone()
                        };
                        self.declare(name, declared);
                    }
                }
            }
            "block" | "constructor_body" | "switch_block" | "for_statement" => {
                self.scopes.push(HashMap::new());
                self.walk_children(node);
                self.scopes.pop();
            }
            "enhanced_for_statement" => {
                self.scopes.push(HashMap::new());
                if let (Some(name), Some(type_name)) = (self.field_text(node, "name"), self.field_text(node, "type")) {
                    self.declare(name, normalize_type(type_name));
                }
                self.walk_children(node);
                self.scopes.pop();
            }
            "try_statement" | "try_with_resources_statement" => self.try_statement(node),
            "catch_clause" => {
                self.scopes.push(HashMap::new());
                for param in children_of_kind(node, "catch_formal_parameter") {
                    if let Some(name) = self.field_text(param, "name") {
                        let type_name = self.catch_types(param).into_iter().next().unwrap_or_default();
                        self.declare(name, type_name);
                    }
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.walk(body);
                }
                self.scopes.pop();
            }
            "lambda_expression" => {
                self.scopes.push(HashMap::new());
                if let Some(body) = node.child_by_field_name("body") {
                    self.walk(body);
                }
                self.scopes.pop();
            }
            kind if TYPE_DECLARATIONS.contains(&kind) => self.class(node),
            _ => self.walk_children(node),
        }
    }

    fn walk_children(&mut self, node: Node) {
        for child in named_children(node) {
            self.walk(child);
        }
    }

    fn try_statement(&mut self, node: Node) {
        let caught: Vec<String> = children_of_kind(node, "catch_clause")
            .into_iter()
            .flat_map(|clause| children_of_kind(clause, "catch_formal_parameter"))
            .flat_map(|param| self.catch_types(param))
            .collect();

        self.scopes.push(HashMap::new());
        if let Some(resources) = node.child_by_field_name("resources") {
            self.walk(resources);
        }
        if let Some(body) = node.child_by_field_name("body") {
            let depth = self.caught.len();
            self.caught.extend(caught);
            self.walk(body);
            self.caught.truncate(depth);
        }
        self.scopes.pop();

        for child in named_children(node) {
            if matches!(child.kind(), "catch_clause" | "finally_clause") {
                self.walk(child);
            }
        }
    }

    fn catch_types(&self, param: Node) -> Vec<String> {
        children_of_kind(param, "catch_type")
            .into_iter()
            .flat_map(named_children)
            .map(|t| normalize_type(self.text(t)))
            .collect()
    }

    fn anonymous_class(&mut self, body: Node) {
        let owner = self
            .classes
            .last()
            .map(|c| c.qualified_name.clone())
            .unwrap_or_default();
        for member in named_children(body) {
            if member.kind() == "method_declaration" {
                self.method(member, &owner, false);
            } else {
                self.walk(member);
            }
        }
    }

    fn method_call(&mut self, node: Node) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let object = node.child_by_field_name("object");
        let receiver = match object {
            Some(o) => self.receiver(o),
            None => Receiver::Implicit,
        };
        let call = CallSite {
            name: self.text(name_node).to_string(),
            receiver,
            receiver_text: object.map(|o| compact(self.text(o))),
            args: self.arguments(node),
            is_constructor: false,
            result_unused: is_expression_statement(node),
            caught: self.caught.clone(),
            caller: self.caller.clone(),
            range: node.byte_range(),
            name_range: name_node.byte_range(),
        };
        self.unit.calls.push(call);
    }

    fn constructor_call(&mut self, node: Node) {
        let Some(type_node) = node.child_by_field_name("type") else {
            return;
        };
        let type_name = normalize_type(self.text(type_node));
        let simple = type_name.rsplit('.').next().unwrap_or(&type_name).to_string();
        let call = CallSite {
            name: simple,
            receiver: Receiver::Type(type_name),
            receiver_text: None,
            args: self.arguments(node),
            is_constructor: true,
            result_unused: is_expression_statement(node),
            caught: self.caught.clone(),
            caller: self.caller.clone(),
            range: node.byte_range(),
            name_range: node.start_byte()..type_node.end_byte(),
        };
        self.unit.calls.push(call);
    }

    fn arguments(&self, node: Node) -> Vec<Expr> {
        node.child_by_field_name("arguments")
            .map(|args| named_children(args).into_iter().map(|a| self.expr(a)).collect())
            .unwrap_or_default()
    }

    fn receiver(&self, node: Node) -> Receiver {
        match node.kind() {
            "this" => Receiver::Implicit,
            "super" => Receiver::Super,
            "identifier" => {
                let name = self.text(node);
                match self.lookup(name) {
                    Some(type_name) => Receiver::Type(type_name),
                    None if starts_uppercase(name) => Receiver::Type(name.to_string()),
                    None => Receiver::Unknown,
                }
            }
            "field_access" => {
                let path = compact(self.text(node));
                if let Some(field) = path.strip_prefix("this.") {
                    return self.lookup_field(field).map(Receiver::Type).unwrap_or(Receiver::Unknown);
                }
                let last = path.rsplit('.').next().unwrap_or(&path);
                if starts_uppercase(last) && last.chars().any(|c| c.is_lowercase()) {
                    Receiver::Type(path)
                } else {
                    Receiver::Unknown
                }
            }
            "object_creation_expression" => self
                .field_text(node, "type")
                .map(|t| Receiver::Type(normalize_type(t)))
                .unwrap_or(Receiver::Unknown),
            "parenthesized_expression" | "cast_expression" => match self.expr(node).type_name {
                Some(type_name) => Receiver::Type(type_name),
                None => Receiver::Unknown,
            },
            _ => Receiver::Unknown,
        }
    }

    fn declare(&mut self, name: &str, type_name: String) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), type_name);
        }
    }

    fn lookup(&self, name: &str) -> Option<String> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
            .or_else(|| self.lookup_field(name))
    }

    fn lookup_field(&self, name: &str) -> Option<String> {
        self.classes
            .iter()
            .rev()
            .find_map(|class| class.fields.get(name))
            .cloned()
    }

    fn expr(&self, node: Node) -> Expr {
        let range = node.byte_range();
        let text = self.text(node);
        let (kind, type_name) = match node.kind() {
            "decimal_integer_literal" | "hex_integer_literal" | "octal_integer_literal" | "binary_integer_literal" => {
                let type_name = if text.ends_with(['l', 'L']) { "long" } else { "int" };
                match parse_int_literal(text) {
                    Some(v) => (ExprKind::Int(v), Some(type_name.to_string())),
                    None => (ExprKind::Other, Some(type_name.to_string())),
                }
            }
            "decimal_floating_point_literal" | "hex_floating_point_literal" => {
                let type_name = if text.ends_with(['f', 'F']) { "float" } else { "double" };
                match parse_float_literal(text) {
                    Some(v) => (ExprKind::Float(v), Some(type_name.to_string())),
                    None => (ExprKind::Other, Some(type_name.to_string())),
                }
            }
            "true" => (ExprKind::Bool(true), Some("boolean".to_string())),
            "false" => (ExprKind::Bool(false), Some("boolean".to_string())),
            "null_literal" => (ExprKind::Null, None),
            "character_literal" => {
                let body = text.trim_start_matches('\'').trim_end_matches('\'');
                let c = unescape_string_literal(body).chars().next().unwrap_or('\0');
                (ExprKind::Char(c), Some("char".to_string()))
            }
            "string_literal" | "text_block" => {
                let body = text.trim_start_matches('"').trim_end_matches('"');
                (ExprKind::Str(unescape_string_literal(body)), Some("String".to_string()))
            }
            "parenthesized_expression" => {
                return match named_children(node).into_iter().next() {
                    Some(inner) => Expr { range, ..self.expr(inner) },
                    None => Expr::new(ExprKind::Other, None, range),
                };
            }
            "unary_expression" => {
                let operator = self.field_text(node, "operator").unwrap_or("");
                let operand = node.child_by_field_name("operand").map(|o| self.expr(o));
                match (operator, operand) {
                    ("-", Some(Expr { kind: ExprKind::Int(v), type_name, .. })) => (ExprKind::Int(-v), type_name),
                    ("-", Some(Expr { kind: ExprKind::Float(v), type_name, .. })) => (ExprKind::Float(-v), type_name),
                    ("+", Some(operand)) => (operand.kind, operand.type_name),
                    ("!", _) => (ExprKind::Other, Some("boolean".to_string())),
                    (_, Some(operand)) => (ExprKind::Other, operand.type_name),
                    (_, None) => (ExprKind::Other, None),
                }
            }
            "identifier" => (ExprKind::Name(text.to_string()), self.lookup(text)),
            "field_access" => {
                let path = compact(text);
                let expr = Expr::new(ExprKind::Name(path.clone()), None, range.clone());
                let type_name = if expr.resource_reference().is_some() {
                    Some("int".to_string())
                } else if let Some(field) = path.strip_prefix("this.") {
                    self.lookup_field(field)
                } else {
                    None
                };
                (expr.kind, type_name)
            }
            "method_invocation" => {
                let name = self.field_text(node, "name").unwrap_or("").to_string();
                let receiver = self.field_text(node, "object").map(compact);
                let type_name = match (receiver.as_deref(), name.as_str()) {
                    (_, "toString") | (Some("String"), "valueOf" | "format") => Some("String".to_string()),
                    _ => None,
                };
                (
                    ExprKind::Call {
                        name,
                        args: self.arguments(node),
                    },
                    type_name,
                )
            }
            "object_creation_expression" => {
                let type_name = self.field_text(node, "type").map(normalize_type);
                (ExprKind::New(type_name.clone().unwrap_or_default()), type_name)
            }
            "array_creation_expression" => {
                let element_type = self.field_text(node, "type").map(normalize_type);
                let elements = node
                    .child_by_field_name("value")
                    .map(|init| named_children(init).into_iter().map(|e| self.expr(e)).collect());
                let type_name = element_type.as_ref().map(|t| format!("{}[]", t));
                match elements {
                    Some(elements) => (ExprKind::ArrayInit { element_type, elements }, type_name),
                    None => (ExprKind::Other, type_name),
                }
            }
            "array_initializer" => {
                let elements = named_children(node).into_iter().map(|e| self.expr(e)).collect();
                (
                    ExprKind::ArrayInit {
                        element_type: None,
                        elements,
                    },
                    None,
                )
            }
            "cast_expression" => {
                let type_name = self.field_text(node, "type").map(normalize_type);
                let kind = node
                    .child_by_field_name("value")
                    .map(|v| self.expr(v).kind)
                    .unwrap_or(ExprKind::Other);
                (kind, type_name)
            }
            "binary_expression" => {
                let operator = self.field_text(node, "operator").unwrap_or("");
                let left = node.child_by_field_name("left").and_then(|l| self.expr(l).type_name);
                let right = node.child_by_field_name("right").and_then(|r| self.expr(r).type_name);
                (ExprKind::Other, binary_type(operator, left.as_deref(), right.as_deref()))
            }
            "ternary_expression" => {
                let type_name = node
                    .child_by_field_name("consequence")
                    .and_then(|c| self.expr(c).type_name);
                (ExprKind::Other, type_name)
            }
            "instanceof_expression" => (ExprKind::Other, Some("boolean".to_string())),
            _ => (ExprKind::Other, None),
        };
        Expr::new(kind, type_name, range)
    }
}

/// Members of a class, enum or interface body
fn members(body: Node) -> Vec<Node> {
    let mut out = Vec::new();
    for child in named_children(body) {
        if child.kind() == "enum_body_declarations" {
            out.extend(named_children(child));
        } else {
            out.push(child);
        }
    }
    out
}

fn is_expression_statement(node: Node) -> bool {
    node.parent().map(|p| p.kind() == "expression_statement").unwrap_or(false)
}

fn contains_call(node: Node, names: &[&str], source: &str) -> bool {
    if node.kind() == "method_invocation" {
        if let Some(name) = node.child_by_field_name("name") {
            if names.contains(&node_text(name, source)) {
                return true;
            }
        }
    }
    named_children(node).into_iter().any(|child| contains_call(child, names, source))
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

/// Primitive type of a boxed or primitive Java type name
pub fn unbox(type_name: &str) -> &str {
    match type_name {
        "Integer" | "java.lang.Integer" => "int",
        "Long" | "java.lang.Long" => "long",
        "Short" | "java.lang.Short" => "short",
        "Byte" | "java.lang.Byte" => "byte",
        "Float" | "java.lang.Float" => "float",
        "Double" | "java.lang.Double" => "double",
        "Boolean" | "java.lang.Boolean" => "boolean",
        "Character" | "java.lang.Character" => "char",
        other => other,
    }
}

fn numeric_rank(type_name: &str) -> Option<u8> {
    match unbox(type_name) {
        "byte" | "short" | "char" | "int" => Some(1),
        "long" => Some(2),
        "float" => Some(3),
        "double" => Some(4),
        _ => None,
    }
}

fn binary_type(operator: &str, left: Option<&str>, right: Option<&str>) -> Option<String> {
    let is_string = |t: Option<&str>| matches!(t, Some("String" | "java.lang.String"));
    match operator {
        "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" => Some("boolean".to_string()),
        "+" if is_string(left) || is_string(right) => Some("String".to_string()),
        "<<" | ">>" | ">>>" => left.and_then(numeric_rank).map(|r| rank_type(r.min(2)).to_string()),
        "&" | "|" | "^" if left == Some("boolean") && right == Some("boolean") => Some("boolean".to_string()),
        _ => {
            let rank = numeric_rank(left?)?.max(numeric_rank(right?)?);
            Some(rank_type(rank).to_string())
        }
    }
}

fn rank_type(rank: u8) -> &'static str {
    match rank {
        1 => "int",
        2 => "long",
        3 => "float",
        _ => "double",
    }
}
