//! Contracts declared with Android support annotations
//!
//! Every call in the project is resolved to a method declared in project
//! sources where possible; the callee's annotations and those on its
//! parameters are then checked against the arguments and the calling context.

mod check_result;
mod permission;
mod range;
mod resource_type;
mod thread;
mod typedef;
mod visibility;

use super::Detector;
use crate::lint::{Incident, Issue, Location};
use crate::parser::{CallSite, ClassInfo, Expr, ExprKind, FieldInfo, MethodInfo, Receiver, SourceUnit};
use crate::project::{Project, ProjectFile};

pub use check_result::CHECK_RESULT;
pub use permission::MISSING_PERMISSION;
pub use range::RANGE;
pub use resource_type::RESOURCE_TYPE;
pub use thread::WRONG_THREAD;
pub use typedef::WRONG_CONSTANT;
pub use visibility::VISIBLE_FOR_TESTS;

/// A call resolved to its declaration
pub(crate) struct CallContext<'a> {
    pub project: &'a Project,
    pub unit: &'a SourceUnit,
    pub file: &'a ProjectFile,
    pub call: &'a CallSite,
    pub method: &'a MethodInfo,
    pub class: &'a ClassInfo,
}

impl<'a> CallContext<'a> {
    pub fn location(&self, range: std::ops::Range<usize>) -> Location {
        Location::new(&self.file.path, &self.file.contents, range)
    }

    pub fn call_location(&self) -> Location {
        self.location(self.call.range.clone())
    }

    /// Class containing the call, when it is known
    pub fn caller_class(&self) -> Option<&'a ClassInfo> {
        let caller = self.call.caller.as_ref()?;
        self.project.find_class(&caller.class, Some(self.unit))
    }

    /// Literal value of an argument, following references to constants
    pub fn constant(&self, expr: &Expr) -> Option<ExprKind> {
        constant_value(self.project, self.unit, self.caller_class(), expr, 0)
    }

    /// Each argument with the parameter it binds to
    pub fn arguments(&self) -> impl Iterator<Item = (&'a Expr, &'a crate::parser::Parameter)> + '_ {
        self.call
            .args
            .iter()
            .enumerate()
            .filter_map(|(i, arg)| self.method.parameter_for_argument(i).map(|p| (arg, p)))
    }
}

/// Detector for support annotation contracts
pub struct SupportAnnotationDetector;

impl SupportAnnotationDetector {
    pub const ISSUES: &'static [&'static Issue] = &[
        &RANGE,
        &WRONG_CONSTANT,
        &RESOURCE_TYPE,
        &MISSING_PERMISSION,
        &WRONG_THREAD,
        &VISIBLE_FOR_TESTS,
        &CHECK_RESULT,
    ];

    pub fn new() -> Self {
        Self
    }

    /// The method a call invokes and the class declaring it
    fn resolve<'a>(
        &self,
        project: &'a Project,
        unit: &'a SourceUnit,
        call: &CallSite,
    ) -> Option<(&'a ClassInfo, &'a MethodInfo)> {
        let arity = call.args.len();

        if call.is_constructor {
            let Receiver::Type(type_name) = &call.receiver else {
                return None;
            };
            let class = project.find_class(type_name, Some(unit))?;
            return project.find_constructor(class, arity).map(|m| (class, m));
        }

        let candidates: Vec<&ClassInfo> = match &call.receiver {
            Receiver::Implicit => {
                let caller = call.caller.as_ref()?;
                let class = project.find_class(&caller.class, Some(unit))?;
                // Unqualified calls can reach methods of enclosing classes
                let mut chain = vec![class];
                let mut name = class.qualified_name.as_str();
                while let Some((outer, _)) = name.rsplit_once('.') {
                    match project.find_class(outer, None) {
                        Some(outer_class) if outer_class.qualified_name == outer => {
                            chain.push(outer_class);
                            name = &outer_class.qualified_name;
                        }
                        _ => break,
                    }
                }
                chain
            }
            Receiver::Super => {
                let caller = call.caller.as_ref()?;
                let class = project.find_class(&caller.class, Some(unit))?;
                let superclass = class.superclass.as_deref()?;
                vec![project.find_class(superclass, project.unit_of(class))?]
            }
            Receiver::Type(type_name) => vec![project.find_class(type_name, Some(unit))?],
            Receiver::Unknown => return None,
        };

        candidates.into_iter().find_map(|class| {
            let method = project.find_method(class, &call.name, arity)?;
            let owner = project.find_class(&method.owner, None).unwrap_or(class);
            Some((owner, method))
        })
    }
}

impl Default for SupportAnnotationDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for SupportAnnotationDetector {
    fn name(&self) -> &'static str {
        "SupportAnnotation"
    }

    fn issues(&self) -> &'static [&'static Issue] {
        Self::ISSUES
    }

    fn detect(&self, project: &Project) -> Vec<Incident> {
        let mut incidents = Vec::new();
        for unit in project.units() {
            let Some(file) = project.file(&unit.path) else {
                continue;
            };
            for call in &unit.calls {
                let Some((class, method)) = self.resolve(project, unit, call) else {
                    continue;
                };
                let context = CallContext {
                    project,
                    unit,
                    file,
                    call,
                    method,
                    class,
                };
                range::check(&context, &mut incidents);
                typedef::check(&context, &mut incidents);
                resource_type::check(&context, &mut incidents);
                permission::check(&context, &mut incidents);
                thread::check(&context, &mut incidents);
                visibility::check(&context, &mut incidents);
                check_result::check(&context, &mut incidents);
            }
        }
        incidents
    }
}

/// Classes whose fields are visible by simple name from code in `class`:
/// the class, its superclasses and its enclosing classes
fn field_scopes<'a>(project: &'a Project, class: &'a ClassInfo) -> Vec<&'a ClassInfo> {
    let mut scopes = project.class_hierarchy(class);
    let mut name = class.qualified_name.as_str();
    while let Some((outer, _)) = name.rsplit_once('.') {
        match project.find_class(outer, None) {
            Some(outer_class) if outer_class.qualified_name == outer => {
                scopes.extend(project.class_hierarchy(outer_class));
                name = &outer_class.qualified_name;
            }
            _ => break,
        }
    }
    scopes
}

/// Resolve a field reference written as `NAME` or `Type.NAME`
pub(crate) fn resolve_field<'a>(
    project: &'a Project,
    unit: &'a SourceUnit,
    class: Option<&'a ClassInfo>,
    path: &str,
) -> Option<(&'a ClassInfo, &'a FieldInfo)> {
    match path.rsplit_once('.') {
        Some((owner, field)) => {
            let owner = project.find_class(owner, Some(unit))?;
            project
                .class_hierarchy(owner)
                .into_iter()
                .find_map(|c| c.field(field).map(|f| (c, f)))
        }
        None => field_scopes(project, class?)
            .into_iter()
            .find_map(|c| c.field(path).filter(|f| f.is_static || f.is_final).map(|f| (c, f))),
    }
}

/// Follow constant references down to a literal
pub(crate) fn constant_value(
    project: &Project,
    unit: &SourceUnit,
    class: Option<&ClassInfo>,
    expr: &Expr,
    depth: usize,
) -> Option<ExprKind> {
    match &expr.kind {
        ExprKind::Int(_) | ExprKind::Float(_) | ExprKind::Str(_) | ExprKind::Bool(_) | ExprKind::Char(_) => {
            Some(expr.kind.clone())
        }
        ExprKind::Name(path) if depth < 8 => {
            let (owner, field) = resolve_field(project, unit, class, path)?;
            if !field.is_final {
                return None;
            }
            let initializer = field.initializer.as_ref()?;
            let owner_unit = project.unit_of(owner)?;
            constant_value(project, owner_unit, Some(owner), initializer, depth + 1)
        }
        _ => None,
    }
}

/// Simple name of a class, e.g. `Outer.Inner` for nested classes
pub(crate) fn display_class_name(class: &ClassInfo) -> String {
    let top_simple = class.top_level.rsplit('.').next().unwrap_or(&class.top_level);
    match class.qualified_name.strip_prefix(&class.top_level) {
        Some(nested) if !nested.is_empty() => format!("{}{}", top_simple, nested),
        _ => class.name.clone(),
    }
}
