use super::CallContext;
use crate::lint::{Category, Incident, Issue, Severity};
use crate::parser::AnnotationValue;

pub static VISIBLE_FOR_TESTS: Issue = Issue {
    id: "VisibleForTests",
    brief: "Visible Only For Tests",
    explanation: "With the `@VisibleForTesting` annotation you can specify an `otherwise=` attribute \
                  which specifies the intended visibility if the method had not been made more widely \
                  visible for the tests.\n\nThis check looks for accesses from within production code \
                  (e.g. not tests) where the access is not permitted by the intended visibility.",
    category: Category::Correctness,
    priority: 4,
    severity: Severity::Warning,
};

/// Intended visibility from `@VisibleForTesting(otherwise = ...)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Private,
    PackagePrivate,
    Protected,
    None,
}

impl Scope {
    fn from_value(value: Option<&AnnotationValue>) -> Self {
        let Some(value) = value else {
            return Scope::PackagePrivate;
        };
        match value {
            AnnotationValue::Int(2) => Scope::Private,
            AnnotationValue::Int(4) => Scope::Protected,
            AnnotationValue::Int(5) => Scope::None,
            AnnotationValue::Name(name) => match name.rsplit('.').next() {
                Some("PRIVATE") => Scope::Private,
                Some("PROTECTED") => Scope::Protected,
                Some("NONE") => Scope::None,
                _ => Scope::PackagePrivate,
            },
            _ => Scope::PackagePrivate,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Scope::Private => "private",
            Scope::PackagePrivate => "package private",
            Scope::Protected => "protected",
            Scope::None => "",
        }
    }
}

pub(super) fn check(ctx: &CallContext, incidents: &mut Vec<Incident>) {
    let Some(annotation) = ctx.method.annotation(&["VisibleForTesting"]) else {
        return;
    };
    if ctx.project.is_test_source(&ctx.unit.path) {
        return;
    }
    let Some(caller_class) = ctx.caller_class() else {
        return;
    };

    let scope = Scope::from_value(annotation.value("otherwise"));
    let same_package = || {
        let callee_package = ctx.project.unit_of(ctx.class).and_then(|u| u.package.as_deref());
        ctx.unit.package.as_deref() == callee_package
    };
    let allowed = match scope {
        Scope::Private => caller_class.top_level == ctx.class.top_level,
        Scope::PackagePrivate => same_package(),
        Scope::Protected => {
            same_package()
                || ctx
                    .project
                    .class_hierarchy(caller_class)
                    .iter()
                    .any(|c| c.qualified_name == ctx.class.qualified_name)
        }
        Scope::None => false,
    };
    if allowed {
        return;
    }

    let message = match scope {
        Scope::None => "This method should only be accessed from tests".to_string(),
        scope => format!(
            "This method should only be accessed from tests or within {} scope",
            scope.describe()
        ),
    };
    incidents.push(Incident::new(
        &VISIBLE_FOR_TESTS,
        ctx.location(ctx.call.name_range.clone()),
        message,
    ));
}
