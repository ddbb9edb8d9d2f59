use super::{constant_value, display_class_name, resolve_field, CallContext};
use crate::lint::{Category, Incident, Issue, Severity};
use crate::parser::{find_annotation, Annotation, AnnotationValue, ClassInfo, ExprKind};

pub static WRONG_CONSTANT: Issue = Issue {
    id: "WrongConstant",
    brief: "Incorrect constant",
    explanation: "Ensures that when a parameter in a method only allows a specific set of \
                  constants, calls obey those rules.",
    category: Category::Correctness,
    priority: 6,
    severity: Severity::Error,
};

/// One permitted value of a typedef
struct Allowed {
    /// `(declaring class, field)` for named constants
    field: Option<(String, String)>,
    value: Option<ExprKind>,
    display: String,
}

/// Values a typedef annotation permits
struct Typedef {
    allowed: Vec<Allowed>,
    flag: bool,
}

impl Typedef {
    fn message(&self) -> String {
        let names: Vec<&str> = self.allowed.iter().map(|a| a.display.as_str()).collect();
        let lead = if self.flag { "Must be one or more of" } else { "Must be one of" };
        format!("{}: {}", lead, names.join(", "))
    }
}

pub(super) fn check(ctx: &CallContext, incidents: &mut Vec<Incident>) {
    let Some(callee_unit) = ctx.project.unit_of(ctx.class) else {
        return;
    };

    for (arg, parameter) in ctx.arguments() {
        let Some(typedef) = parameter
            .annotations
            .iter()
            .find_map(|a| typedef_for(ctx, callee_unit, a))
        else {
            continue;
        };

        let accepted = match &arg.kind {
            ExprKind::Name(path) => {
                let Some((owner, field)) = resolve_field(ctx.project, ctx.unit, ctx.caller_class(), path) else {
                    continue;
                };
                typedef.allowed.iter().any(|a| {
                    a.field
                        .as_ref()
                        .map(|(class, name)| *class == owner.qualified_name && *name == field.name)
                        .unwrap_or(false)
                })
            }
            ExprKind::Int(0) if typedef.flag => true,
            kind @ (ExprKind::Int(_) | ExprKind::Str(_)) => {
                typedef.allowed.iter().any(|a| a.value.as_ref() == Some(kind))
            }
            _ => continue,
        };

        if !accepted {
            incidents.push(Incident::new(
                &WRONG_CONSTANT,
                ctx.location(arg.range.clone()),
                typedef.message(),
            ));
        }
    }
}

/// Resolve a parameter annotation to the `@IntDef`/`@StringDef`/`@LongDef`
/// annotation class it names
fn typedef_for(ctx: &CallContext, unit: &crate::parser::SourceUnit, annotation: &Annotation) -> Option<Typedef> {
    let class = ctx.project.find_class(&annotation.name, Some(unit))?;
    let definition = find_annotation(&class.annotations, &["IntDef", "StringDef", "LongDef"])?;
    let values = definition.value("value")?;
    let flag = definition.value("flag").and_then(|v| v.as_bool()).unwrap_or(false);

    let allowed = values
        .elements()
        .into_iter()
        .filter_map(|value| allowed_value(ctx, class, value))
        .collect();
    Some(Typedef { allowed, flag })
}

fn allowed_value(ctx: &CallContext, typedef: &ClassInfo, value: &AnnotationValue) -> Option<Allowed> {
    let project = ctx.project;
    let unit = project.unit_of(typedef)?;
    match value {
        AnnotationValue::Name(path) => {
            let Some((owner, field)) = resolve_field(project, unit, Some(typedef), path) else {
                return Some(Allowed {
                    field: None,
                    value: None,
                    display: path.clone(),
                });
            };
            let value = field.initializer.as_ref().and_then(|init| {
                let owner_unit = project.unit_of(owner)?;
                constant_value(project, owner_unit, Some(owner), init, 0)
            });
            Some(Allowed {
                field: Some((owner.qualified_name.clone(), field.name.clone())),
                value,
                display: format!("{}.{}", display_class_name(owner), field.name),
            })
        }
        AnnotationValue::Int(v) => Some(Allowed {
            field: None,
            value: Some(ExprKind::Int(*v)),
            display: v.to_string(),
        }),
        AnnotationValue::Str(s) => Some(Allowed {
            field: None,
            value: Some(ExprKind::Str(s.clone())),
            display: format!("\"{}\"", s),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{java, lint};

    #[test]
    fn test_int_def() {
        let result = lint()
            .files(vec![java(
                r#"
                package test.pkg;
                import android.support.annotation.IntDef;
                public class Toolbar {
                    public static final int MODE_STANDARD = 0;
                    public static final int MODE_TABS = 1;
                    public static final int UNRELATED = 2;
                    @IntDef({MODE_STANDARD, MODE_TABS})
                    public @interface Mode {}
                    public void setMode(@Mode int mode) {}
                    void configure() {
                        setMode(MODE_TABS);
                        setMode(UNRELATED);
                        setMode(1);
                        setMode(5);
                    }
                }
                "#,
            )])
            .issues(&[&WRONG_CONSTANT])
            .run();

        result.expect(
            r#"
            src/test/pkg/Toolbar.java:12: Error: Must be one of: Toolbar.MODE_STANDARD, Toolbar.MODE_TABS [WrongConstant]
                    setMode(UNRELATED);
                            ~~~~~~~~~
            src/test/pkg/Toolbar.java:14: Error: Must be one of: Toolbar.MODE_STANDARD, Toolbar.MODE_TABS [WrongConstant]
                    setMode(5);
                            ~
            2 errors, 0 warnings
            "#,
        );
    }

    #[test]
    fn test_int_def_flags() {
        let result = lint()
            .files(vec![
                java(
                    r#"
                    package test.pkg;
                    import android.support.annotation.IntDef;
                    public class Gravity {
                        public static final int LEFT = 1;
                        public static final int RIGHT = 2;
                        @IntDef(flag = true, value = {LEFT, RIGHT})
                        public @interface Flags {}
                        public static void apply(@Flags int flags) {}
                    }
                    "#,
                ),
                java(
                    r#"
                    package test.pkg;
                    public class Caller {
                        void run() {
                            Gravity.apply(0);
                            Gravity.apply(Gravity.LEFT);
                            Gravity.apply(7);
                        }
                    }
                    "#,
                ),
            ])
            .issues(&[&WRONG_CONSTANT])
            .run();

        result.expect_contains("Error: Must be one or more of: Gravity.LEFT, Gravity.RIGHT [WrongConstant]");
        result.expect_count(1, 0);
    }
}
