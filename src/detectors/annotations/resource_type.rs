use super::CallContext;
use crate::lint::{Category, Incident, Issue, Severity};
use crate::parser::find_annotation;

pub static RESOURCE_TYPE: Issue = Issue {
    id: "ResourceType",
    brief: "Wrong Resource Type",
    explanation: "Ensures that resource id's passed to APIs are of the right type; for example, \
                  calling `Resources.getColor(R.string.name)` is wrong.",
    category: Category::Correctness,
    priority: 7,
    severity: Severity::Error,
};

/// Resource annotations and the `R` type each one accepts
const RESOURCE_ANNOTATIONS: &[(&str, &str)] = &[
    ("AnimRes", "anim"),
    ("AnimatorRes", "animator"),
    ("ArrayRes", "array"),
    ("AttrRes", "attr"),
    ("BoolRes", "bool"),
    ("ColorRes", "color"),
    ("DimenRes", "dimen"),
    ("DrawableRes", "drawable"),
    ("FontRes", "font"),
    ("FractionRes", "fraction"),
    ("IdRes", "id"),
    ("IntegerRes", "integer"),
    ("InterpolatorRes", "interpolator"),
    ("LayoutRes", "layout"),
    ("MenuRes", "menu"),
    ("NavigationRes", "navigation"),
    ("PluralsRes", "plurals"),
    ("RawRes", "raw"),
    ("StringRes", "string"),
    ("StyleRes", "style"),
    ("StyleableRes", "styleable"),
    ("TransitionRes", "transition"),
    ("XmlRes", "xml"),
];

pub(super) fn check(ctx: &CallContext, incidents: &mut Vec<Incident>) {
    for (arg, parameter) in ctx.arguments() {
        let Some((actual, name)) = arg.resource_reference() else {
            continue;
        };
        let annotations = &parameter.annotations;

        if find_annotation(annotations, &["ColorInt"]).is_some() && actual == "color" {
            incidents.push(Incident::new(
                &RESOURCE_TYPE,
                ctx.location(arg.range.clone()),
                format!(
                    "Should pass resolved color instead of resource id here: `getResources().getColor(R.color.{})`",
                    name
                ),
            ));
            continue;
        }

        if find_annotation(annotations, &["AnyRes"]).is_some() {
            continue;
        }
        let expected: Vec<&str> = RESOURCE_ANNOTATIONS
            .iter()
            .filter(|(annotation, _)| find_annotation(annotations, &[*annotation]).is_some())
            .map(|(_, kind)| *kind)
            .collect();
        if expected.is_empty() || expected.contains(&actual) {
            continue;
        }
        // Launcher icons live in mipmap folders but are used as drawables
        if actual == "mipmap" && expected.contains(&"drawable") {
            continue;
        }

        incidents.push(Incident::new(
            &RESOURCE_TYPE,
            ctx.location(arg.range.clone()),
            format!("Expected resource of type {}", expected.join(" or ")),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{java, lint};

    #[test]
    fn test_resource_type() {
        let result = lint()
            .files(vec![java(
                r#"
                package test.pkg;
                import android.support.annotation.ColorInt;
                import android.support.annotation.DrawableRes;
                import android.support.annotation.StringRes;
                public class Labels {
                    void setTitle(@StringRes int title) {}
                    void setIcon(@DrawableRes int icon) {}
                    void setColor(@ColorInt int color) {}
                    void run() {
                        setTitle(R.string.app_name);
                        setTitle(R.drawable.icon);
                        setIcon(R.mipmap.ic_launcher);
                        setColor(R.color.red);
                    }
                }
                "#,
            )])
            .issues(&[&RESOURCE_TYPE])
            .run();

        result.expect(
            r#"
            src/test/pkg/Labels.java:11: Error: Expected resource of type string [ResourceType]
                    setTitle(R.drawable.icon);
                             ~~~~~~~~~~~~~~~
            src/test/pkg/Labels.java:13: Error: Should pass resolved color instead of resource id here: `getResources().getColor(R.color.red)` [ResourceType]
                    setColor(R.color.red);
                             ~~~~~~~~~~~
            2 errors, 0 warnings
            "#,
        );
    }
}
