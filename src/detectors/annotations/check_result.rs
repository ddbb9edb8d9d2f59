use super::CallContext;
use crate::lint::{Category, Incident, Issue, Severity};

pub static CHECK_RESULT: Issue = Issue {
    id: "CheckResult",
    brief: "Ignoring results",
    explanation: "Some methods have no side effects, and calling them without doing something \
                  with the result is suspicious.",
    category: Category::Correctness,
    priority: 6,
    severity: Severity::Warning,
};

pub(super) fn check(ctx: &CallContext, incidents: &mut Vec<Incident>) {
    if !ctx.call.result_unused || ctx.method.is_constructor {
        return;
    }
    let Some(annotation) = ctx.method.annotation(&["CheckResult"]) else {
        return;
    };

    let mut message = format!("The result of `{}` is not used", ctx.method.name);
    if let Some(suggest) = annotation.value("suggest").and_then(|v| v.as_text()) {
        let suggest = suggest.trim_start_matches('#');
        if !suggest.is_empty() {
            message.push_str(&format!("; did you mean to call `{}`?", suggest));
        }
    }
    incidents.push(Incident::new(&CHECK_RESULT, ctx.call_location(), message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{java, lint};

    #[test]
    fn test_unused_result() {
        let result = lint()
            .files(vec![java(
                r##"
                package test.pkg;
                import android.support.annotation.CheckResult;
                public class Builder {
                    @CheckResult
                    public Builder trimmed() { return this; }
                    @CheckResult(suggest = "#apply")
                    public boolean commit() { return true; }
                    public void apply() {}
                    void run() {
                        trimmed();
                        Builder copy = trimmed();
                        commit();
                        if (commit()) {
                            apply();
                        }
                    }
                }
                "##,
            )])
            .issues(&[&CHECK_RESULT])
            .run();

        result.expect(
            r#"
            src/test/pkg/Builder.java:10: Warning: The result of `trimmed` is not used [CheckResult]
                    trimmed();
                    ~~~~~~~~~
            src/test/pkg/Builder.java:12: Warning: The result of `commit` is not used; did you mean to call `apply`? [CheckResult]
                    commit();
                    ~~~~~~~~
            0 errors, 2 warnings
            "#,
        );
    }
}
