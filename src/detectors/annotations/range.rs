use super::CallContext;
use crate::lint::{Category, Incident, Issue, Severity};
use crate::parser::{find_annotation, Annotation, ExprKind};

pub static RANGE: Issue = Issue {
    id: "Range",
    brief: "Outside Range",
    explanation: "Some parameters are required to be in a particular numerical range; this check \
                  makes sure that arguments passed fall within the range. For arrays, Strings and \
                  collections this refers to the size or length.",
    category: Category::Correctness,
    priority: 6,
    severity: Severity::Error,
};

/// Check `@IntRange`, `@FloatRange` and `@Size` parameters
pub(super) fn check(ctx: &CallContext, incidents: &mut Vec<Incident>) {
    for (arg, parameter) in ctx.arguments() {
        let annotations = &parameter.annotations;
        let message = if let Some(range) = find_annotation(annotations, &["IntRange"]) {
            ctx.constant(arg).and_then(|value| check_int_range(range, &value))
        } else if let Some(range) = find_annotation(annotations, &["FloatRange"]) {
            ctx.constant(arg).and_then(|value| check_float_range(range, &value))
        } else if let Some(size) = find_annotation(annotations, &["Size"]) {
            let actual = match &arg.kind {
                ExprKind::ArrayInit { elements, .. } => Some((elements.len() as i64, "size")),
                _ => match ctx.constant(arg) {
                    Some(ExprKind::Str(s)) => Some((s.chars().count() as i64, "length")),
                    _ => None,
                },
            };
            actual.and_then(|(actual, unit)| check_size(size, actual, unit))
        } else {
            None
        };

        if let Some(message) = message {
            incidents.push(Incident::new(&RANGE, ctx.location(arg.range.clone()), message));
        }
    }
}

fn check_int_range(range: &Annotation, value: &ExprKind) -> Option<String> {
    let value = match value {
        ExprKind::Int(v) => *v,
        ExprKind::Char(c) => *c as i64,
        _ => return None,
    };
    let from = range.value("from").and_then(|v| v.as_i64()).unwrap_or(i64::MIN);
    let to = range.value("to").and_then(|v| v.as_i64()).unwrap_or(i64::MAX);

    if value < from {
        Some(format!("Value must be ≥ {} (was {})", from, value))
    } else if value > to {
        Some(format!("Value must be ≤ {} (was {})", to, value))
    } else {
        None
    }
}

fn check_float_range(range: &Annotation, value: &ExprKind) -> Option<String> {
    let value = match value {
        ExprKind::Float(v) => *v,
        ExprKind::Int(v) => *v as f64,
        _ => return None,
    };
    let from = range.value("from").and_then(|v| v.as_f64());
    let to = range.value("to").and_then(|v| v.as_f64());
    let from_inclusive = range.value("fromInclusive").and_then(|v| v.as_bool()).unwrap_or(true);
    let to_inclusive = range.value("toInclusive").and_then(|v| v.as_bool()).unwrap_or(true);

    if let Some(from) = from {
        let below = if from_inclusive { value < from } else { value <= from };
        if below {
            let op = if from_inclusive { "≥" } else { ">" };
            return Some(format!("Value must be {} {} (was {})", op, java_double(from), java_double(value)));
        }
    }
    if let Some(to) = to {
        let above = if to_inclusive { value > to } else { value >= to };
        if above {
            let op = if to_inclusive { "≤" } else { "<" };
            return Some(format!("Value must be {} {} (was {})", op, java_double(to), java_double(value)));
        }
    }
    None
}

fn check_size(size: &Annotation, actual: i64, unit: &str) -> Option<String> {
    if let Some(exact) = size.value("value").and_then(|v| v.as_i64()) {
        if actual != exact {
            return Some(format!("Expected {} {} (was {})", unit, exact, actual));
        }
    }
    if let Some(min) = size.value("min").and_then(|v| v.as_i64()) {
        if actual < min {
            return Some(format!("Expected {} ≥ {} (was {})", unit, min, actual));
        }
    }
    if let Some(max) = size.value("max").and_then(|v| v.as_i64()) {
        if actual > max {
            return Some(format!("Expected {} ≤ {} (was {})", unit, max, actual));
        }
    }
    if let Some(multiple) = size.value("multiple").and_then(|v| v.as_i64()).filter(|m| *m > 0) {
        if actual % multiple != 0 {
            let lower = (actual / multiple) * multiple;
            let upper = lower + multiple;
            return Some(format!(
                "Expected {} to be a multiple of {} (was {} and should be either {} or {})",
                unit, multiple, actual, lower, upper
            ));
        }
    }
    None
}

/// Render a double the way `Double.toString` does for ordinary magnitudes
fn java_double(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e7 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
