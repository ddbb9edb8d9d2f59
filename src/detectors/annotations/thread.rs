use super::CallContext;
use crate::lint::{Category, Incident, Issue, Severity};
use crate::parser::{find_annotation, Annotation};

pub static WRONG_THREAD: Issue = Issue {
    id: "WrongThread",
    brief: "Wrong Thread",
    explanation: "Ensures that a method which expects to be called on a specific thread, is actually \
                  called from that thread. For example, calls on methods in widgets should always be \
                  made on the UI thread.",
    category: Category::Correctness,
    priority: 6,
    severity: Severity::Error,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ThreadKind {
    Ui,
    Main,
    Worker,
    Binder,
    Any,
}

impl ThreadKind {
    fn from_annotations(annotations: &[Annotation]) -> Option<Self> {
        let annotation = find_annotation(
            annotations,
            &["UiThread", "MainThread", "WorkerThread", "BinderThread", "AnyThread"],
        )?;
        match annotation.simple_name() {
            "UiThread" => Some(ThreadKind::Ui),
            "MainThread" => Some(ThreadKind::Main),
            "WorkerThread" => Some(ThreadKind::Worker),
            "BinderThread" => Some(ThreadKind::Binder),
            "AnyThread" => Some(ThreadKind::Any),
            _ => None,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            ThreadKind::Ui => "UI",
            ThreadKind::Main => "main",
            ThreadKind::Worker => "worker",
            ThreadKind::Binder => "binder",
            ThreadKind::Any => "any",
        }
    }

    /// Whether code running on `self` may call a method bound to `required`
    fn can_call(self, required: ThreadKind) -> bool {
        match (self, required) {
            (ThreadKind::Any, _) | (_, ThreadKind::Any) => true,
            (ThreadKind::Ui | ThreadKind::Main, ThreadKind::Ui | ThreadKind::Main) => true,
            (current, required) => current == required,
        }
    }
}

pub(super) fn check(ctx: &CallContext, incidents: &mut Vec<Incident>) {
    let Some(caller) = ctx.call.caller.as_ref() else {
        return;
    };
    let Some(required) = ThreadKind::from_annotations(&ctx.method.annotations)
        .or_else(|| ThreadKind::from_annotations(&ctx.class.annotations))
    else {
        return;
    };
    let Some(current) = ThreadKind::from_annotations(&caller.annotations)
        .or_else(|| ctx.caller_class().and_then(|c| ThreadKind::from_annotations(&c.annotations)))
    else {
        return;
    };

    if current.can_call(required) {
        return;
    }

    let name = if ctx.method.is_constructor {
        &ctx.class.name
    } else {
        &ctx.method.name
    };
    incidents.push(Incident::new(
        &WRONG_THREAD,
        ctx.call_location(),
        format!(
            "Method {} must be called from the {} thread, currently inferred thread is {} thread",
            name,
            required.describe(),
            current.describe()
        ),
    ));
}
