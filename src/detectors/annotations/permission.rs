use super::{constant_value, display_class_name, resolve_field, CallContext};
use crate::lint::{Category, Incident, Issue, Severity};
use crate::parser::{find_annotation, Annotation, AnnotationValue, ClassInfo, ExprKind, SourceUnit};
use crate::project::Project;

pub static MISSING_PERMISSION: Issue = Issue {
    id: "MissingPermission",
    brief: "Missing Permissions",
    explanation: "This check scans through your code and libraries and looks at the APIs being used, \
                  and checks this against the set of permissions required to access those APIs. If \
                  the code using those APIs is called at runtime, then the program will crash.\n\n\
                  Furthermore, for permissions that are revocable (with targetSdkVersion 23), client \
                  code must also be prepared to handle the calls throwing an exception if the user \
                  rejects the request for permission at runtime.",
    category: Category::Correctness,
    priority: 9,
    severity: Severity::Error,
};

/// Permissions the user can revoke at runtime from API 23 on
const DANGEROUS_PERMISSIONS: &[&str] = &[
    "android.permission.ACCESS_COARSE_LOCATION",
    "android.permission.ACCESS_FINE_LOCATION",
    "android.permission.ACCESS_BACKGROUND_LOCATION",
    "android.permission.ADD_VOICEMAIL",
    "android.permission.BODY_SENSORS",
    "android.permission.CALL_PHONE",
    "android.permission.CAMERA",
    "android.permission.GET_ACCOUNTS",
    "android.permission.PROCESS_OUTGOING_CALLS",
    "android.permission.READ_CALENDAR",
    "android.permission.READ_CALL_LOG",
    "android.permission.READ_CELL_BROADCASTS",
    "android.permission.READ_CONTACTS",
    "android.permission.READ_EXTERNAL_STORAGE",
    "android.permission.READ_PHONE_STATE",
    "android.permission.READ_PROFILE",
    "android.permission.READ_SMS",
    "android.permission.READ_SOCIAL_STREAM",
    "android.permission.RECEIVE_MMS",
    "android.permission.RECEIVE_SMS",
    "android.permission.RECEIVE_WAP_PUSH",
    "android.permission.RECORD_AUDIO",
    "android.permission.SEND_SMS",
    "android.permission.USE_FINGERPRINT",
    "android.permission.USE_SIP",
    "android.permission.WRITE_CALENDAR",
    "android.permission.WRITE_CALL_LOG",
    "android.permission.WRITE_CONTACTS",
    "android.permission.WRITE_EXTERNAL_STORAGE",
    "android.permission.WRITE_PROFILE",
    "android.permission.WRITE_SETTINGS",
    "android.permission.WRITE_SOCIAL_STREAM",
    "com.android.voicemail.permission.ADD_VOICEMAIL",
];

/// First API level with runtime permissions
const RUNTIME_PERMISSION_API: u32 = 23;

#[derive(Debug, PartialEq)]
enum Requirement {
    All(Vec<String>),
    Any(Vec<String>),
}

impl Requirement {
    /// `class` is where unqualified constant names are looked up
    fn from_annotation(
        project: &Project,
        unit: &SourceUnit,
        class: Option<&ClassInfo>,
        annotation: &Annotation,
    ) -> Option<Self> {
        let names = |value: &AnnotationValue| -> Vec<String> {
            value
                .elements()
                .into_iter()
                .filter_map(|v| permission_name(project, unit, class, v))
                .collect()
        };
        if let Some(value) = annotation.value("value") {
            return Some(Requirement::All(names(value)));
        }
        if let Some(value) = annotation.value("allOf") {
            return Some(Requirement::All(names(value)));
        }
        annotation.value("anyOf").map(|value| Requirement::Any(names(value)))
    }

    fn permissions(&self) -> &[String] {
        match self {
            Requirement::All(p) | Requirement::Any(p) => p,
        }
    }
}

/// Permission string for an annotation value
///
/// `Manifest.permission.X` references are mapped to `android.permission.X`;
/// other constants are followed to their string initializer.
fn permission_name(
    project: &Project,
    unit: &SourceUnit,
    class: Option<&ClassInfo>,
    value: &AnnotationValue,
) -> Option<String> {
    match value {
        AnnotationValue::Str(s) => Some(s.clone()),
        AnnotationValue::Name(path) => {
            let stripped = path.strip_prefix("android.").unwrap_or(path);
            if let Some(name) = stripped
                .strip_prefix("Manifest.permission.")
                .or_else(|| stripped.strip_prefix("permission."))
            {
                return Some(format!("android.permission.{}", name));
            }
            let (owner, field) = resolve_field(project, unit, class, path)?;
            let owner_unit = project.unit_of(owner)?;
            match constant_value(project, owner_unit, Some(owner), field.initializer.as_ref()?, 0)? {
                ExprKind::Str(s) => Some(s),
                _ => None,
            }
        }
        _ => None,
    }
}

pub(super) fn check(ctx: &CallContext, incidents: &mut Vec<Incident>) {
    let project = ctx.project;
    let Some(callee_unit) = project.unit_of(ctx.class) else {
        return;
    };
    let Some(annotation) = ctx
        .method
        .annotation(&["RequiresPermission"])
        .or_else(|| ctx.class.annotation(&["RequiresPermission"]))
    else {
        return;
    };
    let Some(requirement) = Requirement::from_annotation(project, callee_unit, Some(ctx.class), annotation) else {
        return;
    };
    if requirement.permissions().is_empty() {
        return;
    }

    // Permissions the caller itself declares it requires
    let declared: Vec<String> = ctx
        .call
        .caller
        .as_ref()
        .and_then(|caller| find_annotation(&caller.annotations, &["RequiresPermission"]))
        .and_then(|a| Requirement::from_annotation(project, ctx.unit, ctx.caller_class(), a))
        .map(|r| r.permissions().to_vec())
        .unwrap_or_default();

    let manifest = project.manifest_info();
    let in_manifest = |p: &str| manifest.map(|m| m.has_permission(p)).unwrap_or(false);
    let satisfied = |p: &str| declared.iter().any(|d| d == p) || in_manifest(p);

    let (missing, joiner) = match &requirement {
        Requirement::All(permissions) => (
            permissions.iter().filter(|p| !satisfied(p.as_str())).cloned().collect::<Vec<_>>(),
            " and ",
        ),
        Requirement::Any(permissions) if permissions.iter().any(|p| satisfied(p.as_str())) => (Vec::new(), " or "),
        Requirement::Any(permissions) => (permissions.clone(), " or "),
    };

    if !missing.is_empty() {
        let method = if ctx.method.is_constructor {
            ctx.class.name.clone()
        } else {
            ctx.method.name.clone()
        };
        incidents.push(Incident::new(
            &MISSING_PERMISSION,
            ctx.call_location(),
            format!(
                "Missing permissions required by {}.{}: {}",
                display_class_name(ctx.class),
                method,
                missing.join(joiner)
            ),
        ));
        return;
    }

    let Some(caller) = ctx.call.caller.as_ref() else {
        return;
    };
    let revocable = requirement
        .permissions()
        .iter()
        .any(|p| DANGEROUS_PERMISSIONS.contains(&p.as_str()) && !declared.contains(p) && in_manifest(p.as_str()));
    let runtime = project.target_sdk().map(|t| t >= RUNTIME_PERMISSION_API).unwrap_or(false);
    let handled = caller.checks_permission
        || ctx
            .call
            .caught
            .iter()
            .any(|e| matches!(e.rsplit('.').next(), Some("SecurityException" | "RuntimeException" | "Exception" | "Throwable")));

    if revocable && runtime && !handled {
        incidents.push(Incident::new(
            &MISSING_PERMISSION,
            ctx.call_location(),
            "Call requires permission which may be rejected by user: code should explicitly check to see if \
             permission is available (with `checkPermission`) or explicitly handle a potential `SecurityException`",
        ));
    }
}
