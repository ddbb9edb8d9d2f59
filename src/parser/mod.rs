mod common;
mod gradle;
mod java;
mod kotlin;
pub mod xml;

pub use common::{
    find_annotation, normalize_type, Annotation, AnnotationValue, CallSite, Caller, ClassInfo, ClassKind, Expr,
    ExprKind, FieldInfo, Language, MethodInfo, Parameter, Parser, Receiver, SourceUnit, Visibility,
};
pub use gradle::{GradleInfo, GradleValue};
pub use java::{unbox, JavaParser};
pub use kotlin::KotlinParser;
