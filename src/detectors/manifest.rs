//! Structural checks for AndroidManifest.xml

use super::Detector;
use crate::discovery::FileKind;
use crate::lint::{Category, Incident, Issue, LintFix, Location, Severity, TextEdit};
use crate::parser::xml::{resolve_class_name, XmlDocument, XmlElement, ANDROID_URI};
use crate::project::{Project, ProjectFile};
use std::collections::HashSet;

pub static ORDER: Issue = Issue {
    id: "ManifestOrder",
    brief: "Incorrect order of elements in manifest",
    explanation: "The <application> tag should appear after the elements which declare which \
        version you need, which features you need, which libraries you need, and so on. In the \
        past there have been subtle bugs (such as themes not getting applied correctly) when the \
        `<application>` tag appears before some of these other elements, so it's best to order \
        your manifest in the logical dependency order.",
    category: Category::Correctness,
    priority: 5,
    severity: Severity::Warning,
};

pub static MULTIPLE_USES_SDK: Issue = Issue {
    id: "MultipleUsesSdk",
    brief: "Multiple `<uses-sdk>` elements in the manifest",
    explanation: "The `<uses-sdk>` element should appear just once; the tools will **not** merge \
        the contents of all the elements so if you split up the attributes across multiple \
        elements, only one of them will take effect.",
    category: Category::Correctness,
    priority: 6,
    severity: Severity::Fatal,
};

pub static USES_SDK: Issue = Issue {
    id: "UsesMinSdkAttributes",
    brief: "Minimum SDK and target SDK attributes not defined",
    explanation: "The manifest should contain a `<uses-sdk>` element which defines the minimum API \
        Level required for the application to run, as well as the target version (the highest \
        API level you have tested the version for).",
    category: Category::Correctness,
    priority: 9,
    severity: Severity::Warning,
};

pub static GRADLE_OVERRIDES: Issue = Issue {
    id: "GradleOverrides",
    brief: "Value overridden by Gradle build script",
    explanation: "The value of (for example) `minSdkVersion` is only used if it is not specified \
        in the `build.gradle` build scripts. When specified in the Gradle build scripts, the \
        manifest value is ignored and can be misleading, so should be removed to avoid ambiguity.",
    category: Category::Correctness,
    priority: 4,
    severity: Severity::Warning,
};

pub static WRONG_PARENT: Issue = Issue {
    id: "WrongManifestParent",
    brief: "Wrong manifest parent",
    explanation: "The `<uses-library>` element should be defined as a direct child of the \
        `<application>` tag, not the `<manifest>` tag or an `<activity>` tag. Similarly, a \
        `<uses-sdk>` tag must be declared at the root level, and so on. This check looks for \
        incorrect declaration locations in the manifest, and complains if an element is found \
        in the wrong place.",
    category: Category::Correctness,
    priority: 6,
    severity: Severity::Fatal,
};

pub static DUPLICATE_ACTIVITY: Issue = Issue {
    id: "DuplicateActivity",
    brief: "Activity registered more than once",
    explanation: "An activity should only be registered once in the manifest. If it is \
        accidentally registered more than once, then subtle errors can occur, since attribute \
        declarations from the two elements are not merged, so you may accidentally remove \
        previous declarations.",
    category: Category::Correctness,
    priority: 5,
    severity: Severity::Fatal,
};

pub static DUPLICATE_USES_FEATURE: Issue = Issue {
    id: "DuplicateUsesFeature",
    brief: "Feature declared more than once",
    explanation: "A given feature should only be declared once in the manifest.",
    category: Category::Correctness,
    priority: 5,
    severity: Severity::Warning,
};

pub static ALLOW_BACKUP: Issue = Issue {
    id: "AllowBackup",
    brief: "AllowBackup/FullBackupContent Problems",
    explanation: "The `allowBackup` attribute determines if an application's data can be backed \
        up and restored. By default this flag is set to `true` which means application data can \
        be backed up and restored by the OS. Setting it explicitly documents the decision.",
    category: Category::Security,
    priority: 3,
    severity: Severity::Warning,
};

pub static APPLICATION_ICON: Issue = Issue {
    id: "MissingApplicationIcon",
    brief: "Missing application icon",
    explanation: "You should set an icon for the application as whole because there is no \
        default. This attribute must be set as a reference to a drawable resource containing the \
        image (for example `@mipmap/icon`).",
    category: Category::Icons,
    priority: 5,
    severity: Severity::Warning,
};

pub static MIPMAP: Issue = Issue {
    id: "MipmapIcons",
    brief: "Use Mipmap Launcher Icons",
    explanation: "Launcher icons should be provided in the `mipmap` resource directory. This is \
        the same as the `drawable` resource directory, except resources in the `mipmap` directory \
        will not get stripped out when creating density-specific APKs.",
    category: Category::Icons,
    priority: 5,
    severity: Severity::Warning,
};

/// Elements that must come before `<application>`
const BEFORE_APPLICATION: &[&str] = &[
    "uses-sdk",
    "uses-permission",
    "uses-permission-sdk-23",
    "permission",
    "permission-tree",
    "permission-group",
    "uses-feature",
    "uses-configuration",
    "supports-screens",
    "compatible-screens",
    "supports-gl-texture",
    "instrumentation",
];

/// Elements that must be direct children of `<application>`
const APPLICATION_CHILDREN: &[&str] = &[
    "activity",
    "activity-alias",
    "service",
    "receiver",
    "provider",
    "uses-library",
];

/// Elements that must be direct children of `<manifest>`
const MANIFEST_CHILDREN: &[&str] = &[
    "uses-permission",
    "permission",
    "uses-sdk",
    "uses-feature",
    "instrumentation",
    "application",
];

/// Detector for manifest structure and required attributes
pub struct ManifestDetector;

impl ManifestDetector {
    pub const ISSUES: &'static [&'static Issue] = &[
        &ORDER,
        &MULTIPLE_USES_SDK,
        &USES_SDK,
        &GRADLE_OVERRIDES,
        &WRONG_PARENT,
        &DUPLICATE_ACTIVITY,
        &DUPLICATE_USES_FEATURE,
        &ALLOW_BACKUP,
        &APPLICATION_ICON,
        &MIPMAP,
    ];

    pub fn new() -> Self {
        Self
    }

    fn check_order(&self, file: &ProjectFile, root: &XmlElement, incidents: &mut Vec<Incident>) {
        let mut seen_application = false;
        for child in &root.children {
            if child.tag == "application" {
                seen_application = true;
            } else if seen_application && BEFORE_APPLICATION.contains(&child.tag.as_str()) {
                incidents.push(Incident::new(
                    &ORDER,
                    element_location(file, child),
                    format!("`<{}>` tag appears after `<application>` tag", child.tag),
                ));
            }
        }
    }

    fn check_multiple_uses_sdk(&self, file: &ProjectFile, root: &XmlElement, incidents: &mut Vec<Incident>) {
        let mut uses_sdk = root.children_named("uses-sdk");
        let Some(first) = uses_sdk.next() else {
            return;
        };
        for other in uses_sdk {
            let secondary = element_location(file, first).with_message("Also appears here");
            incidents.push(Incident::new(
                &MULTIPLE_USES_SDK,
                element_location(file, other).with_secondary(secondary),
                "There should only be a single `<uses-sdk>` element in the manifest: merge these together",
            ));
        }
    }

    fn check_sdk_levels(&self, project: &Project, file: &ProjectFile, root: &XmlElement, incidents: &mut Vec<Incident>) {
        let gradle = project.gradle();
        let uses_sdk = root.children_named("uses-sdk").next();

        let Some(uses_sdk) = uses_sdk else {
            if gradle.min_sdk.is_none() {
                incidents.push(Incident::new(
                    &USES_SDK,
                    Location::new(&file.path, &file.contents, root.name_range()),
                    "Manifest should specify a minimum API level with `<uses-sdk android:minSdkVersion=\"?\" />`; \
                     if it really supports all versions of Android set it to 1",
                ));
            }
            return;
        };

        let levels = [
            (
                "minSdkVersion",
                gradle.min_sdk.as_ref(),
                "`<uses-sdk>` tag should specify a minimum API level with `android:minSdkVersion=\"?\"`",
            ),
            (
                "targetSdkVersion",
                gradle.target_sdk.as_ref(),
                "`<uses-sdk>` tag should specify a target API level (the highest verified version; \
                 when running on later versions, compatibility behaviors may be enabled) with \
                 `android:targetSdkVersion=\"?\"`",
            ),
        ];

        for (attribute, from_gradle, missing_message) in levels {
            match (uses_sdk.android_attribute(attribute), from_gradle) {
                (Some(attr), Some(gradle_value)) => {
                    incidents.push(Incident::new(
                        &GRADLE_OVERRIDES,
                        Location::new(&file.path, &file.contents, attr.range.clone()),
                        format!(
                            "This `{}` value (`{}`) is not used; it is always overridden by the value specified in the Gradle build script (`{}`)",
                            attribute, attr.value, gradle_value.value
                        ),
                    ));
                }
                (None, None) => {
                    incidents.push(Incident::new(
                        &USES_SDK,
                        Location::new(&file.path, &file.contents, uses_sdk.name_range()),
                        missing_message,
                    ));
                }
                _ => {}
            }
        }
    }

    fn check_parents(&self, file: &ProjectFile, element: &XmlElement, incidents: &mut Vec<Incident>) {
        for child in &element.children {
            let tag = child.tag.as_str();
            if APPLICATION_CHILDREN.contains(&tag) && element.tag != "application" {
                incidents.push(Incident::new(
                    &WRONG_PARENT,
                    element_location(file, child),
                    format!("The `<{}>` element must be a direct child of the `<application>` element", tag),
                ));
            } else if MANIFEST_CHILDREN.contains(&tag) && element.tag != "manifest" {
                incidents.push(Incident::new(
                    &WRONG_PARENT,
                    element_location(file, child),
                    format!("The `<{}>` element must be a direct child of the `<manifest>` root element", tag),
                ));
            }
            self.check_parents(file, child, incidents);
        }
    }

    fn check_duplicates(&self, file: &ProjectFile, root: &XmlElement, incidents: &mut Vec<Incident>) {
        let package = root.attribute("package").map(|a| a.value.as_str());

        for application in root.children_named("application") {
            let mut activities = HashSet::new();
            for child in &application.children {
                if child.tag != "activity" {
                    continue;
                }
                let Some(name) = child.android_attribute("name") else {
                    continue;
                };
                let qualified = resolve_class_name(&name.value, package);
                if !activities.insert(qualified.clone()) {
                    incidents.push(Incident::new(
                        &DUPLICATE_ACTIVITY,
                        Location::new(&file.path, &file.contents, name.range.clone()),
                        format!("Duplicate registration for activity `{}`", qualified),
                    ));
                }
            }
        }

        let mut features = HashSet::new();
        for feature in root.children_named("uses-feature") {
            let Some(name) = feature.android_attribute("name") else {
                continue;
            };
            if !features.insert(name.value.as_str()) {
                incidents.push(Incident::new(
                    &DUPLICATE_USES_FEATURE,
                    Location::new(&file.path, &file.contents, name.range.clone()),
                    format!("Duplicate declaration of uses-feature `{}`", name.value),
                ));
            }
        }
    }

    fn check_application(&self, project: &Project, file: &ProjectFile, root: &XmlElement, incidents: &mut Vec<Incident>) {
        let Some(application) = root.children_named("application").next() else {
            return;
        };
        let name_location = || Location::new(&file.path, &file.contents, application.name_range());

        if !project.is_library() {
            if application.android_attribute("allowBackup").is_none() {
                let fix = LintFix::Edits {
                    name: "Set allowBackup=\"true\"".to_string(),
                    edits: vec![TextEdit::insert(
                        &file.path,
                        application.name_end(),
                        format!(" {}:allowBackup=\"true\"", android_prefix(root)),
                    )],
                };
                incidents.push(
                    Incident::new(
                        &ALLOW_BACKUP,
                        name_location(),
                        "Should explicitly set `android:allowBackup` to `true` or `false` (it's `true` by default, \
                         and that can have some security implications for the application's data)",
                    )
                    .with_fix(fix),
                );
            }
            if application.android_attribute("icon").is_none() {
                incidents.push(Incident::new(
                    &APPLICATION_ICON,
                    name_location(),
                    "Should explicitly set `android:icon`, there is no default",
                ));
            }
        }

        let launchers = std::iter::once(application).chain(
            application
                .children
                .iter()
                .filter(|c| c.tag == "activity" || c.tag == "activity-alias"),
        );
        for element in launchers {
            let Some(icon) = element.android_attribute("icon") else {
                continue;
            };
            let Some(name) = icon.value.strip_prefix("@drawable/") else {
                continue;
            };
            let replacement = format!("@mipmap/{}", name);
            incidents.push(
                Incident::new(
                    &MIPMAP,
                    Location::new(&file.path, &file.contents, icon.value_range.clone()),
                    "Should use `@mipmap` instead of `@drawable` for launcher icons",
                )
                .with_fix(LintFix::replace(
                    format!("Replace with {}", replacement),
                    &file.path,
                    icon.value_range.clone(),
                    replacement,
                )),
            );
        }
    }
}

impl Default for ManifestDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for ManifestDetector {
    fn name(&self) -> &'static str {
        "Manifest"
    }

    fn issues(&self) -> &'static [&'static Issue] {
        Self::ISSUES
    }

    fn detect(&self, project: &Project) -> Vec<Incident> {
        let mut incidents = Vec::new();
        let main = project.manifest().map(|(file, _)| file.path.clone());

        for (index, file) in project.files_of(FileKind::Manifest) {
            let Some(XmlDocument { root }) = project.xml(index) else {
                continue;
            };
            if root.tag != "manifest" {
                continue;
            }

            self.check_order(file, root, &mut incidents);
            self.check_multiple_uses_sdk(file, root, &mut incidents);
            if main.as_ref() == Some(&file.path) {
                self.check_sdk_levels(project, file, root, &mut incidents);
            }
            self.check_parents(file, root, &mut incidents);
            self.check_duplicates(file, root, &mut incidents);
            self.check_application(project, file, root, &mut incidents);
        }
        incidents
    }
}

fn element_location(file: &ProjectFile, element: &XmlElement) -> Location {
    Location::new(&file.path, &file.contents, element.range.clone())
}

/// Prefix bound to the Android namespace on the root element
fn android_prefix(root: &XmlElement) -> &str {
    root.attributes
        .iter()
        .find(|a| a.prefix() == Some("xmlns") && a.value == ANDROID_URI)
        .map(|a| a.local_name())
        .unwrap_or("android")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{gradle, lint, manifest};

    #[test]
    fn test_clean_manifest() {
        lint()
            .files(vec![manifest(
                r#"
                <manifest xmlns:android="http://schemas.android.com/apk/res/android"
                    package="test.pkg">
                    <uses-sdk android:minSdkVersion="14" android:targetSdkVersion="23" />
                    <application android:allowBackup="false" android:icon="@mipmap/ic_launcher">
                        <activity android:name=".MainActivity" />
                    </application>
                </manifest>
                "#,
            )])
            .issues(ManifestDetector::ISSUES)
            .run()
            .expect_clean();
    }

    #[test]
    fn test_android_namespace_under_other_prefix() {
        lint()
            .files(vec![manifest(
                r#"
                <manifest xmlns:a="http://schemas.android.com/apk/res/android"
                    package="test.pkg">
                    <uses-sdk a:minSdkVersion="14" a:targetSdkVersion="23" />
                    <application a:allowBackup="false" a:icon="@mipmap/ic_launcher">
                        <activity a:name=".MainActivity" />
                    </application>
                </manifest>
                "#,
            )])
            .issues(ManifestDetector::ISSUES)
            .run()
            .expect_clean();
    }

    #[test]
    fn test_gradle_overrides() {
        let result = lint()
            .files(vec![
                manifest(
                    r#"
                    <manifest xmlns:android="http://schemas.android.com/apk/res/android"
                        package="test.pkg">
                        <uses-sdk android:minSdkVersion="14" />
                        <application android:allowBackup="false" android:icon="@mipmap/ic_launcher" />
                    </manifest>
                    "#,
                ),
                gradle(
                    r#"
                    android {
                        defaultConfig {
                            minSdkVersion 5
                            targetSdkVersion 16
                        }
                    }
                    "#,
                ),
            ])
            .issues(&[&GRADLE_OVERRIDES, &USES_SDK])
            .run();
        result.expect_count(0, 1);
        result.expect_contains(
            "This `minSdkVersion` value (`14`) is not used; it is always overridden by the value specified in the Gradle build script (`5`)",
        );
    }

    #[test]
    fn test_duplicate_activity_and_feature() {
        let result = lint()
            .files(vec![manifest(
                r#"
                <manifest xmlns:android="http://schemas.android.com/apk/res/android"
                    package="test.pkg">
                    <uses-sdk android:minSdkVersion="14" android:targetSdkVersion="23" />
                    <uses-feature android:name="android.hardware.camera" />
                    <uses-feature android:name="android.hardware.camera" />
                    <application android:allowBackup="true" android:icon="@mipmap/ic_launcher">
                        <activity android:name=".Foo" />
                        <activity android:name="test.pkg.Foo" />
                    </application>
                </manifest>
                "#,
            )])
            .issues(ManifestDetector::ISSUES)
            .run();
        result.expect_count(1, 1);
        result.expect_contains("Duplicate registration for activity `test.pkg.Foo`");
        result.expect_contains("Duplicate declaration of uses-feature `android.hardware.camera`");
    }
}
