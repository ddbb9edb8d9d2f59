use super::{XmlDocument, XmlElement};
use std::ops::Range;

/// Tags that declare an application component
pub const COMPONENT_TAGS: &[&str] = &["activity", "activity-alias", "service", "receiver", "provider"];

/// Summary of an AndroidManifest.xml used by the source checks
#[derive(Debug, Clone, Default)]
pub struct ManifestInfo {
    /// The `package` attribute of `<manifest>`
    pub package: Option<String>,

    /// Every `<uses-sdk>` element, in document order
    pub uses_sdk: Vec<UsesSdk>,

    /// Names from `<uses-permission>` and `<uses-permission-sdk-23>`
    pub permissions: Vec<String>,

    pub components: Vec<ManifestComponent>,
}

#[derive(Debug, Clone)]
pub struct UsesSdk {
    pub min_sdk: Option<String>,
    pub target_sdk: Option<String>,
    pub range: Range<usize>,
}

/// An activity, service, receiver or provider registration
#[derive(Debug, Clone)]
pub struct ManifestComponent {
    pub tag: String,

    /// Name as written, possibly relative (`.MainActivity`)
    pub name: String,

    /// Name resolved against the manifest package
    pub qualified_name: String,

    /// Range of the `android:name` attribute
    pub name_range: Range<usize>,
}

impl ManifestInfo {
    pub fn from_document(doc: &XmlDocument) -> Self {
        let root = &doc.root;
        let package = root.attribute("package").map(|a| a.value.clone());
        let mut info = Self {
            package,
            ..Default::default()
        };

        for element in root.descendants() {
            match element.tag.as_str() {
                "uses-sdk" => info.uses_sdk.push(UsesSdk {
                    min_sdk: element.android_value("minSdkVersion").map(str::to_string),
                    target_sdk: element.android_value("targetSdkVersion").map(str::to_string),
                    range: element.range.clone(),
                }),
                "uses-permission" | "uses-permission-sdk-23" | "uses-permission-sdk-m" => {
                    if let Some(name) = element.android_value("name") {
                        info.permissions.push(name.to_string());
                    }
                }
                tag if COMPONENT_TAGS.contains(&tag) => {
                    if let Some(component) = info.component(element) {
                        info.components.push(component);
                    }
                }
                _ => {}
            }
        }

        info
    }

    fn component(&self, element: &XmlElement) -> Option<ManifestComponent> {
        let attr = element.android_attribute("name")?;
        Some(ManifestComponent {
            tag: element.tag.clone(),
            name: attr.value.clone(),
            qualified_name: resolve_class_name(&attr.value, self.package.as_deref()),
            name_range: attr.range.clone(),
        })
    }

    /// Numeric minSdkVersion of the first `<uses-sdk>`, if set
    pub fn min_sdk(&self) -> Option<u32> {
        self.uses_sdk.first()?.min_sdk.as_deref()?.parse().ok()
    }

    pub fn target_sdk(&self) -> Option<u32> {
        self.uses_sdk.first()?.target_sdk.as_deref()?.parse().ok()
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Resolve a component name, handling relative names like ".MainActivity"
pub fn resolve_class_name(name: &str, package: Option<&str>) -> String {
    match package {
        Some(pkg) if name.starts_with('.') => format!("{}{}", pkg, name),
        Some(pkg) if !name.contains('.') => format!("{}.{}", pkg, name),
        None if name.starts_with('.') => name[1..].to_string(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="com.example.app">
    <uses-sdk android:minSdkVersion="14" android:targetSdkVersion="23" />
    <uses-permission android:name="android.permission.CAMERA" />
    <application android:name=".MyApplication">
        <activity android:name=".MainActivity" />
        <service android:name="MyService" />
        <receiver android:name="com.other.Receiver" />
    </application>
</manifest>
"#;

    #[test]
    fn test_manifest_info() {
        let doc = XmlDocument::parse(MANIFEST).unwrap();
        let info = ManifestInfo::from_document(&doc);

        assert_eq!(info.package.as_deref(), Some("com.example.app"));
        assert_eq!(info.min_sdk(), Some(14));
        assert_eq!(info.target_sdk(), Some(23));
        assert!(info.has_permission("android.permission.CAMERA"));

        let names: Vec<_> = info.components.iter().map(|c| c.qualified_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["com.example.app.MainActivity", "com.example.app.MyService", "com.other.Receiver"]
        );
    }

    #[test]
    fn test_resolve_class_name() {
        assert_eq!(resolve_class_name(".Main", Some("p")), "p.Main");
        assert_eq!(resolve_class_name("Main", Some("p")), "p.Main");
        assert_eq!(resolve_class_name("a.b.Main", Some("p")), "a.b.Main");
        assert_eq!(resolve_class_name(".Main", None), "Main");
    }
}
