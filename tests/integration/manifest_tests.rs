//! Manifest structure, SDK levels and application attributes

use droidlint::detectors::ManifestDetector;
use droidlint::lint::{find_issue, Issue};
use droidlint::testing::{gradle, lint, manifest};

fn issue(id: &str) -> &'static Issue {
    find_issue(id).expect("registered issue")
}

#[test]
fn test_order() {
    lint()
        .files(vec![manifest(
            r#"
            <manifest xmlns:android="http://schemas.android.com/apk/res/android"
                package="test.pkg">
                <application android:allowBackup="true" android:icon="@mipmap/ic_launcher" />
                <uses-sdk android:minSdkVersion="14" />
            </manifest>
            "#,
        )])
        .issues(&[issue("ManifestOrder")])
        .run()
        .expect(
            r#"
            AndroidManifest.xml:4: Warning: `<uses-sdk>` tag appears after `<application>` tag [ManifestOrder]
                <uses-sdk android:minSdkVersion="14" />
                ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
            0 errors, 1 warnings
            "#,
        );
}

#[test]
fn test_missing_uses_sdk() {
    lint()
        .files(vec![manifest(
            r#"
            <manifest xmlns:android="http://schemas.android.com/apk/res/android" package="test.pkg">
                <application android:allowBackup="true" android:icon="@mipmap/ic_launcher" />
            </manifest>
            "#,
        )])
        .issues(&[issue("UsesMinSdkAttributes")])
        .run()
        .expect(
            r#"
            AndroidManifest.xml:1: Warning: Manifest should specify a minimum API level with `<uses-sdk android:minSdkVersion="?" />`; if it really supports all versions of Android set it to 1 [UsesMinSdkAttributes]
            <manifest xmlns:android="http://schemas.android.com/apk/res/android" package="test.pkg">
             ~~~~~~~~
            0 errors, 1 warnings
            "#,
        );
}

#[test]
fn test_missing_target_sdk() {
    lint()
        .files(vec![manifest(
            r#"
            <manifest xmlns:android="http://schemas.android.com/apk/res/android" package="test.pkg">
                <uses-sdk android:minSdkVersion="14" />
                <application android:allowBackup="true" android:icon="@mipmap/ic_launcher" />
            </manifest>
            "#,
        )])
        .issues(&[issue("UsesMinSdkAttributes")])
        .run()
        .expect(
            r#"
            AndroidManifest.xml:2: Warning: `<uses-sdk>` tag should specify a target API level (the highest verified version; when running on later versions, compatibility behaviors may be enabled) with `android:targetSdkVersion="?"` [UsesMinSdkAttributes]
                <uses-sdk android:minSdkVersion="14" />
                 ~~~~~~~~
            0 errors, 1 warnings
            "#,
        );
}

#[test]
fn test_gradle_overrides_manifest_values() {
    lint()
        .files(vec![
            manifest(
                r#"
                <manifest xmlns:android="http://schemas.android.com/apk/res/android" package="test.pkg">
                    <uses-sdk android:minSdkVersion="14" android:targetSdkVersion="21" />
                    <application android:allowBackup="true" android:icon="@mipmap/ic_launcher" />
                </manifest>
                "#,
            ),
            gradle(
                r#"
                apply plugin: 'com.android.application'

                android {
                    defaultConfig {
                        minSdkVersion 15
                        targetSdkVersion 23
                    }
                }
                "#,
            ),
        ])
        .issues(&[issue("GradleOverrides"), issue("UsesMinSdkAttributes")])
        .run()
        .expect(
            r#"
            AndroidManifest.xml:2: Warning: This `minSdkVersion` value (`14`) is not used; it is always overridden by the value specified in the Gradle build script (`15`) [GradleOverrides]
                <uses-sdk android:minSdkVersion="14" android:targetSdkVersion="21" />
                          ~~~~~~~~~~~~~~~~~~~~~~~~~~
            AndroidManifest.xml:2: Warning: This `targetSdkVersion` value (`21`) is not used; it is always overridden by the value specified in the Gradle build script (`23`) [GradleOverrides]
                <uses-sdk android:minSdkVersion="14" android:targetSdkVersion="21" />
                                                     ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
            0 errors, 2 warnings
            "#,
        );
}

#[test]
fn test_multiple_uses_sdk() {
    lint()
        .files(vec![manifest(
            r#"
            <manifest xmlns:android="http://schemas.android.com/apk/res/android" package="test.pkg">
                <uses-sdk android:minSdkVersion="14" />
                <uses-sdk android:targetSdkVersion="23" />
                <application android:allowBackup="true" android:icon="@mipmap/ic_launcher" />
            </manifest>
            "#,
        )])
        .issues(&[issue("MultipleUsesSdk")])
        .run()
        .expect(
            r#"
            AndroidManifest.xml:3: Error: There should only be a single `<uses-sdk>` element in the manifest: merge these together [MultipleUsesSdk]
                <uses-sdk android:targetSdkVersion="23" />
                ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
                AndroidManifest.xml:2: Also appears here
            1 errors, 0 warnings
            "#,
        );
}

#[test]
fn test_wrong_parent() {
    lint()
        .files(vec![manifest(
            r#"
            <manifest xmlns:android="http://schemas.android.com/apk/res/android" package="test.pkg">
                <uses-sdk android:minSdkVersion="14" android:targetSdkVersion="23" />
                <activity android:name=".Orphan" />
                <application android:allowBackup="true" android:icon="@mipmap/ic_launcher">
                    <uses-permission android:name="android.permission.CAMERA" />
                </application>
            </manifest>
            "#,
        )])
        .issues(&[issue("WrongManifestParent")])
        .run()
        .expect(
            r#"
            AndroidManifest.xml:3: Error: The `<activity>` element must be a direct child of the `<application>` element [WrongManifestParent]
                <activity android:name=".Orphan" />
                ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
            AndroidManifest.xml:5: Error: The `<uses-permission>` element must be a direct child of the `<manifest>` root element [WrongManifestParent]
                    <uses-permission android:name="android.permission.CAMERA" />
                    ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
            2 errors, 0 warnings
            "#,
        );
}

#[test]
fn test_allow_backup_fix() {
    let result = lint()
        .files(vec![manifest(
            r#"
            <manifest xmlns:android="http://schemas.android.com/apk/res/android" package="test.pkg">
                <uses-sdk android:minSdkVersion="14" android:targetSdkVersion="23" />
                <application android:icon="@mipmap/ic_launcher">
                    <activity android:name=".MainActivity" />
                </application>
            </manifest>
            "#,
        )])
        .issues(ManifestDetector::ISSUES)
        .run();

    result.expect(
        r#"
        AndroidManifest.xml:3: Warning: Should explicitly set `android:allowBackup` to `true` or `false` (it's `true` by default, and that can have some security implications for the application's data) [AllowBackup]
            <application android:icon="@mipmap/ic_launcher">
             ~~~~~~~~~~~
        0 errors, 1 warnings
        "#,
    );
    result.expect_fix_diffs(
        r#"
        Fix for AndroidManifest.xml line 3: Set allowBackup="true":
        @@ -3 +3
        -     <application android:icon="@mipmap/ic_launcher">
        +     <application android:allowBackup="true" android:icon="@mipmap/ic_launcher">
        "#,
    );
}

#[test]
fn test_library_skips_application_attributes() {
    lint()
        .files(vec![manifest(
            r#"
            <manifest xmlns:android="http://schemas.android.com/apk/res/android" package="test.lib">
                <uses-sdk android:minSdkVersion="14" android:targetSdkVersion="23" />
                <application />
            </manifest>
            "#,
        )])
        .issues(ManifestDetector::ISSUES)
        .library(true)
        .run()
        .expect_clean();
}

#[test]
fn test_mipmap_icons() {
    let result = lint()
        .files(vec![manifest(
            r#"
            <manifest xmlns:android="http://schemas.android.com/apk/res/android" package="test.pkg">
                <uses-sdk android:minSdkVersion="14" android:targetSdkVersion="23" />
                <application android:allowBackup="false" android:icon="@drawable/ic_launcher">
                    <activity android:name=".MainActivity" android:icon="@mipmap/ic_other" />
                </application>
            </manifest>
            "#,
        )])
        .issues(&[issue("MipmapIcons")])
        .run()
        .window(1);

    result.expect(
        r#"
        AndroidManifest.xml:3: Warning: Should use `@mipmap` instead of `@drawable` for launcher icons [MipmapIcons]
            <application android:allowBackup="false" android:icon="@drawable/ic_launcher">
                                                                   ~~~~~~~~~~~~~~~~~~~~~
        0 errors, 1 warnings
        "#,
    );
    result.expect_fix_diffs(
        r#"
        Fix for AndroidManifest.xml line 3: Replace with @mipmap/ic_launcher:
        @@ -2 +2
              <uses-sdk android:minSdkVersion="14" android:targetSdkVersion="23" />
        -     <application android:allowBackup="false" android:icon="@drawable/ic_launcher">
        +     <application android:allowBackup="false" android:icon="@mipmap/ic_launcher">
                  <activity android:name=".MainActivity" android:icon="@mipmap/ic_other" />
        "#,
    );
}
