//! Duplicate definitions, reference types and string escapes in values folders

use droidlint::detectors::DuplicateResourceDetector;
use droidlint::testing::{lint, xml};

#[test]
fn test_same_file() {
    lint()
        .files(vec![xml(
            "res/values/customattr.xml",
            r#"
            <?xml version="1.0" encoding="utf-8"?>
            <resources>
                <string name="hello_world">Hello world!</string>
                <string name="app_name">App Name</string>
                <string name="action_settings">Settings</string>
                <string name="app_name">App Name 2</string>
            </resources>
            "#,
        )])
        .issues(DuplicateResourceDetector::ISSUES)
        .run()
        .expect(
            r#"
            res/values/customattr.xml:6: Error: `app_name` has already been defined in this folder [DuplicateDefinition]
                <string name="app_name">App Name 2</string>
                        ~~~~~~~~~~~~~~~
                res/values/customattr.xml:4: Previously defined here
            1 errors, 0 warnings
            "#,
        );
}

#[test]
fn test_across_files_in_one_folder() {
    lint()
        .files(vec![
            xml(
                "res/values/colors.xml",
                r#"
                <resources>
                    <color name="accent">#ff0000</color>
                    <dimen name="margin">16dp</dimen>
                </resources>
                "#,
            ),
            xml(
                "res/values/theme.xml",
                r#"
                <resources>
                    <color name="primary">#00ff00</color>
                    <color name="accent">#0000ff</color>
                </resources>
                "#,
            ),
        ])
        .issues(DuplicateResourceDetector::ISSUES)
        .run()
        .expect(
            r#"
            res/values/theme.xml:3: Error: `accent` has already been defined in this folder [DuplicateDefinition]
                <color name="accent">#0000ff</color>
                       ~~~~~~~~~~~~~
                res/values/colors.xml:2: Previously defined here
            1 errors, 0 warnings
            "#,
        );
}

#[test]
fn test_incremental_shows_related_file_only() {
    lint()
        .files(vec![
            xml(
                "res/values/colors.xml",
                r#"
                <resources>
                    <color name="accent">#ff0000</color>
                </resources>
                "#,
            ),
            xml(
                "res/values/theme.xml",
                r#"
                <resources>
                    <color name="accent">#0000ff</color>
                </resources>
                "#,
            ),
        ])
        .issues(DuplicateResourceDetector::ISSUES)
        .incremental("res/values/theme.xml")
        .run()
        .expect(
            r#"
            res/values/theme.xml:2: Error: `accent` has already been defined in this folder [DuplicateDefinition]
                <color name="accent">#0000ff</color>
                       ~~~~~~~~~~~~~
                res/values/colors.xml: Previously defined here
            1 errors, 0 warnings
            "#,
        );
}

#[test]
fn test_translations_and_types_do_not_clash() {
    lint()
        .files(vec![
            xml(
                "res/values/strings.xml",
                r#"
                <resources>
                    <string name="title">Title</string>
                    <color name="title">#ffffff</color>
                    <item type="id" name="button" />
                    <item type="id" name="button" />
                </resources>
                "#,
            ),
            xml(
                "res/values-es/strings.xml",
                r#"
                <resources>
                    <string name="title">Título</string>
                </resources>
                "#,
            ),
        ])
        .issues(DuplicateResourceDetector::ISSUES)
        .run()
        .expect_clean();
}

#[test]
fn test_dotted_name_matches_underscore() {
    lint()
        .files(vec![xml(
            "res/values/styles.xml",
            r#"
            <resources>
                <style name="Theme_Base" />
                <style name="Theme.Base" />
            </resources>
            "#,
        )])
        .issues(DuplicateResourceDetector::ISSUES)
        .run()
        .expect(
            r#"
            res/values/styles.xml:3: Error: `Theme.Base` has already been defined in this folder as `Theme_Base` [DuplicateDefinition]
                <style name="Theme.Base" />
                       ~~~~~~~~~~~~~~~~~
                res/values/styles.xml:2: Previously defined here
            1 errors, 0 warnings
            "#,
        );
}

#[test]
fn test_styleable_attributes() {
    lint()
        .files(vec![xml(
            "res/values/attrs.xml",
            r#"
            <resources>
                <declare-styleable name="ContentFrame">
                    <attr name="content" format="reference" />
                    <attr name="contentId" format="reference" />
                    <attr name="content" format="reference" />
                </declare-styleable>
            </resources>
            "#,
        )])
        .issues(DuplicateResourceDetector::ISSUES)
        .run()
        .expect(
            r#"
            res/values/attrs.xml:5: Error: `content` has already been defined in this `<declare-styleable>` [DuplicateDefinition]
                    <attr name="content" format="reference" />
                          ~~~~~~~~~~~~~~
                res/values/attrs.xml:3: Previously defined here
            1 errors, 0 warnings
            "#,
        );
}

#[test]
fn test_reference_types() {
    lint()
        .files(vec![xml(
            "res/values/refs.xml",
            r#"
            <resources>
                <string name="label">@drawable/icon</string>
                <string name="alias">@string/label</string>
                <drawable name="background">@color/white</drawable>
                <color name="missing">@null</color>
                <string-array name="choices">
                    <item>@string/label</item>
                    <item>@dimen/margin</item>
                </string-array>
            </resources>
            "#,
        )])
        .issues(DuplicateResourceDetector::ISSUES)
        .run()
        .expect(
            r#"
            res/values/refs.xml:2: Error: Unexpected resource reference type; expected value of type `@string/` [ReferenceType]
                <string name="label">@drawable/icon</string>
                                     ~~~~~~~~~~~~~~
            res/values/refs.xml:8: Error: Unexpected resource reference type; expected value of type `@string/` [ReferenceType]
                    <item>@dimen/margin</item>
                          ~~~~~~~~~~~~~
            2 errors, 0 warnings
            "#,
        );
}

#[test]
fn test_apostrophe_escaping() {
    let result = lint()
        .files(vec![xml(
            "res/values/strings.xml",
            r#"
            <resources>
                <string name="ok">Don\'t stop</string>
                <string name="quoted">"Don't stop"</string>
                <string name="broken">Don't stop</string>
            </resources>
            "#,
        )])
        .issues(DuplicateResourceDetector::ISSUES)
        .run();

    result.expect(
        r#"
        res/values/strings.xml:4: Error: Apostrophe not preceded by \ [StringEscaping]
            <string name="broken">Don't stop</string>
                                     ~
        1 errors, 0 warnings
        "#,
    );
    result.expect_fix_diffs(
        r#"
        Fix for res/values/strings.xml line 4: Escape Apostrophe:
        @@ -4 +4
        -     <string name="broken">Don't stop</string>
        +     <string name="broken">Don\'t stop</string>
        "#,
    );
}

#[test]
fn test_bad_unicode_escape() {
    lint()
        .files(vec![xml(
            "res/values/strings.xml",
            r#"
            <resources>
                <string name="accent">Café</string>
                <string name="bad">Caf\u0g9</string>
            </resources>
            "#,
        )])
        .issues(DuplicateResourceDetector::ISSUES)
        .run()
        .expect_contains(
            r#"
            res/values/strings.xml:3: Error: Bad character in \u unicode escape sequence [StringEscaping]
            "#,
        )
        .expect_count(1, 0);
}
