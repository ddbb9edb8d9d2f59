//! Format string resources and the calls that format them

use droidlint::detectors::StringFormatDetector;
use droidlint::lint::{find_issue, Issue};
use droidlint::testing::{java, lint, xml};

fn issue(id: &str) -> &'static Issue {
    find_issue(id).expect("registered issue")
}

#[test]
fn test_wrong_argument_type() {
    let result = lint()
        .files(vec![
            xml(
                "res/values/strings.xml",
                r#"
                <resources>
                    <string name="score">Score: %1$d points</string>
                </resources>
                "#,
            ),
            java(
                r#"
                package test.pkg;

                import android.app.Activity;

                public class Scores extends Activity {
                    public String describe(String label) {
                        return getString(R.string.score, label);
                    }
                }
                "#,
            ),
        ])
        .issues(StringFormatDetector::ISSUES)
        .run();

    result.expect(
        r#"
        src/test/pkg/Scores.java:7: Error: Wrong argument type for formatting argument '#1' in `score`: conversion is '`%1$d`', received `String` (argument #2 in method call) (Did you mean formatting character `s`?) [StringFormatMatches]
                return getString(R.string.score, label);
                       ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
            res/values/strings.xml:2: Conflicting argument declaration here
        1 errors, 0 warnings
        "#,
    );
    result.expect_fix_diffs(
        r#"
        Fix for src/test/pkg/Scores.java line 7: Replace with %1$s:
        res/values/strings.xml:
        @@ -2 +2
        -     <string name="score">Score: %1$d points</string>
        +     <string name="score">Score: %1$s points</string>
        "#,
    );
}

#[test]
fn test_boolean_passed_to_integer_conversion() {
    let result = lint()
        .files(vec![
            xml(
                "res/values/strings.xml",
                r#"
                <resources>
                    <string name="enabled">Enabled: %1$d</string>
                </resources>
                "#,
            ),
            java(
                r#"
                package test.pkg;

                import android.app.Activity;

                public class Toggles extends Activity {
                    public String describe() {
                        return getString(R.string.enabled, true);
                    }
                }
                "#,
            ),
        ])
        .issues(&[issue("StringFormatMatches")])
        .run();

    result.expect(
        r#"
        src/test/pkg/Toggles.java:7: Error: Wrong argument type for formatting argument '#1' in `enabled`: conversion is '`%1$d`', received `boolean` (argument #2 in method call) (Did you mean formatting character `b`?) [StringFormatMatches]
                return getString(R.string.enabled, true);
                       ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
            res/values/strings.xml:2: Conflicting argument declaration here
        1 errors, 0 warnings
        "#,
    );
    result.expect_fix_diffs(
        r#"
        Fix for src/test/pkg/Toggles.java line 7: Replace with %1$b:
        res/values/strings.xml:
        @@ -2 +2
        -     <string name="enabled">Enabled: %1$d</string>
        +     <string name="enabled">Enabled: %1$b</string>
        "#,
    );
}

#[test]
fn test_wrong_argument_count() {
    lint()
        .files(vec![
            xml(
                "res/values/strings.xml",
                r#"
                <resources>
                    <string name="welcome">Welcome %1$s to %2$s</string>
                </resources>
                "#,
            ),
            java(
                r#"
                package test.pkg;

                import android.app.Activity;

                public class Welcome extends Activity {
                    public String greet(String name) {
                        return getString(R.string.welcome, name);
                    }
                }
                "#,
            ),
        ])
        .issues(&[issue("StringFormatMatches")])
        .run()
        .expect(
            r#"
            src/test/pkg/Welcome.java:7: Error: Wrong argument count, format string `welcome` requires `2` but format call supplies `1` [StringFormatMatches]
                    return getString(R.string.welcome, name);
                           ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
                res/values/strings.xml:2: This definition requires 2 arguments
            1 errors, 0 warnings
            "#,
        );
}

#[test]
fn test_string_format_with_locale_is_clean() {
    lint()
        .files(vec![
            xml(
                "res/values/strings.xml",
                r#"
                <resources>
                    <string name="price">%1$s costs %2$.2f</string>
                    <string name="count">%s items</string>
                </resources>
                "#,
            ),
            java(
                r#"
                package test.pkg;

                import android.app.Activity;
                import java.util.Locale;

                public class Prices extends Activity {
                    public String price(String item, double amount) {
                        return String.format(Locale.US, getString(R.string.price), item, amount);
                    }

                    public String count(int items) {
                        return String.format(getString(R.string.count), items);
                    }
                }
                "#,
            ),
        ])
        .issues(StringFormatDetector::ISSUES)
        .run()
        .expect_clean();
}

#[test]
fn test_array_of_arguments_is_not_counted() {
    lint()
        .files(vec![
            xml(
                "res/values/strings.xml",
                r#"
                <resources>
                    <string name="pair">%1$s and %2$s</string>
                </resources>
                "#,
            ),
            java(
                r#"
                package test.pkg;

                import android.app.Activity;

                public class Pairs extends Activity {
                    public String pair(Object[] values) {
                        return getString(R.string.pair, values);
                    }
                }
                "#,
            ),
        ])
        .issues(StringFormatDetector::ISSUES)
        .run()
        .expect_clean();
}

#[test]
fn test_not_a_format_string() {
    lint()
        .files(vec![
            xml(
                "res/values/strings.xml",
                r#"
                <resources>
                    <string name="battery">Battery at 100%</string>
                </resources>
                "#,
            ),
            java(
                r#"
                package test.pkg;

                import android.app.Activity;

                public class Battery extends Activity {
                    public String level(int level) {
                        return String.format(getString(R.string.battery), level);
                    }
                }
                "#,
            ),
        ])
        .issues(StringFormatDetector::ISSUES)
        .run()
        .expect(
            r#"
            src/test/pkg/Battery.java:7: Error: Format string '`battery`' is not a valid format string so it should not be passed to `String.format` [StringFormatInvalid]
                    return String.format(getString(R.string.battery), level);
                           ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
            1 errors, 0 warnings
            "#,
        );
}

#[test]
fn test_formatted_false_is_not_a_format() {
    lint()
        .files(vec![
            xml(
                "res/values/strings.xml",
                r#"
                <resources>
                    <string name="template" formatted="false">Use %s as a placeholder</string>
                </resources>
                "#,
            ),
            java(
                r#"
                package test.pkg;

                import android.app.Activity;

                public class Templates extends Activity {
                    public String fill(String value) {
                        return String.format(getString(R.string.template), value);
                    }
                }
                "#,
            ),
        ])
        .issues(StringFormatDetector::ISSUES)
        .run()
        .expect_count(1, 0);
}

#[test]
fn test_inconsistent_argument_count_across_translations() {
    let result = lint()
        .files(vec![
            xml(
                "res/values/strings.xml",
                r#"
                <resources>
                    <string name="greeting">Hello %1$s, from %2$s</string>
                </resources>
                "#,
            ),
            xml(
                "res/values-fr/strings.xml",
                r#"
                <resources>
                    <string name="greeting">Bonjour %1$s</string>
                </resources>
                "#,
            ),
        ])
        .issues(StringFormatDetector::ISSUES)
        .run();

    result.expect_count(0, 1);
    assert_eq!(result.incidents()[0].issue.id, "StringFormatCount");
    assert!(result.incidents()[0]
        .message
        .starts_with("Inconsistent number of arguments in formatting string `greeting`"));
}

#[test]
fn test_inconsistent_types_across_translations() {
    let result = lint()
        .files(vec![
            xml(
                "res/values/strings.xml",
                r#"
                <resources>
                    <string name="items">%1$d items</string>
                </resources>
                "#,
            ),
            xml(
                "res/values-de/strings.xml",
                r#"
                <resources>
                    <string name="items">%1$s Artikel</string>
                </resources>
                "#,
            ),
        ])
        .issues(&[issue("StringFormatInvalid")])
        .run();

    result.expect_count(1, 0);
    result.expect_contains("Inconsistent formatting types for argument #1 in format string `items`");
    result.expect_contains("Conflicting argument type here");
}

#[test]
fn test_matching_translations_are_clean() {
    lint()
        .files(vec![
            xml(
                "res/values/strings.xml",
                r#"
                <resources>
                    <string name="progress">%1$d of %2$d done, 100%% soon</string>
                </resources>
                "#,
            ),
            xml(
                "res/values-es/strings.xml",
                r#"
                <resources>
                    <string name="progress">%2$d de %1$d</string>
                </resources>
                "#,
            ),
        ])
        .issues(StringFormatDetector::ISSUES)
        .run()
        .expect_clean();
}
