//! Annotation contracts checked across files, packages and languages

use droidlint::detectors::SupportAnnotationDetector;
use droidlint::lint::{find_issue, Issue};
use droidlint::testing::{java, java_at, kotlin, lint, TestFile};

fn issue(id: &str) -> &'static Issue {
    find_issue(id).expect("registered issue")
}

fn volume() -> TestFile {
    java(
        r#"
        package test.pkg.media;

        import android.support.annotation.IntRange;

        public class Volume {
            public void setLevel(@IntRange(from = 0, to = 10) int level) {}
        }
        "#,
    )
}

#[test]
fn test_range_from_another_package() {
    lint()
        .files(vec![
            volume(),
            java(
                r#"
                package test.pkg;

                import test.pkg.media.Volume;

                public class Player {
                    public void play() {
                        Volume volume = new Volume();
                        volume.setLevel(20);
                        volume.setLevel(10);
                    }
                }
                "#,
            ),
        ])
        .issues(&[issue("Range")])
        .run()
        .expect(
            r#"
            src/test/pkg/Player.java:8: Error: Value must be ≤ 10 (was 20) [Range]
                    volume.setLevel(20);
                                    ~~
            1 errors, 0 warnings
            "#,
        );
}

#[test]
fn test_range_from_kotlin_caller() {
    lint()
        .files(vec![
            volume(),
            kotlin(
                r#"
                package test.pkg

                import test.pkg.media.Volume

                class Player {
                    fun play(volume: Volume) {
                        volume.setLevel(20)
                    }
                }
                "#,
            ),
        ])
        .issues(SupportAnnotationDetector::ISSUES)
        .run()
        .expect_count(1, 0)
        .expect_contains("Value must be ≤ 10 (was 20) [Range]");
}

#[test]
fn test_string_def_across_files() {
    lint()
        .files(vec![
            java(
                r#"
                package test.pkg.ui;

                import android.support.annotation.StringDef;

                public class Theme {
                    public static final String LIGHT = "light";
                    public static final String DARK = "dark";
                    @StringDef({LIGHT, DARK})
                    public @interface Name {}
                    public static void apply(@Name String name) {}
                }
                "#,
            ),
            java(
                r#"
                package test.pkg;
                import test.pkg.ui.Theme;
                public class Settings {
                    void update() {
                        Theme.apply(Theme.DARK);
                        Theme.apply("dark");
                        Theme.apply("sepia");
                    }
                }
                "#,
            ),
        ])
        .issues(&[issue("WrongConstant")])
        .run()
        .expect(
            r#"
            src/test/pkg/Settings.java:7: Error: Must be one of: Theme.LIGHT, Theme.DARK [WrongConstant]
                    Theme.apply("sepia");
                                ~~~~~~~
            1 errors, 0 warnings
            "#,
        );
}

#[test]
fn test_class_level_thread_annotation() {
    lint()
        .files(vec![
            java(
                r#"
                package test.pkg.widget;
                import android.support.annotation.UiThread;
                @UiThread
                public class Canvas {
                    public void redraw() {}
                }
                "#,
            ),
            java(
                r#"
                package test.pkg;
                import android.support.annotation.WorkerThread;
                import test.pkg.widget.Canvas;
                public class Renderer {
                    @WorkerThread
                    void render(Canvas canvas) {
                        canvas.redraw();
                    }
                }
                "#,
            ),
        ])
        .issues(&[issue("WrongThread")])
        .run()
        .expect(
            r#"
            src/test/pkg/Renderer.java:7: Error: Method redraw must be called from the UI thread, currently inferred thread is worker thread [WrongThread]
                    canvas.redraw();
                    ~~~~~~~~~~~~~~~
            1 errors, 0 warnings
            "#,
        );
}

#[test]
fn test_visible_for_testing_from_tests_is_allowed() {
    let cache = java(
        r#"
        package test.pkg.data;
        import android.support.annotation.VisibleForTesting;
        public class Cache {
            @VisibleForTesting
            public void clear() {}
        }
        "#,
    );
    let test = java_at(
        "src/test/java/test/pkg/CacheTest.java",
        r#"
        package test.pkg;
        import test.pkg.data.Cache;
        public class CacheTest {
            public void reset(Cache cache) {
                cache.clear();
            }
        }
        "#,
    );
    let production = java(
        r#"
        package test.pkg;
        import test.pkg.data.Cache;
        public class Janitor {
            public void sweep(Cache cache) {
                cache.clear();
            }
        }
        "#,
    );

    lint()
        .files(vec![cache, test, production])
        .issues(SupportAnnotationDetector::ISSUES)
        .run()
        .expect_count(0, 1)
        .expect_contains("src/test/pkg/Janitor.java:5: Warning: This method should only be accessed from tests or within package private scope [VisibleForTests]");
}

#[test]
fn test_unresolved_calls_are_ignored() {
    lint()
        .files(vec![java(
            r#"
            package test.pkg;
            import android.view.View;
            public class Screen {
                void show(View view, Object other) {
                    view.setVisibility(12345);
                    other.toString();
                    unknownHelper(-1);
                }
            }
            "#,
        )])
        .issues(SupportAnnotationDetector::ISSUES)
        .run()
        .expect_clean();
}
