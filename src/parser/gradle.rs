use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// SDK levels and plugin type declared by a Gradle build script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradleInfo {
    pub min_sdk: Option<GradleValue>,
    pub target_sdk: Option<GradleValue>,

    /// The script applies `com.android.library`
    pub is_library: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradleValue {
    pub value: String,
    pub range: Range<usize>,
}

fn sdk_pattern(kind: &str) -> Regex {
    // minSdkVersion 14, minSdkVersion = 14, minSdk 21, minSdkVersion(21), targetSdkVersion "O"
    Regex::new(&format!(
        r#"(?m)^\s*{kind}(?:SdkVersion|Sdk)\s*(?:=\s*|\(\s*|\s+)["']?([A-Za-z0-9_.]+)["']?"#
    ))
    .expect("valid sdk pattern")
}

fn min_sdk_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| sdk_pattern("min"))
}

fn target_sdk_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| sdk_pattern("target"))
}

fn library_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:apply\s+plugin\s*:\s*|id\s*\(?\s*)["'](?:com\.android\.library|android-library)["']"#)
            .expect("valid library pattern")
    })
}

impl GradleInfo {
    pub fn parse(contents: &str) -> Self {
        let find = |re: &Regex| {
            re.captures(contents).and_then(|c| c.get(1)).map(|m| GradleValue {
                value: m.as_str().to_string(),
                range: m.range(),
            })
        };

        Self {
            min_sdk: find(min_sdk_regex()),
            target_sdk: find(target_sdk_regex()),
            is_library: library_regex().is_match(contents),
        }
    }

    /// Merge another script's settings, keeping values already found
    pub fn merge(&mut self, other: GradleInfo) {
        if self.min_sdk.is_none() {
            self.min_sdk = other.min_sdk;
        }
        if self.target_sdk.is_none() {
            self.target_sdk = other.target_sdk;
        }
        self.is_library |= other.is_library;
    }

    pub fn target_sdk_level(&self) -> Option<u32> {
        self.target_sdk.as_ref()?.value.parse().ok()
    }
}
