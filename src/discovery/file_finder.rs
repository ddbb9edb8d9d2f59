use crate::config::Config;
use ignore::WalkBuilder;
use miette::{IntoDiagnostic, Result, WrapErr};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// What a project file is, as far as the detectors care
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Manifest,
    /// XML under `res/values*/`
    ValuesXml,
    /// Any other XML under `res/`
    ResourceXml,
    Java,
    Kotlin,
    Gradle,
    Other,
}

impl FileKind {
    /// Determine the kind from a (relative or absolute) path
    pub fn from_path(path: &Path) -> Self {
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        if file_name == "AndroidManifest.xml" {
            return FileKind::Manifest;
        }
        if file_name.ends_with(".gradle") || file_name.ends_with(".gradle.kts") {
            return FileKind::Gradle;
        }

        match extension {
            "java" => FileKind::Java,
            "kt" => FileKind::Kotlin,
            "xml" => {
                let folder = path.parent().and_then(|p| p.file_name()).and_then(|n| n.to_str());
                let in_res = path
                    .parent()
                    .and_then(|p| p.parent())
                    .and_then(|p| p.file_name())
                    .map(|n| n == "res")
                    .unwrap_or(false);
                match folder {
                    Some(folder) if in_res && (folder == "values" || folder.starts_with("values-")) => {
                        FileKind::ValuesXml
                    }
                    _ if in_res => FileKind::ResourceXml,
                    _ => FileKind::Other,
                }
            }
            _ => FileKind::Other,
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self, FileKind::Java | FileKind::Kotlin)
    }

    pub fn is_xml(&self) -> bool {
        matches!(self, FileKind::Manifest | FileKind::ValuesXml | FileKind::ResourceXml)
    }
}

/// A discovered file, identified relative to the project root
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path to the file
    pub path: PathBuf,

    /// Path relative to the project root, as printed in reports
    pub relative: PathBuf,

    pub kind: FileKind,
}

impl SourceFile {
    pub fn read_contents(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read {}", self.path.display()))
    }
}

/// File finder for discovering lintable files in a project
pub struct FileFinder<'a> {
    config: &'a Config,
}

impl<'a> FileFinder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Find all files the detectors can look at
    pub fn find_files(&self, root: &Path) -> Result<Vec<SourceFile>> {
        debug!("Scanning for files in: {}", root.display());

        let targets = if self.config.targets.is_empty() {
            vec![root.to_path_buf()]
        } else {
            self.config.targets.iter().map(|t| root.join(t)).collect()
        };

        let mut files: Vec<SourceFile> = targets
            .par_iter()
            .flat_map(|target| self.scan_directory(root, target))
            .collect();
        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        files.dedup_by(|a, b| a.relative == b.relative);

        debug!("Found {} files", files.len());
        Ok(files)
    }

    fn scan_directory(&self, root: &Path, dir: &Path) -> Vec<SourceFile> {
        if !dir.exists() {
            trace!("Directory does not exist: {}", dir.display());
            return Vec::new();
        }

        let walker = WalkBuilder::new(dir)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .parents(true)
            .follow_links(false)
            .build();

        walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let path = entry.path();
                let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();

                if self.config.should_exclude(&relative) {
                    trace!("Excluding: {}", relative.display());
                    return None;
                }

                let kind = FileKind::from_path(&relative);
                if kind == FileKind::Other {
                    return None;
                }

                trace!("Found {:?}: {}", kind, relative.display());
                Some(SourceFile {
                    path: path.to_path_buf(),
                    relative,
                    kind,
                })
            })
            .collect()
    }
}

/// Counts of discovered files per kind
#[derive(Debug, Default)]
pub struct FileStats {
    pub manifests: usize,
    pub values_files: usize,
    pub resource_files: usize,
    pub java_files: usize,
    pub kotlin_files: usize,
    pub gradle_files: usize,
}

impl FileStats {
    pub fn from_kinds(kinds: impl IntoIterator<Item = FileKind>) -> Self {
        let mut stats = Self::default();
        for kind in kinds {
            match kind {
                FileKind::Manifest => stats.manifests += 1,
                FileKind::ValuesXml => stats.values_files += 1,
                FileKind::ResourceXml => stats.resource_files += 1,
                FileKind::Java => stats.java_files += 1,
                FileKind::Kotlin => stats.kotlin_files += 1,
                FileKind::Gradle => stats.gradle_files += 1,
                FileKind::Other => {}
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.manifests + self.values_files + self.resource_files + self.java_files + self.kotlin_files + self.gradle_files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_path() {
        assert_eq!(FileKind::from_path(Path::new("src/Main.kt")), FileKind::Kotlin);
        assert_eq!(FileKind::from_path(Path::new("src/Main.java")), FileKind::Java);
        assert_eq!(FileKind::from_path(Path::new("AndroidManifest.xml")), FileKind::Manifest);
        assert_eq!(FileKind::from_path(Path::new("res/values/strings.xml")), FileKind::ValuesXml);
        assert_eq!(FileKind::from_path(Path::new("app/src/main/res/values-es/strings.xml")), FileKind::ValuesXml);
        assert_eq!(FileKind::from_path(Path::new("res/layout/main.xml")), FileKind::ResourceXml);
        assert_eq!(FileKind::from_path(Path::new("build.gradle")), FileKind::Gradle);
        assert_eq!(FileKind::from_path(Path::new("app/build.gradle.kts")), FileKind::Gradle);
        assert_eq!(FileKind::from_path(Path::new("README.md")), FileKind::Other);
    }

    #[test]
    fn test_find_files_skips_excluded() {
        let dir = tempfile::Builder::new().prefix("project").tempdir().unwrap();
        let values = dir.path().join("res/values");
        let build = dir.path().join("build/res/values");
        std::fs::create_dir_all(&values).unwrap();
        std::fs::create_dir_all(&build).unwrap();
        std::fs::write(values.join("strings.xml"), "<resources/>").unwrap();
        std::fs::write(build.join("strings.xml"), "<resources/>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let config = Config::default();
        let files = FileFinder::new(&config).find_files(dir.path()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, PathBuf::from("res/values/strings.xml"));
        assert_eq!(files[0].kind, FileKind::ValuesXml);

        let stats = FileStats::from_kinds(files.iter().map(|f| f.kind));
        assert_eq!(stats.values_files, 1);
        assert_eq!(stats.total(), 1);
    }
}
