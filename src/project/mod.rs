//! In-memory view of an Android project
//!
//! A [`Project`] owns the text of every file the detectors look at. XML
//! documents, Java/Kotlin models and the Gradle summary are computed on first
//! use and shared by all detectors.

use crate::config::Config;
use crate::discovery::{FileFinder, FileKind, FileStats};
use crate::parser::xml::{ManifestInfo, ValuesFile, XmlDocument};
use crate::parser::{ClassInfo, GradleInfo, JavaParser, KotlinParser, MethodInfo, Parser, SourceUnit};
use miette::Result;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

/// A file with its contents, identified by its path relative to the project root
#[derive(Debug, Clone)]
pub struct ProjectFile {
    pub path: PathBuf,
    pub kind: FileKind,
    pub contents: String,
}

impl ProjectFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            kind: FileKind::from_path(&path),
            path,
            contents: contents.into(),
        }
    }

    /// Resource folder of a file under `res/`, e.g. `res/values-es`
    pub fn resource_folder(&self) -> Option<&Path> {
        match self.kind {
            FileKind::ValuesXml | FileKind::ResourceXml => self.path.parent(),
            _ => None,
        }
    }

    /// `values-es/strings.xml`: folder name plus file name, as used in messages
    pub fn folder_and_name(&self) -> String {
        let name = self.path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        match self.path.parent().and_then(|p| p.file_name()) {
            Some(folder) => format!("{}/{}", folder.to_string_lossy(), name),
            None => name.to_string(),
        }
    }
}

/// Where a class lives inside the parsed sources
#[derive(Debug, Clone, Copy)]
struct ClassSlot {
    unit: usize,
    class: usize,
}

pub struct Project {
    root: PathBuf,
    files: Vec<ProjectFile>,
    config: Config,
    xml: Vec<OnceLock<Option<XmlDocument>>>,
    values: Vec<OnceLock<Option<ValuesFile>>>,
    units: OnceLock<Vec<SourceUnit>>,
    classes: OnceLock<HashMap<String, ClassSlot>>,
    gradle: OnceLock<GradleInfo>,
    manifest_info: OnceLock<Option<ManifestInfo>>,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, files: Vec<ProjectFile>, config: Config) -> Self {
        let xml = files.iter().map(|_| OnceLock::new()).collect();
        let values = files.iter().map(|_| OnceLock::new()).collect();
        Self {
            root: root.into(),
            files,
            config,
            xml,
            values,
            units: OnceLock::new(),
            classes: OnceLock::new(),
            gradle: OnceLock::new(),
            manifest_info: OnceLock::new(),
        }
    }

    /// Discover and read the files of a project on disk
    pub fn load(root: &Path, config: &Config) -> Result<Self> {
        let found = FileFinder::new(config).find_files(root)?;
        let stats = FileStats::from_kinds(found.iter().map(|f| f.kind));
        info!(
            "Found {} files ({} values, {} manifests, {} Java, {} Kotlin, {} Gradle)",
            stats.total(),
            stats.values_files,
            stats.manifests,
            stats.java_files,
            stats.kotlin_files,
            stats.gradle_files
        );

        let files = found
            .par_iter()
            .map(|file| {
                Ok(ProjectFile {
                    path: file.relative.clone(),
                    kind: file.kind,
                    contents: file.read_contents()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(root, files, config.clone()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn files(&self) -> &[ProjectFile] {
        &self.files
    }

    pub fn file(&self, path: &Path) -> Option<&ProjectFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn files_of(&self, kind: FileKind) -> impl Iterator<Item = (usize, &ProjectFile)> {
        self.files.iter().enumerate().filter(move |(_, f)| f.kind == kind)
    }

    /// Parsed XML of the file at `index`; `None` when it is not well-formed XML
    pub fn xml(&self, index: usize) -> Option<&XmlDocument> {
        let file = self.files.get(index)?;
        self.xml
            .get(index)?
            .get_or_init(|| match XmlDocument::parse(&file.contents) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    debug!("Skipping {}: {}", file.path.display(), e);
                    None
                }
            })
            .as_ref()
    }

    pub fn values(&self, index: usize) -> Option<&ValuesFile> {
        self.values
            .get(index)?
            .get_or_init(|| self.xml(index).map(ValuesFile::from_document))
            .as_ref()
    }

    /// Values files with their definitions, in path order
    pub fn values_files(&self) -> Vec<(&ProjectFile, &ValuesFile)> {
        self.files_of(FileKind::ValuesXml)
            .filter_map(|(i, f)| self.values(i).map(|v| (f, v)))
            .collect()
    }

    /// The main manifest: the one closest to the project root
    pub fn manifest(&self) -> Option<(&ProjectFile, &XmlDocument)> {
        self.files_of(FileKind::Manifest)
            .min_by_key(|(_, f)| (f.path.components().count(), f.path.clone()))
            .and_then(|(i, f)| self.xml(i).map(|doc| (f, doc)))
    }

    pub fn manifest_info(&self) -> Option<&ManifestInfo> {
        self.manifest_info
            .get_or_init(|| self.manifest().map(|(_, doc)| ManifestInfo::from_document(doc)))
            .as_ref()
    }

    /// Merged settings of all Gradle scripts
    pub fn gradle(&self) -> &GradleInfo {
        self.gradle.get_or_init(|| {
            let mut merged = GradleInfo::default();
            for (_, file) in self.files_of(FileKind::Gradle) {
                merged.merge(GradleInfo::parse(&file.contents));
            }
            merged
        })
    }

    pub fn has_gradle(&self) -> bool {
        self.files_of(FileKind::Gradle).next().is_some()
    }

    pub fn is_library(&self) -> bool {
        self.config.android.library || self.gradle().is_library
    }

    /// Effective targetSdkVersion: Gradle wins over the manifest
    pub fn target_sdk(&self) -> Option<u32> {
        self.gradle()
            .target_sdk_level()
            .or_else(|| self.manifest_info().and_then(|m| m.target_sdk()))
    }

    pub fn is_test_source(&self, path: &Path) -> bool {
        self.config.is_test_source(path)
    }

    /// Java and Kotlin models, parsed in parallel on first use
    pub fn units(&self) -> &[SourceUnit] {
        self.units.get_or_init(|| {
            let units: Vec<SourceUnit> = self
                .files
                .par_iter()
                .filter(|f| f.kind.is_source())
                .map_init(
                    || (JavaParser::new(), KotlinParser::new()),
                    |parsers, file| {
                        let parsed = match (file.kind, parsers) {
                            (FileKind::Java, (Ok(java), _)) => java.parse(&file.path, &file.contents),
                            (FileKind::Kotlin, (_, Ok(kotlin))) => kotlin.parse(&file.path, &file.contents),
                            _ => Err(miette::miette!("No parser available for {}", file.path.display())),
                        };
                        match parsed {
                            Ok(unit) => Some(unit),
                            Err(e) => {
                                debug!("Skipping {}: {}", file.path.display(), e);
                                None
                            }
                        }
                    },
                )
                .flatten()
                .collect();
            debug!("Parsed {} source files", units.len());
            units
        })
    }

    pub fn unit(&self, path: &Path) -> Option<&SourceUnit> {
        self.units().iter().find(|u| u.path == path)
    }

    fn class_index(&self) -> &HashMap<String, ClassSlot> {
        self.classes.get_or_init(|| {
            let mut index = HashMap::new();
            for (u, unit) in self.units().iter().enumerate() {
                for (c, class) in unit.classes.iter().enumerate() {
                    index.insert(class.qualified_name.clone(), ClassSlot { unit: u, class: c });
                }
            }
            index
        })
    }

    fn class_at(&self, slot: ClassSlot) -> &ClassInfo {
        &self.units()[slot.unit].classes[slot.class]
    }

    /// Resolve a class name as written in `context`
    ///
    /// Tries, in order: the qualified name, a class nested in or beside the
    /// context's classes, explicit imports, the context package, and finally a
    /// unique simple-name match anywhere in the project.
    pub fn find_class(&self, name: &str, context: Option<&SourceUnit>) -> Option<&ClassInfo> {
        let index = self.class_index();
        if let Some(slot) = index.get(name) {
            return Some(self.class_at(*slot));
        }

        if let Some(unit) = context {
            for class in &unit.classes {
                let candidate = format!("{}.{}", class.qualified_name, name);
                if let Some(slot) = index.get(&candidate) {
                    return Some(self.class_at(*slot));
                }
            }
            let first = name.split('.').next().unwrap_or(name);
            for import in &unit.imports {
                if import.rsplit('.').next() == Some(first) {
                    let candidate = format!("{}{}", import, &name[first.len()..]);
                    if let Some(slot) = index.get(&candidate) {
                        return Some(self.class_at(*slot));
                    }
                }
            }
            if let Some(pkg) = &unit.package {
                if let Some(slot) = index.get(&format!("{}.{}", pkg, name)) {
                    return Some(self.class_at(*slot));
                }
            }
        }

        let suffix = format!(".{}", name);
        let mut matches = index.iter().filter(|(qualified, _)| qualified.ends_with(&suffix));
        match (matches.next(), matches.next()) {
            (Some((_, slot)), None) => Some(self.class_at(*slot)),
            _ => None,
        }
    }

    /// The unit that declares a class
    pub fn unit_of(&self, class: &ClassInfo) -> Option<&SourceUnit> {
        let slot = self.class_index().get(&class.qualified_name)?;
        self.units().get(slot.unit)
    }

    /// Superclass chain starting at `class` itself, stopping at classes outside the project
    pub fn class_hierarchy<'a>(&'a self, class: &'a ClassInfo) -> Vec<&'a ClassInfo> {
        let mut chain = vec![class];
        let mut current = class;
        while let Some(superclass) = &current.superclass {
            let context = self.unit_of(current);
            match self.find_class(superclass, context) {
                Some(next) if !chain.iter().any(|c| c.qualified_name == next.qualified_name) => {
                    chain.push(next);
                    current = next;
                }
                _ => break,
            }
        }
        chain
    }

    /// Find a method by name and argument count in a class or its superclasses
    pub fn find_method<'a>(&'a self, class: &'a ClassInfo, name: &str, arity: usize) -> Option<&'a MethodInfo> {
        self.class_hierarchy(class).into_iter().find_map(|c| {
            c.methods
                .iter()
                .find(|m| m.name == name && !m.is_constructor && m.accepts_arity(arity))
        })
    }

    pub fn find_constructor<'a>(&'a self, class: &'a ClassInfo, arity: usize) -> Option<&'a MethodInfo> {
        class
            .methods
            .iter()
            .find(|m| m.is_constructor && m.accepts_arity(arity))
    }
}
