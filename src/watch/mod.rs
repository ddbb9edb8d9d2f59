//! Re-run lint when project files change

use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::discovery::FileKind;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to create file watcher: {0}")]
    WatcherError(#[from] notify::Error),
    #[error("Failed to receive events: {0}")]
    RecvError(#[from] std::sync::mpsc::RecvError),
}

/// Directories whose contents are generated and never linted
const GENERATED_DIRS: &[&str] = &["build", ".gradle", ".idea", "generated"];

/// Watches a project and calls back with the lintable files that changed
pub struct ProjectWatcher<'a> {
    config: &'a Config,
    debounce: Duration,
}

impl<'a> ProjectWatcher<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            debounce: Duration::from_millis(500),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Whether a change to `path` can affect lint results
    fn is_relevant(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        if relative
            .components()
            .any(|c| GENERATED_DIRS.iter().any(|d| c.as_os_str() == *d))
        {
            return false;
        }
        if self.config.should_exclude(relative) {
            return false;
        }
        FileKind::from_path(relative) != FileKind::Other
    }

    /// Run `on_change` once, then again after every batch of relevant changes
    ///
    /// The callback receives the changed files (empty on the first run) and
    /// returns `false` to stop watching.
    pub fn watch<F>(&self, root: &Path, mut on_change: F) -> Result<(), WatchError>
    where
        F: FnMut(&[PathBuf]) -> bool,
    {
        let (tx, rx) = channel();
        let mut debouncer = new_debouncer(self.debounce, tx)?;
        debouncer.watcher().watch(root, RecursiveMode::Recursive)?;

        eprintln!();
        eprintln!("{}", "Watching for changes. Press Ctrl+C to stop.".cyan().bold());
        eprintln!("{}", format!("   {}", root.display()).dimmed());

        if !on_change(&[]) {
            return Ok(());
        }

        loop {
            match rx.recv()? {
                Ok(events) => {
                    let mut changed: Vec<PathBuf> = events
                        .into_iter()
                        .filter(|e| matches!(e.kind, DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous))
                        .map(|e| e.path)
                        .filter(|p| self.is_relevant(root, p))
                        .collect();
                    changed.sort();
                    changed.dedup();
                    if changed.is_empty() {
                        continue;
                    }

                    debug!("{} changed files", changed.len());
                    eprintln!();
                    eprintln!("{}", format!("Changes in {} file(s), re-running lint", changed.len()).yellow());
                    for path in changed.iter().take(5) {
                        let shown = path.strip_prefix(root).unwrap_or(path);
                        eprintln!("   {}", shown.display().to_string().dimmed());
                    }
                    if changed.len() > 5 {
                        eprintln!("   ... and {} more", changed.len() - 5);
                    }

                    if !on_change(&changed) {
                        break;
                    }
                }
                Err(e) => warn!("Watch error: {:?}", e),
            }
        }

        Ok(())
    }
}
