use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Shallow bound used when indexing priority directories
pub const INDEX_DEPTH: usize = 4;
/// Deep bound used by the exhaustive workspace scan
pub const EXHAUSTIVE_DEPTH: usize = 6;

const DEFINITION_FILE_NAME: &str = "Kconfig";
const DEFINITION_FILE_EXTENSION: &str = "kconfig";

#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Directory names pruned without descending
    pub exclude_names: HashSet<String>,
    /// Maximum depth counted from the walk root
    pub max_depth: usize,
}

impl WalkOptions {
    pub fn new<I, S>(exclude_names: I, max_depth: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exclude_names: exclude_names.into_iter().map(Into::into).collect(),
            max_depth,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct WalkOutcome {
    /// Definition files, sorted by path
    pub files: Vec<PathBuf>,
    /// Non-fatal errors that reduced coverage
    pub warnings: Vec<String>,
}

impl WalkOutcome {
    pub fn merge(&mut self, other: WalkOutcome) {
        self.files.extend(other.files);
        self.warnings.extend(other.warnings);
        self.files.sort();
        self.files.dedup();
    }
}

/// Bounded, exclusion-aware enumerator of definition files
#[derive(Debug, Clone)]
pub struct TreeWalker {
    options: WalkOptions,
}

impl TreeWalker {
    pub fn new(options: WalkOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    /// Walk `root` depth-first and collect definition files
    pub fn walk(&self, root: &Path) -> WalkOutcome {
        let mut outcome = WalkOutcome::default();
        let walker = WalkDir::new(root)
            .max_depth(self.options.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_pruned(entry));

        for result in walker {
            match result {
                Ok(entry) => {
                    if entry.file_type().is_file() && is_definition_file(entry.path()) {
                        outcome.files.push(entry.into_path());
                    }
                }
                Err(err) => {
                    let kind = err.io_error().map(io::Error::kind);
                    let location = err
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| root.display().to_string());
                    if matches!(
                        kind,
                        Some(io::ErrorKind::PermissionDenied) | Some(io::ErrorKind::NotFound)
                    ) {
                        log::debug!("Skipping unreadable entry {location}: {err}");
                        continue;
                    }
                    log::warn!("Partial coverage under {location}: {err}");
                    outcome.warnings.push(format!("{location}: {err}"));
                }
            }
        }

        outcome.files.sort();
        log::debug!(
            "Walked {} (depth {}): {} definition files",
            root.display(),
            self.options.max_depth,
            outcome.files.len()
        );
        outcome
    }

    /// Same as [`TreeWalker::walk`], on the blocking pool
    pub async fn walk_async(&self, root: PathBuf) -> WalkOutcome {
        let walker = self.clone();
        let fallback_root = root.clone();
        match tokio::task::spawn_blocking(move || walker.walk(&root)).await {
            Ok(outcome) => outcome,
            Err(err) => {
                log::warn!("Walk of {} aborted: {err}", fallback_root.display());
                WalkOutcome {
                    files: Vec::new(),
                    warnings: vec![format!("{}: {err}", fallback_root.display())],
                }
            }
        }
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let Some(name) = entry.file_name().to_str() else {
            return false;
        };
        name.starts_with('.') || self.options.exclude_names.contains(name)
    }
}

/// `Kconfig`, `Kconfig.<suffix>` or `*.kconfig`
pub fn is_definition_file(path: &Path) -> bool {
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    if file_name == DEFINITION_FILE_NAME {
        return true;
    }
    if file_name
        .strip_prefix(DEFINITION_FILE_NAME)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|suffix| !suffix.is_empty())
    {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DEFINITION_FILE_EXTENSION))
}
