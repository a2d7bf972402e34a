use crate::error::{IndexerError, Result};
use crate::walker::{TreeWalker, WalkOptions, WalkOutcome};
use crate::workspace::Workspace;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Largest definition file we are willing to read
const MAX_FILE_SIZE_BYTES: u64 = 4 * 1_048_576;

/// Definition files discovered under the priority directories of one workspace.
///
/// Built once per workspace analysis and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct DefinitionIndex {
    files: Vec<PathBuf>,
    warnings: Vec<String>,
    build_ms: u64,
}

impl DefinitionIndex {
    pub fn from_files(mut files: Vec<PathBuf>) -> Self {
        files.sort();
        files.dedup();
        Self {
            files,
            warnings: Vec::new(),
            build_ms: 0,
        }
    }

    /// Walk each existing priority directory with the shallow depth budget
    pub async fn build<S: AsRef<str>>(
        workspace: &Workspace,
        priority_dirs: &[S],
        options: WalkOptions,
    ) -> Self {
        let started = Instant::now();
        let walker = TreeWalker::new(options);
        let mut outcome = WalkOutcome::default();
        let dirs = workspace.resolve_dirs(priority_dirs);
        if dirs.is_empty() {
            log::warn!(
                "No priority directories present under {}",
                workspace.root().display()
            );
        }
        for dir in dirs {
            outcome.merge(walker.walk_async(dir).await);
        }

        let index = Self {
            files: outcome.files,
            warnings: outcome.warnings,
            build_ms: started.elapsed().as_millis() as u64,
        };
        log::info!(
            "Indexed {} definition files in {} ms",
            index.files.len(),
            index.build_ms
        );
        index
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn build_ms(&self) -> u64 {
        self.build_ms
    }
}

/// Read a candidate file's text for one strategy pass.
///
/// The text is owned by the caller and dropped after the pass.
pub async fn load_text(path: &Path) -> Result<String> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|err| IndexerError::from_io(path, err))?;
    if meta.len() > MAX_FILE_SIZE_BYTES {
        return Err(IndexerError::MalformedDefinitionFile {
            path: path.to_path_buf(),
            reason: format!("{} bytes exceeds {MAX_FILE_SIZE_BYTES}", meta.len()),
        });
    }
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| IndexerError::from_io(path, err))?;
    String::from_utf8(bytes).map_err(|err| IndexerError::MalformedDefinitionFile {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// [`load_text`] that logs and swallows per-file failures
pub async fn load_text_lenient(path: &Path) -> Option<String> {
    match load_text(path).await {
        Ok(text) => Some(text),
        Err(err) if err.is_transient() => {
            log::debug!("Skipping {}: {err}", path.display());
            None
        }
        Err(err) => {
            log::warn!("Treating {} as no match: {err}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn builds_from_priority_directories_only() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("zephyr/subsys")).unwrap();
        fs::create_dir_all(root.join("nrf")).unwrap();
        fs::create_dir_all(root.join("custom")).unwrap();
        fs::write(root.join("zephyr/subsys/Kconfig"), "config A\n").unwrap();
        fs::write(root.join("nrf/Kconfig.nrf"), "config B\n").unwrap();
        fs::write(root.join("custom/Kconfig"), "config C\n").unwrap();

        let ws = Workspace::open(root).unwrap();
        let index =
            DefinitionIndex::build(&ws, &["zephyr", "nrf", "nrfxlib"], WalkOptions::new(["build"], 4))
                .await;

        assert_eq!(
            index.files(),
            &[root.join("nrf/Kconfig.nrf"), root.join("zephyr/subsys/Kconfig")]
        );
    }

    #[tokio::test]
    async fn load_text_classifies_failures() {
        let temp = tempdir().unwrap();
        let missing = load_text(&temp.path().join("Kconfig")).await;
        assert!(matches!(
            missing,
            Err(IndexerError::FilesystemTransientMissing(_))
        ));

        let binary = temp.path().join("Kconfig.bin");
        fs::write(&binary, [0xff_u8, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            load_text(&binary).await,
            Err(IndexerError::MalformedDefinitionFile { .. })
        ));
        assert!(load_text_lenient(&binary).await.is_none());
        assert!(load_text_lenient(&temp.path().join("Kconfig")).await.is_none());
    }
}
