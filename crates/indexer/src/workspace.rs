use crate::error::{IndexerError, Result};
use crate::manifest::PROJECT_DOC_FILES;
use std::path::{Path, PathBuf};

/// Resolved layout of a firmware workspace.
///
/// Immutable once constructed; re-derived per verification call unless the caller keeps it.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    zephyr_base: Option<PathBuf>,
    sdk_base: Option<PathBuf>,
    nrfxlib_base: Option<PathBuf>,
    module_dirs: Vec<PathBuf>,
}

impl Workspace {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let meta = std::fs::metadata(root).map_err(|err| {
            IndexerError::WorkspaceRootInvalid(format!("{}: {err}", root.display()))
        })?;
        if !meta.is_dir() {
            return Err(IndexerError::WorkspaceRootInvalid(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        let root = root.to_path_buf();

        let mut module_dirs = Vec::new();
        for group in ["modules", "bootloader"] {
            module_dirs.extend(child_dirs(&root.join(group)));
        }
        module_dirs.sort();

        let workspace = Self {
            zephyr_base: existing_dir(root.join("zephyr")),
            sdk_base: existing_dir(root.join("nrf")),
            nrfxlib_base: existing_dir(root.join("nrfxlib")),
            module_dirs,
            root,
        };
        log::debug!(
            "Workspace {}: zephyr={:?} sdk={:?} modules={}",
            workspace.root.display(),
            workspace.zephyr_base,
            workspace.sdk_base,
            workspace.module_dirs.len()
        );
        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn zephyr_base(&self) -> Option<&Path> {
        self.zephyr_base.as_deref()
    }

    pub fn sdk_base(&self) -> Option<&Path> {
        self.sdk_base.as_deref()
    }

    pub fn nrfxlib_base(&self) -> Option<&Path> {
        self.nrfxlib_base.as_deref()
    }

    pub fn module_dirs(&self) -> &[PathBuf] {
        &self.module_dirs
    }

    /// Documentation candidates of every resolved component tree, workspace-relative.
    ///
    /// Order: zephyr, sdk, nrfxlib, then module directories.
    pub fn component_doc_paths(&self) -> Vec<String> {
        self.zephyr_base()
            .into_iter()
            .chain(self.sdk_base())
            .chain(self.nrfxlib_base())
            .chain(self.module_dirs.iter().map(PathBuf::as_path))
            .flat_map(|dir| {
                let base = self.relative(dir);
                PROJECT_DOC_FILES
                    .iter()
                    .map(move |file| format!("{base}/{file}"))
            })
            .collect()
    }

    /// Existing directories among `relative` entries, resolved against the root
    pub fn resolve_dirs<S: AsRef<str>>(&self, relative: &[S]) -> Vec<PathBuf> {
        relative
            .iter()
            .map(|rel| self.root.join(rel.as_ref()))
            .filter(|path| path.is_dir())
            .collect()
    }

    /// Workspace-relative display form, always with forward slashes
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.to_string_lossy().replace('\\', "/")
    }
}

fn existing_dir(path: PathBuf) -> Option<PathBuf> {
    path.is_dir().then_some(path)
}

fn child_dirs(path: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(path) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_dir())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn resolves_component_trees() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("zephyr")).unwrap();
        fs::create_dir_all(root.join("nrf")).unwrap();
        fs::create_dir_all(root.join("modules/hal")).unwrap();
        fs::create_dir_all(root.join("bootloader/mcuboot")).unwrap();

        let ws = Workspace::open(root).unwrap();
        assert_eq!(ws.zephyr_base(), Some(root.join("zephyr").as_path()));
        assert_eq!(ws.sdk_base(), Some(root.join("nrf").as_path()));
        assert_eq!(ws.nrfxlib_base(), None);
        assert_eq!(
            ws.module_dirs(),
            &[root.join("bootloader/mcuboot"), root.join("modules/hal")]
        );
        assert_eq!(ws.resolve_dirs(&["zephyr", "nrfxlib"]), vec![root.join("zephyr")]);
        assert_eq!(ws.relative(&root.join("zephyr/Kconfig")), "zephyr/Kconfig");
    }

    #[test]
    fn component_doc_paths_cover_every_tree() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("nrf")).unwrap();
        fs::create_dir_all(root.join("modules/hal_nordic")).unwrap();

        let ws = Workspace::open(root).unwrap();
        assert_eq!(
            ws.component_doc_paths(),
            vec![
                "nrf/README.rst",
                "nrf/README.md",
                "nrf/zephyr/module.yml",
                "modules/hal_nordic/README.rst",
                "modules/hal_nordic/README.md",
                "modules/hal_nordic/zephyr/module.yml",
            ]
        );
    }

    #[test]
    fn rejects_missing_or_file_root() {
        let temp = tempdir().unwrap();
        let missing = Workspace::open(temp.path().join("nope"));
        assert!(matches!(missing, Err(IndexerError::WorkspaceRootInvalid(_))));

        let file = temp.path().join("west.yml");
        fs::write(&file, "manifest: {}\n").unwrap();
        assert!(matches!(
            Workspace::open(&file),
            Err(IndexerError::WorkspaceRootInvalid(_))
        ));
    }
}
