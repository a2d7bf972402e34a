use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    /// Skip and continue
    #[error("Access denied: {}", .0.display())]
    FilesystemAccessDenied(PathBuf),

    /// File vanished between enumeration and read; skip and continue
    #[error("Vanished before read: {}", .0.display())]
    FilesystemTransientMissing(PathBuf),

    /// Unparsable text; treated as "no match"
    #[error("Malformed definition file {}: {reason}", path.display())]
    MalformedDefinitionFile { path: PathBuf, reason: String },

    /// Fatal for the whole call
    #[error("Invalid workspace root: {0}")]
    WorkspaceRootInvalid(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl IndexerError {
    /// Map an IO failure on `path` into the taxonomy.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::FilesystemAccessDenied(path.to_path_buf()),
            io::ErrorKind::NotFound => Self::FilesystemTransientMissing(path.to_path_buf()),
            io::ErrorKind::InvalidData => Self::MalformedDefinitionFile {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
            _ => Self::IoError(err),
        }
    }

    /// Expected churn in a live tree: the file is skipped quietly.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::FilesystemAccessDenied(_) | Self::FilesystemTransientMissing(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_io_kinds() {
        let path = Path::new("zephyr/Kconfig");
        let denied = IndexerError::from_io(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(denied, IndexerError::FilesystemAccessDenied(_)));

        let missing = IndexerError::from_io(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(missing, IndexerError::FilesystemTransientMissing(_)));
        assert!(missing.is_transient());
        assert!(denied.is_transient());

        let malformed = IndexerError::from_io(path, io::Error::from(io::ErrorKind::InvalidData));
        assert!(matches!(malformed, IndexerError::MalformedDefinitionFile { .. }));
        assert!(!malformed.is_transient());

        let root = IndexerError::WorkspaceRootInvalid("nope".into());
        assert!(!root.is_transient());
    }
}
