//! # Kconfig Indexer
//!
//! Workspace discovery for configuration-symbol verification.
//!
//! ## Pipeline
//!
//! ```text
//! Workspace root
//!     │
//!     ├──> Workspace (component trees resolved)
//!     │
//!     ├──> Tree Walker (depth-bounded, exclusion-aware)
//!     │      └─> Kconfig / Kconfig.* / *.kconfig files
//!     │
//!     └──> Definition Index (priority directories, built once)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use kconfig_indexer::{DefinitionIndex, WalkOptions, Workspace};
//!
//! #[tokio::main]
//! async fn main() -> kconfig_indexer::Result<()> {
//!     let workspace = Workspace::open("/path/to/ncs")?;
//!     let index = DefinitionIndex::build(
//!         &workspace,
//!         &["zephyr", "nrf"],
//!         WalkOptions::new(["build"], kconfig_indexer::INDEX_DEPTH),
//!     )
//!     .await;
//!
//!     println!("Indexed {} definition files", index.len());
//!     Ok(())
//! }
//! ```

mod error;
mod index;
mod manifest;
mod walker;
mod workspace;

pub use error::{IndexerError, Result};
pub use index::{load_text, load_text_lenient, DefinitionIndex};
pub use manifest::{Manifest, ManifestProject};
pub use walker::{
    is_definition_file, TreeWalker, WalkOptions, WalkOutcome, EXHAUSTIVE_DEPTH, INDEX_DEPTH,
};
pub use workspace::Workspace;
