//! # Kconfig Search
//!
//! Locates configuration-symbol declarations and runs the verification cascade.
//!
//! ```no_run
//! use kconfig_search::Verifier;
//!
//! #[tokio::main]
//! async fn main() -> kconfig_search::Result<()> {
//!     let verifier = Verifier::open("/path/to/ncs")?;
//!     let result = verifier.verify("BT_SCAN").await?;
//!     println!("{} available: {}", result.name, result.available);
//!     Ok(())
//! }
//! ```

mod cascade;
mod config;
mod error;
mod knowledge;
mod locator;
mod stages;
mod stats;
mod strategy;

pub use cascade::{normalize_symbol, Verifier};
pub use config::{EngineConfig, SubsystemRule};
pub use error::{Result, SearchError};
pub use knowledge::{AlternativeEntry, KnowledgeBase};
pub use locator::{
    definition_section, locate, locate_with, DeclarationPatterns, LocatedSymbol, MatchPrecision,
};
pub use stages::{
    default_stages, BroadPatternStage, ExhaustiveStage, IndexedStage, SemanticStage, Stage,
    StageContext,
};
pub use stats::{CascadeStats, CascadeStatsSnapshot, Tier};
pub use strategy::{best_match, word_parts, BroadLineMatcher, MatchStrategy, StrategySet, SymbolMatch};
