use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Indexer error: {0}")]
    IndexerError(#[from] kconfig_indexer::IndexerError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    #[error("Empty symbol name")]
    EmptySymbol,

    #[error("Task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
