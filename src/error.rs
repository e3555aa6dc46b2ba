use std::path::PathBuf;
use thiserror::Error;

/// Failures of the relational store writer. Any of these aborts the store
/// transaction; flat files written earlier are unaffected.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to open database {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("failed to prepare schema: {0}")]
    Schema(#[source] rusqlite::Error),

    #[error("failed to begin transaction: {0}")]
    Begin(#[source] rusqlite::Error),

    #[error("failed to clear table {table}: {source}")]
    Clear {
        table: &'static str,
        source: rusqlite::Error,
    },

    #[error("failed to insert into {table}: {source}")]
    Insert {
        table: &'static str,
        source: rusqlite::Error,
    },

    #[error("no catalog item for title '{0}'")]
    UnknownTitle(String),

    #[error("failed to commit transaction: {0}")]
    Commit(#[source] rusqlite::Error),

    #[error("failed to query {table}: {source}")]
    Query {
        table: &'static str,
        source: rusqlite::Error,
    },
}
