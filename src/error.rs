//! Error types shared by the store and the repository.

use thiserror::Error;

use crate::lifecycle::OrderStatus;

/// Failures of the key/value store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage quota exceeded: {size} bytes over a {quota} byte limit")]
    QuotaExceeded { size: usize, quota: usize },

    #[error("storage lock poisoned")]
    Poisoned,

    #[error("snapshot must be a JSON object keyed by collection name")]
    MalformedSnapshot,
}

/// Errors surfaced by repository writes and the order engine.
#[derive(Error, Debug)]
pub enum PosError {
    #[error("{0}")]
    Validation(String),

    #[error("cannot move order from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

pub type PosResult<T> = Result<T, PosError>;
