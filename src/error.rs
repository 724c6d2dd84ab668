use std::io;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, LexcapError>;

/// Canonical error surface for `lexcap-core`.
#[derive(Debug, Error)]
pub enum LexcapError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[cfg(feature = "lex")]
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// Recovery merges could not bring the projected document count under the ceiling.
    #[error(
        "Unable to reserve {requested} documents for insertion into index. \
         Index contains too many documents. Current limitation is {ceiling} documents per index. \
         Current value of maxDoc is {observed_max_doc}."
    )]
    CapacityExceeded {
        requested: u64,
        ceiling: u64,
        observed_max_doc: u64,
    },

    #[error("aggregated reservation is full (capacity {capacity})")]
    OutOfBounds { capacity: usize },

    #[error("failed to withdraw aggregated reservation: {source}")]
    AggregateWithdrawalFailed {
        #[source]
        source: Box<LexcapError>,
    },

    #[error("reservation was issued by a different writer")]
    ForeignReservation,

    #[error("reservation withdrawal failed: {reason}")]
    WithdrawalFailed { reason: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("writer lock poisoned: {0}")]
    Lock(String),

    #[error("failed to parse reservation options: {0}")]
    Json(#[from] serde_json::Error),
}
