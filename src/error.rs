use std::path::PathBuf;

use thiserror::Error;

use crate::model::EntityKind;

/// Boxed error returned by storage collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error type for the polycad document core.
#[derive(Debug, Error)]
pub enum PolycadError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised by arena, chain and tree mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("{kind} #{index} not found")]
    NotFound { kind: EntityKind, index: u16 },

    #[error("{kind} table is full ({capacity} slots)")]
    CapacityExhausted { kind: EntityKind, capacity: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("broken {kind} chain at #{index}")]
    BrokenChain { kind: EntityKind, index: u16 },
}

/// Errors crossing the file-storage boundary.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to load {}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("failed to save {}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("invalid snapshot: {0}")]
    Snapshot(String),
}

/// Convenience type alias for results using [`PolycadError`].
pub type Result<T> = std::result::Result<T, PolycadError>;
