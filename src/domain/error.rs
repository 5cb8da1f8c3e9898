//! Error types for call stack traversal.

use crate::domain::snapshot::SnapshotId;
use thiserror::Error;

/// Conditions that stop a traversal.
///
/// Malformed snapshots (missing frame lists, boundary snapshots without a
/// frame) are not errors; they render as marker lines instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    /// A parent link leads back to a snapshot already visited.
    #[error("snapshot chain is cyclic: {snapshot} was already visited")]
    CyclicChain { snapshot: SnapshotId },

    /// More snapshots than the configured limit.
    #[error("snapshot chain exceeds the maximum length of {limit}")]
    ChainTooLong { limit: usize },

    /// The head or a parent link names a snapshot that does not exist.
    #[error("snapshot {snapshot} is not part of the chain")]
    UnknownSnapshot { snapshot: SnapshotId },
}

pub type TraceResult<T> = Result<T, TraceError>;
