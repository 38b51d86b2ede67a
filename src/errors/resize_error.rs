//! Resize-propagation error types.

use thiserror::Error;

use crate::model::VertexId;

/// Errors that can occur while building a graph description or propagating
/// a structural resize through it.
///
/// A propagation either fully succeeds or fails with one of these; the
/// caller's model is never left partially mutated.
#[derive(Debug, Error)]
pub enum ResizeError {
    /// The resize request names a vertex that is not part of the model.
    #[error("Unknown vertex: {0}")]
    UnknownVertex(VertexId),

    /// The size-semantics lookup could not classify a vertex. This is a
    /// collaborator-configuration error, not recoverable by retry.
    #[error("Vertex {0} has no size classification")]
    UnsupportedVertexKind(VertexId),

    /// Splitting a delta across a merge vertex's branches left a nonzero
    /// remainder. Internal invariant violation; the mutation is aborted.
    #[error("Delta distribution at merge vertex {vertex} left a remainder of {remainder}")]
    DistributionImbalance { vertex: VertexId, remainder: i64 },

    /// The graph structure is malformed (e.g. a derived-width vertex with no
    /// inputs, or a width driven below zero mid-propagation).
    #[error("Invalid graph structure: {0}")]
    InvalidGraph(String),

    /// Serialization of the graph description failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
