//! Vertex identity and layer operations.
//!
//! Uses a simple enum instead of trait objects for clarity: every width an
//! operation owns lives inside its variant, so a coupled-size op physically
//! cannot have mismatched input and output widths.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for a vertex, unique within one [`GraphModel`].
///
/// Ids are assigned sequentially by the owning model and survive a resize
/// unchanged, so downstream collaborators (model assembly, weight transfer)
/// can match vertices across the old and new model.
///
/// [`GraphModel`]: crate::model::GraphModel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(pub(crate) u32);

impl VertexId {
    /// Builds an id from a raw index. Useful for matching vertices across
    /// process boundaries; an id not present in a model is simply unknown.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index of this id.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A layer operation in the computation graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LayerOp {
    /// Dense (fully connected) layer. Input and output widths are
    /// independently settable; changing one side never implies the other.
    #[serde(rename = "DENSE")]
    Dense { input_width: u32, output_width: u32 },

    /// Per-channel batch normalization. Input width and output width are
    /// always equal, hence a single field.
    #[serde(rename = "BATCH_NORM")]
    BatchNorm { width: u32 },

    /// Pooling over the feature dimension; output width equals input width
    /// and the op carries no parameters of its own.
    #[serde(rename = "POOL")]
    Pool,

    /// Softmax over the feature dimension; pass-through for sizing purposes.
    #[serde(rename = "SOFTMAX")]
    Softmax,

    /// Concatenation of N input branches along the feature dimension.
    #[serde(rename = "CONCAT")]
    Concat,

    /// Element-wise addition of equal-width inputs.
    #[serde(rename = "ADD")]
    Add,

    /// Element-wise multiplication of equal-width inputs.
    #[serde(rename = "MULTIPLY")]
    Multiply,
}

impl LayerOp {
    /// Creates a dense layer op.
    pub fn dense(input_width: u32, output_width: u32) -> Self {
        Self::Dense {
            input_width,
            output_width,
        }
    }

    /// Creates a batch-normalization op.
    pub fn batch_norm(width: u32) -> Self {
        Self::BatchNorm { width }
    }

    /// Returns the output width this op owns, if it owns one.
    ///
    /// Pass-through, merge and elementwise ops derive their width from their
    /// inputs and return `None` here.
    pub fn owned_output_width(&self) -> Option<u32> {
        match self {
            Self::Dense { output_width, .. } => Some(*output_width),
            Self::BatchNorm { width } => Some(*width),
            Self::Pool | Self::Softmax | Self::Concat | Self::Add | Self::Multiply => None,
        }
    }

    /// Returns the input width this op owns, if it owns one.
    pub fn owned_input_width(&self) -> Option<u32> {
        match self {
            Self::Dense { input_width, .. } => Some(*input_width),
            Self::BatchNorm { width } => Some(*width),
            Self::Pool | Self::Softmax | Self::Concat | Self::Add | Self::Multiply => None,
        }
    }
}

/// A vertex of the computation graph: its operation plus the vertices that
/// feed it, in declared order.
///
/// Input order is load-bearing: it determines the deterministic depth-first
/// visit order, which in turn fixes how a delta is split at merge vertices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexSpec {
    pub op: LayerOp,
    pub inputs: Vec<VertexId>,
}

impl VertexSpec {
    pub fn new(op: LayerOp, inputs: Vec<VertexId>) -> Self {
        Self { op, inputs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id_display() {
        assert_eq!(VertexId(7).to_string(), "v7");
    }

    #[test]
    fn test_dense_owns_both_widths() {
        let op = LayerOp::dense(4, 8);
        assert_eq!(op.owned_input_width(), Some(4));
        assert_eq!(op.owned_output_width(), Some(8));
    }

    #[test]
    fn test_batch_norm_widths_are_coupled() {
        let op = LayerOp::batch_norm(6);
        assert_eq!(op.owned_input_width(), op.owned_output_width());
    }

    #[test]
    fn test_derived_ops_own_no_width() {
        for op in [
            LayerOp::Pool,
            LayerOp::Softmax,
            LayerOp::Concat,
            LayerOp::Add,
            LayerOp::Multiply,
        ] {
            assert_eq!(op.owned_output_width(), None);
            assert_eq!(op.owned_input_width(), None);
        }
    }
}
