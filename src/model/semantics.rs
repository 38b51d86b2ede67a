//! Size classification of vertices.
//!
//! The propagator never inspects a [`LayerOp`] directly; it consults a
//! [`VertexSizeSemantics`] lookup so that a collaborator with custom ops can
//! supply its own classification.

use serde::{Deserialize, Serialize};

use crate::model::LayerOp;

/// How a vertex participates in width propagation.
///
/// The enum is matched exhaustively everywhere: adding a class fails to
/// compile until every algorithm site handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    /// Output width equals input width; no independent parameters.
    PassThrough,
    /// Independently settable input and output widths. A change on one side
    /// is absorbed by the vertex's own parameters and does not imply the
    /// other side.
    SizeBearing,
    /// Input width and output width must always be equal; changing one
    /// forces the other.
    CoupledSize,
    /// Concatenates N branches; output width is the sum of input widths.
    Merge,
    /// Combines N equal-width inputs position-wise; a width change applies
    /// identically to every input.
    Elementwise,
}

impl SizeClass {
    /// Whether a width change arriving at a vertex of this class continues
    /// on to the vertex's consumers.
    ///
    /// This is the default forward traverse condition: size-bearing and
    /// coupled vertices absorb the change into their own parameters and
    /// terminate the forward walk (coupled vertices are re-entered as fresh
    /// origins once their own width has been updated).
    pub fn propagates_forward(self) -> bool {
        match self {
            Self::PassThrough | Self::Merge | Self::Elementwise => true,
            Self::SizeBearing | Self::CoupledSize => false,
        }
    }

    /// Whether a backward walk continues past a vertex of this class into
    /// its producers. Size-bearing vertices absorb the change at their
    /// output and stop the walk.
    pub fn propagates_backward(self) -> bool {
        match self {
            Self::PassThrough | Self::Merge | Self::Elementwise | Self::CoupledSize => true,
            Self::SizeBearing => false,
        }
    }

    /// Whether resizing a vertex of this class requires resolving deltas for
    /// its ancestor branches (it combines several producers whose widths are
    /// tied to its own).
    pub fn requires_ancestor_resolution(self) -> bool {
        match self {
            Self::Merge | Self::Elementwise | Self::CoupledSize | Self::PassThrough => true,
            Self::SizeBearing => false,
        }
    }
}

/// External lookup classifying each operation by size behavior.
///
/// Consulted, not owned, by the propagator. Returning `None` signals an
/// incomplete lookup and aborts the propagation with
/// [`ResizeError::UnsupportedVertexKind`].
///
/// [`ResizeError::UnsupportedVertexKind`]: crate::errors::ResizeError::UnsupportedVertexKind
pub trait VertexSizeSemantics {
    fn classify(&self, op: &LayerOp) -> Option<SizeClass>;
}

/// The standard classification for the built-in operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardSemantics;

impl VertexSizeSemantics for StandardSemantics {
    fn classify(&self, op: &LayerOp) -> Option<SizeClass> {
        let class = match op {
            LayerOp::Dense { .. } => SizeClass::SizeBearing,
            LayerOp::BatchNorm { .. } => SizeClass::CoupledSize,
            LayerOp::Pool | LayerOp::Softmax => SizeClass::PassThrough,
            LayerOp::Concat => SizeClass::Merge,
            LayerOp::Add | LayerOp::Multiply => SizeClass::Elementwise,
        };
        Some(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_classification() {
        let sem = StandardSemantics;
        assert_eq!(
            sem.classify(&LayerOp::dense(4, 8)),
            Some(SizeClass::SizeBearing)
        );
        assert_eq!(
            sem.classify(&LayerOp::batch_norm(4)),
            Some(SizeClass::CoupledSize)
        );
        assert_eq!(sem.classify(&LayerOp::Pool), Some(SizeClass::PassThrough));
        assert_eq!(
            sem.classify(&LayerOp::Softmax),
            Some(SizeClass::PassThrough)
        );
        assert_eq!(sem.classify(&LayerOp::Concat), Some(SizeClass::Merge));
        assert_eq!(sem.classify(&LayerOp::Add), Some(SizeClass::Elementwise));
        assert_eq!(
            sem.classify(&LayerOp::Multiply),
            Some(SizeClass::Elementwise)
        );
    }

    #[test]
    fn test_forward_terminators() {
        assert!(SizeClass::PassThrough.propagates_forward());
        assert!(SizeClass::Merge.propagates_forward());
        assert!(SizeClass::Elementwise.propagates_forward());
        assert!(!SizeClass::SizeBearing.propagates_forward());
        assert!(!SizeClass::CoupledSize.propagates_forward());
    }

    #[test]
    fn test_backward_terminators() {
        assert!(!SizeClass::SizeBearing.propagates_backward());
        assert!(SizeClass::CoupledSize.propagates_backward());
    }
}
