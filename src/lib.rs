//! # netmorph
//!
//! Structural-resize propagation for neural computation graphs.
//!
//! A surrounding system that evolves network architectures (wider/narrower
//! layers) needs to change the output width of one vertex and have every
//! dependent vertex follow suit, so the graph stays shape-consistent through
//! branching, merging and elementwise-combining vertices. This crate provides
//! that subsystem:
//!
//! - a reusable lazy graph-traversal engine with composable policies
//!   ([`traverse`]),
//! - a size-delta propagation algorithm built on it ([`resize`]).
//!
//! Layer computation, weight transfer and training are the business of
//! downstream collaborators; this crate only produces a consistent mutated
//! graph description, with vertex identities preserved so weights can later
//! be matched by id.
//!
//! ## Example
//!
//! ```
//! use netmorph::prelude::*;
//!
//! // dense → pool → dense
//! let mut model = GraphModel::new();
//! let a = model.dense_source(4, 8);
//! let b = model.pool(a);
//! let c = model.dense(8, &[b]);
//!
//! // Narrow the first dense layer by 3 units.
//! let resized = ResizePropagator::new()
//!     .apply(&model, &ResizeRequest::new(a, WidthTransform::ShrinkBy(3)))
//!     .unwrap();
//!
//! assert_eq!(resized.width_of(a).unwrap(), 5);
//! assert_eq!(resized.input_width_of(c).unwrap(), 5);
//! // The original model is untouched.
//! assert_eq!(model.width_of(a).unwrap(), 8);
//! ```

pub mod errors;
pub mod model;
pub mod resize;
pub mod traverse;

// Re-exports for convenience
pub use errors::ResizeError;
pub use model::{GraphModel, LayerOp, SizeClass, VertexId};
pub use resize::{ResizePropagator, ResizeRequest, WidthTransform};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::errors::ResizeError;
    pub use crate::model::{
        GraphModel, LayerOp, SizeClass, StandardSemantics, VertexId, VertexSizeSemantics,
    };
    pub use crate::resize::{ResizePropagator, ResizeRequest, SizeDeltaTracker, WidthTransform};
    pub use crate::traverse::{GraphView, TraversalBuilder};
}
