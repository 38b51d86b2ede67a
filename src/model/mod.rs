//! Computation-graph model: vertices, operations and size semantics.
//!
//! # Example
//!
//! ```
//! use netmorph::model::GraphModel;
//!
//! let mut model = GraphModel::new();
//! let a = model.dense_source(4, 8);
//! let b = model.pool(a);
//! let _c = model.dense(8, &[b]);
//! assert_eq!(model.len(), 3);
//! ```

mod graph;
mod semantics;
mod vertex;

pub use graph::{GraphDescription, GraphModel, VertexDescription};
pub use semantics::{SizeClass, StandardSemantics, VertexSizeSemantics};
pub use vertex::{LayerOp, VertexId, VertexSpec};
