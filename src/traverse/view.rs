//! The GraphView contract and the two concrete adjacency views.
//!
//! A `GraphView` yields the immediate neighbors of a vertex. Every call is
//! threaded through a caller-owned context `Ctx` so that traversal hooks can
//! mutate shared per-invocation state under a single exclusive borrow.

use std::collections::BTreeMap;

use crate::model::{GraphModel, VertexId};

/// Lazy adjacency: the immediate children of a vertex.
///
/// Must not fail for a vertex with no children — it yields nothing instead.
/// `&mut self` lets stateful decorators (visited guards, taps) live in the
/// view chain itself.
pub trait GraphView<Ctx> {
    fn children(&mut self, ctx: &mut Ctx, vertex: VertexId) -> Vec<VertexId>;
}

impl<Ctx, V: GraphView<Ctx> + ?Sized> GraphView<Ctx> for &mut V {
    fn children(&mut self, ctx: &mut Ctx, vertex: VertexId) -> Vec<VertexId> {
        (**self).children(ctx, vertex)
    }
}

impl<Ctx, V: GraphView<Ctx> + ?Sized> GraphView<Ctx> for Box<V> {
    fn children(&mut self, ctx: &mut Ctx, vertex: VertexId) -> Vec<VertexId> {
        (**self).children(ctx, vertex)
    }
}

/// Producer→consumer view: children of a vertex are the vertices consuming
/// its output, in ascending consumer-id order.
///
/// The topology is snapshotted at construction; a resize only changes widths,
/// never wiring, so the snapshot stays valid for the whole propagation.
#[derive(Debug, Clone)]
pub struct ForwardView {
    edges: BTreeMap<VertexId, Vec<VertexId>>,
}

impl ForwardView {
    pub fn new(model: &GraphModel) -> Self {
        Self {
            edges: model.consumers(),
        }
    }
}

impl<Ctx> GraphView<Ctx> for ForwardView {
    fn children(&mut self, _ctx: &mut Ctx, vertex: VertexId) -> Vec<VertexId> {
        self.edges.get(&vertex).cloned().unwrap_or_default()
    }
}

/// Consumer→producer view: children of a vertex are its inputs, in declared
/// order. Declared order is what makes merge-delta splitting deterministic.
#[derive(Debug, Clone)]
pub struct BackwardView {
    edges: BTreeMap<VertexId, Vec<VertexId>>,
}

impl BackwardView {
    pub fn new(model: &GraphModel) -> Self {
        Self {
            edges: model
                .vertices()
                .map(|(id, spec)| (id, spec.inputs.clone()))
                .collect(),
        }
    }
}

impl<Ctx> GraphView<Ctx> for BackwardView {
    fn children(&mut self, _ctx: &mut Ctx, vertex: VertexId) -> Vec<VertexId> {
        self.edges.get(&vertex).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> (GraphModel, [VertexId; 4]) {
        let mut model = GraphModel::new();
        let a = model.dense_source(4, 8);
        let b = model.pool(a);
        let c = model.softmax(a);
        let d = model.add(&[b, c]);
        (model, [a, b, c, d])
    }

    #[test]
    fn test_forward_view_yields_consumers() {
        let (model, [a, b, c, d]) = diamond();
        let mut view = ForwardView::new(&model);
        assert_eq!(view.children(&mut (), a), vec![b, c]);
        assert_eq!(view.children(&mut (), d), Vec::new());
    }

    #[test]
    fn test_backward_view_yields_inputs_in_declared_order() {
        let (model, [a, b, c, d]) = diamond();
        let mut view = BackwardView::new(&model);
        assert_eq!(view.children(&mut (), d), vec![b, c]);
        assert_eq!(view.children(&mut (), a), Vec::new());
    }

    #[test]
    fn test_unknown_vertex_has_no_children() {
        let (model, _) = diamond();
        let mut view = ForwardView::new(&model);
        assert!(view.children(&mut (), VertexId(99)).is_empty());
    }
}
