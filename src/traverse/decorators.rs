//! Composable wrappers around a [`GraphView`].
//!
//! Each decorator preserves the contract: `children` never fails and yields
//! nothing for a vertex without children. The pipeline a traversal uses is
//! assembled by [`TraversalBuilder`](crate::traverse::TraversalBuilder).

use std::collections::HashSet;

use crate::model::VertexId;
use crate::traverse::GraphView;

/// Yields each vertex at most once across all calls.
///
/// On the first `children` call that would yield a vertex, the vertex is
/// marked visited; later calls drop it. This is what bounds recursion on
/// diamond shapes and prevents double-counting a delta.
pub struct SingleVisit<V> {
    inner: V,
    visited: HashSet<VertexId>,
}

impl<V> SingleVisit<V> {
    pub fn new(inner: V) -> Self {
        Self {
            inner,
            visited: HashSet::new(),
        }
    }
}

impl<Ctx, V: GraphView<Ctx>> GraphView<Ctx> for SingleVisit<V> {
    fn children(&mut self, ctx: &mut Ctx, vertex: VertexId) -> Vec<VertexId> {
        self.inner
            .children(ctx, vertex)
            .into_iter()
            .filter(|child| self.visited.insert(*child))
            .collect()
    }
}

/// Refuses to descend at all when the predicate rejects the call's root:
/// the inner view is not even consulted.
pub struct EntryGate<V, P> {
    inner: V,
    predicate: P,
}

impl<V, P> EntryGate<V, P> {
    pub fn new(inner: V, predicate: P) -> Self {
        Self { inner, predicate }
    }
}

impl<Ctx, V, P> GraphView<Ctx> for EntryGate<V, P>
where
    V: GraphView<Ctx>,
    P: FnMut(&mut Ctx, VertexId) -> bool,
{
    fn children(&mut self, ctx: &mut Ctx, vertex: VertexId) -> Vec<VertexId> {
        if !(self.predicate)(ctx, vertex) {
            return Vec::new();
        }
        self.inner.children(ctx, vertex)
    }
}

/// Drops children failing the predicate.
pub struct ChildFilter<V, P> {
    inner: V,
    predicate: P,
}

impl<V, P> ChildFilter<V, P> {
    pub fn new(inner: V, predicate: P) -> Self {
        Self { inner, predicate }
    }
}

impl<Ctx, V, P> GraphView<Ctx> for ChildFilter<V, P>
where
    V: GraphView<Ctx>,
    P: FnMut(&mut Ctx, VertexId) -> bool,
{
    fn children(&mut self, ctx: &mut Ctx, vertex: VertexId) -> Vec<VertexId> {
        self.inner
            .children(ctx, vertex)
            .into_iter()
            .filter(|child| (self.predicate)(ctx, *child))
            .collect()
    }
}

/// Caps the number of children yielded per call.
pub struct ChildLimit<V> {
    inner: V,
    limit: usize,
}

impl<V> ChildLimit<V> {
    pub fn new(inner: V, limit: usize) -> Self {
        Self { inner, limit }
    }
}

impl<Ctx, V: GraphView<Ctx>> GraphView<Ctx> for ChildLimit<V> {
    fn children(&mut self, ctx: &mut Ctx, vertex: VertexId) -> Vec<VertexId> {
        let mut children = self.inner.children(ctx, vertex);
        children.truncate(self.limit);
        children
    }
}

/// Invokes a callback for each yielded child without altering the sequence.
pub struct Tap<V, F> {
    inner: V,
    effect: F,
}

impl<V, F> Tap<V, F> {
    pub fn new(inner: V, effect: F) -> Self {
        Self { inner, effect }
    }
}

impl<Ctx, V, F> GraphView<Ctx> for Tap<V, F>
where
    V: GraphView<Ctx>,
    F: FnMut(&mut Ctx, VertexId),
{
    fn children(&mut self, ctx: &mut Ctx, vertex: VertexId) -> Vec<VertexId> {
        let children = self.inner.children(ctx, vertex);
        for child in &children {
            (self.effect)(ctx, *child);
        }
        children
    }
}

/// Chains two views: the children of the first feed the second.
///
/// `children(v) = flat_map(first.children(v), second.children)` — this is the
/// re-entry mechanism that streams the vertices a backward walk resolved into
/// a fresh forward walk.
pub struct Compose<A, B> {
    first: A,
    second: B,
}

impl<A, B> Compose<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<Ctx, A, B> GraphView<Ctx> for Compose<A, B>
where
    A: GraphView<Ctx>,
    B: GraphView<Ctx>,
{
    fn children(&mut self, ctx: &mut Ctx, vertex: VertexId) -> Vec<VertexId> {
        let mut result = Vec::new();
        for mid in self.first.children(ctx, vertex) {
            result.extend(self.second.children(ctx, mid));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Fixed adjacency for exercising decorators in isolation.
    struct MapView(BTreeMap<VertexId, Vec<VertexId>>);

    impl<Ctx> GraphView<Ctx> for MapView {
        fn children(&mut self, _ctx: &mut Ctx, vertex: VertexId) -> Vec<VertexId> {
            self.0.get(&vertex).cloned().unwrap_or_default()
        }
    }

    fn v(n: u32) -> VertexId {
        VertexId(n)
    }

    fn fan_out() -> MapView {
        MapView(BTreeMap::from([
            (v(0), vec![v(1), v(2), v(3)]),
            (v(1), vec![v(3)]),
        ]))
    }

    #[test]
    fn test_single_visit_yields_each_vertex_once() {
        let mut view = SingleVisit::new(fan_out());
        assert_eq!(view.children(&mut (), v(0)), vec![v(1), v(2), v(3)]);
        assert_eq!(view.children(&mut (), v(1)), Vec::new());
    }

    #[test]
    fn test_entry_gate_refuses_root() {
        let mut view = EntryGate::new(fan_out(), |_: &mut (), root| root != v(0));
        assert!(view.children(&mut (), v(0)).is_empty());
        assert_eq!(view.children(&mut (), v(1)), vec![v(3)]);
    }

    #[test]
    fn test_child_filter_drops_failing_children() {
        let mut view = ChildFilter::new(fan_out(), |_: &mut (), child| child != v(2));
        assert_eq!(view.children(&mut (), v(0)), vec![v(1), v(3)]);
    }

    #[test]
    fn test_child_limit_caps_per_call() {
        let mut view = ChildLimit::new(fan_out(), 2);
        assert_eq!(view.children(&mut (), v(0)), vec![v(1), v(2)]);
        assert_eq!(view.children(&mut (), v(1)), vec![v(3)]);
    }

    #[test]
    fn test_tap_sees_every_child_in_order() {
        let mut view = Tap::new(fan_out(), |seen: &mut Vec<VertexId>, child| {
            seen.push(child)
        });
        let mut seen = Vec::new();
        let children = view.children(&mut seen, v(0));
        assert_eq!(children, seen);
        assert_eq!(seen, vec![v(1), v(2), v(3)]);
    }

    #[test]
    fn test_compose_flat_maps_first_into_second() {
        let first = MapView(BTreeMap::from([(v(0), vec![v(1), v(2)])]));
        let second = MapView(BTreeMap::from([
            (v(1), vec![v(4)]),
            (v(2), vec![v(5), v(6)]),
        ]));
        let mut view = Compose::new(first, second);
        assert_eq!(view.children(&mut (), v(0)), vec![v(4), v(5), v(6)]);
    }

    #[test]
    fn test_decorators_stack() {
        let guarded = SingleVisit::new(fan_out());
        let mut view = ChildLimit::new(guarded, 2);
        assert_eq!(view.children(&mut (), v(0)), vec![v(1), v(2)]);
        // The guard below the limit already marked v3 visited when it was
        // computed for v0, even though the limit dropped it.
        assert_eq!(view.children(&mut (), v(1)), Vec::new());
    }
}
