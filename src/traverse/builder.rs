//! TraversalBuilder - assembles a recursive traversal from decorators.
//!
//! The pipeline order is fixed: entry gate → recursive expansion → tap →
//! limit → filter → single-visit guard → base view. Hooks and conditions are
//! closures over a caller-owned context, so one `&mut Ctx` threads every
//! side effect of a propagation.

use crate::model::VertexId;
use crate::traverse::decorators::{ChildFilter, ChildLimit, EntryGate, SingleVisit, Tap};
use crate::traverse::GraphView;

/// A boxed condition over the traversal context.
pub type Predicate<'a, Ctx> = Box<dyn FnMut(&mut Ctx, VertexId) -> bool + 'a>;

/// A boxed listener over the traversal context.
pub type Listener<'a, Ctx> = Box<dyn FnMut(&mut Ctx, VertexId) + 'a>;

/// Recursive expansion: yields a vertex's immediate children and, for each
/// child passing the traverse condition, its transitive children, depth-first
/// and left-to-right in declared order.
///
/// `on_enter`/`on_leave` fire once per expanded vertex, including the root of
/// each call; the single-visit guard below guarantees each vertex is expanded
/// at most once per traversal.
struct Expand<'a, Ctx> {
    inner: Box<dyn GraphView<Ctx> + 'a>,
    traverse_when: Predicate<'a, Ctx>,
    on_enter: Listener<'a, Ctx>,
    on_leave: Listener<'a, Ctx>,
}

impl<Ctx> GraphView<Ctx> for Expand<'_, Ctx> {
    fn children(&mut self, ctx: &mut Ctx, vertex: VertexId) -> Vec<VertexId> {
        (self.on_enter)(ctx, vertex);
        let direct = self.inner.children(ctx, vertex);
        let mut result = Vec::new();
        for child in direct {
            result.push(child);
            if (self.traverse_when)(ctx, child) {
                result.extend(self.children(ctx, child));
            }
        }
        (self.on_leave)(ctx, vertex);
        result
    }
}

/// A fully assembled traversal. Implements [`GraphView`] itself, so it can be
/// chained into another traversal with
/// [`Compose`](crate::traverse::Compose).
pub struct Traversal<'a, Ctx> {
    root: EntryGate<Expand<'a, Ctx>, Predicate<'a, Ctx>>,
}

impl<Ctx> GraphView<Ctx> for Traversal<'_, Ctx> {
    fn children(&mut self, ctx: &mut Ctx, vertex: VertexId) -> Vec<VertexId> {
        self.root.children(ctx, vertex)
    }
}

/// Builder for a [`Traversal`].
///
/// # Example
///
/// ```
/// use netmorph::model::GraphModel;
/// use netmorph::traverse::{ForwardView, GraphView, TraversalBuilder};
///
/// let mut model = GraphModel::new();
/// let a = model.dense_source(4, 8);
/// let b = model.pool(a);
/// let c = model.dense(1, &[b]);
///
/// let mut reached = Vec::new();
/// let mut walk = TraversalBuilder::new(ForwardView::new(&model))
///     .on_visit(|seen: &mut Vec<_>, v| seen.push(v))
///     .build();
/// walk.children(&mut reached, a);
/// assert_eq!(reached, vec![b, c]);
/// ```
pub struct TraversalBuilder<'a, Ctx, V> {
    base: V,
    enter_when: Option<Predicate<'a, Ctx>>,
    traverse_when: Option<Predicate<'a, Ctx>>,
    visit_when: Option<Predicate<'a, Ctx>>,
    child_filter: Option<Predicate<'a, Ctx>>,
    child_limit: Option<usize>,
    on_enter: Option<Listener<'a, Ctx>>,
    on_visit: Option<Listener<'a, Ctx>>,
    on_leave: Option<Listener<'a, Ctx>>,
}

impl<'a, Ctx: 'a, V: GraphView<Ctx> + 'a> TraversalBuilder<'a, Ctx, V> {
    pub fn new(base: V) -> Self {
        Self {
            base,
            enter_when: None,
            traverse_when: None,
            visit_when: None,
            child_filter: None,
            child_limit: None,
            on_enter: None,
            on_visit: None,
            on_leave: None,
        }
    }

    /// Condition that must hold on a call's root for the traversal to begin
    /// at all. Default: always.
    pub fn enter_when<F>(mut self, predicate: F) -> Self
    where
        F: FnMut(&mut Ctx, VertexId) -> bool + 'a,
    {
        self.enter_when = Some(Box::new(predicate));
        self
    }

    /// Condition that must hold on a child for recursion to continue past
    /// it. Default: always (the single-visit guard still bounds the walk).
    pub fn traverse_when<F>(mut self, predicate: F) -> Self
    where
        F: FnMut(&mut Ctx, VertexId) -> bool + 'a,
    {
        self.traverse_when = Some(Box::new(predicate));
        self
    }

    /// Filters which yielded vertices are reported to `on_visit`. Default:
    /// all of them.
    pub fn visit_when<F>(mut self, predicate: F) -> Self
    where
        F: FnMut(&mut Ctx, VertexId) -> bool + 'a,
    {
        self.visit_when = Some(Box::new(predicate));
        self
    }

    /// Drops children failing the predicate before they are yielded.
    pub fn filter_children<F>(mut self, predicate: F) -> Self
    where
        F: FnMut(&mut Ctx, VertexId) -> bool + 'a,
    {
        self.child_filter = Some(Box::new(predicate));
        self
    }

    /// Caps the number of children considered per vertex. Default: unlimited.
    pub fn limit_children(mut self, limit: usize) -> Self {
        self.child_limit = Some(limit);
        self
    }

    /// Fires when a vertex is about to be expanded.
    pub fn on_enter<F>(mut self, listener: F) -> Self
    where
        F: FnMut(&mut Ctx, VertexId) + 'a,
    {
        self.on_enter = Some(Box::new(listener));
        self
    }

    /// Fires once for each vertex the traversal yields (after the visit
    /// condition).
    pub fn on_visit<F>(mut self, listener: F) -> Self
    where
        F: FnMut(&mut Ctx, VertexId) + 'a,
    {
        self.on_visit = Some(Box::new(listener));
        self
    }

    /// Fires when a vertex's expansion is complete.
    pub fn on_leave<F>(mut self, listener: F) -> Self
    where
        F: FnMut(&mut Ctx, VertexId) + 'a,
    {
        self.on_leave = Some(Box::new(listener));
        self
    }

    /// Assembles the decorator pipeline.
    pub fn build(self) -> Traversal<'a, Ctx> {
        let mut chain: Box<dyn GraphView<Ctx> + 'a> = Box::new(SingleVisit::new(self.base));
        if let Some(predicate) = self.child_filter {
            chain = Box::new(ChildFilter::new(chain, predicate));
        }
        if let Some(limit) = self.child_limit {
            chain = Box::new(ChildLimit::new(chain, limit));
        }

        let mut visit_when = self
            .visit_when
            .unwrap_or_else(|| Box::new(|_: &mut Ctx, _| true));
        let mut on_visit = self
            .on_visit
            .unwrap_or_else(|| Box::new(|_: &mut Ctx, _| {}));
        let tapped: Box<dyn GraphView<Ctx> + 'a> =
            Box::new(Tap::new(chain, move |ctx: &mut Ctx, vertex| {
                if visit_when(ctx, vertex) {
                    on_visit(ctx, vertex);
                }
            }));

        let expand = Expand {
            inner: tapped,
            traverse_when: self
                .traverse_when
                .unwrap_or_else(|| Box::new(|_: &mut Ctx, _| true)),
            on_enter: self
                .on_enter
                .unwrap_or_else(|| Box::new(|_: &mut Ctx, _| {})),
            on_leave: self
                .on_leave
                .unwrap_or_else(|| Box::new(|_: &mut Ctx, _| {})),
        };

        let enter_when = self
            .enter_when
            .unwrap_or_else(|| Box::new(|_: &mut Ctx, _| true));
        Traversal {
            root: EntryGate::new(expand, enter_when),
        }
    }
}
