//! ResizePropagator - applies a width change to one vertex and propagates it
//! through every dependent vertex.
//!
//! The propagator mutates a private clone of the model; a failed propagation
//! drops the clone, so the caller never observes a partially-resized graph.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::errors::ResizeError;
use crate::model::{GraphModel, SizeClass, StandardSemantics, VertexId, VertexSizeSemantics};
use crate::resize::SizeDeltaTracker;
use crate::traverse::{
    BackwardView, Compose, ForwardView, GraphView, Traversal, TraversalBuilder,
};

/// Deterministic width transform of a resize request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WidthTransform {
    /// Set the width to an absolute value.
    SetTo(u32),
    /// Scale the width by a factor, rounded to nearest.
    ScaleBy(f64),
    /// Widen by a fixed number of units.
    GrowBy(u32),
    /// Narrow by a fixed number of units.
    ShrinkBy(u32),
}

impl WidthTransform {
    /// Applies the transform to the current width. Clamping against the
    /// request's minimum happens in the propagator, not here.
    pub fn apply(self, old_width: u32) -> u32 {
        match self {
            Self::SetTo(width) => width,
            Self::ScaleBy(factor) => (f64::from(old_width) * factor.max(0.0)).round() as u32,
            Self::GrowBy(units) => old_width.saturating_add(units),
            Self::ShrinkBy(units) => old_width.saturating_sub(units),
        }
    }
}

/// A request to change the output width of one vertex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResizeRequest {
    pub target: VertexId,
    pub transform: WidthTransform,
    /// Structural floor for the new width; requests below it are clamped,
    /// not rejected. Never less than 1.
    pub minimum_width: u32,
}

impl ResizeRequest {
    pub fn new(target: VertexId, transform: WidthTransform) -> Self {
        Self {
            target,
            transform,
            minimum_width: 1,
        }
    }

    pub fn with_minimum_width(mut self, minimum_width: u32) -> Self {
        self.minimum_width = minimum_width;
        self
    }
}

/// Queued follow-up walks discovered while a walk is in progress.
enum Reentry {
    /// Fan a recorded width change out to a vertex's consumers.
    Forward(VertexId),
    /// Resolve the ancestor branches feeding a combining vertex.
    Backward(VertexId),
}

/// Per-invocation propagation state, exclusively borrowed by one `apply`
/// call and dropped with it.
struct PropagationState {
    /// The copy-on-write result model.
    model: GraphModel,
    tracker: SizeDeltaTracker,
    /// Deltas of the forward expansions currently on the stack; the top is
    /// the delta arriving at the vertices being yielded right now.
    delta_stack: Vec<i64>,
    pending: VecDeque<Reentry>,
    backward_origins: HashSet<VertexId>,
    /// Vertices whose owned output width has already been set.
    resolved: HashSet<VertexId>,
    failure: Option<ResizeError>,
}

impl PropagationState {
    fn fail(&mut self, error: ResizeError) {
        if self.failure.is_none() {
            self.failure = Some(error);
        }
    }

    /// Reduces the owned input width of `vertex` by `delta`.
    fn shift_input_width(&mut self, vertex: VertexId, delta: i64) {
        let result = self.model.input_width_of(vertex).and_then(|old| {
            let new = i64::from(old) - delta;
            if new < 0 {
                return Err(ResizeError::InvalidGraph(format!(
                    "Input width of {vertex} driven below zero"
                )));
            }
            self.model.set_input_width(vertex, new as u32)
        });
        if let Err(error) = result {
            self.fail(error);
        }
    }

    /// Reduces the owned output width of `vertex` by `delta`, at most once
    /// per propagation. Returns true if the width was changed now.
    fn shift_output_width(&mut self, vertex: VertexId, delta: i64) -> bool {
        if !self.resolved.insert(vertex) {
            return false;
        }
        let result = self.model.width_of(vertex).and_then(|old| {
            let new = i64::from(old) - delta;
            if new < 0 {
                return Err(ResizeError::InvalidGraph(format!(
                    "Output width of {vertex} driven below zero"
                )));
            }
            self.model.set_output_width(vertex, new as u32)
        });
        match result {
            Ok(()) => true,
            Err(error) => {
                self.fail(error);
                false
            }
        }
    }
}

fn classify_or_fail<S: VertexSizeSemantics>(
    semantics: &S,
    state: &mut PropagationState,
    vertex: VertexId,
) -> Option<SizeClass> {
    match state.model.get(vertex) {
        None => {
            state.fail(ResizeError::UnknownVertex(vertex));
            None
        }
        Some(spec) => match semantics.classify(&spec.op) {
            Some(class) => Some(class),
            None => {
                state.fail(ResizeError::UnsupportedVertexKind(vertex));
                None
            }
        },
    }
}

/// Propagates [`ResizeRequest`]s through a [`GraphModel`].
///
/// # Example
///
/// ```
/// use netmorph::model::GraphModel;
/// use netmorph::resize::{ResizePropagator, ResizeRequest, WidthTransform};
///
/// let mut model = GraphModel::new();
/// let a = model.dense_source(4, 8);
/// let b = model.pool(a);
/// let c = model.dense(8, &[b]);
///
/// let propagator = ResizePropagator::new();
/// let request = ResizeRequest::new(a, WidthTransform::ShrinkBy(3));
/// let resized = propagator.apply(&model, &request).unwrap();
///
/// assert_eq!(resized.width_of(a).unwrap(), 5);
/// assert_eq!(resized.input_width_of(c).unwrap(), 5);
/// assert_eq!(resized.width_of(c).unwrap(), 8);
/// ```
pub struct ResizePropagator<S = StandardSemantics> {
    semantics: S,
}

impl ResizePropagator<StandardSemantics> {
    /// Propagator over the standard size classification.
    pub fn new() -> Self {
        Self {
            semantics: StandardSemantics,
        }
    }
}

impl Default for ResizePropagator<StandardSemantics> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: VertexSizeSemantics> ResizePropagator<S> {
    /// Propagator over a caller-supplied size classification.
    pub fn with_semantics(semantics: S) -> Self {
        Self { semantics }
    }

    /// Applies the request and returns the mutated model. The input model is
    /// never touched; on error the caller keeps it unchanged.
    pub fn apply(
        &self,
        model: &GraphModel,
        request: &ResizeRequest,
    ) -> Result<GraphModel, ResizeError> {
        let spec = model
            .get(request.target)
            .ok_or(ResizeError::UnknownVertex(request.target))?;
        let class = self
            .semantics
            .classify(&spec.op)
            .ok_or(ResizeError::UnsupportedVertexKind(request.target))?;

        let old_width = model.width_of(request.target)?;
        let mut new_width = request.transform.apply(old_width);
        let floor = request.minimum_width.max(1);
        if new_width < floor {
            log::info!(
                "Requested width {new_width} for {} is below the structural minimum; clamping to {floor}",
                request.target
            );
            new_width = floor;
        }
        let delta = i64::from(old_width) - i64::from(new_width);
        if delta == 0 {
            return Ok(model.clone());
        }
        log::debug!(
            "Resizing {} from {old_width} to {new_width} (delta {delta})",
            request.target
        );

        let mut state = PropagationState {
            model: model.clone(),
            tracker: SizeDeltaTracker::new(),
            delta_stack: Vec::new(),
            pending: VecDeque::new(),
            backward_origins: HashSet::new(),
            resolved: HashSet::new(),
            failure: None,
        };
        state.tracker.set(request.target, delta);

        match class {
            // The target owns its output width; set it directly.
            SizeClass::SizeBearing | SizeClass::CoupledSize => {
                state.resolved.insert(request.target);
                state.model.set_output_width(request.target, new_width)?;
            }
            // Derived-width targets realize the change purely through
            // propagation into their producers.
            SizeClass::PassThrough | SizeClass::Merge | SizeClass::Elementwise => {}
        }
        if class.requires_ancestor_resolution() {
            state.backward_origins.insert(request.target);
            state.pending.push_back(Reentry::Backward(request.target));
        }

        let mut forward = self.forward_traversal(model);
        let mut backward = self.backward_traversal(model);

        forward.children(&mut state, request.target);
        while state.failure.is_none() {
            let Some(item) = state.pending.pop_front() else {
                break;
            };
            match item {
                Reentry::Forward(vertex) => {
                    forward.children(&mut state, vertex);
                }
                Reentry::Backward(vertex) => {
                    // Every ancestor the backward walk resolves is streamed
                    // straight into a fresh forward walk.
                    let mut reentry = Compose::new(&mut backward, &mut forward);
                    reentry.children(&mut state, vertex);
                }
            }
        }

        match state.failure {
            Some(error) => Err(error),
            None => Ok(state.model),
        }
    }

    /// Descendant walk: carries the delta of its origin to every dependent
    /// vertex, stopping where a vertex's own parameters absorb the change.
    fn forward_traversal(&self, model: &GraphModel) -> Traversal<'_, PropagationState> {
        let semantics = &self.semantics;
        TraversalBuilder::new(ForwardView::new(model))
            .enter_when(|state: &mut PropagationState, vertex| {
                state.failure.is_none() && state.tracker.get(vertex).is_some()
            })
            .traverse_when(move |state: &mut PropagationState, vertex| {
                state.failure.is_none()
                    && classify_or_fail(semantics, state, vertex)
                        .is_some_and(SizeClass::propagates_forward)
            })
            .on_enter(move |state: &mut PropagationState, vertex| {
                // The origin of a walk carries its recorded delta; vertices
                // the walk flows through inherit the delta of the expansion
                // they were discovered under and record it.
                let delta = match state.tracker.get(vertex) {
                    Some(delta) => delta,
                    None => {
                        let inherited = state.delta_stack.last().copied().unwrap_or(0);
                        state.tracker.set(vertex, inherited);
                        inherited
                    }
                };
                state.delta_stack.push(delta);
            })
            .on_visit(move |state: &mut PropagationState, vertex| {
                if state.failure.is_some() {
                    return;
                }
                let Some(class) = classify_or_fail(semantics, state, vertex) else {
                    return;
                };
                let Some(&delta) = state.delta_stack.last() else {
                    return;
                };
                match class {
                    SizeClass::SizeBearing => state.shift_input_width(vertex, delta),
                    SizeClass::CoupledSize => {
                        // One width field covers both sides. The walk stops
                        // here, so the vertex becomes a fresh forward origin
                        // for its own consumers.
                        if state.shift_output_width(vertex, delta) {
                            state.tracker.set(vertex, delta);
                            state.pending.push_back(Reentry::Forward(vertex));
                        }
                    }
                    SizeClass::Elementwise => {
                        if state.backward_origins.insert(vertex) {
                            state.pending.push_back(Reentry::Backward(vertex));
                        }
                    }
                    SizeClass::Merge | SizeClass::PassThrough => {}
                }
            })
            .on_leave(|state: &mut PropagationState, vertex| {
                state.delta_stack.pop();
                log::trace!("forward expansion of {vertex} complete");
            })
            .build()
    }

    /// Ancestor walk: resolves the delta every producer branch of a
    /// combining vertex must carry, and applies it to the branch terminals.
    fn backward_traversal(&self, model: &GraphModel) -> Traversal<'_, PropagationState> {
        let semantics = &self.semantics;
        TraversalBuilder::new(BackwardView::new(model))
            .enter_when(|state: &mut PropagationState, vertex| {
                state.failure.is_none() && state.backward_origins.contains(&vertex)
            })
            .on_enter(move |state: &mut PropagationState, vertex| {
                if state.failure.is_some() {
                    return;
                }
                let PropagationState { model, tracker, .. } = state;
                if let Err(error) = tracker.visit(model, semantics, vertex) {
                    state.fail(error);
                }
            })
            .filter_children(|state: &mut PropagationState, vertex| {
                // Branches that were not assigned a delta are unchanged and
                // stay out of the walk entirely.
                state.failure.is_none() && state.tracker.get(vertex).is_some()
            })
            .traverse_when(move |state: &mut PropagationState, vertex| {
                state.failure.is_none()
                    && classify_or_fail(semantics, state, vertex)
                        .is_some_and(SizeClass::propagates_backward)
            })
            .visit_when(move |state: &mut PropagationState, vertex| {
                matches!(
                    classify_or_fail(semantics, state, vertex),
                    Some(SizeClass::SizeBearing | SizeClass::CoupledSize)
                )
            })
            .on_visit(move |state: &mut PropagationState, vertex| {
                if state.failure.is_some() {
                    return;
                }
                let Some(delta) = state.tracker.get(vertex) else {
                    return;
                };
                if state.shift_output_width(vertex, delta) {
                    log::debug!("Resolved ancestor {vertex} by delta {delta}");
                }
            })
            .on_leave(|_: &mut PropagationState, vertex| {
                log::trace!("backward expansion of {vertex} complete");
            })
            .build()
    }
}
