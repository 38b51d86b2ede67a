//! Lazy graph traversal: views, decorators and the traversal builder.
//!
//! A [`GraphView`] yields a vertex's immediate neighbors; decorators wrap a
//! view to add visiting policy; [`TraversalBuilder`] assembles the fixed
//! decorator pipeline into a recursive depth-first [`Traversal`]. The resize
//! propagator drives one forward and one backward traversal per call and
//! chains them with [`Compose`] for re-entry.

mod builder;
mod decorators;
mod view;

pub use builder::{Listener, Predicate, Traversal, TraversalBuilder};
pub use decorators::{ChildFilter, ChildLimit, Compose, EntryGate, SingleVisit, Tap};
pub use view::{BackwardView, ForwardView, GraphView};
