//! Structural-resize propagation: delta bookkeeping and the propagator.

mod propagator;
mod tracker;

pub use propagator::{ResizePropagator, ResizeRequest, WidthTransform};
pub use tracker::SizeDeltaTracker;
