//! Error types for graph construction and resize propagation.

mod resize_error;

pub use resize_error::ResizeError;
