//! Mesh processing algorithms.
//!
//! - **Shells**: connected components under twin adjacency, with streaming
//!   export of single shells
//! - **Decimation**: in-place quadric error metric edge collapse
//! - **Progress**: progress callbacks and cooperative stop tokens

pub mod decimate;
pub mod progress;
pub mod shells;

pub use progress::{Progress, StopToken};
