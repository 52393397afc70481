//! # Shepard Algorithms
//!
//! Scattered N-dimensional interpolation for Shepard.
//!
//! ## Available Algorithm Categories
//!
//! - **interpolation**: k-d tree spatial index, k-nearest IDW

mod maybe_rayon;
pub mod interpolation;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::interpolation::{
        IdwParams, InterpolationResult, Interpolator, KdTree, Neighbor, ResultKind, Sample,
    };
    pub use shepard_core::prelude::*;
}
