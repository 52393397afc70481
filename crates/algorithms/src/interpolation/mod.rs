//! Scattered-data interpolation
//!
//! - KdTree: incremental N-dimensional k-d tree with exact and k-nearest lookup
//! - IDW: k-nearest Inverse Distance Weighting (modified Shepard's method)

mod idw;
pub mod kdtree;

pub use idw::{IdwParams, InterpolationResult, Interpolator, ResultKind};
pub use kdtree::{KdTree, Neighbor};
pub use shepard_core::Sample;
