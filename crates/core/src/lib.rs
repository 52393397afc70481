//! # Shepard Core
//!
//! Core types and errors shared by the Shepard interpolation crates.
//!
//! This crate provides:
//! - `Sample`: an immutable (coordinate, value) pair
//! - Euclidean distance helpers over coordinate slices
//! - `Error` / `Result`: the error taxonomy for configuration, argument and
//!   query failures

pub mod error;
pub mod sample;

pub use error::{Error, Result};
pub use sample::{euclidean_distance, squared_distance, Sample};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::sample::{euclidean_distance, Sample};
}
