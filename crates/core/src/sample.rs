//! Known (coordinate, value) samples

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An immutable sample: a scalar value observed at an N-dimensional coordinate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    value: f64,
    coordinate: Box<[f64]>,
}

impl Sample {
    pub fn new(value: f64, coordinate: impl Into<Box<[f64]>>) -> Self {
        Self {
            value,
            coordinate: coordinate.into(),
        }
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub fn coordinate(&self) -> &[f64] {
        &self.coordinate
    }

    /// Number of coordinate components.
    #[inline]
    pub fn dimensions(&self) -> usize {
        self.coordinate.len()
    }

    /// Squared Euclidean distance to a query coordinate
    #[inline]
    pub fn dist_sq(&self, query: &[f64]) -> f64 {
        squared_distance(&self.coordinate, query)
    }

    /// Euclidean distance to a query coordinate
    #[inline]
    pub fn dist(&self, query: &[f64]) -> f64 {
        self.dist_sq(query).sqrt()
    }
}

/// Sum of squared componentwise differences.
///
/// Only the overlapping components are compared; callers check lengths.
#[inline]
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Euclidean distance `sqrt(Σ (a[i] - b[i])²)`.
#[inline]
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    squared_distance(a, b).sqrt()
}
