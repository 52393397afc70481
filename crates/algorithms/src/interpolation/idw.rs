//! Inverse Distance Weighting (IDW) interpolation
//!
//! Estimates the value at a query coordinate as a weighted average of the
//! k nearest known samples, where weights are inversely proportional to
//! distance raised to a power parameter (modified Shepard's method).
//!
//! Reference:
//! Shepard, D. (1968). A two-dimensional interpolation function for
//! irregularly-spaced data. ACM National Conference.

use crate::maybe_rayon::*;
use shepard_core::{Error, Result, Sample};
use tracing::{debug, trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::kdtree::{KdTree, Neighbor};

/// Parameters for IDW interpolation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IdwParams {
    /// Power parameter (default: 2.0).
    /// Higher values give more weight to nearby samples.
    pub power: f64,
    /// Number of nearest samples used per query (default: 5).
    pub neighbours: usize,
}

impl Default for IdwParams {
    fn default() -> Self {
        Self {
            power: 2.0,
            neighbours: 5,
        }
    }
}

impl IdwParams {
    /// Check that power is a positive finite number and neighbours is at least 1.
    pub fn validate(&self) -> Result<()> {
        if !(self.power.is_finite() && self.power > 0.0) {
            return Err(Error::InvalidConfiguration {
                name: "power",
                value: self.power.to_string(),
                reason: "must be a positive finite number".into(),
            });
        }
        if self.neighbours < 1 {
            return Err(Error::InvalidConfiguration {
                name: "neighbours",
                value: self.neighbours.to_string(),
                reason: "at least one neighbour is required".into(),
            });
        }
        Ok(())
    }
}

/// How an [`InterpolationResult`] was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResultKind {
    /// The query coordinate equals a stored sample's coordinate.
    Hit,
    /// Only one neighbour was considered.
    NearestNeighbor,
    /// Weighted average of two or more neighbours.
    Interpolated,
    /// Query outside the convex hull of its neighbours. Never produced:
    /// hull membership is not computed.
    Extrapolated,
    /// Reserved.
    OutOfBounds,
}

/// Outcome of a single query
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InterpolationResult {
    pub value: f64,
    pub kind: ResultKind,
    /// The originating sample, for `Hit` and `NearestNeighbor` only
    pub sample: Option<Sample>,
}

impl InterpolationResult {
    fn from_sample(kind: ResultKind, sample: &Sample) -> Self {
        Self {
            value: sample.value(),
            kind,
            sample: Some(sample.clone()),
        }
    }
}

/// k-nearest IDW interpolator over an owned k-d tree.
///
/// Dimensions and parameters are fixed at construction. Samples can only
/// be added (or all removed); queries borrow the interpolator immutably.
#[derive(Debug, Clone)]
pub struct Interpolator {
    params: IdwParams,
    tree: KdTree,
}

impl Interpolator {
    /// Create an interpolator with default parameters (power 2, 5 neighbours).
    pub fn new(dimensions: usize) -> Result<Self> {
        Self::with_params(dimensions, IdwParams::default())
    }

    /// Create an interpolator with explicit parameters.
    ///
    /// # Errors
    /// `InvalidConfiguration` if `dimensions` or `neighbours` is zero, or if
    /// `power` is not a positive finite number.
    pub fn with_params(dimensions: usize, params: IdwParams) -> Result<Self> {
        if dimensions < 1 {
            return Err(Error::InvalidConfiguration {
                name: "dimensions",
                value: dimensions.to_string(),
                reason: "at least one dimension is required".into(),
            });
        }
        params.validate()?;

        debug!(
            dimensions,
            power = params.power,
            neighbours = params.neighbours,
            "created IDW interpolator"
        );

        Ok(Self {
            params,
            tree: KdTree::new(dimensions),
        })
    }

    pub fn dimensions(&self) -> usize {
        self.tree.dimensions()
    }

    pub fn params(&self) -> IdwParams {
        self.params
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Stored samples in insertion order.
    pub fn samples(&self) -> impl Iterator<Item = &Sample> + '_ {
        self.tree.iter()
    }

    /// Remove every stored sample.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Add a sample at `coordinates`.
    ///
    /// # Errors
    /// `MissingArgument` for an empty coordinate slice, `DimensionMismatch`
    /// if its length differs from the configured dimensions.
    pub fn add_point(&mut self, value: f64, coordinates: &[f64]) -> Result<()> {
        self.check_coordinates(coordinates)?;
        self.tree.insert(Sample::new(value, coordinates));
        Ok(())
    }

    /// Add a prebuilt sample. Same validation as [`Interpolator::add_point`].
    pub fn add_sample(&mut self, sample: Sample) -> Result<()> {
        self.check_coordinates(sample.coordinate())?;
        self.tree.insert(sample);
        Ok(())
    }

    /// Add a batch of samples, all or nothing.
    ///
    /// On the first invalid sample the whole index is cleared, including
    /// samples stored before this call, and the error is returned.
    pub fn add_point_range<I>(&mut self, samples: I) -> Result<()>
    where
        I: IntoIterator<Item = Sample>,
    {
        for (position, sample) in samples.into_iter().enumerate() {
            if let Err(e) = self.check_coordinates(sample.coordinate()) {
                warn!(
                    position,
                    discarded = self.tree.len(),
                    error = %e,
                    "rejected sample batch, clearing index"
                );
                self.tree.clear();
                return Err(e);
            }
            self.tree.insert(sample);
        }
        Ok(())
    }

    /// Interpolate the value at `coordinates`.
    ///
    /// # Errors
    /// - `MissingArgument` for an empty coordinate slice
    /// - `DimensionMismatch` if its length differs from the configured dimensions
    /// - `InsufficientSamples` if fewer samples are stored than `neighbours`
    pub fn interpolate(&self, coordinates: &[f64]) -> Result<InterpolationResult> {
        self.check_coordinates(coordinates)?;

        let required = self.params.neighbours;
        let available = self.tree.len();
        if available < required {
            return Err(Error::InsufficientSamples {
                available,
                required,
            });
        }

        if let Some(sample) = self.tree.find_exact(coordinates) {
            trace!(value = sample.value(), "exact hit");
            return Ok(InterpolationResult::from_sample(ResultKind::Hit, sample));
        }

        let neighbors = self.tree.k_nearest(coordinates, required);
        if let [only] = neighbors.as_slice() {
            trace!(distance = only.distance(), "nearest neighbour");
            return Ok(InterpolationResult::from_sample(
                ResultKind::NearestNeighbor,
                only.sample,
            ));
        }

        let value = weighted_average(&neighbors, self.params.power);
        trace!(value, neighbours = neighbors.len(), "interpolated");

        Ok(InterpolationResult {
            value,
            kind: ResultKind::Interpolated,
            sample: None,
        })
    }

    /// Interpolate a batch of query coordinates.
    ///
    /// Runs in parallel with the `parallel` feature. Any failing query fails
    /// the whole batch; when several queries fail, which of their errors is
    /// returned is unspecified under the `parallel` feature.
    pub fn interpolate_many<Q>(&self, queries: &[Q]) -> Result<Vec<InterpolationResult>>
    where
        Q: AsRef<[f64]> + Sync,
    {
        queries
            .into_par_iter()
            .map(|q| self.interpolate(q.as_ref()))
            .collect()
    }

    fn check_coordinates(&self, coordinates: &[f64]) -> Result<()> {
        if coordinates.is_empty() {
            return Err(Error::MissingArgument("coordinates"));
        }
        let expected = self.tree.dimensions();
        if coordinates.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                actual: coordinates.len(),
            });
        }
        Ok(())
    }
}

/// IDW weighted average.
///
/// ```text
/// z = Σ(wi * zi) / Σ(wi)
/// where wi = 1 / di^p
/// ```
///
/// Distances are strictly positive here: exact hits are answered earlier.
fn weighted_average(neighbors: &[Neighbor<'_>], power: f64) -> f64 {
    let mut sum_w = 0.0;
    let mut sum_wz = 0.0;

    for n in neighbors {
        let w = 1.0 / n.distance().powf(power);
        sum_w += w;
        sum_wz += w * n.sample.value();
    }

    sum_wz / sum_w
}
