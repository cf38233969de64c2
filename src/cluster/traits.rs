// Density clusterer trait: swap-ready abstraction.
//
// The built-in backend is `Hdbscan`; an imported clustering produced by
// another tool yields the same `Clustering` value, so everything downstream
// (descriptors, hierarchy view, reports) is backend-agnostic.

use super::error::Result;
use super::Clustering;

/// Trait for clustering a set of points into a condensed-tree clustering.
pub trait DensityClusterer {
    /// Cluster `data` (one row per point, equal dimensionality).
    fn fit(&self, data: &[Vec<f32>]) -> Result<Clustering>;
}
