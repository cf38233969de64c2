// Dimension reducer trait: swap-ready abstraction.
//
// The clustering stage only needs low-dimensional coordinates; whether they
// come from PCA or a precomputed manifold embedding does not matter to it.

use anyhow::Result;

/// Maps each input row to a lower-dimensional coordinate vector.
pub trait DimensionReducer {
    /// Fit on `data` and return one reduced row per input row.
    fn fit_transform(&self, data: &[Vec<f32>]) -> Result<Vec<Vec<f32>>>;
}
