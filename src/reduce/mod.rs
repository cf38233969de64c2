// Dimensionality reduction ahead of clustering.

pub mod pca;
pub mod scale;
pub mod traits;

use anyhow::Result;
use serde::Serialize;

pub use pca::Pca;
pub use scale::standardize;
pub use traits::DimensionReducer;

/// Reduced coordinates for every row, raw and standardized.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Projection {
    pub coords: Vec<Vec<f32>>,
    pub standardized: Vec<Vec<f32>>,
}

impl Projection {
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.coords.first().map_or(0, |c| c.len())
    }
}

/// Reduce `data` and standardize the result.
pub fn project(reducer: &dyn DimensionReducer, data: &[Vec<f32>]) -> Result<Projection> {
    let coords = reducer.fit_transform(data)?;
    let standardized = standardize(&coords);
    Ok(Projection {
        coords,
        standardized,
    })
}
