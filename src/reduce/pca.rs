// Principal component projection.
//
// Wraps linfa's PCA: rows are copied into an f64 `Array2`, fitted as an
// unsupervised dataset, then projected back onto the fitted axes. The
// decomposition is free to return either sign per axis, so each output
// column is flipped until its largest-magnitude entry is positive.

use anyhow::{anyhow, bail, Result};
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_reduction::Pca as LinfaPca;
use ndarray::{Array2, Axis};
use tracing::{debug, info};

use super::traits::DimensionReducer;

/// PCA reducer producing `n_components` coordinates per row.
#[derive(Debug, Clone)]
pub struct Pca {
    pub n_components: usize,
}

impl Default for Pca {
    fn default() -> Self {
        Self { n_components: 2 }
    }
}

impl Pca {
    pub fn new(n_components: usize) -> Self {
        Self { n_components }
    }
}

impl DimensionReducer for Pca {
    fn fit_transform(&self, data: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        let start = std::time::Instant::now();
        let records = to_records(data)?;
        if self.n_components == 0 {
            bail!("PCA needs at least one component");
        }

        let (rows, dim) = records.dim();
        let k = self.n_components.min(dim);
        if k < self.n_components {
            debug!(requested = self.n_components, dim, "Clamped PCA components");
        }
        // A single row has nothing to decompose; it sits at the mean.
        if rows < 2 {
            return Ok(vec![vec![0.0; k]; rows]);
        }

        let dataset = DatasetBase::from(records.clone());
        let model = LinfaPca::params(k)
            .fit(&dataset)
            .map_err(|e| anyhow!("PCA fit failed: {e}"))?;
        let mut projected: Array2<f64> = model.predict(&records);
        for mut column in projected.axis_iter_mut(Axis(1)) {
            let pivot = column
                .iter()
                .copied()
                .fold(0.0f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
            if pivot < 0.0 {
                column.mapv_inplace(|x| -x);
            }
        }

        info!(
            rows,
            components = projected.ncols(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Projected embeddings with PCA"
        );
        Ok(projected
            .outer_iter()
            .map(|row| row.iter().map(|&v| v as f32).collect())
            .collect())
    }
}

fn to_records(data: &[Vec<f32>]) -> Result<Array2<f64>> {
    let Some(first) = data.first() else {
        bail!("Cannot run PCA on an empty matrix");
    };
    let dim = first.len();
    if dim == 0 {
        bail!("Cannot run PCA on zero-dimensional rows");
    }
    if let Some(i) = data.iter().position(|r| r.len() != dim) {
        bail!("Row {i} has {} columns, expected {dim}", data[i].len());
    }

    let mut records = Array2::zeros((data.len(), dim));
    for (i, row) in data.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            records[[i, j]] = v as f64;
        }
    }
    Ok(records)
}
