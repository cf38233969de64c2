// Parameter assessment: grid sweeps, target-range search, Pareto front.

pub mod grid;
pub mod pareto;

use std::path::Path;

use anyhow::{Context, Result};

pub use grid::{
    assess_grid, best_by_dbcv, optimize, param_grid, pivot, AssessmentResult, Metric,
    OptimizeOutcome, Pivot, DEFAULT_CANDIDATES,
};
pub use pareto::{dominates, pareto_front};

/// Write results as pretty JSON.
pub fn save_results(path: &Path, results: &[AssessmentResult]) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write results to {}", path.display()))
}

pub fn load_results(path: &Path) -> Result<Vec<AssessmentResult>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse assessment results in {}", path.display()))
}
