// Pareto front over assessment results.
//
// Objectives: higher relative validity, lower noise ratio, more clusters.
// A result is on the front when no other result is at least as good on every
// objective and strictly better on one. Results without a validity score
// cannot be compared and are left out.

use super::grid::AssessmentResult;

/// True when `a` dominates `b`. Both must carry a validity score.
pub fn dominates(a: &AssessmentResult, b: &AssessmentResult) -> bool {
    let (Some(da), Some(db)) = (a.dbcv, b.dbcv) else {
        return false;
    };
    let no_worse = da >= db && a.noise_ratio <= b.noise_ratio && a.n_clusters >= b.n_clusters;
    let better = da > db || a.noise_ratio < b.noise_ratio || a.n_clusters > b.n_clusters;
    no_worse && better
}

/// Non-dominated results, in input order.
pub fn pareto_front(results: &[AssessmentResult]) -> Vec<AssessmentResult> {
    let scored: Vec<&AssessmentResult> = results.iter().filter(|r| r.dbcv.is_some()).collect();
    scored
        .iter()
        .filter(|candidate| !scored.iter().any(|other| dominates(other, candidate)))
        .map(|r| (*r).clone())
        .collect()
}
