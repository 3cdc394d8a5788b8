use nalgebra::DVector;
use rayon::prelude::*;
use crate::evaluation_modules::evaluation_manager::EvaluationManager;

/// Gradient of the total cost, with the parameters split round-robin across `workers`.
///
/// `canonical` is evaluated first if its reference is stale; every worker is then synced to it, so
/// the result matches `canonical.compute_gradient(eps)`.  With no workers the canonical manager
/// computes the gradient itself.
pub fn compute_gradient_with_workers(canonical: &mut EvaluationManager, workers: &mut [EvaluationManager], eps: f64) -> DVector<f64> {
    canonical.ensure_reference();
    if workers.is_empty() { return canonical.compute_gradient(eps); }

    let values = canonical.get_parameters();
    let num_parameters = values.len();
    let num_workers = workers.len();

    for w in workers.iter_mut() {
        assert!(w.is_perturbation_worker(), "only perturbation workers can share a canonical reference");
        w.sync_from(canonical);
    }

    let partials: Vec<Vec<(usize, f64)>> = workers.par_iter_mut().enumerate().map(|(worker_idx, worker)| {
        (worker_idx..num_parameters).step_by(num_workers)
            .map(|i| (i, worker.compute_derivative(i, values[i], eps)))
            .collect()
    }).collect();

    let mut gradient = DVector::zeros(num_parameters);
    for (i, d) in partials.into_iter().flatten() {
        gradient[i] = d;
    }
    gradient
}

/// Fully evaluates independent candidate managers in parallel and returns their total costs.
pub fn evaluate_candidates(candidates: &mut [EvaluationManager]) -> Vec<f64> {
    candidates.par_iter_mut().map(|c| c.evaluate()).collect()
}
