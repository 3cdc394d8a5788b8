use nalgebra::DMatrix;
use crate::evaluation_modules::kinematics_dynamics_propagator::PropagationState;

/// Immutable snapshot of a complete (unperturbed) evaluation.  Shared behind an `Arc` between a
/// canonical manager and its perturbation workers, which copy unaffected state out of it.
#[derive(Clone, Debug)]
pub struct ReferenceEvaluation {
    state: PropagationState,
    cost_matrix: DMatrix<f64>,
    generation: u64,
    cost_function_version: u64
}
impl ReferenceEvaluation {
    pub fn new(state: PropagationState, cost_matrix: DMatrix<f64>, generation: u64, cost_function_version: u64) -> Self {
        Self { state, cost_matrix, generation, cost_function_version }
    }
    pub fn state(&self) -> &PropagationState {
        &self.state
    }
    pub fn cost_matrix(&self) -> &DMatrix<f64> {
        &self.cost_matrix
    }
    /// Increases with every full evaluation of the manager that published it.
    pub fn generation(&self) -> u64 {
        self.generation
    }
    /// `CostMatrixEvaluator::version()` of the cost functions that filled `cost_matrix`.
    pub fn cost_function_version(&self) -> u64 {
        self.cost_function_version
    }
    pub fn total_cost(&self) -> f64 {
        self.cost_matrix.sum()
    }
}
