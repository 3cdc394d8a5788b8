use nalgebra::DMatrix;
use crate::cost_modules::{EvaluationContext, TrajectoryCostFunction};
use crate::cost_modules::standard_costs::{ContactInvarianceCost, FrictionConeCost, JointLimitCost, SmoothnessCost, TorqueCost};
use crate::trajectory_modules::trajectory_index::TrajectoryPointIndex;
use crate::utils::utils_console::{cio_print, PrintColor, PrintMode};
use crate::utils::utils_parameters::EvaluationParameters;

/// Owns the active cost functions and fills `[point x cost function]` matrices with their
/// weighted values.
#[derive(Clone, Debug)]
pub struct CostMatrixEvaluator {
    cost_functions: Vec<Box<dyn TrajectoryCostFunction>>,
    version: u64
}
impl CostMatrixEvaluator {
    pub fn new() -> Self {
        Self { cost_functions: vec![], version: 0 }
    }
    /// Builds the standard cost functions from the configured weights.  Functions with a zero
    /// weight are left out.
    pub fn new_from_parameters(parameters: &EvaluationParameters) -> Self {
        let mut out_self = Self::new();
        let candidates: Vec<Box<dyn TrajectoryCostFunction>> = vec![
            Box::new(SmoothnessCost::new(parameters.cost_weight(SmoothnessCost::NAME))),
            Box::new(TorqueCost::new(parameters.cost_weight(TorqueCost::NAME))),
            Box::new(ContactInvarianceCost::new(parameters.cost_weight(ContactInvarianceCost::NAME))),
            Box::new(FrictionConeCost::new(parameters.cost_weight(FrictionConeCost::NAME))),
            Box::new(JointLimitCost::new(parameters.cost_weight(JointLimitCost::NAME)))
        ];
        for c in candidates {
            out_self.add_cost_function(c);
        }
        out_self
    }
    /// Zero-weight functions are ignored.  Returns whether the function was added.
    pub fn add_cost_function(&mut self, cost_function: Box<dyn TrajectoryCostFunction>) -> bool {
        if cost_function.weight() == 0.0 { return false; }
        self.cost_functions.push(cost_function);
        self.version += 1;
        true
    }
    /// Returns whether a function was removed.
    pub fn remove_cost_function(&mut self, name: &str) -> bool {
        let before = self.cost_functions.len();
        self.cost_functions.retain(|c| c.name() != name);
        if self.cost_functions.len() == before { return false; }
        self.version += 1;
        true
    }
    /// Returns whether a function with that name is registered.
    pub fn set_cost_function_weight(&mut self, name: &str, weight: f64) -> bool {
        let mut found = false;
        for c in self.cost_functions.iter_mut().filter(|c| c.name() == name) {
            c.set_weight(weight);
            found = true;
        }
        if found { self.version += 1; }
        found
    }
    /// Changes with every addition, removal or reweighting of a cost function.
    pub fn version(&self) -> u64 {
        self.version
    }
    pub fn cost_functions(&self) -> &Vec<Box<dyn TrajectoryCostFunction>> {
        &self.cost_functions
    }
    pub fn num_cost_functions(&self) -> usize {
        self.cost_functions.len()
    }
    pub fn cost_function_names(&self) -> Vec<String> {
        self.cost_functions.iter().map(|c| c.name().to_string()).collect()
    }
    pub fn pre_evaluate(&mut self, context: &EvaluationContext) {
        for c in self.cost_functions.iter_mut() { c.pre_evaluate(context); }
    }
    pub fn post_evaluate(&mut self, context: &EvaluationContext) {
        for c in self.cost_functions.iter_mut() { c.post_evaluate(context); }
    }
    /// Resets `cost_matrix` to zeros with one column per cost function when the column count is
    /// stale.  Returns whether it was reset.
    pub fn ensure_cost_matrix_shape(&self, cost_matrix: &mut DMatrix<f64>, num_points: usize) -> bool {
        if cost_matrix.ncols() != self.cost_functions.len() || cost_matrix.nrows() != num_points {
            *cost_matrix = DMatrix::zeros(num_points, self.cost_functions.len());
            return true;
        }
        false
    }
    /// Fills rows `[begin, end)` of `cost_matrix` and returns the AND of every evaluated
    /// feasibility.  A function invariant to `perturbation` has its column zero-filled over the
    /// range instead of being evaluated.
    pub fn evaluate(&self, begin: usize, end: usize, cost_matrix: &mut DMatrix<f64>, context: &EvaluationContext, perturbation: Option<&TrajectoryPointIndex>) -> bool {
        self.ensure_cost_matrix_shape(cost_matrix, context.trajectory.num_points());
        assert!(begin <= end && end <= cost_matrix.nrows(), "invalid point range [{}, {})", begin, end);

        let mut feasible = true;
        for (i, cost_function) in self.cost_functions.iter().enumerate() {
            let invariant = match perturbation {
                Some(index) => { cost_function.is_invariant(context, index) }
                None => { false }
            };
            if invariant {
                for p in begin..end { cost_matrix[(p, i)] = 0.0; }
                continue;
            }
            let weight = cost_function.weight();
            for p in begin..end {
                let (cost, point_feasible) = cost_function.evaluate(context, p);
                cost_matrix[(p, i)] = weight * cost;
                feasible &= point_feasible;
            }
        }
        feasible
    }
    pub fn print_summary(&self) {
        cio_print("Cost functions", PrintMode::Println, PrintColor::Blue, true);
        for c in &self.cost_functions {
            cio_print(&format!("  {} (weight {})", c.name(), c.weight()), PrintMode::Println, PrintColor::None, false);
        }
    }
}
impl Default for CostMatrixEvaluator {
    fn default() -> Self { Self::new() }
}
