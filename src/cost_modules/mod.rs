use std::fmt::Debug;
use crate::evaluation_modules::kinematics_dynamics_propagator::PropagationState;
use crate::robot_modules::robot_dynamics_module::DynamicsModel;
use crate::robot_modules::robot_planning_group_module::PlanningGroup;
use crate::trajectory_modules::full_trajectory::FullTrajectory;
use crate::trajectory_modules::trajectory_index::TrajectoryPointIndex;
use crate::utils::utils_parameters::EvaluationParameters;

pub mod cost_matrix_evaluator;
pub mod standard_costs;

/// Read-only view of everything a cost function may look at for one evaluation.
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub trajectory: &'a FullTrajectory,
    pub state: &'a PropagationState,
    pub model: &'a dyn DynamicsModel,
    pub group: &'a PlanningGroup,
    pub parameters: &'a EvaluationParameters
}

/// A per-point trajectory cost.  The evaluator multiplies the returned cost by `weight()`.
pub trait TrajectoryCostFunction: TrajectoryCostFunctionClone + Send + Sync + Debug {
    fn name(&self) -> &str;
    fn weight(&self) -> f64;
    fn set_weight(&mut self, weight: f64);
    /// Unweighted cost at `point` and whether the point is feasible with respect to this cost.
    fn evaluate(&self, context: &EvaluationContext, point: usize) -> (f64, bool);
    /// True when changing the scalar at `perturbation` cannot change this cost anywhere.
    fn is_invariant(&self, _context: &EvaluationContext, _perturbation: &TrajectoryPointIndex) -> bool {
        false
    }
    /// Called once before every full evaluation.
    fn pre_evaluate(&mut self, _context: &EvaluationContext) { }
    /// Called once after every full evaluation.
    fn post_evaluate(&mut self, _context: &EvaluationContext) { }
}

pub trait TrajectoryCostFunctionClone {
    fn clone_box(&self) -> Box<dyn TrajectoryCostFunction>;
}
impl<T> TrajectoryCostFunctionClone for T where T: 'static + TrajectoryCostFunction + Clone {
    fn clone_box(&self) -> Box<dyn TrajectoryCostFunction> {
        Box::new(self.clone())
    }
}
impl Clone for Box<dyn TrajectoryCostFunction> {
    fn clone(&self) -> Box<dyn TrajectoryCostFunction> {
        self.clone_box()
    }
}
