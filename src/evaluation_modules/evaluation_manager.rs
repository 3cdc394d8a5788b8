use std::collections::VecDeque;
use std::sync::Arc;
use nalgebra::{DMatrix, DVector};
use crate::contact_modules::ground_module::GroundModel;
use crate::cost_modules::cost_matrix_evaluator::CostMatrixEvaluator;
use crate::cost_modules::EvaluationContext;
use crate::evaluation_modules::kinematics_dynamics_propagator::{KinematicsDynamicsPropagator, PropagationState};
use crate::evaluation_modules::reference_evaluation::ReferenceEvaluation;
use crate::robot_modules::robot_dynamics_module::DynamicsModel;
use crate::robot_modules::robot_planning_group_module::PlanningGroup;
use crate::trajectory_modules::contact_variables::ContactVariables;
use crate::trajectory_modules::full_trajectory::FullTrajectory;
use crate::trajectory_modules::parameter_trajectory::{ParameterIndexMap, ParameterTrajectory};
use crate::trajectory_modules::trajectory_index::{ComponentType, SubComponentType, TrajectoryPointIndex};
use crate::utils::utils_console::{cio_print, CioDebug, PrintColor, PrintMode};
use crate::utils::utils_errors::CioError;
use crate::utils::utils_math::exponential_map::ExponentialMapUtils;
use crate::utils::utils_parameters::EvaluationParameters;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvaluationManagerState {
    Initialized,
    Evaluated,
    Perturbing
}

/// Receives read-only evaluation state, e.g. for visualization.
pub trait EvaluationObserver {
    fn render(&mut self, trajectory: &FullTrajectory, state: &PropagationState, cost_matrix: &DMatrix<f64>, cost_function_names: &Vec<String>);
}

#[derive(Clone, Debug)]
pub struct CostHistoryEntry {
    pub iteration: usize,
    pub total_cost: f64,
    pub cost_per_function: Vec<f64>,
    pub feasible: bool
}

/// Caller-owned record of the most recent `capacity` cost reports.
#[derive(Clone, Debug)]
pub struct CostHistory {
    capacity: usize,
    entries: VecDeque<CostHistoryEntry>
}
impl CostHistory {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cost history needs room for at least one entry");
        Self { capacity, entries: VecDeque::with_capacity(capacity) }
    }
    pub fn push(&mut self, entry: CostHistoryEntry) {
        if self.entries.len() == self.capacity { self.entries.pop_front(); }
        self.entries.push_back(entry);
    }
    pub fn entries(&self) -> &VecDeque<CostHistoryEntry> {
        &self.entries
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    pub fn min_total_cost(&self) -> Option<f64> {
        self.entries.iter().map(|e| e.total_cost).fold(None, |acc, c| Some(acc.map_or(c, |a: f64| a.min(c))))
    }
    pub fn mean_total_cost(&self) -> Option<f64> {
        if self.entries.is_empty() { return None; }
        Some(self.entries.iter().map(|e| e.total_cost).sum::<f64>() / self.entries.len() as f64)
    }
}

/// Evaluates a trajectory against the registered cost functions and computes finite-difference
/// derivatives of the total cost with respect to single parameters.
///
/// A full `evaluate()` publishes an immutable `ReferenceEvaluation`.  Derivatives perturb one
/// parameter, recompute only the affected point range (copying everything else from the
/// reference), and restore the range from the reference before returning.
///
/// `clone_for_candidate` deep-copies the trajectories, propagation state, cost functions and cost
/// matrix; the dynamics model, ground, planning group, parameter map and reference snapshot are
/// shared.
#[derive(Clone, Debug)]
pub struct EvaluationManager {
    parameters: EvaluationParameters,
    model: Arc<dyn DynamicsModel>,
    group: Arc<PlanningGroup>,
    propagator: KinematicsDynamicsPropagator,
    cost_evaluator: CostMatrixEvaluator,
    parameter_map: Arc<ParameterIndexMap>,
    full_trajectory: FullTrajectory,
    parameter_trajectory: ParameterTrajectory,
    parameters_modified: bool,
    state: PropagationState,
    cost_matrix: DMatrix<f64>,
    reference: Option<Arc<ReferenceEvaluation>>,
    generation: u64,
    last_trajectory_feasible: bool,
    best_cost: f64,
    evaluation_state: EvaluationManagerState,
    is_perturbation_worker: bool,
    planning_start_time: f64,
    trajectory_start_time: f64,
    debug: CioDebug
}
impl EvaluationManager {
    pub fn new(trajectory: FullTrajectory,
               model: Arc<dyn DynamicsModel>,
               ground: Arc<dyn GroundModel>,
               group: Arc<PlanningGroup>,
               cost_evaluator: CostMatrixEvaluator,
               parameters: EvaluationParameters,
               planning_start_time: f64,
               trajectory_start_time: f64) -> Result<Self, CioError> {
        parameters.validate()?;
        if trajectory.num_joints() != model.num_joints() {
            return Err(CioError::new_generic_error_str(&format!("trajectory has {} joints but the dynamics model has {}", trajectory.num_joints(), model.num_joints()), file!(), line!()));
        }
        if trajectory.num_contacts() != group.num_contacts() {
            return Err(CioError::new_generic_error_str(&format!("trajectory has {} contacts but planning group {} has {}", trajectory.num_contacts(), group.name(), group.num_contacts()), file!(), line!()));
        }
        for g in group.group_joints() {
            CioError::new_check_for_idx_out_of_bound_error(g.joint_index(), model.num_joints(), file!(), line!())?;
        }

        let num_points = trajectory.num_points();
        let state = PropagationState::new(model.as_ref(), num_points, group.num_contacts());
        let cost_matrix = DMatrix::zeros(num_points, cost_evaluator.num_cost_functions());
        let parameter_map = Arc::new(ParameterIndexMap::new(&trajectory, &group, parameters.fix_start_point, parameters.fix_goal_point, parameters.optimize_keyframe_velocities));
        let parameter_trajectory = ParameterTrajectory::new(&parameter_map);
        let propagator = KinematicsDynamicsPropagator::new(model.clone(), ground, group.clone());
        let debug = parameters.debug_mode();

        let mut out_self = Self {
            parameters,
            model,
            group,
            propagator,
            cost_evaluator,
            parameter_map,
            full_trajectory: trajectory,
            parameter_trajectory,
            parameters_modified: false,
            state,
            cost_matrix,
            reference: None,
            generation: 0,
            last_trajectory_feasible: false,
            best_cost: f64::INFINITY,
            evaluation_state: EvaluationManagerState::Initialized,
            is_perturbation_worker: false,
            planning_start_time,
            trajectory_start_time,
            debug
        };

        out_self.full_trajectory.interpolate_keyframes(&out_self.group);
        out_self.initialize_contact_variables();
        out_self.parameter_trajectory = ParameterTrajectory::extract(&out_self.full_trajectory, &out_self.parameter_map);

        if out_self.debug.is_enabled() {
            out_self.parameters.print_summary();
            out_self.cost_evaluator.print_summary();
            cio_print(&format!("{} parameters over {} points", out_self.parameter_map.num_parameters(), num_points), PrintMode::Println, PrintColor::Cyan, false);
        }

        Ok(out_self)
    }
    /// Seeds the contact trajectories: contact poses at the start and goal are taken from the
    /// attached bodies (kinematics without external forces), forces are zeroed, and the contact
    /// trajectories are interpolated from start to goal.  Position-only trajectories keep the
    /// contact variables they were given.
    fn initialize_contact_variables(&mut self) {
        let num_contacts = self.group.num_contacts();
        if num_contacts == 0 || !self.full_trajectory.has_derivative_components() { return; }
        let n = self.full_trajectory.num_points();

        self.full_trajectory.component_trajectory_mut(ComponentType::Position, SubComponentType::ContactForce).fill(0.0);
        self.propagator.propagate_full(&self.full_trajectory, &mut self.state, 0, n, false);

        for point in [0, n - 1] {
            for (c, contact_point) in self.group.contact_points().iter().enumerate() {
                let pose = self.model.body_world_transform(&self.state.dynamics_states[point], contact_point.body_id());
                let mut variables = ContactVariables::new();
                let rotation = pose.rotation.to_rotation_matrix();
                variables.set_pose(pose.translation.vector, ExponentialMapUtils::rotation_to_exp_map(&rotation));
                self.full_trajectory.set_contact_variables(point, c, &variables);
            }
        }
        self.full_trajectory.interpolate_start_end(SubComponentType::ContactPosition);
        self.full_trajectory.interpolate_start_end(SubComponentType::ContactForce);
        self.full_trajectory.interpolate_contact_variables();

        if self.debug.is_enabled() {
            cio_print(&format!("Initialized {} contact trajectories", num_contacts), PrintMode::Println, PrintColor::Cyan, false);
        }
    }

    /// Full evaluation of the current trajectory.  Returns the total cost and publishes the new
    /// reference snapshot.
    pub fn evaluate(&mut self) -> f64 {
        assert!(!self.is_perturbation_worker, "perturbation workers only compute derivatives");
        if self.parameters_modified {
            self.full_trajectory.update_from_parameter_trajectory(&self.parameter_trajectory, &self.parameter_map, &self.group);
            self.parameters_modified = false;
        }

        let n = self.full_trajectory.num_points();
        self.propagator.propagate_full(&self.full_trajectory, &mut self.state, 0, n, true);

        let context = EvaluationContext {
            trajectory: &self.full_trajectory,
            state: &self.state,
            model: self.model.as_ref(),
            group: &self.group,
            parameters: &self.parameters
        };
        self.cost_evaluator.pre_evaluate(&context);
        let feasible = self.cost_evaluator.evaluate(0, n, &mut self.cost_matrix, &context, None);
        self.cost_evaluator.post_evaluate(&context);

        self.last_trajectory_feasible = feasible;
        self.generation += 1;
        self.reference = Some(Arc::new(ReferenceEvaluation::new(self.state.clone(), self.cost_matrix.clone(), self.generation, self.cost_evaluator.version())));
        self.evaluation_state = EvaluationManagerState::Evaluated;

        self.cost_matrix.sum()
    }
    /// Makes sure a reference snapshot matches the current parameters and cost functions,
    /// evaluating if needed.  Perturbation workers cannot evaluate and panic instead.
    pub fn ensure_reference(&mut self) {
        let stale = match &self.reference {
            None => { true }
            Some(reference) => {
                self.parameters_modified || reference.cost_function_version() != self.cost_evaluator.version()
            }
        };
        if !stale { return; }
        assert!(!self.is_perturbation_worker, "perturbation worker has no up-to-date reference; sync it from the canonical manager");
        self.evaluate();
    }
    fn current_reference(&self) -> Arc<ReferenceEvaluation> {
        match &self.reference {
            Some(reference) => { reference.clone() }
            None => { panic!("no reference evaluation is available") }
        }
    }

    /// Perturbs parameter `parameter_index` to `value` and evaluates the affected range
    /// incrementally.  The perturbed state stays visible until `restore_perturbation`.
    pub fn apply_perturbation(&mut self, parameter_index: usize, value: f64) -> (usize, usize) {
        self.ensure_reference();
        let reference = self.current_reference();
        let index = *self.parameter_map.trajectory_index(parameter_index);
        let (begin, end, _) = self.evaluate_perturbed_range(value, &index, true, &reference);
        (begin, end)
    }
    /// Undoes `apply_perturbation`: restores the trajectory and copies the propagation state and
    /// cost rows of the perturbed range back from the reference.
    pub fn restore_perturbation(&mut self) {
        let reference = self.current_reference();
        let n = self.full_trajectory.num_points();
        self.full_trajectory.restore_backup_trajectories();
        self.state.copy_range_from(reference.state(), 0, n);
        if reference.cost_matrix().shape() == self.cost_matrix.shape() {
            self.cost_matrix.copy_from(reference.cost_matrix());
        }
        self.evaluation_state = EvaluationManagerState::Evaluated;
    }
    fn evaluate_perturbed_range(&mut self, value: f64, index: &TrajectoryPointIndex, is_first_of_pair: bool, reference: &ReferenceEvaluation) -> (usize, usize, Vec<f64>) {
        self.evaluation_state = EvaluationManagerState::Perturbing;
        let (begin, end) = self.full_trajectory.direct_change_for_derivatives(value, index, is_first_of_pair);
        self.propagator.propagate_partial(&self.full_trajectory, &mut self.state, reference.state(), index, begin, end);

        let context = EvaluationContext {
            trajectory: &self.full_trajectory,
            state: &self.state,
            model: self.model.as_ref(),
            group: &self.group,
            parameters: &self.parameters
        };
        self.cost_evaluator.evaluate(begin, end, &mut self.cost_matrix, &context, Some(index));

        let range = self.cost_matrix.rows(begin, end - begin);
        let per_function = (0..range.ncols()).map(|c| range.column(c).sum()).collect();
        (begin, end, per_function)
    }
    /// Central difference of the total cost with respect to one parameter, taken around `value`.
    pub fn compute_derivative(&mut self, parameter_index: usize, value: f64, eps: f64) -> f64 {
        self.compute_per_cost_derivatives(parameter_index, value, eps).0
    }
    /// Central difference of the total cost and of every cost function's contribution.
    pub fn compute_per_cost_derivatives(&mut self, parameter_index: usize, value: f64, eps: f64) -> (f64, Vec<f64>) {
        assert!(eps > 0.0, "finite-difference step must be positive");
        self.ensure_reference();
        let reference = self.current_reference();
        let index = *self.parameter_map.trajectory_index(parameter_index);

        let (begin, end, plus) = self.evaluate_perturbed_range(value + eps, &index, true, &reference);
        let (_, _, minus) = self.evaluate_perturbed_range(value - eps, &index, false, &reference);

        self.full_trajectory.restore_backup_trajectories();
        self.state.copy_range_from(reference.state(), begin, end);
        self.cost_matrix.rows_mut(begin, end - begin).copy_from(&reference.cost_matrix().rows(begin, end - begin));
        self.evaluation_state = EvaluationManagerState::Evaluated;

        let per_function: Vec<f64> = plus.iter().zip(minus.iter()).map(|(p, m)| (p - m) / (2.0 * eps)).collect();
        let total = (plus.iter().sum::<f64>() - minus.iter().sum::<f64>()) / (2.0 * eps);

        if self.debug.is_enabled() {
            cio_print(&format!("d/dp[{}] ({:?} {:?} point {} element {}) = {} over [{}, {})", parameter_index, index.component, index.sub_component, index.point, index.element, total, begin, end), PrintMode::Println, PrintColor::None, false);
        }

        (total, per_function)
    }
    /// Derivatives with respect to every parameter, in flat parameter order.
    pub fn compute_gradient(&mut self, eps: f64) -> DVector<f64> {
        self.ensure_reference();
        let values = self.get_parameters();
        let mut gradient = DVector::zeros(values.len());
        for i in 0..values.len() {
            gradient[i] = self.compute_derivative(i, values[i], eps);
        }
        gradient
    }

    pub fn num_parameters(&self) -> usize {
        self.parameter_map.num_parameters()
    }
    pub fn get_parameters(&self) -> DVector<f64> {
        self.parameter_trajectory.get_flat()
    }
    pub fn set_parameters(&mut self, parameters: &DVector<f64>) {
        self.parameter_trajectory.set_flat(parameters);
        self.parameters_modified = true;
    }
    pub fn add_parameter_noise(&mut self, standard_deviation: f64, seed: u64) {
        self.parameter_trajectory.add_parameter_noise(standard_deviation, seed);
        self.parameters_modified = true;
    }
    pub fn trajectory_cost(&self) -> f64 {
        self.cost_matrix.sum()
    }
    pub fn cost_per_function(&self) -> Vec<f64> {
        (0..self.cost_matrix.ncols()).map(|c| self.cost_matrix.column(c).sum()).collect()
    }
    pub fn cost_function_names(&self) -> Vec<String> {
        self.cost_evaluator.cost_function_names()
    }
    pub fn is_last_trajectory_feasible(&self) -> bool {
        self.last_trajectory_feasible
    }
    pub fn best_cost(&self) -> f64 {
        self.best_cost
    }
    pub fn reset_best_trajectory_cost(&mut self) {
        self.best_cost = f64::INFINITY;
    }
    /// Reports the current cost, updates the best cost and appends to `history`.  With `details`
    /// the per-function breakdown and history statistics are printed as well.
    pub fn print_trajectory_cost(&mut self, iteration: usize, details: bool, history: &mut CostHistory) {
        let total = self.trajectory_cost();
        let per_function = self.cost_per_function();
        history.push(CostHistoryEntry {
            iteration,
            total_cost: total,
            cost_per_function: per_function.clone(),
            feasible: self.last_trajectory_feasible
        });

        let is_best = total < self.best_cost;
        if is_best { self.best_cost = total; }

        let color = if is_best { PrintColor::Green } else { PrintColor::None };
        cio_print(&format!("[{}] Trajectory cost: {:.6} (best {:.6})", iteration, total, self.best_cost), PrintMode::Print, color, is_best);
        if !self.last_trajectory_feasible {
            cio_print(" infeasible", PrintMode::Print, PrintColor::Red, false);
        }
        cio_print("", PrintMode::Println, PrintColor::None, false);

        if details {
            for (name, cost) in self.cost_function_names().iter().zip(per_function.iter()) {
                cio_print(&format!("    {}: {:.6}", name, cost), PrintMode::Println, PrintColor::None, false);
            }
            if let (Some(min), Some(mean)) = (history.min_total_cost(), history.mean_total_cost()) {
                cio_print(&format!("    last {} reports: min {:.6}, mean {:.6}", history.len(), min, mean), PrintMode::Println, PrintColor::Cyan, false);
            }
        }
    }
    pub fn render(&self, observer: &mut dyn EvaluationObserver) {
        observer.render(&self.full_trajectory, &self.state, &self.cost_matrix, &self.cost_function_names());
    }

    /// Independent copy for evaluating another candidate trajectory.
    pub fn clone_for_candidate(&self) -> Self {
        let mut out_self = self.clone();
        out_self.is_perturbation_worker = false;
        out_self.best_cost = f64::INFINITY;
        out_self
    }
    /// A copy that only computes derivatives against this manager's reference snapshot.
    pub fn spawn_perturbation_worker(&mut self) -> Self {
        self.ensure_reference();
        let mut out_self = self.clone();
        out_self.is_perturbation_worker = true;
        out_self
    }
    /// Points a perturbation worker at `canonical`'s current trajectory and reference snapshot.
    pub fn sync_from(&mut self, canonical: &EvaluationManager) {
        assert!(canonical.reference.is_some() && !canonical.parameters_modified, "the canonical manager must be evaluated before workers are synced");
        assert_eq!(self.full_trajectory.num_points(), canonical.full_trajectory.num_points(), "worker and canonical manager describe different trajectories");
        self.full_trajectory.clone_from(&canonical.full_trajectory);
        self.parameter_trajectory.clone_from(&canonical.parameter_trajectory);
        self.parameters_modified = false;
        self.state.clone_from(&canonical.state);
        self.cost_matrix.clone_from(&canonical.cost_matrix);
        self.cost_evaluator.clone_from(&canonical.cost_evaluator);
        self.reference = canonical.reference.clone();
        self.generation = canonical.generation;
        self.last_trajectory_feasible = canonical.last_trajectory_feasible;
        self.evaluation_state = EvaluationManagerState::Evaluated;
    }

    pub fn parameters(&self) -> &EvaluationParameters {
        &self.parameters
    }
    pub fn planning_group(&self) -> &Arc<PlanningGroup> {
        &self.group
    }
    pub fn dynamics_model(&self) -> &Arc<dyn DynamicsModel> {
        &self.model
    }
    pub fn parameter_map(&self) -> &Arc<ParameterIndexMap> {
        &self.parameter_map
    }
    pub fn full_trajectory(&self) -> &FullTrajectory {
        &self.full_trajectory
    }
    pub fn parameter_trajectory(&self) -> &ParameterTrajectory {
        &self.parameter_trajectory
    }
    pub fn propagation_state(&self) -> &PropagationState {
        &self.state
    }
    pub fn cost_matrix(&self) -> &DMatrix<f64> {
        &self.cost_matrix
    }
    pub fn cost_evaluator(&self) -> &CostMatrixEvaluator {
        &self.cost_evaluator
    }
    /// Changing the cost functions makes the next derivative re-evaluate first.
    pub fn cost_evaluator_mut(&mut self) -> &mut CostMatrixEvaluator {
        &mut self.cost_evaluator
    }
    pub fn reference(&self) -> Option<&Arc<ReferenceEvaluation>> {
        self.reference.as_ref()
    }
    pub fn reference_generation(&self) -> u64 {
        self.generation
    }
    pub fn evaluation_state(&self) -> EvaluationManagerState {
        self.evaluation_state
    }
    pub fn is_perturbation_worker(&self) -> bool {
        self.is_perturbation_worker
    }
    pub fn planning_start_time(&self) -> f64 {
        self.planning_start_time
    }
    pub fn trajectory_start_time(&self) -> f64 {
        self.trajectory_start_time
    }
    /// Time stamp of `point` relative to the planning start.
    pub fn point_time(&self, point: usize) -> f64 {
        self.trajectory_start_time - self.planning_start_time + point as f64 * self.full_trajectory.discretization()
    }
}
