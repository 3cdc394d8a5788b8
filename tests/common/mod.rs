#![allow(dead_code)]

use std::sync::Arc;
use nalgebra::{DVector, Matrix3, Vector3};
use cio_planner::contact_modules::ground_module::{FlatGround, GroundModel};
use cio_planner::cost_modules::{EvaluationContext, TrajectoryCostFunction};
use cio_planner::cost_modules::cost_matrix_evaluator::CostMatrixEvaluator;
use cio_planner::evaluation_modules::evaluation_manager::EvaluationManager;
use cio_planner::robot_modules::robot_dynamics_module::{DynamicsModel, RigidBody, TreeDynamicsModel};
use cio_planner::robot_modules::robot_planning_group_module::{ContactPointSpec, GroupJointSpec, PlanningGroup, PlanningGroupSpec};
use cio_planner::trajectory_modules::full_trajectory::FullTrajectory;
use cio_planner::trajectory_modules::trajectory_index::{ComponentType, SubComponentType};
use cio_planner::utils::utils_parameters::EvaluationParameters;

/// Sum of squared group joint positions at each point.
#[derive(Clone, Debug)]
pub struct SumSquaredJointPositionsCost {
    weight: f64
}
impl SumSquaredJointPositionsCost {
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }
}
impl TrajectoryCostFunction for SumSquaredJointPositionsCost {
    fn name(&self) -> &str { "sum_squared_joint_positions" }
    fn weight(&self) -> f64 { self.weight }
    fn set_weight(&mut self, weight: f64) { self.weight = weight; }
    fn evaluate(&self, context: &EvaluationContext, point: usize) -> (f64, bool) {
        let q = context.trajectory.component_trajectory(ComponentType::Position, SubComponentType::Joint);
        let cost: f64 = context.group.group_joints().iter().map(|g| q[(point, g.joint_index())].powi(2)).sum();
        (cost, true)
    }
}

/// Hip, knee and ankle of a single leg hanging from a fixed pelvis one meter above the ground.
pub fn leg_model(gravity: f64) -> TreeDynamicsModel {
    let bodies = vec![
        RigidBody::new_revolute("hip", None, Vector3::y(), Vector3::new(0.0, 0.0, 1.0), 2.0, Vector3::new(0.0, 0.0, -0.25), Matrix3::identity() * 0.02),
        RigidBody::new_revolute("knee", Some(0), Vector3::y(), Vector3::new(0.0, 0.0, -0.5), 1.5, Vector3::new(0.0, 0.0, -0.25), Matrix3::identity() * 0.01),
        RigidBody::new_revolute("ankle", Some(1), Vector3::x(), Vector3::new(0.0, 0.0, -0.5), 0.5, Vector3::zeros(), Matrix3::identity() * 0.005),
    ];
    TreeDynamicsModel::new(bodies, gravity).expect("valid leg model")
}

pub fn leg_group(model: &dyn DynamicsModel, with_contact: bool) -> PlanningGroup {
    let joints = ["hip", "knee", "ankle"].iter()
        .map(|n| GroupJointSpec { joint_name: n.to_string(), lower_limit: -2.0, upper_limit: 2.0 })
        .collect();
    let contact_points = if with_contact { vec![ContactPointSpec::new_rectangular("foot", "ankle", 0.1, 0.05)] } else { vec![] };
    let spec = PlanningGroupSpec { name: "leg".to_string(), joints, contact_points };
    PlanningGroup::new(&spec, model).expect("valid leg group")
}

pub fn leg_parameters() -> EvaluationParameters {
    let mut parameters = EvaluationParameters::default();
    parameters.trajectory_duration = 1.0;
    parameters.trajectory_discretization = 0.1;
    parameters.keyframe_interval = 5;
    parameters.optimize_keyframe_velocities = true;
    parameters
}

pub fn build_manager(parameters: EvaluationParameters, with_contact: bool, cost_functions: Vec<Box<dyn TrajectoryCostFunction>>) -> EvaluationManager {
    let tree = leg_model(parameters.gravity);
    let group = Arc::new(leg_group(&tree, with_contact));
    let model: Arc<dyn DynamicsModel> = Arc::new(tree);
    let ground: Arc<dyn GroundModel> = Arc::new(FlatGround::new(0.0));

    let mut trajectory = FullTrajectory::new_from_parameters(&parameters, model.num_joints(), group.num_contacts());
    trajectory.initialize_from_start_goal(&DVector::from_vec(vec![0.0, 0.0, 0.0]), &DVector::from_vec(vec![0.4, -0.6, 0.1]));

    let mut cost_evaluator = CostMatrixEvaluator::new();
    for c in cost_functions { cost_evaluator.add_cost_function(c); }

    EvaluationManager::new(trajectory, model, ground, group, cost_evaluator, parameters, 0.0, 0.0).expect("valid manager")
}

pub fn leg_manager(cost_functions: Vec<Box<dyn TrajectoryCostFunction>>) -> EvaluationManager {
    build_manager(leg_parameters(), true, cost_functions)
}
