use nalgebra::Vector3;
use crate::cost_modules::{EvaluationContext, TrajectoryCostFunction};
use crate::trajectory_modules::contact_variables::NUM_CONTACT_SUB_POINTS;
use crate::trajectory_modules::trajectory_index::{ComponentType, SubComponentType, TrajectoryPointIndex};

/// Squared joint accelerations of the planning group.
#[derive(Clone, Debug)]
pub struct SmoothnessCost {
    weight: f64
}
impl SmoothnessCost {
    pub const NAME: &'static str = "smoothness";
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }
}
impl TrajectoryCostFunction for SmoothnessCost {
    fn name(&self) -> &str { Self::NAME }
    fn weight(&self) -> f64 { self.weight }
    fn set_weight(&mut self, weight: f64) { self.weight = weight; }
    fn evaluate(&self, context: &EvaluationContext, point: usize) -> (f64, bool) {
        let qddot = context.trajectory.component_trajectory(ComponentType::Acceleration, SubComponentType::Joint);
        let cost: f64 = context.group.group_joints().iter().map(|g| qddot[(point, g.joint_index())].powi(2)).sum();
        (cost, true)
    }
    fn is_invariant(&self, _context: &EvaluationContext, perturbation: &TrajectoryPointIndex) -> bool {
        perturbation.sub_component.is_contact()
    }
}

/// Squared joint torques of every joint of the model.
#[derive(Clone, Debug)]
pub struct TorqueCost {
    weight: f64
}
impl TorqueCost {
    pub const NAME: &'static str = "torque";
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }
}
impl TrajectoryCostFunction for TorqueCost {
    fn name(&self) -> &str { Self::NAME }
    fn weight(&self) -> f64 { self.weight }
    fn set_weight(&mut self, weight: f64) { self.weight = weight; }
    fn evaluate(&self, context: &EvaluationContext, point: usize) -> (f64, bool) {
        (context.state.joint_torques[point].norm_squared(), true)
    }
}

/// Keeps active contacts on the ground: contact activity (total sub-point force magnitude) times
/// the squared distance between the attached body and the projected contact center.
#[derive(Clone, Debug)]
pub struct ContactInvarianceCost {
    weight: f64
}
impl ContactInvarianceCost {
    pub const NAME: &'static str = "contact_invariance";
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }
}
impl TrajectoryCostFunction for ContactInvarianceCost {
    fn name(&self) -> &str { Self::NAME }
    fn weight(&self) -> f64 { self.weight }
    fn set_weight(&mut self, weight: f64) { self.weight = weight; }
    fn evaluate(&self, context: &EvaluationContext, point: usize) -> (f64, bool) {
        let threshold = context.parameters.contact_activation_threshold;
        let mut cost = 0.0;
        for (c, contact_point) in context.group.contact_points().iter().enumerate() {
            let variables = &context.state.contact_variables[point][c];
            let activity = variables.activity();
            if activity <= threshold { continue; }
            let body_pose = context.model.body_world_transform(&context.state.dynamics_states[point], contact_point.body_id());
            let body_position = body_pose.translation.vector;
            cost += activity * (body_position - variables.projected_center()).norm_squared();
        }
        (cost, true)
    }
}

/// Squared violation of the Coulomb friction cone (and of unilaterality) for every sub-point
/// force, measured against the projected ground normal.
#[derive(Clone, Debug)]
pub struct FrictionConeCost {
    weight: f64
}
impl FrictionConeCost {
    pub const NAME: &'static str = "friction_cone";
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }
    pub fn violation(force: &Vector3<f64>, normal: &Vector3<f64>, friction_coefficient: f64) -> f64 {
        let normal_component = force.dot(normal);
        let tangential = (force - normal * normal_component).norm();
        let cone = (tangential - friction_coefficient * normal_component).max(0.0);
        let pulling = (-normal_component).max(0.0);
        cone + pulling
    }
}
impl TrajectoryCostFunction for FrictionConeCost {
    fn name(&self) -> &str { Self::NAME }
    fn weight(&self) -> f64 { self.weight }
    fn set_weight(&mut self, weight: f64) { self.weight = weight; }
    fn evaluate(&self, context: &EvaluationContext, point: usize) -> (f64, bool) {
        let mu = context.parameters.friction_coefficient;
        let mut cost = 0.0;
        let mut feasible = true;
        for variables in &context.state.contact_variables[point] {
            for s in 0..NUM_CONTACT_SUB_POINTS {
                let v = Self::violation(variables.force(s), variables.projected_normal(), mu);
                if v > 0.0 { feasible = false; }
                cost += v * v;
            }
        }
        (cost, feasible)
    }
    fn is_invariant(&self, _context: &EvaluationContext, perturbation: &TrajectoryPointIndex) -> bool {
        perturbation.sub_component == SubComponentType::Joint
    }
}

/// Squared violation of the group's joint position limits.
#[derive(Clone, Debug)]
pub struct JointLimitCost {
    weight: f64
}
impl JointLimitCost {
    pub const NAME: &'static str = "joint_limit";
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }
}
impl TrajectoryCostFunction for JointLimitCost {
    fn name(&self) -> &str { Self::NAME }
    fn weight(&self) -> f64 { self.weight }
    fn set_weight(&mut self, weight: f64) { self.weight = weight; }
    fn evaluate(&self, context: &EvaluationContext, point: usize) -> (f64, bool) {
        let q = context.trajectory.component_trajectory(ComponentType::Position, SubComponentType::Joint);
        let mut cost = 0.0;
        let mut feasible = true;
        for g in context.group.group_joints() {
            let value = q[(point, g.joint_index())];
            let v = (g.lower_limit() - value).max(0.0) + (value - g.upper_limit()).max(0.0);
            if v > 0.0 { feasible = false; }
            cost += v * v;
        }
        (cost, feasible)
    }
    fn is_invariant(&self, _context: &EvaluationContext, perturbation: &TrajectoryPointIndex) -> bool {
        perturbation.sub_component.is_contact()
    }
}

/// Squared distance from a body to a goal position, counted at the last point only.
#[derive(Clone, Debug)]
pub struct GoalPoseCost {
    weight: f64,
    body_id: usize,
    goal_position: Vector3<f64>
}
impl GoalPoseCost {
    pub const NAME: &'static str = "goal_pose";
    pub fn new(weight: f64, body_id: usize, goal_position: Vector3<f64>) -> Self {
        Self { weight, body_id, goal_position }
    }
}
impl TrajectoryCostFunction for GoalPoseCost {
    fn name(&self) -> &str { Self::NAME }
    fn weight(&self) -> f64 { self.weight }
    fn set_weight(&mut self, weight: f64) { self.weight = weight; }
    fn evaluate(&self, context: &EvaluationContext, point: usize) -> (f64, bool) {
        if point + 1 != context.trajectory.num_points() { return (0.0, true); }
        let pose = context.model.body_world_transform(&context.state.dynamics_states[point], self.body_id);
        ((pose.translation.vector - self.goal_position).norm_squared(), true)
    }
    fn is_invariant(&self, _context: &EvaluationContext, perturbation: &TrajectoryPointIndex) -> bool {
        perturbation.sub_component.is_contact()
    }
}

/// Returns the same value at every point.
#[derive(Clone, Debug)]
pub struct ConstantCost {
    weight: f64,
    value: f64
}
impl ConstantCost {
    pub const NAME: &'static str = "constant";
    pub fn new(weight: f64, value: f64) -> Self {
        Self { weight, value }
    }
}
impl TrajectoryCostFunction for ConstantCost {
    fn name(&self) -> &str { Self::NAME }
    fn weight(&self) -> f64 { self.weight }
    fn set_weight(&mut self, weight: f64) { self.weight = weight; }
    fn evaluate(&self, _context: &EvaluationContext, _point: usize) -> (f64, bool) {
        (self.value, true)
    }
    fn is_invariant(&self, _context: &EvaluationContext, _perturbation: &TrajectoryPointIndex) -> bool {
        true
    }
}
