use std::sync::Arc;
use nalgebra::DVector;
use crate::contact_modules::contact_projection_module::ContactProjector;
use crate::contact_modules::ground_module::GroundModel;
use crate::robot_modules::robot_dynamics_module::{DynamicsModel, DynamicsState};
use crate::robot_modules::robot_planning_group_module::PlanningGroup;
use crate::trajectory_modules::contact_variables::ContactVariables;
use crate::trajectory_modules::full_trajectory::FullTrajectory;
use crate::trajectory_modules::trajectory_index::{ComponentType, SubComponentType, TrajectoryPointIndex};
use crate::utils::utils_math::spatial::SpatialVector;

/// Everything propagation produces, one entry per trajectory point.
#[derive(Clone, Debug, PartialEq)]
pub struct PropagationState {
    pub dynamics_states: Vec<DynamicsState>,
    pub joint_torques: Vec<DVector<f64>>,
    /// `[point][body]`, world coordinates.
    pub external_forces: Vec<Vec<SpatialVector>>,
    /// `[point][contact]`.
    pub contact_variables: Vec<Vec<ContactVariables>>
}
impl PropagationState {
    pub fn new(model: &dyn DynamicsModel, num_points: usize, num_contacts: usize) -> Self {
        Self {
            dynamics_states: vec![model.new_dynamics_state(); num_points],
            joint_torques: vec![DVector::zeros(model.num_joints()); num_points],
            external_forces: vec![vec![SpatialVector::zeros(); model.num_bodies()]; num_points],
            contact_variables: vec![vec![ContactVariables::new(); num_contacts]; num_points]
        }
    }
    pub fn num_points(&self) -> usize {
        self.dynamics_states.len()
    }
    /// Copies every per-point quantity in `[begin, end)` from `other`.
    pub fn copy_range_from(&mut self, other: &PropagationState, begin: usize, end: usize) {
        for p in begin..end {
            self.dynamics_states[p].clone_from(&other.dynamics_states[p]);
            self.joint_torques[p].copy_from(&other.joint_torques[p]);
            self.external_forces[p].clone_from(&other.external_forces[p]);
            self.contact_variables[p].clone_from(&other.contact_variables[p]);
        }
    }
}

/// Runs contact projection and the dynamics model over ranges of trajectory points.
#[derive(Clone, Debug)]
pub struct KinematicsDynamicsPropagator {
    model: Arc<dyn DynamicsModel>,
    ground: Arc<dyn GroundModel>,
    group: Arc<PlanningGroup>
}
impl KinematicsDynamicsPropagator {
    pub fn new(model: Arc<dyn DynamicsModel>, ground: Arc<dyn GroundModel>, group: Arc<PlanningGroup>) -> Self {
        Self { model, ground, group }
    }
    pub fn model(&self) -> &Arc<dyn DynamicsModel> {
        &self.model
    }
    pub fn ground(&self) -> &Arc<dyn GroundModel> {
        &self.ground
    }
    pub fn group(&self) -> &Arc<PlanningGroup> {
        &self.group
    }
    fn joint_rows(trajectory: &FullTrajectory, point: usize) -> (DVector<f64>, DVector<f64>, DVector<f64>) {
        (trajectory.trajectory_point(ComponentType::Position, SubComponentType::Joint, point),
         trajectory.trajectory_point(ComponentType::Velocity, SubComponentType::Joint, point),
         trajectory.trajectory_point(ComponentType::Acceleration, SubComponentType::Joint, point))
    }
    /// Reads the contact variables of `point` from the trajectory and recomputes the external
    /// forces they exert.
    fn update_contacts(&self, trajectory: &FullTrajectory, state: &mut PropagationState, point: usize) {
        for c in 0..self.group.num_contacts() {
            state.contact_variables[point][c] = trajectory.contact_variables(point, c);
        }
        ContactProjector::compute_external_forces(&self.group, self.ground.as_ref(), &mut state.contact_variables[point], &mut state.external_forces[point]);
    }
    /// Contact projection, external forces and full kinematics/dynamics over `[begin, end)`.
    /// With `apply_external_forces == false` the external forces are zeroed instead.
    pub fn propagate_full(&self, trajectory: &FullTrajectory, state: &mut PropagationState, begin: usize, end: usize, apply_external_forces: bool) {
        assert!(end <= state.num_points() && begin <= end, "invalid point range [{}, {})", begin, end);
        if !trajectory.has_derivative_components() { return; }

        for point in begin..end {
            if apply_external_forces {
                self.update_contacts(trajectory, state, point);
            } else {
                for f in state.external_forces[point].iter_mut() { *f = SpatialVector::zeros(); }
            }
            let (q, qdot, qddot) = Self::joint_rows(trajectory, point);
            self.model.propagate_full(&mut state.dynamics_states[point], &q, &qdot, &qddot, &state.external_forces[point], &mut state.joint_torques[point]);
        }
    }
    /// Incremental propagation over `[begin, end)` after the scalar at `changed` was perturbed.
    ///
    /// A joint change recomputes only the kinematics of the bodies downstream of that joint,
    /// taking everything else (including contacts and external forces) from `reference`.  A
    /// contact change keeps the reference kinematics and recomputes contact projection, external
    /// forces and torques.
    pub fn propagate_partial(&self, trajectory: &FullTrajectory, state: &mut PropagationState, reference: &PropagationState, changed: &TrajectoryPointIndex, begin: usize, end: usize) {
        assert!(end <= state.num_points() && begin <= end, "invalid point range [{}, {})", begin, end);
        assert_eq!(reference.num_points(), state.num_points(), "reference state has a different number of points");
        if !trajectory.has_derivative_components() { return; }

        match changed.sub_component {
            SubComponentType::Joint => {
                let affected_body_ids = match self.group.group_joint_for_joint_index(changed.element) {
                    Some(group_joint) => { group_joint.affected_body_ids().clone() }
                    None => { self.model.descendant_body_ids(self.model.joint_body_id(changed.element)) }
                };
                for point in begin..end {
                    state.dynamics_states[point].copy_kinematics_from(&reference.dynamics_states[point]);
                    state.contact_variables[point].clone_from(&reference.contact_variables[point]);
                    state.external_forces[point].clone_from(&reference.external_forces[point]);

                    let (q, qdot, qddot) = Self::joint_rows(trajectory, point);
                    self.model.propagate_partial(&mut state.dynamics_states[point], &q, &qdot, &qddot, &state.external_forces[point], &affected_body_ids, &mut state.joint_torques[point]);
                }
            }
            SubComponentType::ContactPosition | SubComponentType::ContactForce => {
                for point in begin..end {
                    state.dynamics_states[point].copy_kinematics_from(&reference.dynamics_states[point]);
                    self.update_contacts(trajectory, state, point);
                    self.model.propagate_dynamics_only(&mut state.dynamics_states[point], &state.external_forces[point], &mut state.joint_torques[point]);
                }
            }
        }
    }
}
