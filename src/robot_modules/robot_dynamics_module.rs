use std::fmt::Debug;
use nalgebra::{DVector, Isometry3, Matrix3, Matrix6, Rotation3, Translation3, Unit, UnitQuaternion, Vector3};
use serde::{Serialize, Deserialize};
use crate::utils::utils_console::{cio_print, cio_print_new_line, PrintColor, PrintMode};
use crate::utils::utils_errors::CioError;
use crate::utils::utils_math::spatial::{cross_force, cross_motion, rigid_body_inertia_matrix, spatial_from_parts, SpatialTransform, SpatialVector};

/// Interface to the rigid-body dynamics routines the evaluation engine runs at every trajectory
/// point.
///
/// External forces are given per body in world coordinates as `[torque about the world origin;
/// force]`.  Implementations must keep the body ordering topological (a parent's id is smaller
/// than its children's ids) so that affected-body subsets can be processed in ascending order.
pub trait DynamicsModel: Send + Sync + Debug {
    fn num_bodies(&self) -> usize;
    fn num_joints(&self) -> usize;
    fn new_dynamics_state(&self) -> DynamicsState;
    /// Full forward kinematics plus inverse dynamics.
    fn propagate_full(&self, state: &mut DynamicsState, q: &DVector<f64>, qdot: &DVector<f64>, qddot: &DVector<f64>, external_forces: &[SpatialVector], torques: &mut DVector<f64>);
    /// Recomputes the kinematics of `affected_body_ids` only (ascending, downstream of the changed
    /// joint) and then the complete torque pass.  Every other body's kinematic state must already
    /// be valid for the given configuration.
    fn propagate_partial(&self, state: &mut DynamicsState, q: &DVector<f64>, qdot: &DVector<f64>, qddot: &DVector<f64>, external_forces: &[SpatialVector], affected_body_ids: &[usize], torques: &mut DVector<f64>);
    /// Recomputes joint torques from valid kinematic state and new external forces.
    fn propagate_dynamics_only(&self, state: &mut DynamicsState, external_forces: &[SpatialVector], torques: &mut DVector<f64>);
    fn body_world_transform(&self, state: &DynamicsState, body_id: usize) -> Isometry3<f64>;
    /// Bodies in the subtree rooted at `body_id` (including itself), ascending.
    fn descendant_body_ids(&self, body_id: usize) -> Vec<usize>;
    fn body_id_from_name(&self, name: &str) -> Option<usize>;
    /// The body moved by the given joint.
    fn joint_body_id(&self, joint_idx: usize) -> usize;
    fn joint_index_from_name(&self, name: &str) -> Option<usize>;
}

/// Working state of the recursive Newton-Euler passes for a single trajectory point.
#[derive(Clone, Debug, PartialEq)]
pub struct DynamicsState {
    pub x_lambda: Vec<SpatialTransform>,
    pub x_base: Vec<SpatialTransform>,
    pub v: Vec<SpatialVector>,
    pub a: Vec<SpatialVector>,
    pub c: Vec<SpatialVector>,
    /// Newton-Euler body forces before external forces are subtracted.
    pub f_body: Vec<SpatialVector>,
    /// Accumulated forces after the backward pass.
    pub f: Vec<SpatialVector>
}
impl DynamicsState {
    pub fn new(num_bodies: usize) -> Self {
        Self {
            x_lambda: vec![SpatialTransform::identity(); num_bodies],
            x_base: vec![SpatialTransform::identity(); num_bodies],
            v: vec![SpatialVector::zeros(); num_bodies],
            a: vec![SpatialVector::zeros(); num_bodies],
            c: vec![SpatialVector::zeros(); num_bodies],
            f_body: vec![SpatialVector::zeros(); num_bodies],
            f: vec![SpatialVector::zeros(); num_bodies]
        }
    }
    pub fn num_bodies(&self) -> usize {
        self.x_lambda.len()
    }
    /// Copies transforms, velocities, accelerations and Newton-Euler body forces.
    pub fn copy_kinematics_from(&mut self, other: &DynamicsState) {
        self.x_lambda.clone_from(&other.x_lambda);
        self.x_base.clone_from(&other.x_base);
        self.v.clone_from(&other.v);
        self.a.clone_from(&other.a);
        self.c.clone_from(&other.c);
        self.f_body.clone_from(&other.f_body);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JointAxisPrimitiveType {
    Rotation,
    Translation
}

/// A rigid body together with the single-DoF joint that connects it to its parent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RigidBody {
    pub name: String,
    /// `None` attaches the body to the fixed world frame.
    pub parent: Option<usize>,
    pub joint_type: JointAxisPrimitiveType,
    pub joint_axis: Vector3<f64>,
    pub joint_offset_xyz: Vector3<f64>,
    pub joint_offset_rpy: Vector3<f64>,
    pub mass: f64,
    pub center_of_mass: Vector3<f64>,
    pub inertia_at_com: Matrix3<f64>
}
impl RigidBody {
    pub fn new_revolute(name: &str, parent: Option<usize>, axis: Vector3<f64>, offset_xyz: Vector3<f64>, mass: f64, center_of_mass: Vector3<f64>, inertia_at_com: Matrix3<f64>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            joint_type: JointAxisPrimitiveType::Rotation,
            joint_axis: axis,
            joint_offset_xyz: offset_xyz,
            joint_offset_rpy: Vector3::zeros(),
            mass,
            center_of_mass,
            inertia_at_com
        }
    }
    pub fn new_prismatic(name: &str, parent: Option<usize>, axis: Vector3<f64>, offset_xyz: Vector3<f64>, mass: f64, center_of_mass: Vector3<f64>, inertia_at_com: Matrix3<f64>) -> Self {
        let mut out_self = Self::new_revolute(name, parent, axis, offset_xyz, mass, center_of_mass, inertia_at_com);
        out_self.joint_type = JointAxisPrimitiveType::Translation;
        out_self
    }
    /// Three massless prismatic bodies followed by two massless revolute bodies; the sixth body
    /// (the last revolute) carries the given mass properties.  Ids start at `first_id`.
    pub fn new_floating_base(name: &str, first_id: usize, mass: f64, center_of_mass: Vector3<f64>, inertia_at_com: Matrix3<f64>) -> Vec<Self> {
        let axes = [Vector3::x(), Vector3::y(), Vector3::z()];
        let mut out_vec = vec![];
        for (i, axis) in axes.iter().enumerate() {
            let parent = if i == 0 { None } else { Some(first_id + i - 1) };
            out_vec.push(Self::new_prismatic(&format!("{}_t{}", name, i), parent, axis.clone(), Vector3::zeros(), 0.0, Vector3::zeros(), Matrix3::zeros()));
        }
        for (i, axis) in axes.iter().enumerate() {
            let parent = Some(first_id + 2 + i);
            let body_name = if i == 2 { name.to_string() } else { format!("{}_r{}", name, i) };
            if i == 2 {
                out_vec.push(Self::new_revolute(&body_name, parent, axis.clone(), Vector3::zeros(), mass, center_of_mass, inertia_at_com));
            } else {
                out_vec.push(Self::new_revolute(&body_name, parent, axis.clone(), Vector3::zeros(), 0.0, Vector3::zeros(), Matrix3::zeros()));
            }
        }
        out_vec
    }
    fn motion_subspace(&self) -> SpatialVector {
        let axis = self.joint_axis.normalize();
        return match self.joint_type {
            JointAxisPrimitiveType::Rotation => { spatial_from_parts(&axis, &Vector3::zeros()) }
            JointAxisPrimitiveType::Translation => { spatial_from_parts(&Vector3::zeros(), &axis) }
        }
    }
}

/// Recursive Newton-Euler dynamics over a kinematic tree in which every body owns exactly one
/// single-DoF joint, so joint index `i` drives body `i`.
#[derive(Clone, Debug)]
pub struct TreeDynamicsModel {
    bodies: Vec<RigidBody>,
    x_tree: Vec<SpatialTransform>,
    motion_subspaces: Vec<SpatialVector>,
    inertias: Vec<Matrix6<f64>>,
    children: Vec<Vec<usize>>,
    base_acceleration: SpatialVector
}
impl TreeDynamicsModel {
    pub fn new(bodies: Vec<RigidBody>, gravity: f64) -> Result<Self, CioError> {
        let mut x_tree = vec![];
        let mut motion_subspaces = vec![];
        let mut inertias = vec![];
        let mut children = vec![vec![]; bodies.len()];

        for (i, body) in bodies.iter().enumerate() {
            if let Some(parent) = body.parent {
                if parent >= i {
                    return Err(CioError::new_generic_error_str(&format!("body {} ({}) has parent {}, but parents must precede their children", i, body.name, parent), file!(), line!()));
                }
                children[parent].push(i);
            }
            if body.joint_axis.norm() < 1e-12 {
                return Err(CioError::new_generic_error_str(&format!("body {} ({}) has a zero joint axis", i, body.name), file!(), line!()));
            }
            if body.mass < 0.0 {
                return Err(CioError::new_generic_error_str(&format!("body {} ({}) has negative mass", i, body.name), file!(), line!()));
            }
            let rpy = &body.joint_offset_rpy;
            let rotation = Rotation3::from_euler_angles(rpy[0], rpy[1], rpy[2]);
            x_tree.push(SpatialTransform::from_rotation_and_translation(&rotation, &body.joint_offset_xyz));
            motion_subspaces.push(body.motion_subspace());
            inertias.push(rigid_body_inertia_matrix(body.mass, &body.center_of_mass, &body.inertia_at_com));
        }

        Ok(Self {
            bodies,
            x_tree,
            motion_subspaces,
            inertias,
            children,
            base_acceleration: spatial_from_parts(&Vector3::zeros(), &Vector3::new(0.0, 0.0, gravity))
        })
    }
    pub fn bodies(&self) -> &Vec<RigidBody> {
        &self.bodies
    }
    pub fn print_summary(&self) {
        for (i, body) in self.bodies.iter().enumerate() {
            cio_print(&format!("Body {} ({}) ---> ", i, body.name), PrintMode::Print, PrintColor::Blue, true);
            cio_print(&format!("parent: {:?}, joint: {:?}, mass: {}", body.parent, body.joint_type, body.mass), PrintMode::Print, PrintColor::None, false);
            cio_print_new_line();
        }
    }
    fn joint_transform(&self, body_id: usize, q: f64) -> SpatialTransform {
        let body = &self.bodies[body_id];
        return match body.joint_type {
            JointAxisPrimitiveType::Rotation => {
                SpatialTransform::rotation(&Unit::new_normalize(body.joint_axis.clone()), q)
            }
            JointAxisPrimitiveType::Translation => {
                SpatialTransform::translation(&(body.joint_axis.normalize() * q))
            }
        }
    }
    fn forward_pass_body(&self, state: &mut DynamicsState, body_id: usize, q: &DVector<f64>, qdot: &DVector<f64>, qddot: &DVector<f64>) {
        let s = &self.motion_subspaces[body_id];
        let x_j = self.joint_transform(body_id, q[body_id]);
        let x_lambda = x_j.compose(&self.x_tree[body_id]);
        let v_j = s * qdot[body_id];

        let (x_base, v, a) = match self.bodies[body_id].parent {
            None => {
                (x_lambda.clone(), v_j.clone(), x_lambda.apply_motion(&self.base_acceleration))
            }
            Some(parent) => {
                (x_lambda.compose(&state.x_base[parent]),
                 x_lambda.apply_motion(&state.v[parent]) + v_j,
                 x_lambda.apply_motion(&state.a[parent]))
            }
        };

        let c = cross_motion(&v, &v_j);
        let a = a + c + s * qddot[body_id];
        let inertia = &self.inertias[body_id];
        let f_body = inertia * a + cross_force(&v, &(inertia * v));

        state.x_lambda[body_id] = x_lambda;
        state.x_base[body_id] = x_base;
        state.v[body_id] = v;
        state.a[body_id] = a;
        state.c[body_id] = c;
        state.f_body[body_id] = f_body;
    }
    fn backward_pass(&self, state: &mut DynamicsState, external_forces: &[SpatialVector], torques: &mut DVector<f64>) {
        let n = self.bodies.len();
        assert_eq!(external_forces.len(), n, "one external force per body is required");
        assert_eq!(torques.len(), n, "torque vector length must equal the number of joints");

        for i in 0..n {
            state.f[i] = state.f_body[i] - state.x_base[i].apply_adjoint_force(&external_forces[i]);
        }
        for i in (0..n).rev() {
            torques[i] = self.motion_subspaces[i].dot(&state.f[i]);
            if let Some(parent) = self.bodies[i].parent {
                let f_parent = state.x_lambda[i].apply_transpose_force(&state.f[i]);
                state.f[parent] += f_parent;
            }
        }
    }
}
impl DynamicsModel for TreeDynamicsModel {
    fn num_bodies(&self) -> usize {
        self.bodies.len()
    }
    fn num_joints(&self) -> usize {
        self.bodies.len()
    }
    fn new_dynamics_state(&self) -> DynamicsState {
        DynamicsState::new(self.bodies.len())
    }
    fn propagate_full(&self, state: &mut DynamicsState, q: &DVector<f64>, qdot: &DVector<f64>, qddot: &DVector<f64>, external_forces: &[SpatialVector], torques: &mut DVector<f64>) {
        for i in 0..self.bodies.len() {
            self.forward_pass_body(state, i, q, qdot, qddot);
        }
        self.backward_pass(state, external_forces, torques);
    }
    fn propagate_partial(&self, state: &mut DynamicsState, q: &DVector<f64>, qdot: &DVector<f64>, qddot: &DVector<f64>, external_forces: &[SpatialVector], affected_body_ids: &[usize], torques: &mut DVector<f64>) {
        for body_id in affected_body_ids {
            self.forward_pass_body(state, *body_id, q, qdot, qddot);
        }
        self.backward_pass(state, external_forces, torques);
    }
    fn propagate_dynamics_only(&self, state: &mut DynamicsState, external_forces: &[SpatialVector], torques: &mut DVector<f64>) {
        self.backward_pass(state, external_forces, torques);
    }
    fn body_world_transform(&self, state: &DynamicsState, body_id: usize) -> Isometry3<f64> {
        let x_base = &state.x_base[body_id];
        let rotation = UnitQuaternion::from_rotation_matrix(&x_base.world_rotation());
        return Isometry3::from_parts(Translation3::from(x_base.r().clone()), rotation);
    }
    fn descendant_body_ids(&self, body_id: usize) -> Vec<usize> {
        let mut out_vec = vec![];
        let mut stack = vec![body_id];
        while let Some(b) = stack.pop() {
            out_vec.push(b);
            stack.extend(self.children[b].iter());
        }
        out_vec.sort();
        out_vec
    }
    fn body_id_from_name(&self, name: &str) -> Option<usize> {
        self.bodies.iter().position(|b| b.name == name)
    }
    fn joint_body_id(&self, joint_idx: usize) -> usize {
        joint_idx
    }
    fn joint_index_from_name(&self, name: &str) -> Option<usize> {
        self.body_id_from_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pendulum() -> TreeDynamicsModel {
        // point mass of 2 kg at 0.5 m along x, hinge about y.
        let body = RigidBody::new_revolute("link", None, Vector3::y(), Vector3::zeros(), 2.0, Vector3::new(0.5, 0.0, 0.0), Matrix3::zeros());
        TreeDynamicsModel::new(vec![body], 9.81).expect("valid model")
    }

    #[test]
    fn static_pendulum_torque_balances_gravity() {
        let model = pendulum();
        let mut state = model.new_dynamics_state();
        let z = DVector::zeros(1);
        let mut tau = DVector::zeros(1);
        model.propagate_full(&mut state, &z, &z, &z, &vec![SpatialVector::zeros()], &mut tau);
        // holding the mass level needs m g l about the hinge.
        assert_relative_eq!(tau[0].abs(), 2.0 * 9.81 * 0.5, epsilon = 1e-12);
    }

    #[test]
    fn external_force_cancels_gravity() {
        let model = pendulum();
        let mut state = model.new_dynamics_state();
        let z = DVector::zeros(1);
        let mut tau = DVector::zeros(1);
        let p = Vector3::new(0.5, 0.0, 0.0);
        let force = Vector3::new(0.0, 0.0, 2.0 * 9.81);
        let ext = vec![spatial_from_parts(&p.cross(&force), &force)];
        model.propagate_full(&mut state, &z, &z, &z, &ext, &mut tau);
        assert_relative_eq!(tau[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn partial_matches_full_for_downstream_bodies() {
        let inertia = Matrix3::identity() * 0.01;
        let bodies = vec![
            RigidBody::new_revolute("a", None, Vector3::z(), Vector3::zeros(), 1.0, Vector3::new(0.2, 0.0, 0.0), inertia),
            RigidBody::new_revolute("b", Some(0), Vector3::y(), Vector3::new(0.4, 0.0, 0.0), 1.0, Vector3::new(0.2, 0.0, 0.0), inertia),
            RigidBody::new_prismatic("c", Some(1), Vector3::x(), Vector3::new(0.4, 0.0, 0.0), 0.5, Vector3::zeros(), inertia),
        ];
        let model = TreeDynamicsModel::new(bodies, 9.81).expect("valid model");
        let q = DVector::from_vec(vec![0.1, -0.3, 0.05]);
        let qd = DVector::from_vec(vec![0.4, 0.2, -0.1]);
        let qdd = DVector::from_vec(vec![-0.2, 0.7, 0.3]);
        let ext = vec![SpatialVector::zeros(); 3];

        let mut state = model.new_dynamics_state();
        let mut tau = DVector::zeros(3);
        model.propagate_full(&mut state, &q, &qd, &qdd, &ext, &mut tau);

        let mut q2 = q.clone();
        q2[1] += 0.01;
        let mut full_state = model.new_dynamics_state();
        let mut full_tau = DVector::zeros(3);
        model.propagate_full(&mut full_state, &q2, &qd, &qdd, &ext, &mut full_tau);

        let mut partial_tau = DVector::zeros(3);
        model.propagate_partial(&mut state, &q2, &qd, &qdd, &ext, &model.descendant_body_ids(1), &mut partial_tau);
        assert_relative_eq!(partial_tau, full_tau, epsilon = 1e-12);
        assert_eq!(model.descendant_body_ids(1), vec![1, 2]);
    }

    #[test]
    fn floating_base_has_six_bodies() {
        let bodies = RigidBody::new_floating_base("torso", 0, 10.0, Vector3::zeros(), Matrix3::identity());
        assert_eq!(bodies.len(), 6);
        let model = TreeDynamicsModel::new(bodies, 9.81).expect("valid model");
        assert_eq!(model.body_id_from_name("torso"), Some(5));
        assert_eq!(model.descendant_body_ids(0), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn parents_must_precede_children() {
        let body = RigidBody::new_revolute("a", Some(0), Vector3::z(), Vector3::zeros(), 1.0, Vector3::zeros(), Matrix3::identity());
        assert!(TreeDynamicsModel::new(vec![body], 9.81).is_err());
    }
}
