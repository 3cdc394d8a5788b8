use nalgebra::Vector3;
use crate::contact_modules::ground_module::GroundModel;
use crate::robot_modules::robot_planning_group_module::PlanningGroup;
use crate::trajectory_modules::contact_variables::{ContactVariables, NUM_CONTACT_SUB_POINTS};
use crate::utils::utils_math::exponential_map::ExponentialMapUtils;
use crate::utils::utils_math::spatial::{spatial_from_parts, SpatialVector};

/// Projects contact sub-points onto the ground and turns their forces into per-body external
/// spatial forces `[position x force; force]` in world coordinates.
pub struct ContactProjector;
impl ContactProjector {
    /// Updates the projected sub-point positions and normal of one contact.
    pub fn project_contact(ground: &dyn GroundModel, sub_point_offsets: &[Vector3<f64>], variables: &mut ContactVariables) {
        let orientation = ExponentialMapUtils::exp_map_to_rotation(variables.orientation());
        let support = ground.nearest_support(variables.position(), &orientation);
        for s in 0..NUM_CONTACT_SUB_POINTS {
            let p = support.position + support.orientation * sub_point_offsets[s];
            variables.set_projected_point_position(s, p);
        }
        variables.set_projected_normal(support.normal);
    }
    /// Projects every contact of one point, then overwrites `external_forces` (one entry per
    /// body) with the accumulated contact wrenches.
    pub fn compute_external_forces(group: &PlanningGroup, ground: &dyn GroundModel, contact_variables: &mut [ContactVariables], external_forces: &mut [SpatialVector]) {
        assert_eq!(contact_variables.len(), group.num_contacts(), "one contact variable per group contact is required");
        for f in external_forces.iter_mut() { *f = SpatialVector::zeros(); }

        for (contact_point, variables) in group.contact_points().iter().zip(contact_variables.iter_mut()) {
            Self::project_contact(ground, contact_point.sub_point_offsets(), variables);
            for s in 0..NUM_CONTACT_SUB_POINTS {
                let force = variables.force(s);
                let position = variables.projected_point_position(s);
                let body_id = contact_point.sub_point_body_ids()[s];
                external_forces[body_id] += spatial_from_parts(&position.cross(force), force);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;
    use crate::contact_modules::ground_module::FlatGround;
    use crate::robot_modules::robot_dynamics_module::{RigidBody, TreeDynamicsModel};
    use crate::robot_modules::robot_planning_group_module::{ContactPointSpec, PlanningGroupSpec};

    fn foot_group() -> PlanningGroup {
        let bodies = vec![RigidBody::new_prismatic("foot", None, Vector3::z(), Vector3::zeros(), 1.0, Vector3::zeros(), Matrix3::identity())];
        let model = TreeDynamicsModel::new(bodies, 9.81).expect("valid model");
        let spec = PlanningGroupSpec {
            name: "foot".to_string(),
            joints: vec![],
            contact_points: vec![ContactPointSpec::new_rectangular("sole", "foot", 0.1, 0.05)]
        };
        PlanningGroup::new(&spec, &model).expect("valid group")
    }

    #[test]
    fn zero_force_gives_zero_wrench() {
        let group = foot_group();
        let ground = FlatGround::new(0.0);
        let mut c = ContactVariables::new();
        c.set_pose(Vector3::new(0.3, 0.2, 0.4), Vector3::new(0.0, 0.0, 0.7));
        let mut vars = vec![c];
        let mut ext = vec![SpatialVector::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0)];
        ContactProjector::compute_external_forces(&group, &ground, &mut vars, &mut ext);
        assert_eq!(ext[0], SpatialVector::zeros());
        assert_eq!(vars[0].projected_point_position(0)[2], 0.0);
    }

    #[test]
    fn symmetric_vertical_forces_produce_torque_about_center() {
        let group = foot_group();
        let ground = FlatGround::new(0.0);
        let mut c = ContactVariables::new();
        c.set_pose(Vector3::new(1.0, 0.0, 0.0), Vector3::zeros());
        for s in 0..NUM_CONTACT_SUB_POINTS { c.set_force(s, Vector3::new(0.0, 0.0, 2.5)); }
        let mut vars = vec![c];
        let mut ext = vec![SpatialVector::zeros()];
        ContactProjector::compute_external_forces(&group, &ground, &mut vars, &mut ext);

        // total force 10 N up, applied at (1, 0, 0): torque = (1,0,0) x (0,0,10) = (0,-10,0).
        let expected = SpatialVector::new(0.0, -10.0, 0.0, 0.0, 0.0, 10.0);
        approx::assert_relative_eq!(ext[0], expected, epsilon = 1e-12);

        // idempotent.
        ContactProjector::compute_external_forces(&group, &ground, &mut vars, &mut ext);
        approx::assert_relative_eq!(ext[0], expected, epsilon = 1e-12);
    }
}
