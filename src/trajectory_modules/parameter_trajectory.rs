use std::collections::HashMap;
use itertools::Itertools;
use nalgebra::{DMatrix, DVector};
use strum::IntoEnumIterator;
use crate::robot_modules::robot_planning_group_module::PlanningGroup;
use crate::trajectory_modules::full_trajectory::FullTrajectory;
use crate::trajectory_modules::trajectory_index::{ComponentType, SubComponentType, TrajectoryPointIndex};
use crate::utils::utils_nalgebra::conversions::NalgebraConversions;
use crate::utils::utils_sampling::SimpleSamplers;

/// The free elements of one (component, sub-component) pair.
#[derive(Clone, Debug)]
pub struct ParameterBlock {
    component: ComponentType,
    sub_component: SubComponentType,
    elements: Vec<usize>,
    offset: usize
}
impl ParameterBlock {
    pub fn component(&self) -> ComponentType {
        self.component
    }
    pub fn sub_component(&self) -> SubComponentType {
        self.sub_component
    }
    pub fn elements(&self) -> &Vec<usize> {
        &self.elements
    }
    /// Flat index of this block's first parameter.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Bidirectional map between flat parameter indices and full-trajectory locations.
///
/// Flat ordering is component, then sub-component, then element, then keyframe.  Built once per
/// planning group and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct ParameterIndexMap {
    parameter_keyframes: Vec<usize>,
    blocks: Vec<ParameterBlock>,
    parameter_to_trajectory: Vec<TrajectoryPointIndex>,
    trajectory_to_parameter: HashMap<TrajectoryPointIndex, usize>
}
impl ParameterIndexMap {
    pub fn new(full_trajectory: &FullTrajectory, group: &PlanningGroup, fix_start_point: bool, fix_goal_point: bool, optimize_keyframe_velocities: bool) -> Self {
        let n = full_trajectory.num_points();
        let parameter_keyframes: Vec<usize> = full_trajectory.keyframe_indices()
            .into_iter()
            .filter(|kf| !(fix_start_point && *kf == 0) && !(fix_goal_point && *kf == n - 1))
            .collect();
        let group_joint_elements: Vec<usize> = group.group_joints().iter().map(|g| g.joint_index()).collect();

        let mut blocks = vec![];
        let mut parameter_to_trajectory = vec![];
        for component in ComponentType::iter() {
            for sub_component in SubComponentType::iter() {
                let elements: Vec<usize> = match (component, sub_component) {
                    (ComponentType::Position, SubComponentType::Joint) => { group_joint_elements.clone() }
                    (ComponentType::Velocity, SubComponentType::Joint) if optimize_keyframe_velocities => { group_joint_elements.clone() }
                    (ComponentType::Position, SubComponentType::ContactPosition) | (ComponentType::Position, SubComponentType::ContactForce) => {
                        (0..full_trajectory.num_elements(sub_component)).collect()
                    }
                    _ => { vec![] }
                };
                if elements.is_empty() || parameter_keyframes.is_empty() { continue; }

                let offset = parameter_to_trajectory.len();
                for (e, kf) in elements.iter().cartesian_product(parameter_keyframes.iter()) {
                    parameter_to_trajectory.push(TrajectoryPointIndex::new(*kf, component, sub_component, *e));
                }
                blocks.push(ParameterBlock { component, sub_component, elements, offset });
            }
        }

        let trajectory_to_parameter = parameter_to_trajectory.iter().enumerate().map(|(i, idx)| (*idx, i)).collect();

        Self {
            parameter_keyframes,
            blocks,
            parameter_to_trajectory,
            trajectory_to_parameter
        }
    }
    pub fn num_parameters(&self) -> usize {
        self.parameter_to_trajectory.len()
    }
    pub fn parameter_keyframes(&self) -> &Vec<usize> {
        &self.parameter_keyframes
    }
    pub fn blocks(&self) -> &Vec<ParameterBlock> {
        &self.blocks
    }
    pub fn parameter_to_trajectory(&self) -> &Vec<TrajectoryPointIndex> {
        &self.parameter_to_trajectory
    }
    /// Panics on an out-of-range index.
    pub fn trajectory_index(&self, parameter_index: usize) -> &TrajectoryPointIndex {
        assert!(parameter_index < self.parameter_to_trajectory.len(), "parameter index {} out of range ({} parameters)", parameter_index, self.parameter_to_trajectory.len());
        &self.parameter_to_trajectory[parameter_index]
    }
    pub fn parameter_index(&self, trajectory_index: &TrajectoryPointIndex) -> Option<usize> {
        self.trajectory_to_parameter.get(trajectory_index).cloned()
    }
}

/// Dense values of the free parameters, one `[parameter keyframes x elements]` matrix per block.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterTrajectory {
    matrices: Vec<DMatrix<f64>>
}
impl ParameterTrajectory {
    pub fn new(map: &ParameterIndexMap) -> Self {
        let num_keyframes = map.parameter_keyframes().len();
        let matrices = map.blocks().iter().map(|b| DMatrix::zeros(num_keyframes, b.elements().len())).collect();
        Self { matrices }
    }
    /// Exact copy of the parameter values held by the full trajectory.
    pub fn extract(full_trajectory: &FullTrajectory, map: &ParameterIndexMap) -> Self {
        let mut out_self = Self::new(map);
        let values: Vec<f64> = map.parameter_to_trajectory().iter().map(|idx| full_trajectory.value(idx)).collect();
        out_self.set_flat(&NalgebraConversions::vec_to_dvector(&values));
        out_self
    }
    pub fn num_parameters(&self) -> usize {
        self.matrices.iter().map(|m| m.len()).sum()
    }
    pub fn block_matrix(&self, block: usize) -> &DMatrix<f64> {
        &self.matrices[block]
    }
    pub fn get_flat(&self) -> DVector<f64> {
        // column-major storage with keyframes as rows is exactly element-then-keyframe order.
        DVector::from_iterator(self.num_parameters(), self.matrices.iter().flat_map(|m| m.iter().cloned()))
    }
    pub fn set_flat(&mut self, flat: &DVector<f64>) {
        assert_eq!(flat.len(), self.num_parameters(), "parameter vector has the wrong length");
        let mut offset = 0;
        for m in self.matrices.iter_mut() {
            let len = m.len();
            m.as_mut_slice().copy_from_slice(&flat.as_slice()[offset..offset + len]);
            offset += len;
        }
    }
    /// Adds zero-mean normal noise with the given standard deviation to every parameter.
    pub fn add_parameter_noise(&mut self, standard_deviation: f64, seed: u64) {
        let means_and_deviations: Vec<(f64, f64)> = NalgebraConversions::dvector_to_vec(&self.get_flat())
            .into_iter()
            .map(|x| (x, standard_deviation))
            .collect();
        let noisy = SimpleSamplers::normal_samples(&means_and_deviations, seed);
        self.set_flat(&NalgebraConversions::vec_to_dvector(&noisy));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix3, Vector3};
    use crate::robot_modules::robot_dynamics_module::{RigidBody, TreeDynamicsModel};
    use crate::robot_modules::robot_planning_group_module::{ContactPointSpec, GroupJointSpec, PlanningGroupSpec};

    fn group_and_trajectory() -> (PlanningGroup, FullTrajectory) {
        let bodies = vec![
            RigidBody::new_revolute("a", None, Vector3::z(), Vector3::zeros(), 1.0, Vector3::zeros(), Matrix3::identity()),
            RigidBody::new_revolute("b", Some(0), Vector3::y(), Vector3::new(0.3, 0.0, 0.0), 1.0, Vector3::zeros(), Matrix3::identity()),
        ];
        let model = TreeDynamicsModel::new(bodies, 9.81).expect("valid model");
        let spec = PlanningGroupSpec {
            name: "arm".to_string(),
            joints: vec![GroupJointSpec { joint_name: "b".to_string(), lower_limit: -2.0, upper_limit: 2.0 }],
            contact_points: vec![ContactPointSpec::new_rectangular("hand", "b", 0.05, 0.05)]
        };
        let group = PlanningGroup::new(&spec, &model).expect("valid group");
        let mut full = FullTrajectory::new(9, 0.1, 4, 2, 1);
        full.initialize_from_start_goal(&DVector::from_vec(vec![0.0, 0.0]), &DVector::from_vec(vec![0.0, 1.0]));
        (group, full)
    }

    #[test]
    fn map_respects_fixed_endpoints_and_ordering() {
        let (group, full) = group_and_trajectory();
        let map = ParameterIndexMap::new(&full, &group, true, false, true);
        assert_eq!(map.parameter_keyframes(), &vec![4, 8]);
        // joint position (1 x 2), joint velocity (1 x 2), contact position (6 x 2), contact force (12 x 2)
        assert_eq!(map.num_parameters(), 2 + 2 + 12 + 24);
        assert_eq!(map.trajectory_index(0), &TrajectoryPointIndex::new(4, ComponentType::Position, SubComponentType::Joint, 1));
        assert_eq!(map.trajectory_index(1), &TrajectoryPointIndex::new(8, ComponentType::Position, SubComponentType::Joint, 1));
        assert_eq!(map.trajectory_index(2).sub_component, SubComponentType::ContactPosition);
        assert_eq!(map.trajectory_index(2 + 12 + 24).component, ComponentType::Velocity);
        for i in 0..map.num_parameters() {
            assert_eq!(map.parameter_index(map.trajectory_index(i)), Some(i));
        }
    }

    #[test]
    fn round_trip_reproduces_full_trajectory() {
        let (group, mut full) = group_and_trajectory();
        let original = full.clone();
        let map = ParameterIndexMap::new(&full, &group, true, true, false);
        let parameters = ParameterTrajectory::extract(&full, &map);
        full.update_from_parameter_trajectory(&parameters, &map, &group);
        for c in ComponentType::iter() {
            for s in SubComponentType::iter() {
                assert_eq!(full.component_trajectory(c, s), original.component_trajectory(c, s));
            }
        }
    }

    #[test]
    fn noise_is_seeded() {
        let (group, full) = group_and_trajectory();
        let map = ParameterIndexMap::new(&full, &group, true, true, false);
        let mut a = ParameterTrajectory::extract(&full, &map);
        let mut b = a.clone();
        a.add_parameter_noise(0.1, 42);
        b.add_parameter_noise(0.1, 42);
        assert_eq!(a, b);
        assert_eq!(a.num_parameters(), b.num_parameters());
    }
}
