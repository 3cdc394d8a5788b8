use nalgebra::{DMatrix, DVector};
use strum::{EnumCount, IntoEnumIterator};
use crate::robot_modules::robot_planning_group_module::PlanningGroup;
use crate::trajectory_modules::contact_variables::{ContactVariables, NUM_CONTACT_FORCE_ELEMENTS, NUM_CONTACT_POSITION_ELEMENTS};
use crate::trajectory_modules::parameter_trajectory::{ParameterIndexMap, ParameterTrajectory};
use crate::trajectory_modules::trajectory_index::{ComponentType, SubComponentType, TrajectoryPointIndex};
use crate::utils::utils_math::interpolation::{QuinticHermiteSegment, SimpleInterpolationUtils};
use crate::utils::utils_nalgebra::conversions::NalgebraConversions;
use crate::utils::utils_parameters::EvaluationParameters;

/// Snapshot of rows `[begin, end)` of the three components of one sub-component.
#[derive(Clone, Debug)]
struct TrajectoryBackup {
    sub_component: SubComponentType,
    begin: usize,
    end: usize,
    rows: Vec<DMatrix<f64>>
}

/// Per-point joint and contact trajectories.  One `[num_points x num_elements]` matrix is kept
/// for every (component, sub-component) pair.
///
/// Keyframes are the points `0, K, 2K, ..., N-1`.  Samples between keyframes are always derived:
/// joints by quintic Hermite interpolation of keyframe position, velocity and acceleration,
/// contacts by linear interpolation of the position component.
#[derive(Clone, Debug)]
pub struct FullTrajectory {
    num_points: usize,
    num_joints: usize,
    num_contacts: usize,
    keyframe_interval: usize,
    discretization: f64,
    has_derivative_components: bool,
    trajectories: Vec<DMatrix<f64>>,
    backup: Option<TrajectoryBackup>
}
impl FullTrajectory {
    pub fn new(num_points: usize, discretization: f64, keyframe_interval: usize, num_joints: usize, num_contacts: usize) -> Self {
        assert!(num_points > 0, "a trajectory needs at least one point");
        assert!(keyframe_interval > 0, "keyframe interval must be at least 1");
        assert_eq!((num_points - 1) % keyframe_interval, 0, "num_points - 1 must be a multiple of the keyframe interval");
        assert!(num_points == 1 || discretization > 0.0, "discretization must be positive");

        let mut trajectories = Vec::with_capacity(ComponentType::COUNT * SubComponentType::COUNT);
        for _ in ComponentType::iter() {
            for sub_component in SubComponentType::iter() {
                let num_elements = Self::num_elements_for(sub_component, num_joints, num_contacts);
                trajectories.push(DMatrix::zeros(num_points, num_elements));
            }
        }

        Self {
            num_points,
            num_joints,
            num_contacts,
            keyframe_interval,
            discretization,
            has_derivative_components: true,
            trajectories,
            backup: None
        }
    }
    pub fn new_from_parameters(parameters: &EvaluationParameters, num_joints: usize, num_contacts: usize) -> Self {
        Self::new(parameters.num_points(), parameters.trajectory_discretization, parameters.keyframe_interval, num_joints, num_contacts)
    }
    /// A trajectory whose velocity and acceleration components carry no information.  Dynamics
    /// propagation is skipped for such trajectories.
    pub fn new_position_only(num_points: usize, discretization: f64, keyframe_interval: usize, num_joints: usize, num_contacts: usize) -> Self {
        let mut out_self = Self::new(num_points, discretization, keyframe_interval, num_joints, num_contacts);
        out_self.has_derivative_components = false;
        out_self
    }
    fn num_elements_for(sub_component: SubComponentType, num_joints: usize, num_contacts: usize) -> usize {
        return match sub_component {
            SubComponentType::Joint => { num_joints }
            SubComponentType::ContactPosition => { NUM_CONTACT_POSITION_ELEMENTS * num_contacts }
            SubComponentType::ContactForce => { NUM_CONTACT_FORCE_ELEMENTS * num_contacts }
        }
    }
    fn matrix_idx(component: ComponentType, sub_component: SubComponentType) -> usize {
        component.index() * SubComponentType::COUNT + sub_component.index()
    }
    pub fn num_points(&self) -> usize {
        self.num_points
    }
    pub fn num_joints(&self) -> usize {
        self.num_joints
    }
    pub fn num_contacts(&self) -> usize {
        self.num_contacts
    }
    pub fn num_elements(&self, sub_component: SubComponentType) -> usize {
        Self::num_elements_for(sub_component, self.num_joints, self.num_contacts)
    }
    pub fn keyframe_interval(&self) -> usize {
        self.keyframe_interval
    }
    pub fn discretization(&self) -> f64 {
        self.discretization
    }
    pub fn duration(&self) -> f64 {
        (self.num_points - 1) as f64 * self.discretization
    }
    pub fn has_derivative_components(&self) -> bool {
        self.has_derivative_components
    }
    pub fn is_keyframe(&self, point: usize) -> bool {
        point % self.keyframe_interval == 0
    }
    pub fn keyframe_indices(&self) -> Vec<usize> {
        (0..self.num_points).step_by(self.keyframe_interval).collect()
    }
    pub fn component_trajectory(&self, component: ComponentType, sub_component: SubComponentType) -> &DMatrix<f64> {
        &self.trajectories[Self::matrix_idx(component, sub_component)]
    }
    pub fn component_trajectory_mut(&mut self, component: ComponentType, sub_component: SubComponentType) -> &mut DMatrix<f64> {
        &mut self.trajectories[Self::matrix_idx(component, sub_component)]
    }
    /// Copy of row `point` of one component trajectory.
    pub fn trajectory_point(&self, component: ComponentType, sub_component: SubComponentType, point: usize) -> DVector<f64> {
        NalgebraConversions::dmatrix_row_to_dvector(self.component_trajectory(component, sub_component), point)
    }
    pub fn value(&self, index: &TrajectoryPointIndex) -> f64 {
        self.component_trajectory(index.component, index.sub_component)[(index.point, index.element)]
    }
    pub fn set_value(&mut self, index: &TrajectoryPointIndex, value: f64) {
        self.component_trajectory_mut(index.component, index.sub_component)[(index.point, index.element)] = value;
    }

    /// Writes every parameter back to its keyframe and re-derives the samples in between.
    pub fn update_from_parameter_trajectory(&mut self, parameters: &ParameterTrajectory, map: &ParameterIndexMap, group: &PlanningGroup) {
        let flat = parameters.get_flat();
        assert_eq!(flat.len(), map.num_parameters(), "parameter vector does not match the parameter map");
        for (i, index) in map.parameter_to_trajectory().iter().enumerate() {
            self.set_value(index, flat[i]);
        }
        self.interpolate_keyframes(group);
    }

    /// Re-derives all non-keyframe samples of the group's joints and of every contact.
    pub fn interpolate_keyframes(&mut self, group: &PlanningGroup) {
        let joint_indices: Vec<usize> = group.group_joints().iter().map(|g| g.joint_index()).collect();
        for j in joint_indices {
            self.interpolate_element(SubComponentType::Joint, j);
        }
        self.interpolate_contact_variables();
    }
    pub fn interpolate_contact_variables(&mut self) {
        for sub_component in [SubComponentType::ContactPosition, SubComponentType::ContactForce] {
            for e in 0..self.num_elements(sub_component) {
                self.interpolate_element(sub_component, e);
            }
        }
    }
    /// Linear interpolation of the position component of `sub_component` between the first and
    /// last point, ignoring interior keyframes.
    pub fn interpolate_start_end(&mut self, sub_component: SubComponentType) {
        let n = self.num_points;
        if n < 3 { return; }
        let m = self.component_trajectory_mut(ComponentType::Position, sub_component);
        for e in 0..m.ncols() {
            let start = m[(0, e)];
            let end = m[(n - 1, e)];
            for i in 1..n - 1 {
                let s = i as f64 / (n - 1) as f64;
                m[(i, e)] = SimpleInterpolationUtils::linear_interpolation_scalar(start, end, s);
            }
        }
    }
    fn interpolate_element(&mut self, sub_component: SubComponentType, element: usize) {
        let k = self.keyframe_interval;
        let mut k0 = 0;
        while k0 + k < self.num_points {
            self.interpolate_segment(sub_component, element, k0, k0 + k);
            k0 += k;
        }
    }
    /// Fills the samples strictly between keyframes `k0` and `k1` for one element.
    fn interpolate_segment(&mut self, sub_component: SubComponentType, element: usize, k0: usize, k1: usize) {
        if k1 <= k0 + 1 { return; }
        match sub_component {
            SubComponentType::Joint => {
                let p = Self::matrix_idx(ComponentType::Position, sub_component);
                let v = Self::matrix_idx(ComponentType::Velocity, sub_component);
                let a = Self::matrix_idx(ComponentType::Acceleration, sub_component);
                let dt = self.discretization;
                let segment = QuinticHermiteSegment::new(
                    self.trajectories[p][(k0, element)], self.trajectories[v][(k0, element)], self.trajectories[a][(k0, element)],
                    self.trajectories[p][(k1, element)], self.trajectories[v][(k1, element)], self.trajectories[a][(k1, element)],
                    (k1 - k0) as f64 * dt
                );
                for i in k0 + 1..k1 {
                    let t = (i - k0) as f64 * dt;
                    self.trajectories[p][(i, element)] = segment.position(t);
                    self.trajectories[v][(i, element)] = segment.velocity(t);
                    self.trajectories[a][(i, element)] = segment.acceleration(t);
                }
            }
            _ => {
                let m = self.component_trajectory_mut(ComponentType::Position, sub_component);
                let start = m[(k0, element)];
                let end = m[(k1, element)];
                for i in k0 + 1..k1 {
                    let s = (i - k0) as f64 / (k1 - k0) as f64;
                    m[(i, element)] = SimpleInterpolationUtils::linear_interpolation_scalar(start, end, s);
                }
            }
        }
    }

    /// Points whose samples change when `point` changes: from one past the previous keyframe to
    /// the next keyframe (exclusive).  A non-keyframe point only affects itself.
    pub fn affected_range(&self, point: usize) -> (usize, usize) {
        if !self.is_keyframe(point) { return (point, point + 1); }
        let k = self.keyframe_interval;
        let begin = if point >= k { point - k + 1 } else { point };
        let end = if point + k < self.num_points { point + k } else { point + 1 };
        (begin, end)
    }

    /// Writes one scalar, re-derives the samples adjacent to it, and returns the affected range
    /// `[begin, end)`.  On the first call of a +/- pair the affected rows of all three components
    /// of the sub-component are backed up, to be put back by `restore_backup_trajectories`.
    pub fn direct_change_for_derivatives(&mut self, value: f64, index: &TrajectoryPointIndex, is_first_of_pair: bool) -> (usize, usize) {
        assert!(index.point < self.num_points, "point {} out of range ({} points)", index.point, self.num_points);
        assert!(index.element < self.num_elements(index.sub_component), "element {} out of range for {:?}", index.element, index.sub_component);

        let (begin, end) = self.affected_range(index.point);
        if is_first_of_pair {
            let rows = ComponentType::iter()
                .map(|c| self.component_trajectory(c, index.sub_component).rows(begin, end - begin).into_owned())
                .collect();
            self.backup = Some(TrajectoryBackup { sub_component: index.sub_component, begin, end, rows });
        } else {
            assert!(self.backup.is_some(), "the second change of a pair requires a backup from the first");
        }

        self.set_value(index, value);
        if self.is_keyframe(index.point) {
            let k = self.keyframe_interval;
            if index.point >= k { self.interpolate_segment(index.sub_component, index.element, index.point - k, index.point); }
            if index.point + k < self.num_points { self.interpolate_segment(index.sub_component, index.element, index.point, index.point + k); }
        }

        (begin, end)
    }
    /// Puts back the rows saved by the last `direct_change_for_derivatives` pair.  No-op when
    /// nothing is backed up.
    pub fn restore_backup_trajectories(&mut self) {
        if let Some(backup) = self.backup.take() {
            for (c, rows) in ComponentType::iter().zip(backup.rows.iter()) {
                self.component_trajectory_mut(c, backup.sub_component)
                    .rows_mut(backup.begin, backup.end - backup.begin)
                    .copy_from(rows);
            }
        }
    }

    pub fn contact_variables(&self, point: usize, contact: usize) -> ContactVariables {
        assert!(contact < self.num_contacts);
        let p = self.component_trajectory(ComponentType::Position, SubComponentType::ContactPosition);
        let f = self.component_trajectory(ComponentType::Position, SubComponentType::ContactForce);
        let p0 = contact * NUM_CONTACT_POSITION_ELEMENTS;
        let f0 = contact * NUM_CONTACT_FORCE_ELEMENTS;
        let position_row: Vec<f64> = (0..NUM_CONTACT_POSITION_ELEMENTS).map(|i| p[(point, p0 + i)]).collect();
        let force_row: Vec<f64> = (0..NUM_CONTACT_FORCE_ELEMENTS).map(|i| f[(point, f0 + i)]).collect();
        ContactVariables::new_from_rows(&position_row, &force_row)
    }
    pub fn set_contact_variables(&mut self, point: usize, contact: usize, variables: &ContactVariables) {
        assert!(contact < self.num_contacts);
        let mut position_row = [0.0; NUM_CONTACT_POSITION_ELEMENTS];
        let mut force_row = [0.0; NUM_CONTACT_FORCE_ELEMENTS];
        variables.write_position_row(&mut position_row);
        variables.write_force_row(&mut force_row);
        let p0 = contact * NUM_CONTACT_POSITION_ELEMENTS;
        let f0 = contact * NUM_CONTACT_FORCE_ELEMENTS;
        let p = self.component_trajectory_mut(ComponentType::Position, SubComponentType::ContactPosition);
        for i in 0..NUM_CONTACT_POSITION_ELEMENTS { p[(point, p0 + i)] = position_row[i]; }
        let f = self.component_trajectory_mut(ComponentType::Position, SubComponentType::ContactForce);
        for i in 0..NUM_CONTACT_FORCE_ELEMENTS { f[(point, f0 + i)] = force_row[i]; }
    }

    /// Linear joint-space path from `start` to `goal` sampled at the keyframes, with zero keyframe
    /// velocity and acceleration; interior samples follow the minimum-jerk profile.
    pub fn initialize_from_start_goal(&mut self, start: &DVector<f64>, goal: &DVector<f64>) {
        assert_eq!(start.len(), self.num_joints);
        assert_eq!(goal.len(), self.num_joints);
        let n = self.num_points;
        for c in ComponentType::iter() {
            self.component_trajectory_mut(c, SubComponentType::Joint).fill(0.0);
        }
        for kf in self.keyframe_indices() {
            let s = if n > 1 { kf as f64 / (n - 1) as f64 } else { 0.0 };
            let m = self.component_trajectory_mut(ComponentType::Position, SubComponentType::Joint);
            for j in 0..start.len() {
                m[(kf, j)] = SimpleInterpolationUtils::linear_interpolation_scalar(start[j], goal[j], s);
            }
        }
        for j in 0..self.num_joints {
            self.interpolate_element(SubComponentType::Joint, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn trajectory() -> FullTrajectory {
        let mut t = FullTrajectory::new(11, 0.1, 5, 2, 1);
        t.initialize_from_start_goal(&DVector::from_vec(vec![0.0, 1.0]), &DVector::from_vec(vec![1.0, -1.0]));
        t
    }

    #[test]
    fn keyframes_and_ranges() {
        let t = trajectory();
        assert_eq!(t.keyframe_indices(), vec![0, 5, 10]);
        assert_eq!(t.affected_range(0), (0, 5));
        assert_eq!(t.affected_range(5), (1, 10));
        assert_eq!(t.affected_range(10), (6, 11));
        assert_eq!(t.affected_range(3), (3, 4));
    }

    #[test]
    fn start_goal_initialization_hits_keyframes() {
        let t = trajectory();
        let q = t.component_trajectory(ComponentType::Position, SubComponentType::Joint);
        assert_relative_eq!(q[(5, 0)], 0.5, epsilon = 1e-12);
        assert_relative_eq!(q[(10, 1)], -1.0, epsilon = 1e-12);
        let v = t.component_trajectory(ComponentType::Velocity, SubComponentType::Joint);
        assert!(v[(2, 0)] > 0.0);
    }

    #[test]
    fn every_component_pair_owns_a_distinct_matrix() {
        let t = trajectory();
        assert_eq!(t.trajectories.len(), ComponentType::COUNT * SubComponentType::COUNT);
        let mut seen = vec![false; t.trajectories.len()];
        for c in ComponentType::iter() {
            for s in SubComponentType::iter() {
                let idx = FullTrajectory::matrix_idx(c, s);
                assert!(!seen[idx]);
                seen[idx] = true;
                assert_eq!(t.component_trajectory(c, s).ncols(), FullTrajectory::num_elements_for(s, 2, 1));
            }
        }
    }

    #[test]
    fn change_then_restore_is_bit_exact() {
        let mut t = trajectory();
        let before = t.clone();
        let index = TrajectoryPointIndex::new(5, ComponentType::Position, SubComponentType::Joint, 1);

        let (b, e) = t.direct_change_for_derivatives(0.3, &index, true);
        assert_eq!((b, e), (1, 10));
        assert_eq!(t.value(&index), 0.3);
        assert!(t.component_trajectory(ComponentType::Position, SubComponentType::Joint)[(3, 1)] != before.component_trajectory(ComponentType::Position, SubComponentType::Joint)[(3, 1)]);
        t.direct_change_for_derivatives(-0.2, &index, false);
        t.restore_backup_trajectories();

        for c in ComponentType::iter() {
            for s in SubComponentType::iter() {
                assert_eq!(t.component_trajectory(c, s), before.component_trajectory(c, s));
            }
        }
    }

    #[test]
    fn contact_variables_round_trip() {
        let mut t = trajectory();
        let mut c = ContactVariables::new();
        c.set_pose(nalgebra::Vector3::new(1.0, 2.0, 0.0), nalgebra::Vector3::new(0.0, 0.0, 0.3));
        c.set_force(2, nalgebra::Vector3::new(0.0, 0.0, 5.0));
        t.set_contact_variables(10, 0, &c);
        assert_eq!(t.contact_variables(10, 0).force(2), c.force(2));
        t.interpolate_contact_variables();
        let mid = t.contact_variables(8, 0);
        assert_relative_eq!(mid.force(2)[2], 3.0, epsilon = 1e-12);
    }

    #[test]
    #[should_panic]
    fn out_of_range_point_panics() {
        let mut t = trajectory();
        let index = TrajectoryPointIndex::new(11, ComponentType::Position, SubComponentType::Joint, 0);
        t.direct_change_for_derivatives(0.0, &index, true);
    }
}
