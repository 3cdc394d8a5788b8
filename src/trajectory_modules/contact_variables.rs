use nalgebra::Vector3;
use crate::utils::utils_nalgebra::conversions::NalgebraConversions;

/// Corners of a rectangular sole.
pub const NUM_CONTACT_SUB_POINTS: usize = 4;
/// Position (3) followed by exponential-map orientation (3).
pub const NUM_CONTACT_POSITION_ELEMENTS: usize = 6;
pub const NUM_CONTACT_FORCE_ELEMENTS: usize = 3 * NUM_CONTACT_SUB_POINTS;

/// One contact at one trajectory point.  The pose and forces mirror the trajectory rows; the
/// projected sub-point positions are derived by the contact projector on every evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactVariables {
    position: Vector3<f64>,
    orientation: Vector3<f64>,
    forces: [Vector3<f64>; NUM_CONTACT_SUB_POINTS],
    projected_point_positions: [Vector3<f64>; NUM_CONTACT_SUB_POINTS],
    projected_normal: Vector3<f64>
}
impl ContactVariables {
    pub fn new() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: Vector3::zeros(),
            forces: [Vector3::zeros(); NUM_CONTACT_SUB_POINTS],
            projected_point_positions: [Vector3::zeros(); NUM_CONTACT_SUB_POINTS],
            projected_normal: Vector3::z()
        }
    }
    /// Reads pose and forces from a contact's slices of a trajectory row.
    pub fn new_from_rows(position_row: &[f64], force_row: &[f64]) -> Self {
        assert_eq!(position_row.len(), NUM_CONTACT_POSITION_ELEMENTS);
        assert_eq!(force_row.len(), NUM_CONTACT_FORCE_ELEMENTS);
        let mut out_self = Self::new();
        out_self.position = NalgebraConversions::slice_to_vector3(position_row, 0);
        out_self.orientation = NalgebraConversions::slice_to_vector3(position_row, 3);
        for i in 0..NUM_CONTACT_SUB_POINTS {
            out_self.forces[i] = NalgebraConversions::slice_to_vector3(force_row, 3 * i);
        }
        out_self
    }
    pub fn write_position_row(&self, position_row: &mut [f64]) {
        assert_eq!(position_row.len(), NUM_CONTACT_POSITION_ELEMENTS);
        for i in 0..3 {
            position_row[i] = self.position[i];
            position_row[3 + i] = self.orientation[i];
        }
    }
    pub fn write_force_row(&self, force_row: &mut [f64]) {
        assert_eq!(force_row.len(), NUM_CONTACT_FORCE_ELEMENTS);
        for (s, force) in self.forces.iter().enumerate() {
            for i in 0..3 { force_row[3 * s + i] = force[i]; }
        }
    }
    pub fn position(&self) -> &Vector3<f64> {
        &self.position
    }
    /// Exponential map.
    pub fn orientation(&self) -> &Vector3<f64> {
        &self.orientation
    }
    pub fn set_pose(&mut self, position: Vector3<f64>, orientation: Vector3<f64>) {
        self.position = position;
        self.orientation = orientation;
    }
    pub fn force(&self, sub_point: usize) -> &Vector3<f64> {
        &self.forces[sub_point]
    }
    pub fn forces(&self) -> &[Vector3<f64>; NUM_CONTACT_SUB_POINTS] {
        &self.forces
    }
    pub fn set_force(&mut self, sub_point: usize, force: Vector3<f64>) {
        self.forces[sub_point] = force;
    }
    pub fn zero_forces(&mut self) {
        self.forces = [Vector3::zeros(); NUM_CONTACT_SUB_POINTS];
    }
    pub fn projected_point_position(&self, sub_point: usize) -> &Vector3<f64> {
        &self.projected_point_positions[sub_point]
    }
    pub fn set_projected_point_position(&mut self, sub_point: usize, position: Vector3<f64>) {
        self.projected_point_positions[sub_point] = position;
    }
    pub fn projected_normal(&self) -> &Vector3<f64> {
        &self.projected_normal
    }
    pub fn set_projected_normal(&mut self, normal: Vector3<f64>) {
        self.projected_normal = normal;
    }
    /// Sum of sub-point force magnitudes.
    pub fn activity(&self) -> f64 {
        self.forces.iter().map(|f| f.norm()).sum()
    }
    /// Mean of the projected sub-point positions.
    pub fn projected_center(&self) -> Vector3<f64> {
        let mut sum = Vector3::zeros();
        for p in &self.projected_point_positions { sum += p; }
        sum / NUM_CONTACT_SUB_POINTS as f64
    }
}
impl Default for ContactVariables {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_round_trip() {
        let position_row = [0.1, 0.2, 0.3, 0.0, 0.0, 0.5];
        let force_row: Vec<f64> = (0..NUM_CONTACT_FORCE_ELEMENTS).map(|i| i as f64).collect();
        let c = ContactVariables::new_from_rows(&position_row, &force_row);
        assert_eq!(c.force(1), &Vector3::new(3.0, 4.0, 5.0));

        let mut p_out = [0.0; NUM_CONTACT_POSITION_ELEMENTS];
        let mut f_out = vec![0.0; NUM_CONTACT_FORCE_ELEMENTS];
        c.write_position_row(&mut p_out);
        c.write_force_row(&mut f_out);
        assert_eq!(p_out, position_row);
        assert_eq!(f_out, force_row);
    }
}
