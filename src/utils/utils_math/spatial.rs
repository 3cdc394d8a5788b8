use nalgebra::{Matrix3, Matrix6, Rotation3, Unit, Vector3, Vector6};
use serde::{Serialize, Deserialize};

/// Spatial vectors are stored as `[angular; linear]`.  For a spatial force this is
/// `[torque; force]`.
pub type SpatialVector = Vector6<f64>;

pub fn spatial_angular(v: &SpatialVector) -> Vector3<f64> {
    Vector3::new(v[0], v[1], v[2])
}

pub fn spatial_linear(v: &SpatialVector) -> Vector3<f64> {
    Vector3::new(v[3], v[4], v[5])
}

pub fn spatial_from_parts(angular: &Vector3<f64>, linear: &Vector3<f64>) -> SpatialVector {
    SpatialVector::new(angular[0], angular[1], angular[2], linear[0], linear[1], linear[2])
}

/// Spatial cross product for motion vectors (`v ×`).
pub fn cross_motion(v: &SpatialVector, m: &SpatialVector) -> SpatialVector {
    let w = spatial_angular(v);
    let vl = spatial_linear(v);
    let mw = spatial_angular(m);
    let ml = spatial_linear(m);
    spatial_from_parts(&w.cross(&mw), &(w.cross(&ml) + vl.cross(&mw)))
}

/// Spatial cross product for force vectors (`v ×*`).
pub fn cross_force(v: &SpatialVector, f: &SpatialVector) -> SpatialVector {
    let w = spatial_angular(v);
    let vl = spatial_linear(v);
    let fn_ = spatial_angular(f);
    let ff = spatial_linear(f);
    spatial_from_parts(&(w.cross(&fn_) + vl.cross(&ff)), &w.cross(&ff))
}

fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v[2], v[1],
                 v[2], 0.0, -v[0],
                 -v[1], v[0], 0.0)
}

/// Plücker coordinate transform from frame A to frame B.  `e` rotates A coordinates into B
/// coordinates and `r` is the origin of B expressed in A.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpatialTransform {
    e: Matrix3<f64>,
    r: Vector3<f64>
}
impl SpatialTransform {
    pub fn new(e: Matrix3<f64>, r: Vector3<f64>) -> Self {
        Self { e, r }
    }
    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros())
    }
    /// Frame B rotated by `angle` about `axis` relative to frame A.
    pub fn rotation(axis: &Unit<Vector3<f64>>, angle: f64) -> Self {
        let rot = Rotation3::from_axis_angle(axis, angle);
        Self::new(rot.matrix().transpose(), Vector3::zeros())
    }
    /// Frame B translated by `r` relative to frame A.
    pub fn translation(r: &Vector3<f64>) -> Self {
        Self::new(Matrix3::identity(), r.clone())
    }
    /// Frame B placed at `r` with orientation `rotation` relative to frame A.
    pub fn from_rotation_and_translation(rotation: &Rotation3<f64>, r: &Vector3<f64>) -> Self {
        Self::new(rotation.matrix().transpose(), r.clone())
    }
    pub fn e(&self) -> &Matrix3<f64> {
        &self.e
    }
    pub fn r(&self) -> &Vector3<f64> {
        &self.r
    }
    /// Orientation of frame B expressed in frame A.
    pub fn world_rotation(&self) -> Rotation3<f64> {
        Rotation3::from_matrix_unchecked(self.e.transpose())
    }
    /// `self * other` applies `other` first, then `self`.
    pub fn compose(&self, other: &SpatialTransform) -> SpatialTransform {
        SpatialTransform::new(self.e * other.e, other.r + other.e.transpose() * self.r)
    }
    /// Transforms a motion vector from A coordinates into B coordinates.
    pub fn apply_motion(&self, v: &SpatialVector) -> SpatialVector {
        let w = spatial_angular(v);
        let vl = spatial_linear(v);
        let v_rxw = vl - self.r.cross(&w);
        spatial_from_parts(&(self.e * w), &(self.e * v_rxw))
    }
    /// Transforms a force vector from B coordinates back into A coordinates.
    pub fn apply_transpose_force(&self, f: &SpatialVector) -> SpatialVector {
        let e_t_n = self.e.transpose() * spatial_angular(f);
        let e_t_f = self.e.transpose() * spatial_linear(f);
        spatial_from_parts(&(e_t_n + self.r.cross(&e_t_f)), &e_t_f)
    }
    /// Transforms a force vector from A coordinates into B coordinates.
    pub fn apply_adjoint_force(&self, f: &SpatialVector) -> SpatialVector {
        let n = spatial_angular(f);
        let ff = spatial_linear(f);
        spatial_from_parts(&(self.e * (n - self.r.cross(&ff))), &(self.e * ff))
    }
}

/// 6x6 spatial inertia of a rigid body about its frame origin.
pub fn rigid_body_inertia_matrix(mass: f64, com: &Vector3<f64>, inertia_at_com: &Matrix3<f64>) -> Matrix6<f64> {
    let c = skew(com);
    let top_left = inertia_at_com + mass * c * c.transpose();
    let top_right = mass * c;
    let bottom_left = mass * c.transpose();
    let bottom_right = Matrix3::identity() * mass;

    let mut out = Matrix6::zeros();
    out.fixed_slice_mut::<3, 3>(0, 0).copy_from(&top_left);
    out.fixed_slice_mut::<3, 3>(0, 3).copy_from(&top_right);
    out.fixed_slice_mut::<3, 3>(3, 0).copy_from(&bottom_left);
    out.fixed_slice_mut::<3, 3>(3, 3).copy_from(&bottom_right);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn compose_with_identity_is_noop() {
        let axis = Vector3::z_axis();
        let x = SpatialTransform::rotation(&axis, 0.3).compose(&SpatialTransform::translation(&Vector3::new(0.1, 0.2, 0.3)));
        let composed = x.compose(&SpatialTransform::identity());
        assert_relative_eq!(composed.e(), x.e(), epsilon = 1e-14);
        assert_relative_eq!(composed.r(), x.r(), epsilon = 1e-14);
    }

    #[test]
    fn adjoint_and_transpose_are_inverse_for_forces() {
        let axis = Unit::new_normalize(Vector3::new(1.0, 1.0, 0.0));
        let x = SpatialTransform::rotation(&axis, 0.7).compose(&SpatialTransform::translation(&Vector3::new(0.4, -0.1, 0.9)));
        let f = SpatialVector::new(0.1, 0.2, 0.3, 1.0, -2.0, 0.5);
        let round_trip = x.apply_transpose_force(&x.apply_adjoint_force(&f));
        assert_relative_eq!(round_trip, f, epsilon = 1e-12);
    }

    #[test]
    fn force_at_origin_moves_with_point() {
        // pure force applied at world point p produces torque p x f about the origin.
        let p = Vector3::new(0.0, 1.0, 0.0);
        let x = SpatialTransform::translation(&p);
        let f_local = spatial_from_parts(&Vector3::zeros(), &Vector3::new(0.0, 0.0, 2.0));
        let f_world = x.apply_transpose_force(&f_local);
        assert_relative_eq!(spatial_angular(&f_world), p.cross(&Vector3::new(0.0, 0.0, 2.0)), epsilon = 1e-14);
    }

    #[test]
    fn inertia_of_point_mass_at_origin_is_diagonal() {
        let i = rigid_body_inertia_matrix(2.0, &Vector3::zeros(), &Matrix3::identity());
        assert_relative_eq!(i, Matrix6::from_diagonal(&Vector6::new(1.0, 1.0, 1.0, 2.0, 2.0, 2.0)), epsilon = 1e-14);
    }
}
