use nalgebra::{Rotation3, Vector3};

/// Conversions between the minimal exponential-map orientation used by contact variables and
/// nalgebra's rotation types.
pub struct ExponentialMapUtils;
impl ExponentialMapUtils {
    pub fn exp_map_to_rotation(exp_map: &Vector3<f64>) -> Rotation3<f64> {
        return Rotation3::new(exp_map.clone());
    }
    pub fn rotation_to_exp_map(rotation: &Rotation3<f64>) -> Vector3<f64> {
        return rotation.scaled_axis();
    }
    /// Rotation whose local z axis is `normal`, keeping the heading of `reference` as far as
    /// possible.  Falls back to the identity frame when `normal` is degenerate.
    pub fn rotation_aligned_with_normal(normal: &Vector3<f64>, reference: &Rotation3<f64>) -> Rotation3<f64> {
        let n_norm = normal.norm();
        if n_norm < 1e-12 { return Rotation3::identity(); }
        let z = normal / n_norm;

        let reference_x = reference * Vector3::x();
        let mut x = reference_x - z * z.dot(&reference_x);
        if x.norm() < 1e-9 {
            let reference_y = reference * Vector3::y();
            x = reference_y - z * z.dot(&reference_y);
            if x.norm() < 1e-9 { return Rotation3::identity(); }
        }
        let x = x.normalize();
        let y = z.cross(&x);

        return Rotation3::from_basis_unchecked(&[x, y, z]);
    }
}
