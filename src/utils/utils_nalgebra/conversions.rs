use std::fmt::Debug;
use nalgebra::{DMatrix, DVector, Point3, Scalar, Vector3};

pub struct NalgebraConversions;
impl NalgebraConversions {
    pub fn vector3_to_point3<T>(v: &Vector3<T>) -> Point3<T> where T: Copy + Clone + PartialEq + Scalar + Debug {
        return Point3::new(v[0], v[1], v[2]);
    }

    pub fn point3_to_vector3<T>(p: &Point3<T>) -> Vector3<T> where T: Copy + Clone + PartialEq + Scalar + Debug {
        return Vector3::new(p[0], p[1], p[2]);
    }

    /// Reads three consecutive elements of a row-major slice as a `Vector3`.
    pub fn slice_to_vector3(s: &[f64], start: usize) -> Vector3<f64> {
        return Vector3::new(s[start], s[start + 1], s[start + 2]);
    }

    pub fn dvector_to_vec<T>(d: &DVector<T>) -> Vec<T> where T: Copy + Clone + PartialEq + Scalar + Debug + num_traits::identities::Zero {
        return d.iter().map(|x| *x).collect();
    }

    pub fn vec_to_dvector<T>(v: &Vec<T>) -> DVector<T> where T: Copy + Clone + PartialEq + Scalar + Debug + num_traits::identities::Zero {
        let mut d = DVector::zeros(v.len());
        for (i, vv) in v.iter().enumerate() {
            d[i] = *vv;
        }
        return d;
    }

    /// Copies row `row` of a matrix into a `DVector`.
    pub fn dmatrix_row_to_dvector(m: &DMatrix<f64>, row: usize) -> DVector<f64> {
        return DVector::from_iterator(m.ncols(), m.row(row).iter().map(|x| *x));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_extraction_preserves_order() {
        let m = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let r = NalgebraConversions::dmatrix_row_to_dvector(&m, 1);
        assert_eq!(NalgebraConversions::dvector_to_vec(&r), vec![4.0, 5.0, 6.0]);
    }
}
