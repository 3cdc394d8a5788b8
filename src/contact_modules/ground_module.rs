use std::fmt;
use std::fmt::Debug;
use nalgebra::{Isometry3, Point3, Rotation3, Vector3};
use parry3d_f64::query::{Ray, RayCast};
use parry3d_f64::shape::TriMesh;
use crate::utils::utils_errors::CioError;
use crate::utils::utils_math::exponential_map::ExponentialMapUtils;
use crate::utils::utils_nalgebra::conversions::NalgebraConversions;

/// Supporting surface found under a contact pose.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundSupport {
    pub position: Vector3<f64>,
    pub orientation: Rotation3<f64>,
    pub normal: Vector3<f64>
}

/// Terrain the contacts are projected onto.
pub trait GroundModel: Send + Sync + Debug {
    fn nearest_support(&self, position: &Vector3<f64>, orientation: &Rotation3<f64>) -> GroundSupport;
}

/// Horizontal plane `z = height`.
#[derive(Clone, Debug)]
pub struct FlatGround {
    height: f64
}
impl FlatGround {
    pub fn new(height: f64) -> Self {
        Self { height }
    }
    pub fn height(&self) -> f64 {
        self.height
    }
}
impl GroundModel for FlatGround {
    fn nearest_support(&self, position: &Vector3<f64>, orientation: &Rotation3<f64>) -> GroundSupport {
        let normal = Vector3::z();
        GroundSupport {
            position: Vector3::new(position[0], position[1], self.height),
            orientation: ExponentialMapUtils::rotation_aligned_with_normal(&normal, orientation),
            normal
        }
    }
}

/// Terrain mesh queried by casting a vertical ray from above the mesh.  A miss (the contact is
/// outside the mesh footprint) falls back to the horizontal plane through the lowest vertex.
pub struct TriMeshGround {
    mesh: TriMesh,
    min_height: f64,
    max_height: f64
}
impl TriMeshGround {
    pub fn new(vertices: Vec<Vector3<f64>>, indices: Vec<[usize; 3]>) -> Result<Self, CioError> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(CioError::new_generic_error_str("a ground mesh needs at least one triangle", file!(), line!()));
        }
        for tri in &indices {
            for i in tri {
                CioError::new_check_for_idx_out_of_bound_error(*i, vertices.len(), file!(), line!())?;
            }
        }
        let min_height = vertices.iter().map(|v| v[2]).fold(f64::INFINITY, f64::min);
        let max_height = vertices.iter().map(|v| v[2]).fold(f64::NEG_INFINITY, f64::max);

        let points: Vec<Point3<f64>> = vertices.iter().map(|v| NalgebraConversions::vector3_to_point3(v)).collect();
        let indices: Vec<[u32; 3]> = indices.iter().map(|i| [i[0] as u32, i[1] as u32, i[2] as u32]).collect();

        Ok(Self {
            mesh: TriMesh::new(points, indices),
            min_height,
            max_height
        })
    }
    /// Two triangles spanning `[-half_extent, half_extent]^2` with the given corner heights
    /// (ordered `(-,-), (+,-), (+,+), (-,+)`).
    pub fn new_quad(half_extent: f64, corner_heights: [f64; 4]) -> Result<Self, CioError> {
        let h = half_extent;
        let vertices = vec![
            Vector3::new(-h, -h, corner_heights[0]),
            Vector3::new(h, -h, corner_heights[1]),
            Vector3::new(h, h, corner_heights[2]),
            Vector3::new(-h, h, corner_heights[3])
        ];
        Self::new(vertices, vec![[0, 1, 2], [0, 2, 3]])
    }
    fn fallback_support(&self, position: &Vector3<f64>, orientation: &Rotation3<f64>) -> GroundSupport {
        let normal = Vector3::z();
        GroundSupport {
            position: Vector3::new(position[0], position[1], self.min_height),
            orientation: ExponentialMapUtils::rotation_aligned_with_normal(&normal, orientation),
            normal
        }
    }
}
impl GroundModel for TriMeshGround {
    fn nearest_support(&self, position: &Vector3<f64>, orientation: &Rotation3<f64>) -> GroundSupport {
        let start_height = self.max_height + 1.0;
        let origin = Point3::new(position[0], position[1], start_height);
        let ray = Ray::new(origin, -Vector3::z());
        let max_toi = start_height - self.min_height + 1.0;

        let hit = self.mesh.cast_ray_and_get_normal(&Isometry3::identity(), &ray, max_toi, false);
        return match hit {
            None => { self.fallback_support(position, orientation) }
            Some(intersection) => {
                let mut normal = intersection.normal;
                if normal.norm() < 1e-12 { return self.fallback_support(position, orientation); }
                normal = normal.normalize();
                if normal[2] < 0.0 { normal = -normal; }
                let point = ray.point_at(intersection.toi);
                GroundSupport {
                    position: NalgebraConversions::point3_to_vector3(&point),
                    orientation: ExponentialMapUtils::rotation_aligned_with_normal(&normal, orientation),
                    normal
                }
            }
        }
    }
}
impl Debug for TriMeshGround {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriMeshGround")
            .field("num_vertices", &self.mesh.vertices().len())
            .field("num_triangles", &self.mesh.indices().len())
            .field("min_height", &self.min_height)
            .field("max_height", &self.max_height)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn flat_ground_projects_straight_down() {
        let ground = FlatGround::new(0.1);
        let s = ground.nearest_support(&Vector3::new(1.0, 2.0, 0.7), &Rotation3::identity());
        assert_eq!(s.position, Vector3::new(1.0, 2.0, 0.1));
        assert_eq!(s.normal, Vector3::z());
    }

    #[test]
    fn level_mesh_matches_flat_ground() {
        let ground = TriMeshGround::new_quad(5.0, [0.2; 4]).expect("valid mesh");
        let s = ground.nearest_support(&Vector3::new(0.3, -1.0, 1.0), &Rotation3::identity());
        assert_relative_eq!(s.position, Vector3::new(0.3, -1.0, 0.2), epsilon = 1e-9);
        assert_relative_eq!(s.normal, Vector3::z(), epsilon = 1e-9);
    }

    #[test]
    fn miss_falls_back_to_lowest_plane() {
        let ground = TriMeshGround::new_quad(1.0, [0.0, 0.5, 0.5, 0.0]).expect("valid mesh");
        let s = ground.nearest_support(&Vector3::new(10.0, 0.0, 1.0), &Rotation3::identity());
        assert_relative_eq!(s.position, Vector3::new(10.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn bad_indices_are_rejected() {
        let r = TriMeshGround::new(vec![Vector3::zeros(); 3], vec![[0, 1, 3]]);
        assert!(matches!(r, Err(CioError::IdxOutOfBoundError(_))));
    }
}
