use nalgebra::Vector3;
use serde::{Serialize, Deserialize};
use crate::robot_modules::robot_dynamics_module::DynamicsModel;
use crate::trajectory_modules::contact_variables::NUM_CONTACT_SUB_POINTS;
use crate::utils::utils_errors::CioError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupJointSpec {
    pub joint_name: String,
    pub lower_limit: f64,
    pub upper_limit: f64
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactPointSpec {
    pub name: String,
    pub body_name: String,
    /// One offset per sub-point, in the contact frame.
    pub sub_point_offsets: Vec<Vector3<f64>>,
    /// Bodies the sub-point forces are applied to.  Empty means every sub-point is attached to
    /// `body_name`.
    #[serde(default)]
    pub sub_point_body_names: Vec<String>
}
impl ContactPointSpec {
    /// Four sub-points at the corners of a `2 half_x` by `2 half_y` sole.
    pub fn new_rectangular(name: &str, body_name: &str, half_x: f64, half_y: f64) -> Self {
        Self {
            name: name.to_string(),
            body_name: body_name.to_string(),
            sub_point_offsets: vec![
                Vector3::new(half_x, half_y, 0.0),
                Vector3::new(-half_x, half_y, 0.0),
                Vector3::new(-half_x, -half_y, 0.0),
                Vector3::new(half_x, -half_y, 0.0)
            ],
            sub_point_body_names: vec![]
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanningGroupSpec {
    pub name: String,
    pub joints: Vec<GroupJointSpec>,
    #[serde(default)]
    pub contact_points: Vec<ContactPointSpec>
}

#[derive(Clone, Debug)]
pub struct GroupJoint {
    name: String,
    joint_index: usize,
    lower_limit: f64,
    upper_limit: f64,
    affected_body_ids: Vec<usize>
}
impl GroupJoint {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn joint_index(&self) -> usize {
        self.joint_index
    }
    pub fn lower_limit(&self) -> f64 {
        self.lower_limit
    }
    pub fn upper_limit(&self) -> f64 {
        self.upper_limit
    }
    /// Bodies whose kinematics change when this joint moves, ascending.
    pub fn affected_body_ids(&self) -> &Vec<usize> {
        &self.affected_body_ids
    }
}

#[derive(Clone, Debug)]
pub struct ContactPoint {
    name: String,
    body_id: usize,
    sub_point_body_ids: Vec<usize>,
    sub_point_offsets: Vec<Vector3<f64>>
}
impl ContactPoint {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn body_id(&self) -> usize {
        self.body_id
    }
    pub fn sub_point_body_ids(&self) -> &Vec<usize> {
        &self.sub_point_body_ids
    }
    pub fn sub_point_offsets(&self) -> &Vec<Vector3<f64>> {
        &self.sub_point_offsets
    }
}

/// Read-only description of what is optimized: which joints, and which contacts.
#[derive(Clone, Debug)]
pub struct PlanningGroup {
    name: String,
    group_joints: Vec<GroupJoint>,
    contact_points: Vec<ContactPoint>
}
impl PlanningGroup {
    pub fn new(spec: &PlanningGroupSpec, model: &dyn DynamicsModel) -> Result<Self, CioError> {
        let mut group_joints = vec![];
        for joint_spec in &spec.joints {
            let joint_index = match model.joint_index_from_name(&joint_spec.joint_name) {
                Some(j) => { j }
                None => { return Err(CioError::new_generic_error_str(&format!("joint {} is not in the dynamics model", joint_spec.joint_name), file!(), line!())); }
            };
            if group_joints.iter().any(|g: &GroupJoint| g.joint_index == joint_index) {
                return Err(CioError::new_generic_error_str(&format!("joint {} appears twice in planning group {}", joint_spec.joint_name, spec.name), file!(), line!()));
            }
            if joint_spec.lower_limit > joint_spec.upper_limit {
                return Err(CioError::new_generic_error_str(&format!("joint {} has lower limit above upper limit", joint_spec.joint_name), file!(), line!()));
            }
            let affected_body_ids = model.descendant_body_ids(model.joint_body_id(joint_index));
            group_joints.push(GroupJoint {
                name: joint_spec.joint_name.clone(),
                joint_index,
                lower_limit: joint_spec.lower_limit,
                upper_limit: joint_spec.upper_limit,
                affected_body_ids
            });
        }

        let mut contact_points = vec![];
        for contact_spec in &spec.contact_points {
            if contact_spec.sub_point_offsets.len() != NUM_CONTACT_SUB_POINTS {
                return Err(CioError::new_generic_error_str(&format!("contact {} needs {} sub-point offsets, got {}", contact_spec.name, NUM_CONTACT_SUB_POINTS, contact_spec.sub_point_offsets.len()), file!(), line!()));
            }
            let body_id = Self::lookup_body(model, &contact_spec.body_name)?;
            let sub_point_body_ids = if contact_spec.sub_point_body_names.is_empty() {
                vec![body_id; NUM_CONTACT_SUB_POINTS]
            } else {
                if contact_spec.sub_point_body_names.len() != NUM_CONTACT_SUB_POINTS {
                    return Err(CioError::new_generic_error_str(&format!("contact {} needs {} sub-point bodies, got {}", contact_spec.name, NUM_CONTACT_SUB_POINTS, contact_spec.sub_point_body_names.len()), file!(), line!()));
                }
                let mut ids = vec![];
                for n in &contact_spec.sub_point_body_names { ids.push(Self::lookup_body(model, n)?); }
                ids
            };
            contact_points.push(ContactPoint {
                name: contact_spec.name.clone(),
                body_id,
                sub_point_body_ids,
                sub_point_offsets: contact_spec.sub_point_offsets.clone()
            });
        }

        Ok(Self {
            name: spec.name.clone(),
            group_joints,
            contact_points
        })
    }
    fn lookup_body(model: &dyn DynamicsModel, name: &str) -> Result<usize, CioError> {
        return match model.body_id_from_name(name) {
            Some(b) => { Ok(b) }
            None => { Err(CioError::new_generic_error_str(&format!("body {} is not in the dynamics model", name), file!(), line!())) }
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn group_joints(&self) -> &Vec<GroupJoint> {
        &self.group_joints
    }
    pub fn num_joints(&self) -> usize {
        self.group_joints.len()
    }
    pub fn contact_points(&self) -> &Vec<ContactPoint> {
        &self.contact_points
    }
    pub fn num_contacts(&self) -> usize {
        self.contact_points.len()
    }
    /// The group joint driving full-trajectory joint element `joint_index`, if any.
    pub fn group_joint_for_joint_index(&self, joint_index: usize) -> Option<&GroupJoint> {
        self.group_joints.iter().find(|g| g.joint_index == joint_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;
    use crate::robot_modules::robot_dynamics_module::{RigidBody, TreeDynamicsModel};
    use crate::utils::utils_traits::ToAndFromRonString;

    fn two_link_model() -> TreeDynamicsModel {
        let bodies = vec![
            RigidBody::new_revolute("hip", None, Vector3::y(), Vector3::zeros(), 1.0, Vector3::zeros(), Matrix3::identity()),
            RigidBody::new_revolute("knee", Some(0), Vector3::y(), Vector3::new(0.0, 0.0, -0.5), 1.0, Vector3::zeros(), Matrix3::identity()),
        ];
        TreeDynamicsModel::new(bodies, 9.81).expect("valid model")
    }

    #[test]
    fn builds_affected_bodies_and_contacts() {
        let model = two_link_model();
        let spec = PlanningGroupSpec {
            name: "leg".to_string(),
            joints: vec![
                GroupJointSpec { joint_name: "hip".to_string(), lower_limit: -1.0, upper_limit: 1.0 },
                GroupJointSpec { joint_name: "knee".to_string(), lower_limit: 0.0, upper_limit: 2.0 },
            ],
            contact_points: vec![ContactPointSpec::new_rectangular("foot", "knee", 0.1, 0.05)]
        };
        let group = PlanningGroup::new(&spec, &model).expect("valid group");
        assert_eq!(group.group_joints()[0].affected_body_ids(), &vec![0, 1]);
        assert_eq!(group.group_joints()[1].affected_body_ids(), &vec![1]);
        assert_eq!(group.contact_points()[0].sub_point_body_ids(), &vec![1; NUM_CONTACT_SUB_POINTS]);
    }

    #[test]
    fn unknown_joint_is_an_error() {
        let model = two_link_model();
        let spec = PlanningGroupSpec::load_from_ron_string(r#"(name: "leg", joints: [(joint_name: "ankle", lower_limit: -1.0, upper_limit: 1.0)])"#).expect("parsable");
        assert!(PlanningGroup::new(&spec, &model).is_err());
    }
}
