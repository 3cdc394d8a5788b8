use serde::{Serialize, Deserialize};
use strum_macros::{EnumIter, EnumCount as EnumCountMacro};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter, EnumCountMacro)]
pub enum ComponentType {
    Position,
    Velocity,
    Acceleration
}
impl ComponentType {
    pub fn index(&self) -> usize {
        return match self {
            ComponentType::Position => { 0 }
            ComponentType::Velocity => { 1 }
            ComponentType::Acceleration => { 2 }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter, EnumCountMacro)]
pub enum SubComponentType {
    Joint,
    ContactPosition,
    ContactForce
}
impl SubComponentType {
    pub fn index(&self) -> usize {
        return match self {
            SubComponentType::Joint => { 0 }
            SubComponentType::ContactPosition => { 1 }
            SubComponentType::ContactForce => { 2 }
        }
    }
    pub fn is_contact(&self) -> bool {
        *self != SubComponentType::Joint
    }
}

/// Location of exactly one scalar in the full trajectory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrajectoryPointIndex {
    pub point: usize,
    pub component: ComponentType,
    pub sub_component: SubComponentType,
    pub element: usize
}
impl TrajectoryPointIndex {
    pub fn new(point: usize, component: ComponentType, sub_component: SubComponentType, element: usize) -> Self {
        Self { point, component, sub_component, element }
    }
}
