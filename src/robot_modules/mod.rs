pub mod robot_dynamics_module;
pub mod robot_planning_group_module;
