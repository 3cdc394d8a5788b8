pub mod evaluation_manager;
pub mod kinematics_dynamics_propagator;
pub mod parallel_evaluation;
pub mod reference_evaluation;
