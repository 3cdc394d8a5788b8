pub mod contact_variables;
pub mod full_trajectory;
pub mod parameter_trajectory;
pub mod trajectory_index;
