pub mod contact_projection_module;
pub mod ground_module;
