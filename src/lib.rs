//! Trajectory evaluation for contact-invariant motion optimization.
//!
//! A trajectory of joint and contact variables is propagated through a rigid-body dynamics model,
//! scored by a set of weighted cost functions, and differentiated one parameter at a time by
//! central finite differences that only re-evaluate the points a parameter actually affects.

pub mod contact_modules;
pub mod cost_modules;
pub mod evaluation_modules;
pub mod robot_modules;
pub mod trajectory_modules;
pub mod utils;
