pub mod exponential_map;
pub mod interpolation;
pub mod spatial;
