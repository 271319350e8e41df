pub mod interpolation;
pub mod trace;
