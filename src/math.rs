//! Dense `f32` vector helpers and running statistics.

pub mod mean;
pub mod vector;
