pub mod geometry;
pub mod ratio;
