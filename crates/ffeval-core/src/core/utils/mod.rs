pub mod geometry;
pub mod pairs;
