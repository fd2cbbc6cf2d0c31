pub mod dataset;
pub mod matrix;
pub mod universe;
