pub mod distance_matrix;
pub mod similarity;
