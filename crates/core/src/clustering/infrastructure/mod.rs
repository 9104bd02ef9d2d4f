pub mod dbscan_clusterer;
pub mod math;
