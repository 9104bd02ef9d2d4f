pub mod face_clusterer;
