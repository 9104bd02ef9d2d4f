pub mod cached_face_analyzer;
pub mod sidecar_face_analyzer;
