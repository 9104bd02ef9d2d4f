pub mod constants;
pub mod embedding;
pub mod engine_config;
pub mod engine_error;
pub mod face_detection;
