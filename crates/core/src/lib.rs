//! Identity matching and clustering over face embeddings.
//!
//! The perception model is an external collaborator behind
//! [`perception::domain::face_analyzer::FaceAnalyzer`]; this crate scores,
//! verifies, matches against a persisted registry, and clusters the
//! embeddings it produces.

pub mod clustering;
pub mod identity;
pub mod matching;
pub mod perception;
pub mod pipeline;
pub mod scoring;
pub mod shared;
