use std::path::Path;

use crate::shared::engine_error::EngineError;
use crate::shared::face_detection::FaceDetection;

/// Domain interface for the external perception model.
///
/// Turns one image into its face detections; zero faces is a normal
/// result. Implementations may be stateful (e.g., a lazily loaded
/// model session), hence `&mut self`. The engine never manages the
/// model's lifecycle.
pub trait FaceAnalyzer: Send {
    fn analyze(&mut self, image: &Path) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>>;
}

/// Runs `analyzer` on `image`, folding adapter errors into [`EngineError`].
pub fn analyze_image(
    analyzer: &mut dyn FaceAnalyzer,
    image: &Path,
) -> Result<Vec<FaceDetection>, EngineError> {
    analyzer
        .analyze(image)
        .map_err(|e| EngineError::Perception(format!("{}: {e}", image.display())))
}
