use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::perception::domain::face_analyzer::FaceAnalyzer;
use crate::shared::face_detection::FaceDetection;

/// Replays pre-computed detections by image path.
///
/// Used when perception already ran elsewhere (or in an earlier pass) so
/// the same faces feed verification, attendance and clustering without
/// invoking the model again. Unknown paths yield zero faces.
pub struct CachedFaceAnalyzer {
    cache: Arc<HashMap<PathBuf, Vec<FaceDetection>>>,
}

impl CachedFaceAnalyzer {
    pub fn new(cache: Arc<HashMap<PathBuf, Vec<FaceDetection>>>) -> Self {
        Self { cache }
    }
}

impl FaceAnalyzer for CachedFaceAnalyzer {
    fn analyze(&mut self, image: &Path) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
        Ok(self.cache.get(image).cloned().unwrap_or_default())
    }
}
