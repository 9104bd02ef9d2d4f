use std::path::Path;
use std::sync::Arc;

use crate::matching::domain::verifier::FaceVerification;
use crate::perception::domain::face_analyzer::{analyze_image, FaceAnalyzer};
use crate::pipeline::face_engine::FaceEngine;
use crate::shared::engine_error::EngineError;

/// Decides whether two images show the same person.
pub struct VerifyFacesUseCase {
    analyzer: Box<dyn FaceAnalyzer>,
    engine: Arc<FaceEngine>,
}

impl VerifyFacesUseCase {
    pub fn new(analyzer: Box<dyn FaceAnalyzer>, engine: Arc<FaceEngine>) -> Self {
        Self { analyzer, engine }
    }

    pub fn execute(&mut self, first: &Path, second: &Path) -> Result<FaceVerification, EngineError> {
        let first_faces = analyze_image(self.analyzer.as_mut(), first)?;
        let second_faces = analyze_image(self.analyzer.as_mut(), second)?;
        self.engine.verify_faces(&first_faces, &second_faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    use crate::identity::domain::identity_store::IdentityStore;
    use crate::identity::infrastructure::in_memory_repository::InMemoryRepository;
    use crate::perception::infrastructure::cached_face_analyzer::CachedFaceAnalyzer;
    use crate::shared::embedding::Embedding;
    use crate::shared::engine_config::EngineConfig;
    use crate::shared::engine_error::ImageSide;
    use crate::shared::face_detection::{BoundingBox, FaceDetection};

    fn face(values: &[f32]) -> FaceDetection {
        FaceDetection::new(
            BoundingBox::new(0, 0, 10, 10).unwrap(),
            Embedding::new(values.to_vec()).unwrap(),
            0.9,
        )
        .unwrap()
    }

    fn use_case(images: Vec<(&str, Vec<FaceDetection>)>) -> VerifyFacesUseCase {
        let store = Arc::new(IdentityStore::open(Box::new(InMemoryRepository::new())));
        let engine = Arc::new(FaceEngine::new(&EngineConfig::default(), store).unwrap());
        let cache: HashMap<PathBuf, Vec<FaceDetection>> = images
            .into_iter()
            .map(|(p, d)| (PathBuf::from(p), d))
            .collect();
        VerifyFacesUseCase::new(Box::new(CachedFaceAnalyzer::new(Arc::new(cache))), engine)
    }

    #[test]
    fn test_same_person() {
        let mut uc = use_case(vec![
            ("a.jpg", vec![face(&[0.9, 0.1])]),
            ("b.jpg", vec![face(&[0.85, 0.15])]),
        ]);
        let result = uc.execute(Path::new("a.jpg"), Path::new("b.jpg")).unwrap();
        assert!(result.verification.is_same);
    }

    #[test]
    fn test_different_people() {
        // cosine similarity 0.2
        let mut uc = use_case(vec![
            ("a.jpg", vec![face(&[1.0, 0.0])]),
            ("b.jpg", vec![face(&[0.2, 0.979_795_9])]),
        ]);
        let result = uc.execute(Path::new("a.jpg"), Path::new("b.jpg")).unwrap();
        assert!(!result.verification.is_same);
        assert!((result.verification.similarity - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_reports_second_image_empty() {
        let mut uc = use_case(vec![("a.jpg", vec![face(&[1.0])])]);
        let err = uc.execute(Path::new("a.jpg"), Path::new("none.jpg")).unwrap_err();
        assert!(matches!(
            err,
            EngineError::NoFaceInImage {
                side: ImageSide::Second
            }
        ));
    }
}
