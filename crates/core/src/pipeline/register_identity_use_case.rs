use std::path::Path;
use std::sync::Arc;

use crate::identity::domain::registered_identity::RegisteredIdentity;
use crate::perception::domain::face_analyzer::{analyze_image, FaceAnalyzer};
use crate::pipeline::face_engine::FaceEngine;
use crate::shared::engine_error::EngineError;

/// Enrolls a person from a single-face enrollment image.
pub struct RegisterIdentityUseCase {
    analyzer: Box<dyn FaceAnalyzer>,
    engine: Arc<FaceEngine>,
}

impl RegisterIdentityUseCase {
    pub fn new(analyzer: Box<dyn FaceAnalyzer>, engine: Arc<FaceEngine>) -> Self {
        Self { analyzer, engine }
    }

    /// Returns once the identity is persisted.
    pub fn execute(&mut self, label: &str, image: &Path) -> Result<RegisteredIdentity, EngineError> {
        let detections = analyze_image(self.analyzer.as_mut(), image)?;
        self.engine.register(label, &detections)
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
    use crate::shared::face_detection::{BoundingBox, FaceDetection};

    struct FailingAnalyzer;

    impl FaceAnalyzer for FailingAnalyzer {
        fn analyze(
            &mut self,
            _image: &Path,
        ) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
            Err("model not loaded".into())
        }
    }

    fn face(x: i32) -> FaceDetection {
        FaceDetection::new(
            BoundingBox::new(x, 0, x + 10, 10).unwrap(),
            Embedding::new(vec![0.6, 0.8]).unwrap(),
            0.9,
        )
        .unwrap()
    }

    fn setup(
        images: Vec<(&str, Vec<FaceDetection>)>,
    ) -> (RegisterIdentityUseCase, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let store = Arc::new(IdentityStore::open(Box::new(repo.clone())));
        let engine = Arc::new(FaceEngine::new(&EngineConfig::default(), store).unwrap());
        let cache: HashMap<PathBuf, Vec<FaceDetection>> = images
            .into_iter()
            .map(|(p, d)| (PathBuf::from(p), d))
            .collect();
        let analyzer = Box::new(CachedFaceAnalyzer::new(Arc::new(cache)));
        (RegisterIdentityUseCase::new(analyzer, engine), repo)
    }

    #[test]
    fn test_registers_single_face() {
        let (mut use_case, repo) = setup(vec![("alice.jpg", vec![face(0)])]);

        let identity = use_case.execute("alice", Path::new("alice.jpg")).unwrap();

        assert_eq!(identity.label(), "alice");
        assert_eq!(repo.contents().len(), 1);
    }

    #[test]
    fn test_rejects_image_without_face() {
        let (mut use_case, repo) = setup(vec![]);
        let err = use_case.execute("bob", Path::new("empty.jpg")).unwrap_err();
        assert!(matches!(err, EngineError::NoFaceDetected));
        assert!(repo.contents().is_empty());
    }

    #[test]
    fn test_rejects_group_photo() {
        let (mut use_case, _repo) = setup(vec![("group.jpg", vec![face(0), face(20), face(40)])]);
        let err = use_case.execute("bob", Path::new("group.jpg")).unwrap_err();
        assert!(matches!(err, EngineError::AmbiguousEnrollment { faces: 3 }));
    }

    #[test]
    fn test_perception_failure_names_image() {
        let store = Arc::new(IdentityStore::open(Box::new(InMemoryRepository::new())));
        let engine = Arc::new(FaceEngine::new(&EngineConfig::default(), store).unwrap());
        let mut use_case = RegisterIdentityUseCase::new(Box::new(FailingAnalyzer), engine);

        let err = use_case.execute("x", Path::new("x.jpg")).unwrap_err();

        assert_eq!(err.to_string(), "perception failed: x.jpg: model not loaded");
    }
}
