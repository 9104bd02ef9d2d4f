use std::sync::Arc;

use crate::clustering::domain::face_clusterer::{ClusterGroup, FaceClusterer, PooledFace};
use crate::clustering::infrastructure::dbscan_clusterer::DbscanClusterer;
use crate::identity::domain::identity_store::IdentityStore;
use crate::identity::domain::registered_identity::RegisteredIdentity;
use crate::matching::domain::attendance_matcher::{AttendanceMatcher, AttendanceReport, MatchResult};
use crate::matching::domain::verifier::{FaceVerification, Verification, Verifier};
use crate::scoring::domain::similarity::SimilarityScorer;
use crate::shared::embedding::Embedding;
use crate::shared::engine_config::EngineConfig;
use crate::shared::engine_error::EngineError;
use crate::shared::face_detection::FaceDetection;

/// The identity engine's operations, configured once from [`EngineConfig`].
///
/// Everything except the identity store is stateless; the store is shared
/// by `Arc` so several engines (or threads) can see one registry.
pub struct FaceEngine {
    scorer: SimilarityScorer,
    verifier: Verifier,
    matcher: AttendanceMatcher,
    clusterer: Arc<dyn FaceClusterer>,
    store: Arc<IdentityStore>,
}

impl FaceEngine {
    pub fn new(config: &EngineConfig, store: Arc<IdentityStore>) -> Result<Self, EngineError> {
        config.validate()?;
        let scorer = SimilarityScorer::new(config.zero_norm);
        Ok(Self {
            scorer,
            verifier: Verifier::new(config.verify_threshold)
                .with_scorer(scorer)
                .with_selection(config.face_selection),
            matcher: AttendanceMatcher::new(config.match_threshold, config.max_batch)
                .with_scorer(scorer),
            clusterer: Arc::new(
                DbscanClusterer::new(
                    config.cluster_eps,
                    config.cluster_min_samples,
                    config.max_batch,
                )
                .with_scorer(scorer),
            ),
            store,
        })
    }

    /// Replaces the clustering backend.
    pub fn with_clusterer(mut self, clusterer: Arc<dyn FaceClusterer>) -> Self {
        self.clusterer = clusterer;
        self
    }

    pub fn store(&self) -> &Arc<IdentityStore> {
        &self.store
    }

    pub fn clusterer(&self) -> Arc<dyn FaceClusterer> {
        Arc::clone(&self.clusterer)
    }

    pub fn similarity(&self, a: &Embedding, b: &Embedding) -> Result<f64, EngineError> {
        self.scorer.similarity(a, b)
    }

    pub fn verify(&self, a: &Embedding, b: &Embedding) -> Result<Verification, EngineError> {
        self.verifier.verify(a, b)
    }

    pub fn verify_faces(
        &self,
        first: &[FaceDetection],
        second: &[FaceDetection],
    ) -> Result<FaceVerification, EngineError> {
        self.verifier.verify_faces(first, second)
    }

    pub fn register(
        &self,
        label: &str,
        detections: &[FaceDetection],
    ) -> Result<RegisteredIdentity, EngineError> {
        self.store.register(label, detections)
    }

    /// Per-face matches against the current registry snapshot.
    pub fn match_faces(&self, detections: &[FaceDetection]) -> Result<Vec<MatchResult>, EngineError> {
        let registry = self.store.lookup_all();
        self.matcher.match_faces(detections, &registry)
    }

    pub fn attendance(&self, detections: &[FaceDetection]) -> Result<AttendanceReport, EngineError> {
        let registry = self.store.lookup_all();
        self.matcher.report(detections, &registry)
    }

    pub fn cluster(&self, faces: Vec<PooledFace>) -> Result<Vec<ClusterGroup>, EngineError> {
        self.clusterer.cluster(faces)
    }
}
