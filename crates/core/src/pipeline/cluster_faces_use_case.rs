use std::path::PathBuf;
use std::sync::Arc;

use crate::clustering::domain::face_clusterer::{pool_faces, ClusterGroup, PooledFace};
use crate::perception::domain::face_analyzer::{analyze_image, FaceAnalyzer};
use crate::pipeline::face_engine::FaceEngine;
use crate::pipeline::infrastructure::background_runner::{BackgroundRunner, JobHandle};
use crate::shared::engine_error::EngineError;

/// Groups faces pooled from several images into unknown individuals.
///
/// `image_index` in each group member is the position of its image in the
/// `images` slice passed to `execute`.
pub struct ClusterFacesUseCase {
    analyzer: Box<dyn FaceAnalyzer>,
    engine: Arc<FaceEngine>,
    on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
}

impl ClusterFacesUseCase {
    pub fn new(
        analyzer: Box<dyn FaceAnalyzer>,
        engine: Arc<FaceEngine>,
        on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    ) -> Self {
        Self {
            analyzer,
            engine,
            on_progress,
        }
    }

    /// Perceives and clusters on the calling thread.
    pub fn execute(&mut self, images: &[PathBuf]) -> Result<Vec<ClusterGroup>, EngineError> {
        let faces = self.perceive(images)?;
        self.engine.cluster(faces)
    }

    /// Perceives on the calling thread, then clusters on `runner`.
    pub fn execute_in_background(
        &mut self,
        images: &[PathBuf],
        runner: &BackgroundRunner,
    ) -> Result<JobHandle<Vec<ClusterGroup>>, EngineError> {
        let faces = self.perceive(images)?;
        let clusterer = self.engine.clusterer();
        runner.spawn(move || clusterer.cluster(faces))
    }

    fn perceive(&mut self, images: &[PathBuf]) -> Result<Vec<PooledFace>, EngineError> {
        let total = images.len();
        let mut per_image = Vec::with_capacity(total);
        for (i, image) in images.iter().enumerate() {
            per_image.push(analyze_image(self.analyzer.as_mut(), image)?);
            self.report_progress(i + 1, total)?;
        }
        Ok(pool_faces(per_image))
    }

    fn report_progress(&self, current: usize, total: usize) -> Result<(), EngineError> {
        if let Some(ref callback) = self.on_progress {
            if !callback(current, total) {
                return Err(EngineError::Cancelled);
            }
        }
        Ok(())
    }
}
