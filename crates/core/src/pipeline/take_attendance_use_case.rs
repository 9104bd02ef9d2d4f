use std::path::Path;
use std::sync::Arc;

use crate::matching::domain::attendance_matcher::AttendanceReport;
use crate::perception::domain::face_analyzer::{analyze_image, FaceAnalyzer};
use crate::pipeline::face_engine::FaceEngine;
use crate::shared::engine_error::EngineError;
use crate::shared::face_detection::FaceDetection;

/// Return type for [`TakeAttendanceUseCase::execute`]: the detected faces
/// (for rendering) and the report whose `matches` align with them.
pub type AttendanceResult = (Vec<FaceDetection>, AttendanceReport);

/// Checks a scene image against every registered identity.
pub struct TakeAttendanceUseCase {
    analyzer: Box<dyn FaceAnalyzer>,
    engine: Arc<FaceEngine>,
}

impl TakeAttendanceUseCase {
    pub fn new(analyzer: Box<dyn FaceAnalyzer>, engine: Arc<FaceEngine>) -> Self {
        Self { analyzer, engine }
    }

    pub fn execute(&mut self, scene: &Path) -> Result<AttendanceResult, EngineError> {
        let detections = analyze_image(self.analyzer.as_mut(), scene)?;
        let report = self.engine.attendance(&detections)?;
        log::info!(
            "Attendance for {}: {} present, {} absent ({:.1}%)",
            scene.display(),
            report.present.len(),
            report.absent.len(),
            report.rate
        );
        Ok((detections, report))
    }
}
