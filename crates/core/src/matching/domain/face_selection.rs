use serde::{Deserialize, Serialize};

use crate::shared::face_detection::FaceDetection;

/// Picks the one face that represents an image in 1:1 verification.
///
/// Ties always resolve to the earliest detection, so the choice is stable
/// for a given detector output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceSelection {
    #[default]
    HighestConfidence,
    LargestArea,
    /// Detector order, whatever the model returned first.
    First,
}

impl FaceSelection {
    /// Index of the selected face, or `None` for an empty slice.
    pub fn select(&self, detections: &[FaceDetection]) -> Option<usize> {
        match self {
            FaceSelection::First => (!detections.is_empty()).then_some(0),
            FaceSelection::HighestConfidence => {
                first_max_by(detections, |a, b| a.confidence() > b.confidence())
            }
            FaceSelection::LargestArea => {
                first_max_by(detections, |a, b| a.bbox().area() > b.bbox().area())
            }
        }
    }
}

fn first_max_by(
    detections: &[FaceDetection],
    beats: impl Fn(&FaceDetection, &FaceDetection) -> bool,
) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, d) in detections.iter().enumerate() {
        if best.map_or(true, |b| beats(d, &detections[b])) {
            best = Some(i);
        }
    }
    best
}
