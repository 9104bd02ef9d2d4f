/// Reads detections exported by an external face-analysis model.
///
/// For `photo.jpg` the model's output is expected at `photo.faces.json`,
/// a JSON array of detections:
///
/// ```json
/// [{"bbox": [x1, y1, x2, y2], "embedding": [...], "det_score": 0.98,
///   "age": 24, "gender": "female", "kps": [[x, y], ...]}]
/// ```
///
/// A path that already ends in `.json` is read directly.
use std::fs;
use std::path::{Path, PathBuf};

use crate::perception::domain::face_analyzer::FaceAnalyzer;
use crate::shared::constants::SIDECAR_SUFFIX;
use crate::shared::face_detection::FaceDetection;

#[derive(Default)]
pub struct SidecarFaceAnalyzer;

impl SidecarFaceAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl FaceAnalyzer for SidecarFaceAnalyzer {
    fn analyze(&mut self, image: &Path) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
        let path = sidecar_path(image);
        let json = fs::read_to_string(&path)
            .map_err(|e| format!("Cannot read detections {}: {e}", path.display()))?;
        let detections: Vec<FaceDetection> = serde_json::from_str(&json)
            .map_err(|e| format!("Invalid detections {}: {e}", path.display()))?;
        log::debug!("{}: {} faces", image.display(), detections.len());
        Ok(detections)
    }
}

pub fn sidecar_path(image: &Path) -> PathBuf {
    let is_json = image
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        image.to_path_buf()
    } else {
        image.with_extension(SIDECAR_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TWO_FACES: &str = r#"[
        {"bbox": [0, 0, 50, 60], "embedding": [0.1, 0.9], "det_score": 0.95, "age": 30, "gender": "female"},
        {"bbox": [100, 10, 140, 70], "embedding": [0.8, 0.2], "confidence": 0.7}
    ]"#;

    #[test]
    fn test_sidecar_path_for_image() {
        assert_eq!(
            sidecar_path(Path::new("/data/class/photo.jpg")),
            PathBuf::from("/data/class/photo.faces.json")
        );
    }

    #[test]
    fn test_sidecar_path_for_json_is_identity() {
        assert_eq!(
            sidecar_path(Path::new("scene.JSON")),
            PathBuf::from("scene.JSON")
        );
    }

    #[test]
    fn test_reads_sidecar_next_to_image() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("photo.faces.json"), TWO_FACES).unwrap();

        let faces = SidecarFaceAnalyzer::new()
            .analyze(&tmp.path().join("photo.jpg"))
            .unwrap();

        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].age(), Some(30));
        assert_eq!(faces[1].bbox().x1, 100);
    }

    #[test]
    fn test_empty_array_is_zero_faces() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.json");
        fs::write(&path, "[]").unwrap();
        assert!(SidecarFaceAnalyzer::new().analyze(&path).unwrap().is_empty());
    }

    #[test]
    fn test_missing_sidecar_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = SidecarFaceAnalyzer::new()
            .analyze(&tmp.path().join("nothing.png"))
            .unwrap_err();
        assert!(err.to_string().contains("nothing.faces.json"));
    }

    #[test]
    fn test_invalid_detection_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, r#"[{"bbox": [0, 0, 0, 0], "embedding": [1.0], "confidence": 0.5}]"#)
            .unwrap();
        assert!(SidecarFaceAnalyzer::new().analyze(&path).is_err());
    }
}
