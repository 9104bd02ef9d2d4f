use serde::{Deserialize, Serialize};

use crate::shared::embedding::Embedding;
use crate::shared::engine_error::EngineError;

/// Axis-aligned face box in source-image pixel coordinates.
///
/// Stored as corners (`x1 < x2`, `y1 < y2`) because that is what the
/// perception model emits and what renderers draw. Model exports carry
/// sub-pixel floats; those are truncated toward zero on the way in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Self, EngineError> {
        if x1 >= x2 || y1 >= y2 {
            return Err(EngineError::InvalidDetection(format!(
                "bounding box [{x1}, {y1}, {x2}, {y2}] has no area"
            )));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }
}

impl TryFrom<[i32; 4]> for BoundingBox {
    type Error = EngineError;

    fn try_from(c: [i32; 4]) -> Result<Self, Self::Error> {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl TryFrom<[f64; 4]> for BoundingBox {
    type Error = EngineError;

    fn try_from(c: [f64; 4]) -> Result<Self, Self::Error> {
        let range = i32::MIN as f64..=i32::MAX as f64;
        if let Some(bad) = c.iter().find(|v| !range.contains(&v.trunc())) {
            return Err(EngineError::InvalidDetection(format!(
                "bounding box coordinate {bad} is not a pixel position"
            )));
        }
        Self::try_from(c.map(|v| v.trunc() as i32))
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
        }
    }
}

/// One face found by the perception stage.
///
/// Immutable once built; the engine only reads it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFaceDetection")]
pub struct FaceDetection {
    bbox: BoundingBox,
    embedding: Embedding,
    confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    landmarks: Option<Vec<[f32; 2]>>,
}

impl FaceDetection {
    pub fn new(
        bbox: BoundingBox,
        embedding: Embedding,
        confidence: f32,
    ) -> Result<Self, EngineError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(EngineError::InvalidDetection(format!(
                "confidence must be between 0.0 and 1.0, got {confidence}"
            )));
        }
        Ok(Self {
            bbox,
            embedding,
            confidence,
            age: None,
            gender: None,
            landmarks: None,
        })
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_landmarks(mut self, landmarks: Vec<[f32; 2]>) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn embedding(&self) -> &Embedding {
        &self.embedding
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn age(&self) -> Option<u32> {
        self.age
    }

    pub fn gender(&self) -> Option<Gender> {
        self.gender
    }

    pub fn landmarks(&self) -> Option<&[[f32; 2]]> {
        self.landmarks.as_deref()
    }
}

/// Wire shape accepted from perception exports before validation.
#[derive(Deserialize)]
struct RawFaceDetection {
    bbox: BoundingBox,
    embedding: Embedding,
    #[serde(alias = "det_score")]
    confidence: f32,
    #[serde(default)]
    age: Option<u32>,
    #[serde(default)]
    gender: Option<Gender>,
    #[serde(default, alias = "kps")]
    landmarks: Option<Vec<[f32; 2]>>,
}

impl TryFrom<RawFaceDetection> for FaceDetection {
    type Error = EngineError;

    fn try_from(raw: RawFaceDetection) -> Result<Self, Self::Error> {
        let mut detection = FaceDetection::new(raw.bbox, raw.embedding, raw.confidence)?;
        detection.age = raw.age;
        detection.gender = raw.gender;
        detection.landmarks = raw.landmarks;
        Ok(detection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn embedding() -> Embedding {
        Embedding::new(vec![1.0, 0.0]).unwrap()
    }

    #[rstest]
    #[case::zero_width(10, 0, 10, 5)]
    #[case::zero_height(0, 10, 5, 10)]
    #[case::inverted(20, 20, 10, 10)]
    fn test_bbox_rejects_degenerate(
        #[case] x1: i32,
        #[case] y1: i32,
        #[case] x2: i32,
        #[case] y2: i32,
    ) {
        assert!(BoundingBox::new(x1, y1, x2, y2).is_err());
    }

    #[test]
    fn test_bbox_area() {
        let b = BoundingBox::new(10, 20, 40, 60).unwrap();
        assert_eq!(b.width(), 30);
        assert_eq!(b.height(), 40);
        assert_eq!(b.area(), 1200);
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.01)]
    #[case(f32::NAN)]
    fn test_detection_rejects_bad_confidence(#[case] confidence: f32) {
        let bbox = BoundingBox::new(0, 0, 10, 10).unwrap();
        assert!(FaceDetection::new(bbox, embedding(), confidence).is_err());
    }

    #[test]
    fn test_detection_attributes() {
        let bbox = BoundingBox::new(0, 0, 10, 10).unwrap();
        let d = FaceDetection::new(bbox, embedding(), 0.9)
            .unwrap()
            .with_age(31)
            .with_gender(Gender::Female)
            .with_landmarks(vec![[3.0, 4.0], [6.0, 4.5]]);
        assert_eq!(d.age(), Some(31));
        assert_eq!(d.gender(), Some(Gender::Female));
        assert_eq!(d.landmarks(), Some(&[[3.0, 4.0], [6.0, 4.5]][..]));

        let bare = FaceDetection::new(bbox, embedding(), 0.9).unwrap();
        assert!(bare.landmarks().is_none());
    }

    #[test]
    fn test_deserialize_accepts_model_field_names() {
        let json = r#"{
            "bbox": [1, 2, 30, 40],
            "embedding": [0.1, 0.2],
            "det_score": 0.87,
            "gender": "male",
            "kps": [[5.0, 6.0], [7.0, 8.0]]
        }"#;
        let d: FaceDetection = serde_json::from_str(json).unwrap();
        assert_eq!(d.bbox().x2, 30);
        assert_eq!(d.gender(), Some(Gender::Male));
        assert_eq!(d.landmarks().map(|l| l.len()), Some(2));
        assert!(d.age().is_none());
    }

    #[test]
    fn test_deserialize_truncates_float_box() {
        let json = r#"{
            "bbox": [12.7, 40.2, 88.9, 130.99],
            "embedding": [0.1, 0.2],
            "det_score": 0.9
        }"#;
        let d: FaceDetection = serde_json::from_str(json).unwrap();
        assert_eq!(*d.bbox(), BoundingBox::new(12, 40, 88, 130).unwrap());

        let out = serde_json::to_value(d.bbox()).unwrap();
        assert_eq!(out, serde_json::json!([12, 40, 88, 130]));
    }

    #[rstest]
    #[case::collapses_after_truncation("[5.2, 0.0, 5.9, 10.0]")]
    #[case::out_of_range("[0.0, 0.0, 1e12, 10.0]")]
    fn test_deserialize_rejects_unusable_float_box(#[case] bbox: &str) {
        let json = format!(r#"{{"bbox": {bbox}, "embedding": [1.0], "confidence": 0.5}}"#);
        assert!(serde_json::from_str::<FaceDetection>(&json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_empty_box() {
        let json = r#"{"bbox": [5, 5, 5, 9], "embedding": [1.0], "confidence": 0.5}"#;
        assert!(serde_json::from_str::<FaceDetection>(json).is_err());
    }
}
