use crate::shared::engine_error::EngineError;
use crate::shared::face_detection::FaceDetection;

/// A detection tagged with where it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct PooledFace {
    pub image_index: usize,
    pub detection_index: usize,
    pub detection: FaceDetection,
}

/// Flattens per-image detections into one pool, keeping image order
/// and detector order within each image.
pub fn pool_faces(images: Vec<Vec<FaceDetection>>) -> Vec<PooledFace> {
    images
        .into_iter()
        .enumerate()
        .flat_map(|(image_index, detections)| {
            detections
                .into_iter()
                .enumerate()
                .map(move |(detection_index, detection)| PooledFace {
                    image_index,
                    detection_index,
                    detection,
                })
        })
        .collect()
}

/// Faces believed to be the same (unknown) person.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterGroup {
    pub label: usize,
    pub members: Vec<PooledFace>,
}

impl ClusterGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// One-line summary of a clustering result.
pub fn describe(groups: &[ClusterGroup]) -> String {
    let faces: usize = groups.iter().map(ClusterGroup::len).sum();
    if faces == 0 {
        return "No faces detected".to_string();
    }
    format!(
        "Detected {faces} faces, grouped into {} clusters",
        groups.len()
    )
}

/// Domain interface for N:N grouping of faces without known identities.
///
/// Implementations must partition the input: every face lands in exactly
/// one group, and the same input order yields the same groups.
pub trait FaceClusterer: Send + Sync {
    fn cluster(&self, faces: Vec<PooledFace>) -> Result<Vec<ClusterGroup>, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::embedding::Embedding;
    use crate::shared::face_detection::BoundingBox;

    fn face(x: i32) -> FaceDetection {
        FaceDetection::new(
            BoundingBox::new(x, 0, x + 10, 10).unwrap(),
            Embedding::new(vec![1.0]).unwrap(),
            0.9,
        )
        .unwrap()
    }

    #[test]
    fn test_pool_faces_tags_origin() {
        let pooled = pool_faces(vec![vec![face(0), face(20)], vec![], vec![face(40)]]);

        let origins: Vec<(usize, usize)> = pooled
            .iter()
            .map(|p| (p.image_index, p.detection_index))
            .collect();
        assert_eq!(origins, vec![(0, 0), (0, 1), (2, 0)]);
        assert_eq!(pooled[2].detection.bbox().x1, 40);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&[]), "No faces detected");
        let groups = vec![
            ClusterGroup {
                label: 0,
                members: pool_faces(vec![vec![face(0), face(20)]]),
            },
            ClusterGroup {
                label: 1,
                members: pool_faces(vec![vec![face(40)]]),
            },
        ];
        assert_eq!(describe(&groups), "Detected 3 faces, grouped into 2 clusters");
    }
}
