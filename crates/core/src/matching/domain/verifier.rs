use std::fmt;

use crate::matching::domain::face_selection::FaceSelection;
use crate::scoring::domain::similarity::SimilarityScorer;
use crate::shared::constants::DEFAULT_VERIFY_THRESHOLD;
use crate::shared::embedding::Embedding;
use crate::shared::engine_error::{EngineError, ImageSide};
use crate::shared::face_detection::FaceDetection;

/// Outcome of a 1:1 comparison.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Verification {
    pub similarity: f64,
    pub is_same: bool,
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.is_same {
            "Same person"
        } else {
            "Different persons"
        };
        write!(f, "Similarity: {:.3} ({verdict})", self.similarity)
    }
}

/// Verification of two images plus which face was used from each.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceVerification {
    pub verification: Verification,
    pub first_index: usize,
    pub second_index: usize,
}

/// Decides whether two faces belong to the same person.
///
/// Same identity means similarity strictly above the threshold; a score
/// equal to the threshold is a different person.
pub struct Verifier {
    scorer: SimilarityScorer,
    threshold: f64,
    selection: FaceSelection,
}

impl Verifier {
    pub fn new(threshold: f64) -> Self {
        Self {
            scorer: SimilarityScorer::default(),
            threshold,
            selection: FaceSelection::default(),
        }
    }

    pub fn with_scorer(mut self, scorer: SimilarityScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_selection(mut self, selection: FaceSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn verify(&self, a: &Embedding, b: &Embedding) -> Result<Verification, EngineError> {
        let similarity = self.scorer.similarity(a, b)?;
        Ok(Verification {
            similarity,
            is_same: similarity > self.threshold,
        })
    }

    /// Compares one canonical face from each image.
    ///
    /// Reports which side came back empty when either has no faces.
    pub fn verify_faces(
        &self,
        first: &[FaceDetection],
        second: &[FaceDetection],
    ) -> Result<FaceVerification, EngineError> {
        let (first_index, second_index) =
            match (self.selection.select(first), self.selection.select(second)) {
                (Some(a), Some(b)) => (a, b),
                (None, None) => return Err(no_face(ImageSide::Both)),
                (None, Some(_)) => return Err(no_face(ImageSide::First)),
                (Some(_), None) => return Err(no_face(ImageSide::Second)),
            };

        let verification = self.verify(
            first[first_index].embedding(),
            second[second_index].embedding(),
        )?;
        log::debug!(
            "Verified face {first_index} against face {second_index}: {verification}"
        );
        Ok(FaceVerification {
            verification,
            first_index,
            second_index,
        })
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(DEFAULT_VERIFY_THRESHOLD)
    }
}

fn no_face(side: ImageSide) -> EngineError {
    EngineError::NoFaceInImage { side }
}
