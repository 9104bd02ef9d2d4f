//! Cosine similarity between face embeddings.
//!
//! Every higher-level operation (verification, attendance, clustering)
//! scores pairs through [`SimilarityScorer`], so zero-norm handling is
//! decided in exactly one place.

use serde::{Deserialize, Serialize};

use crate::shared::embedding::Embedding;
use crate::shared::engine_error::EngineError;

/// What to do when either side of a comparison has zero norm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroNormPolicy {
    /// Score the pair as 0.0 (orthogonal) and log a warning.
    #[default]
    Zero,
    /// Fail with [`EngineError::DegenerateVector`].
    Reject,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SimilarityScorer {
    zero_norm: ZeroNormPolicy,
}

impl SimilarityScorer {
    pub fn new(zero_norm: ZeroNormPolicy) -> Self {
        Self { zero_norm }
    }

    /// Cosine similarity in `[-1, 1]`.
    pub fn similarity(&self, a: &Embedding, b: &Embedding) -> Result<f64, EngineError> {
        check_dimensions(a, b)?;
        let (norm_a, norm_b) = (a.norm(), b.norm());
        self.screen_norms([norm_a, norm_b])?;
        self.score(a, norm_a, b, norm_b)
    }

    /// Cosine distance, `1 - similarity`, in `[0, 2]`.
    pub fn distance(&self, a: &Embedding, b: &Embedding) -> Result<f64, EngineError> {
        Ok(1.0 - self.similarity(a, b)?)
    }

    /// Applies the zero-norm policy to a whole batch before it is scored.
    ///
    /// Logs at most one warning per call, however many pairs the batch
    /// produces.
    pub(crate) fn screen_norms(
        &self,
        norms: impl IntoIterator<Item = f64>,
    ) -> Result<(), EngineError> {
        let zeros = norms.into_iter().filter(|n| *n == 0.0).count();
        if zeros == 0 {
            return Ok(());
        }
        match self.zero_norm {
            ZeroNormPolicy::Zero => {
                log::warn!("{zeros} zero-norm embedding(s) in comparison; scoring as 0.0");
                Ok(())
            }
            ZeroNormPolicy::Reject => Err(EngineError::DegenerateVector),
        }
    }

    /// Scores with norms computed by the caller; dimensions must already
    /// match and the norms must have passed [`Self::screen_norms`].
    pub(crate) fn score(
        &self,
        a: &Embedding,
        norm_a: f64,
        b: &Embedding,
        norm_b: f64,
    ) -> Result<f64, EngineError> {
        if norm_a == 0.0 || norm_b == 0.0 {
            return match self.zero_norm {
                ZeroNormPolicy::Zero => Ok(0.0),
                ZeroNormPolicy::Reject => Err(EngineError::DegenerateVector),
            };
        }
        let dot: f64 = a
            .values()
            .iter()
            .zip(b.values())
            .map(|(x, y)| (*x as f64) * (*y as f64))
            .sum();
        // Rounding can push identical vectors a hair past 1.0.
        Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
    }
}

/// Cosine similarity with the default policy (zero-norm scores 0.0).
pub fn cosine_similarity(a: &Embedding, b: &Embedding) -> Result<f64, EngineError> {
    SimilarityScorer::default().similarity(a, b)
}

pub(crate) fn check_dimensions(a: &Embedding, b: &Embedding) -> Result<(), EngineError> {
    if a.dimension() != b.dimension() {
        return Err(EngineError::DimensionMismatch {
            left: a.dimension(),
            right: b.dimension(),
        });
    }
    Ok(())
}
