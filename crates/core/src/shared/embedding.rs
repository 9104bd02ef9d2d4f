use serde::{Deserialize, Serialize};

use crate::shared::engine_error::EngineError;

/// A face identity signature produced by the perception stage.
///
/// Dimensionality is fixed by the model (512 for ArcFace `w600k_r50`), but
/// the type only enforces that the vector is non-empty and finite; pairwise
/// dimensionality is checked where two embeddings meet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct Embedding {
    values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Result<Self, EngineError> {
        if values.is_empty() {
            return Err(EngineError::InvalidEmbedding(
                "embedding has no components".to_string(),
            ));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(EngineError::InvalidEmbedding(format!(
                "component {pos} is not finite"
            )));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Euclidean norm, accumulated in f64.
    pub fn norm(&self) -> f64 {
        self.values
            .iter()
            .map(|v| (*v as f64) * (*v as f64))
            .sum::<f64>()
            .sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }
}

impl TryFrom<Vec<f32>> for Embedding {
    type Error = EngineError;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<Embedding> for Vec<f32> {
    fn from(embedding: Embedding) -> Self {
        embedding.values
    }
}
