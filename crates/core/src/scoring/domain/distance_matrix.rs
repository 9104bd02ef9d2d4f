use ndarray::Array2;

use crate::scoring::domain::similarity::{check_dimensions, SimilarityScorer};
use crate::shared::embedding::Embedding;
use crate::shared::engine_error::EngineError;

/// Symmetric `n x n` cosine-distance matrix with a zero diagonal.
///
/// All embeddings must share the first one's dimensionality. Norms are
/// computed once per embedding, not once per pair.
pub fn pairwise_distances(
    scorer: &SimilarityScorer,
    embeddings: &[&Embedding],
) -> Result<Array2<f64>, EngineError> {
    let n = embeddings.len();
    if let Some(first) = embeddings.first() {
        for e in &embeddings[1..] {
            check_dimensions(first, e)?;
        }
    }

    let norms: Vec<f64> = embeddings.iter().map(|e| e.norm()).collect();
    if n > 1 {
        scorer.screen_norms(norms.iter().copied())?;
    }
    let mut distances = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in (i + 1)..n {
            let sim = scorer.score(embeddings[i], norms[i], embeddings[j], norms[j])?;
            let d = 1.0 - sim;
            distances[[i, j]] = d;
            distances[[j, i]] = d;
        }
    }

    Ok(distances)
}
