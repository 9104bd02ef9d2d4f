/// DBSCAN face clusterer over a precomputed cosine-distance matrix.
///
/// Distances are computed once up front and the clustering step only
/// reads the matrix. Neighborhoods include the point itself and use
/// `distance <= eps`. Core points within `eps` of each other are linked
/// through union-find; a border point joins the lowest-indexed core point
/// in its neighborhood; noise points become singleton groups so the output
/// is always a full partition. With `min_samples = 1` every point is core
/// and this is single-linkage grouping at radius `eps`.
use ndarray::Array2;

use crate::clustering::domain::face_clusterer::{ClusterGroup, FaceClusterer, PooledFace};
use crate::clustering::infrastructure::math;
use crate::scoring::domain::distance_matrix::pairwise_distances;
use crate::scoring::domain::similarity::SimilarityScorer;
use crate::shared::constants::{DEFAULT_CLUSTER_EPS, DEFAULT_CLUSTER_MIN_SAMPLES, DEFAULT_MAX_BATCH};
use crate::shared::embedding::Embedding;
use crate::shared::engine_error::EngineError;

pub struct DbscanClusterer {
    scorer: SimilarityScorer,
    eps: f64,
    min_samples: usize,
    max_batch: usize,
}

impl DbscanClusterer {
    pub fn new(eps: f64, min_samples: usize, max_batch: usize) -> Self {
        Self {
            scorer: SimilarityScorer::default(),
            eps,
            min_samples: min_samples.max(1),
            max_batch,
        }
    }

    pub fn with_scorer(mut self, scorer: SimilarityScorer) -> Self {
        self.scorer = scorer;
        self
    }
}

impl Default for DbscanClusterer {
    fn default() -> Self {
        Self::new(DEFAULT_CLUSTER_EPS, DEFAULT_CLUSTER_MIN_SAMPLES, DEFAULT_MAX_BATCH)
    }
}

impl FaceClusterer for DbscanClusterer {
    fn cluster(&self, faces: Vec<PooledFace>) -> Result<Vec<ClusterGroup>, EngineError> {
        if faces.len() > self.max_batch {
            return Err(EngineError::OversizedBatch {
                size: faces.len(),
                limit: self.max_batch,
            });
        }
        if faces.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings: Vec<&Embedding> = faces.iter().map(|f| f.detection.embedding()).collect();
        let distances = pairwise_distances(&self.scorer, &embeddings)?;
        let index_groups = dbscan(&distances, self.eps, self.min_samples);

        let mut slots: Vec<Option<PooledFace>> = faces.into_iter().map(Some).collect();
        let groups: Vec<ClusterGroup> = index_groups
            .into_iter()
            .enumerate()
            .map(|(label, indices)| ClusterGroup {
                label,
                members: indices.into_iter().filter_map(|i| slots[i].take()).collect(),
            })
            .collect();

        log::info!(
            "Clustered {} faces into {} groups (eps={}, min_samples={})",
            slots.len(),
            groups.len(),
            self.eps,
            self.min_samples
        );
        Ok(groups)
    }
}

/// Runs DBSCAN on a square distance matrix, returning groups of indices.
fn dbscan(distances: &Array2<f64>, eps: f64, min_samples: usize) -> Vec<Vec<usize>> {
    let n = distances.nrows();
    let neighbors: Vec<Vec<usize>> = (0..n)
        .map(|i| (0..n).filter(|&j| distances[[i, j]] <= eps).collect())
        .collect();
    let is_core: Vec<bool> = neighbors.iter().map(|nb| nb.len() >= min_samples).collect();

    let mut parent: Vec<usize> = (0..n).collect();

    for i in (0..n).filter(|&i| is_core[i]) {
        for &j in neighbors[i].iter().filter(|&&j| j > i && is_core[j]) {
            math::union(&mut parent, i, j);
        }
    }

    for i in (0..n).filter(|&i| !is_core[i]) {
        if let Some(&core) = neighbors[i].iter().find(|&&j| is_core[j]) {
            math::union(&mut parent, i, core);
        }
    }

    math::collect_groups(&mut parent)
}
