use std::collections::HashSet;

use crate::identity::domain::registered_identity::RegisteredIdentity;
use crate::scoring::domain::similarity::{check_dimensions, SimilarityScorer};
use crate::shared::constants::{DEFAULT_MATCH_THRESHOLD, DEFAULT_MAX_BATCH};
use crate::shared::engine_error::EngineError;
use crate::shared::face_detection::FaceDetection;

/// Per-face resolution against the registry.
#[derive(Clone, Debug, PartialEq)]
pub enum MatchResult {
    Matched { label: String, similarity: f64 },
    /// No identity scored above the threshold. `best_similarity` is the
    /// closest score seen, or `None` when the registry was empty.
    Unmatched { best_similarity: Option<f64> },
}

impl MatchResult {
    pub fn label(&self) -> Option<&str> {
        match self {
            MatchResult::Matched { label, .. } => Some(label),
            MatchResult::Unmatched { .. } => None,
        }
    }

    pub fn similarity(&self) -> Option<f64> {
        match self {
            MatchResult::Matched { similarity, .. } => Some(*similarity),
            MatchResult::Unmatched { best_similarity } => *best_similarity,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }
}

/// Scene-level attendance derived from per-face matches.
#[derive(Clone, Debug, PartialEq)]
pub struct AttendanceReport {
    /// One entry per input detection, same order.
    pub matches: Vec<MatchResult>,
    /// Distinct matched labels, in order of first matching detection.
    pub present: Vec<String>,
    /// Registered labels not present, in registration order.
    pub absent: Vec<String>,
    /// `present / registered * 100`, or 0 for an empty registry.
    pub rate: f64,
}

impl AttendanceReport {
    pub fn from_matches(matches: Vec<MatchResult>, registry: &[RegisteredIdentity]) -> Self {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut present: Vec<String> = Vec::new();
        for label in matches.iter().filter_map(MatchResult::label) {
            if seen.insert(label) {
                present.push(label.to_string());
            }
        }

        let absent: Vec<String> = registry
            .iter()
            .map(RegisteredIdentity::label)
            .filter(|label| !seen.contains(label))
            .map(str::to_string)
            .collect();

        let rate = if registry.is_empty() {
            0.0
        } else {
            present.len() as f64 / registry.len() as f64 * 100.0
        };

        Self {
            matches,
            present,
            absent,
            rate,
        }
    }
}

/// 1:N matcher: each face independently gets its best registered identity.
///
/// Two faces may resolve to the same identity; presence is deduplicated
/// only in [`AttendanceReport`].
pub struct AttendanceMatcher {
    scorer: SimilarityScorer,
    threshold: f64,
    max_batch: usize,
}

impl AttendanceMatcher {
    pub fn new(threshold: f64, max_batch: usize) -> Self {
        Self {
            scorer: SimilarityScorer::default(),
            threshold,
            max_batch,
        }
    }

    pub fn with_scorer(mut self, scorer: SimilarityScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Resolves every detection; output is aligned 1:1 with `detections`.
    pub fn match_faces(
        &self,
        detections: &[FaceDetection],
        registry: &[RegisteredIdentity],
    ) -> Result<Vec<MatchResult>, EngineError> {
        if detections.len() > self.max_batch {
            return Err(EngineError::OversizedBatch {
                size: detections.len(),
                limit: self.max_batch,
            });
        }

        let registry_norms: Vec<f64> = registry.iter().map(|r| r.embedding().norm()).collect();
        let query_norms: Vec<f64> = detections.iter().map(|d| d.embedding().norm()).collect();
        if !registry.is_empty() && !detections.is_empty() {
            self.scorer
                .screen_norms(registry_norms.iter().chain(&query_norms).copied())?;
        }

        let results = detections
            .iter()
            .zip(&query_norms)
            .map(|(d, &norm)| self.match_one(d, norm, registry, &registry_norms))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "Matched {}/{} faces against {} identities",
            results.iter().filter(|r| r.is_matched()).count(),
            results.len(),
            registry.len()
        );
        Ok(results)
    }

    /// Matches and derives present/absent/rate in one call.
    pub fn report(
        &self,
        detections: &[FaceDetection],
        registry: &[RegisteredIdentity],
    ) -> Result<AttendanceReport, EngineError> {
        let matches = self.match_faces(detections, registry)?;
        Ok(AttendanceReport::from_matches(matches, registry))
    }

    fn match_one(
        &self,
        detection: &FaceDetection,
        query_norm: f64,
        registry: &[RegisteredIdentity],
        registry_norms: &[f64],
    ) -> Result<MatchResult, EngineError> {
        let query = detection.embedding();

        // Strict comparison keeps the earliest-registered identity on ties.
        let mut best: Option<(usize, f64)> = None;
        for (i, identity) in registry.iter().enumerate() {
            check_dimensions(query, identity.embedding())?;
            let sim = self
                .scorer
                .score(query, query_norm, identity.embedding(), registry_norms[i])?;
            if best.map_or(true, |(_, b)| sim > b) {
                best = Some((i, sim));
            }
        }

        Ok(match best {
            Some((i, similarity)) if similarity > self.threshold => MatchResult::Matched {
                label: registry[i].label().to_string(),
                similarity,
            },
            _ => MatchResult::Unmatched {
                best_similarity: best.map(|(_, s)| s),
            },
        })
    }
}

impl Default for AttendanceMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD, DEFAULT_MAX_BATCH)
    }
}
