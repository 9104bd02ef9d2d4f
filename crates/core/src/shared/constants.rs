/// Cosine similarity a verification pair must exceed to count as one person.
pub const DEFAULT_VERIFY_THRESHOLD: f64 = 0.6;

/// Cosine similarity a face must exceed to be matched to a registered identity.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

/// DBSCAN neighborhood radius in cosine distance (`1 - similarity`).
pub const DEFAULT_CLUSTER_EPS: f64 = 0.5;

/// DBSCAN core-point size; 1 means every face seeds or joins a group.
pub const DEFAULT_CLUSTER_MIN_SAMPLES: usize = 1;

/// Largest face batch accepted by match and cluster (n² distance matrix).
pub const DEFAULT_MAX_BATCH: usize = 2048;

pub const APP_DIR_NAME: &str = "facematch";
pub const REGISTRY_FILE_NAME: &str = "registered_identities.json";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Suffix of the per-image detections file exported by the perception model.
pub const SIDECAR_SUFFIX: &str = "faces.json";
