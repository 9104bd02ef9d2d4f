use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::matching::domain::face_selection::FaceSelection;
use crate::scoring::domain::similarity::ZeroNormPolicy;
use crate::shared::constants::{
    APP_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_CLUSTER_EPS, DEFAULT_CLUSTER_MIN_SAMPLES,
    DEFAULT_MATCH_THRESHOLD, DEFAULT_MAX_BATCH, DEFAULT_VERIFY_THRESHOLD, REGISTRY_FILE_NAME,
};
use crate::shared::engine_error::EngineError;

/// Tunables for every engine operation.
///
/// Missing fields fall back to their defaults so partial config files work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub verify_threshold: f64,
    pub match_threshold: f64,
    pub cluster_eps: f64,
    pub cluster_min_samples: usize,
    pub max_batch: usize,
    pub zero_norm: ZeroNormPolicy,
    pub face_selection: FaceSelection,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verify_threshold: DEFAULT_VERIFY_THRESHOLD,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            cluster_eps: DEFAULT_CLUSTER_EPS,
            cluster_min_samples: DEFAULT_CLUSTER_MIN_SAMPLES,
            max_batch: DEFAULT_MAX_BATCH,
            zero_norm: ZeroNormPolicy::Zero,
            face_selection: FaceSelection::HighestConfidence,
        }
    }
}

impl EngineConfig {
    /// Reads a JSON config file, falling back to defaults.
    ///
    /// A missing file yields defaults silently; an unreadable or invalid
    /// one is logged and also yields defaults. Meant for the implicit
    /// per-user config; use [`EngineConfig::try_load`] for a path the user
    /// named explicitly.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::try_load(path).unwrap_or_else(|e| {
            log::warn!("{e}; using defaults");
            Self::default()
        })
    }

    /// Reads a JSON config file, failing on any read or parse error.
    pub fn try_load(path: &Path) -> Result<Self, EngineError> {
        let json = fs::read_to_string(path).map_err(|e| {
            EngineError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&json)
            .map_err(|e| EngineError::InvalidConfig(format!("{}: {e}", path.display())))
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for (name, value) in [
            ("verify_threshold", self.verify_threshold),
            ("match_threshold", self.match_threshold),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be between -1.0 and 1.0, got {value}"
                )));
            }
        }
        if !(0.0..=2.0).contains(&self.cluster_eps) {
            return Err(EngineError::InvalidConfig(format!(
                "cluster_eps must be between 0.0 and 2.0, got {}",
                self.cluster_eps
            )));
        }
        if self.cluster_min_samples == 0 {
            return Err(EngineError::InvalidConfig(
                "cluster_min_samples must be at least 1".to_string(),
            ));
        }
        if self.max_batch == 0 {
            return Err(EngineError::InvalidConfig(
                "max_batch must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// `<config_dir>/facematch/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }
}

/// `<data_dir>/facematch/registered_identities.json`, if the platform has a data dir.
pub fn default_registry_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_DIR_NAME).join(REGISTRY_FILE_NAME))
}
