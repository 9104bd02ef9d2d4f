use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::identity::domain::identity_repository::IdentityRepository;
use crate::identity::domain::registered_identity::RegisteredIdentity;
use crate::scoring::domain::similarity::check_dimensions;
use crate::shared::embedding::Embedding;
use crate::shared::engine_error::EngineError;
use crate::shared::face_detection::FaceDetection;

/// Immutable view of the registry at one point in time.
pub type IdentitySnapshot = Arc<[RegisteredIdentity]>;

/// The registry of known identities, shared across callers.
///
/// One mutex covers both the in-memory table and persistence. Writers
/// copy the current table, mutate the copy, persist it, and only then
/// publish it, so a reader sees an identity only once it is durable and a
/// failed save leaves the published table untouched.
pub struct IdentityStore {
    state: Mutex<StoreState>,
}

struct StoreState {
    repository: Box<dyn IdentityRepository>,
    identities: IdentitySnapshot,
}

impl IdentityStore {
    /// Opens the store, loading whatever the repository holds.
    ///
    /// A corrupt or unreadable repository is logged and treated as empty.
    pub fn open(repository: Box<dyn IdentityRepository>) -> Self {
        let identities = load_or_empty(repository.as_ref());
        Self {
            state: Mutex::new(StoreState {
                repository,
                identities,
            }),
        }
    }

    /// Re-reads the repository, replacing the in-memory table.
    pub fn reload(&self) -> usize {
        let mut state = self.lock();
        state.identities = load_or_empty(state.repository.as_ref());
        state.identities.len()
    }

    /// Writes the current table back to the repository.
    pub fn save(&self) -> Result<(), EngineError> {
        let state = self.lock();
        state.repository.save(&state.identities)?;
        Ok(())
    }

    /// Enrolls `label` from the faces found in its enrollment image.
    ///
    /// Exactly one face is required; the engine never guesses which of
    /// several faces was meant.
    pub fn register(
        &self,
        label: &str,
        detections: &[FaceDetection],
    ) -> Result<RegisteredIdentity, EngineError> {
        let detection = match detections {
            [] => return Err(EngineError::NoFaceDetected),
            [only] => only,
            many => {
                return Err(EngineError::AmbiguousEnrollment { faces: many.len() });
            }
        };
        self.register_embedding(label, detection.embedding().clone())
    }

    /// Inserts or overwrites `label`, returning once the change is persisted.
    ///
    /// Surrounding whitespace is not part of a label, here or in any lookup.
    pub fn register_embedding(
        &self,
        label: &str,
        embedding: Embedding,
    ) -> Result<RegisteredIdentity, EngineError> {
        let label = normalize_label(label);
        if label.is_empty() {
            return Err(EngineError::EmptyLabel);
        }

        let mut state = self.lock();
        if let Some(other) = state.identities.iter().find(|i| i.label() != label) {
            check_dimensions(other.embedding(), &embedding)?;
        }

        let identity = RegisteredIdentity::new(label, embedding);
        let mut next = state.identities.to_vec();
        match next.iter_mut().find(|i| i.label() == label) {
            Some(existing) => *existing = identity.clone(),
            None => next.push(identity.clone()),
        }

        state.persist(next)?;
        log::info!("Registered identity {label}");
        Ok(identity)
    }

    /// Removes `label`. Returns `false` if it was not registered.
    pub fn remove(&self, label: &str) -> Result<bool, EngineError> {
        let label = normalize_label(label);
        let mut state = self.lock();
        if !state.identities.iter().any(|i| i.label() == label) {
            return Ok(false);
        }
        let next: Vec<RegisteredIdentity> = state
            .identities
            .iter()
            .filter(|i| i.label() != label)
            .cloned()
            .collect();
        state.persist(next)?;
        log::info!("Removed identity {label}");
        Ok(true)
    }

    /// All identities in registration order.
    pub fn lookup_all(&self) -> IdentitySnapshot {
        Arc::clone(&self.lock().identities)
    }

    pub fn get(&self, label: &str) -> Option<RegisteredIdentity> {
        let label = normalize_label(label);
        self.lock()
            .identities
            .iter()
            .find(|i| i.label() == label)
            .cloned()
    }

    pub fn contains(&self, label: &str) -> bool {
        let label = normalize_label(label);
        self.lock().identities.iter().any(|i| i.label() == label)
    }

    pub fn labels(&self) -> Vec<String> {
        self.lock()
            .identities
            .iter()
            .map(|i| i.label().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The guarded table is only ever replaced whole, so a panic mid-write
    // cannot leave it half-updated.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StoreState {
    fn persist(&mut self, next: Vec<RegisteredIdentity>) -> Result<(), EngineError> {
        if let Err(e) = self.repository.save(&next) {
            log::error!("Failed to persist identity store: {e}");
            return Err(e.into());
        }
        self.identities = next.into();
        Ok(())
    }
}

fn normalize_label(label: &str) -> &str {
    label.trim()
}

fn load_or_empty(repository: &dyn IdentityRepository) -> IdentitySnapshot {
    match repository.load() {
        Ok(identities) => {
            log::info!("Loaded {} registered identities", identities.len());
            identities.into()
        }
        Err(e) => {
            log::error!("Identity store unusable, starting empty: {e}");
            Vec::<RegisteredIdentity>::new().into()
        }
    }
}
