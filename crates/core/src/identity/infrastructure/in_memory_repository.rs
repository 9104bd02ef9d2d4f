use std::sync::{Arc, Mutex, PoisonError};

use crate::identity::domain::identity_repository::IdentityRepository;
use crate::identity::domain::registered_identity::RegisteredIdentity;
use crate::shared::engine_error::RepositoryError;

/// Non-durable repository for tests and ephemeral sessions.
///
/// Clones share the same storage, so a caller can keep a handle and
/// inspect what the store persisted.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    identities: Arc<Mutex<Vec<RegisteredIdentity>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identities(identities: Vec<RegisteredIdentity>) -> Self {
        Self {
            identities: Arc::new(Mutex::new(identities)),
        }
    }

    pub fn contents(&self) -> Vec<RegisteredIdentity> {
        self.identities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl IdentityRepository for InMemoryRepository {
    fn load(&self) -> Result<Vec<RegisteredIdentity>, RepositoryError> {
        Ok(self.contents())
    }

    fn save(&self, identities: &[RegisteredIdentity]) -> Result<(), RepositoryError> {
        *self
            .identities
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = identities.to_vec();
        Ok(())
    }
}
