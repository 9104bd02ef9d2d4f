use crate::identity::domain::registered_identity::RegisteredIdentity;
use crate::shared::engine_error::RepositoryError;

/// Durable key-value storage for the identity registry.
///
/// Always loaded and saved wholesale; implementations must preserve the
/// order they are given. Callers serialize access, so implementations
/// need no locking of their own.
pub trait IdentityRepository: Send {
    /// Returns every stored identity. A store that does not exist yet is
    /// empty, not an error.
    fn load(&self) -> Result<Vec<RegisteredIdentity>, RepositoryError>;

    /// Replaces the stored contents with `identities`. Must be durable
    /// when it returns `Ok`.
    fn save(&self, identities: &[RegisteredIdentity]) -> Result<(), RepositoryError>;
}
