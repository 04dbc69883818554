use std::collections::BTreeMap;

use uuid::Uuid;

use super::consent::{Consent, Decision};
use super::domain::{ConsentId, Enrollment, EnrollmentId, PersonRef, ProgramRef};

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable keyed storage for enrollment aggregates. The aggregate carries its
/// status log and history, so `put` persists a status change and its history
/// entry as one unit.
pub trait EnrollmentStore: Send + Sync {
    fn get(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, StoreError>;
    /// All enrollments held for one person identity (the business key).
    fn get_for_person(&self, identity: &str) -> Result<Vec<Enrollment>, StoreError>;
    fn put(&self, record: &Enrollment) -> Result<(), StoreError>;
    /// Deleting an absent id is a no-op, not an error.
    fn delete(&self, id: &EnrollmentId) -> Result<(), StoreError>;
}

/// Consent storage. `pending_for` is the single unambiguous lookup backing
/// the at-most-one-pending invariant.
pub trait ConsentStore: Send + Sync {
    fn pending_for(&self, id: &EnrollmentId) -> Result<Option<Consent>, StoreError>;
    fn for_enrollment(&self, id: &EnrollmentId) -> Result<Vec<Consent>, StoreError>;
    fn put(&self, consent: &Consent) -> Result<(), StoreError>;
    fn delete(&self, id: &ConsentId) -> Result<(), StoreError>;
}

/// Decision storage. `undecided_for` mirrors `ConsentStore::pending_for`.
pub trait DecisionStore: Send + Sync {
    fn undecided_for(&self, id: &EnrollmentId) -> Result<Option<Decision>, StoreError>;
    fn for_enrollment(&self, id: &EnrollmentId) -> Result<Vec<Decision>, StoreError>;
    fn put(&self, decision: &Decision) -> Result<(), StoreError>;
}

/// Error raised by the person/program/name lookup collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("lookup unavailable: {0}")]
    Unavailable(String),
}

/// Person registry collaborator.
pub trait PersonResolver: Send + Sync {
    fn resolve_or_create(&self, identity: &str) -> Result<PersonRef, ResolverError>;
    /// Ask the registry to re-derive the person's data (e.g. address) out of
    /// band. The refreshed copy arrives through a later update.
    fn refresh(&self, person: &PersonRef) -> Result<(), ResolverError>;
}

/// Program catalogue collaborator.
pub trait ProgramResolver: Send + Sync {
    fn resolve(&self, id: &Uuid) -> Result<Option<ProgramRef>, ResolverError>;
}

/// Outbound notification hook towards downstream systems. Fire-and-forget;
/// drafts are never published.
pub trait EnrollmentPublisher: Send + Sync {
    fn publish(&self, record: &Enrollment) -> Result<(), PublishError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Display-name lookup used only when rendering history.
pub trait NameResolver: Send + Sync {
    fn resolve_names(
        &self,
        actor_ids: &[String],
        unit_ids: &[String],
    ) -> Result<NameDirectory, ResolverError>;
}

/// Resolved display names keyed by the ids that were asked for. Ids the
/// resolver did not know stay absent and render as ids upstream.
#[derive(Debug, Clone, Default)]
pub struct NameDirectory {
    actors: BTreeMap<String, String>,
    units: BTreeMap<String, String>,
}

impl NameDirectory {
    pub fn new(actors: BTreeMap<String, String>, units: BTreeMap<String, String>) -> Self {
        Self { actors, units }
    }

    pub fn actor(&self, id: &str) -> Option<&str> {
        self.actors.get(id).map(String::as_str)
    }

    pub fn unit(&self, id: &str) -> Option<&str> {
        self.units.get(id).map(String::as_str)
    }
}
