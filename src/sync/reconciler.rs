use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc::Receiver;
use uuid::Uuid;

use crate::lifecycle::domain::{Enrollment, EnrollmentId, SourceSystem, Status};
use crate::lifecycle::duration::ProgramKind;
use crate::lifecycle::history::HistoryEntry;
use crate::lifecycle::repository::{
    EnrollmentStore, PersonResolver, ProgramResolver, ResolverError, StoreError,
};

use super::payload::{MalformedPayload, UpstreamEnvelope, UpstreamPayload};

/// What processing one notification did to local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Deleted,
    Inserted,
    Updated,
    Skipped,
}

/// Error raised while applying one notification. `Malformed` is a
/// data-quality signal the consumption loop drops; the rest are transient
/// and resolved by re-delivery.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("malformed payload for {key}: {reason}")]
    Malformed {
        key: EnrollmentId,
        #[source]
        reason: MalformedPayload,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Resolver(#[from] ResolverError),
    #[error("program {0} is not in the catalogue")]
    UnknownProgram(Uuid),
}

/// Applies externally-authored change notifications to local state.
///
/// All writes are keyed by the record id and by the status's own id, never
/// appended blindly, so replaying a notification converges on the same
/// state. Within one record key the caller must deliver notifications in
/// order; across keys there is no ordering requirement.
pub struct UpstreamReconciler<S, PR, GR> {
    store: Arc<S>,
    persons: Arc<PR>,
    programs: Arc<GR>,
    enabled_programs: HashSet<ProgramKind>,
}

impl<S, PR, GR> UpstreamReconciler<S, PR, GR>
where
    S: EnrollmentStore,
    PR: PersonResolver,
    GR: ProgramResolver,
{
    pub fn new(
        store: Arc<S>,
        persons: Arc<PR>,
        programs: Arc<GR>,
        enabled_programs: impl IntoIterator<Item = ProgramKind>,
    ) -> Self {
        Self {
            store,
            persons,
            programs,
            enabled_programs: enabled_programs.into_iter().collect(),
        }
    }

    pub fn process(&self, envelope: &UpstreamEnvelope) -> Result<ReconcileOutcome, ReconcileError> {
        let Some(payload) = &envelope.payload else {
            self.store.delete(&envelope.key)?;
            return Ok(ReconcileOutcome::Deleted);
        };

        if !self.enabled_programs.contains(&payload.program_kind) {
            return Ok(ReconcileOutcome::Skipped);
        }

        let status = payload
            .checked_status()
            .map_err(|reason| ReconcileError::Malformed {
                key: envelope.key,
                reason,
            })?;

        match self.store.get(&payload.id)? {
            // The legacy register outranks whatever we hold locally.
            Some(local) if payload.source == SourceSystem::Canonical => {
                self.update(local, payload, status)
            }
            _ => self.insert(payload, status),
        }
    }

    /// Consume notifications one at a time. Malformed payloads are logged
    /// and dropped; transient failures are logged and left to the source's
    /// re-delivery.
    pub async fn run(&self, mut notifications: Receiver<UpstreamEnvelope>) {
        while let Some(envelope) = notifications.recv().await {
            match self.process(&envelope) {
                Ok(outcome) => {
                    tracing::debug!(key = %envelope.key, ?outcome, "notification applied");
                }
                Err(error @ ReconcileError::Malformed { .. }) => {
                    tracing::warn!(key = %envelope.key, %error, "dropping malformed notification");
                }
                Err(error) => {
                    tracing::error!(key = %envelope.key, %error, "notification failed, awaiting re-delivery");
                }
            }
        }
    }

    fn insert(
        &self,
        payload: &UpstreamPayload,
        status: Status,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let person = self.persons.resolve_or_create(&payload.person_identity)?;
        let program = self
            .programs
            .resolve(&payload.program_id)?
            .ok_or(ReconcileError::UnknownProgram(payload.program_id))?;

        let status_id = status.id;
        let mut record = Enrollment::imported(
            payload.id,
            person,
            program,
            status,
            payload.modified_by.clone(),
            payload.modified_at,
            payload.created_at,
        );
        apply_fields(&mut record, payload);
        record.append_history(HistoryEntry::Import {
            source: payload.source,
            status_id,
            at: payload.modified_at,
        });

        self.store.put(&record)?;
        Ok(ReconcileOutcome::Inserted)
    }

    fn update(
        &self,
        mut local: Enrollment,
        payload: &UpstreamPayload,
        status: Status,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        if local.status().id != status.id {
            let status_id = status.id;
            local.adopt_status(status, payload.modified_at);
            local.append_history(HistoryEntry::Import {
                source: payload.source,
                status_id,
                at: payload.modified_at,
            });
        }
        apply_fields(&mut local, payload);
        local.modified_by = payload.modified_by.clone();
        local.modified_at = payload.modified_at;

        self.store.put(&local)?;

        if !local.person.has_address {
            // Out-of-band: the refreshed copy arrives through a later update,
            // so a failed refresh does not fail the notification.
            if let Err(error) = self.persons.refresh(&local.person) {
                tracing::warn!(key = %local.id, %error, "person refresh failed");
            }
        }

        Ok(ReconcileOutcome::Updated)
    }
}

fn apply_fields(record: &mut Enrollment, payload: &UpstreamPayload) {
    record.start_date = payload.start_date;
    record.end_date = payload.end_date;
    record.days_per_week = payload.days_per_week;
    record.participation_percent = payload.participation_percent;
    record.background = payload.background.clone();
    record.content = payload.content.clone();
}
