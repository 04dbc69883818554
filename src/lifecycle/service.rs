use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::consent::{CaseWorkerApproval, Consent, ConsentError, ConsentWorkflow, Decision};
use super::domain::{Actor, Enrollment, EnrollmentId, PersonRef, ProgramContent, ProgramRef};
use super::engine::TransitionEngine;
use super::history::{CoordinatorActionKind, HistoryEntry};
use super::mutation::{MutationKind, MutationRequest};
use super::repository::{
    ConsentStore, DecisionStore, EnrollmentPublisher, EnrollmentStore, PublishError, StoreError,
};
use super::validation::{RejectionReason, ValidationLimits, ValidationRuleset};

/// Input for registering a fresh draft. Person and program are resolved by
/// the caller before the record exists.
#[derive(Debug, Clone)]
pub struct NewDraft {
    pub person: PersonRef,
    pub program: ProgramRef,
    pub background: Option<String>,
    pub content: ProgramContent,
}

/// Error raised by the enrollment service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Rejected(#[from] RejectionReason),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error(transparent)]
    Consent(#[from] ConsentError),
    #[error("enrollment {0} not found")]
    NotFound(EnrollmentId),
    #[error("only unstarted drafts can be deleted")]
    NotDeletable,
}

/// Synchronous mutation path: ruleset, engine, stores, and the outbound
/// publisher composed behind one surface. Each operation validates first,
/// persists the whole aggregate once, then notifies downstream systems
/// (drafts are never published).
pub struct EnrollmentService<S, C, D, P> {
    store: Arc<S>,
    decisions: Arc<D>,
    publisher: Arc<P>,
    engine: TransitionEngine,
    workflow: ConsentWorkflow<C, D>,
}

impl<S, C, D, P> EnrollmentService<S, C, D, P>
where
    S: EnrollmentStore,
    C: ConsentStore,
    D: DecisionStore,
    P: EnrollmentPublisher,
{
    pub fn new(
        store: Arc<S>,
        consents: Arc<C>,
        decisions: Arc<D>,
        publisher: Arc<P>,
        limits: ValidationLimits,
    ) -> Self {
        let engine = TransitionEngine::new(ValidationRuleset::new(limits));
        let workflow = ConsentWorkflow::new(engine.clone(), consents, decisions.clone());
        Self {
            store,
            decisions,
            publisher,
            engine,
            workflow,
        }
    }

    pub fn get(&self, id: &EnrollmentId) -> Result<Enrollment, ServiceError> {
        self.store.get(id)?.ok_or(ServiceError::NotFound(*id))
    }

    pub fn get_for_person(&self, identity: &str) -> Result<Vec<Enrollment>, ServiceError> {
        Ok(self.store.get_for_person(identity)?)
    }

    /// Register a draft for a case worker. Drafts stay local until shared.
    pub fn create_draft(
        &self,
        draft: NewDraft,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, ServiceError> {
        let record = self.engine.register_draft(
            draft.person,
            draft.program,
            draft.background,
            draft.content,
            actor,
            now,
        )?;
        self.store.put(&record)?;
        Ok(record)
    }

    /// Apply one validated mutation and persist the result as a unit.
    pub fn apply(
        &self,
        id: &EnrollmentId,
        request: &MutationRequest,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, ServiceError> {
        let record = self.get(id)?;
        let next = self.engine.apply(&record, request, now)?;
        self.store.put(&next)?;
        self.publish_unless_draft(&next)?;
        Ok(next)
    }

    /// Share (or re-share) the signup proposal with the person.
    pub fn share_proposal(
        &self,
        id: &EnrollmentId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<(Enrollment, Consent), ServiceError> {
        let record = self.get(id)?;
        let (next, consent) = self.workflow.open_or_update_draft(&record, actor, now)?;
        self.store.put(&next)?;
        self.publish_unless_draft(&next)?;
        Ok((next, consent))
    }

    /// Approve the signup on the person's behalf.
    pub fn grant_on_behalf(
        &self,
        id: &EnrollmentId,
        approval: CaseWorkerApproval,
        now: DateTime<Utc>,
    ) -> Result<(Enrollment, Consent), ServiceError> {
        let record = self.get(id)?;
        let (next, consent) = self.workflow.grant_on_behalf(&record, approval, now)?;
        self.store.put(&next)?;
        self.publish_unless_draft(&next)?;
        Ok((next, consent))
    }

    /// Withdraw an unanswered proposal. `Ok(false)` means there was nothing
    /// to withdraw.
    pub fn withdraw(
        &self,
        id: &EnrollmentId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<bool, ServiceError> {
        let record = self.get(id)?;
        match self.workflow.withdraw_draft(&record, actor, now)? {
            Some(next) => {
                self.store.put(&next)?;
                self.publish_unless_draft(&next)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn finalize_decision(
        &self,
        id: &EnrollmentId,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<Decision, ServiceError> {
        let record = self.get(id)?;
        Ok(self.workflow.finalize_decision(&record, actor, now)?)
    }

    /// Coordinator toggle for provider sharing. Privileged: moves the flag
    /// without touching the status, in any status.
    pub fn set_provider_sharing(
        &self,
        id: &EnrollmentId,
        shared: bool,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, ServiceError> {
        let mut record = self.get(id)?;
        if record.shared_with_provider == shared {
            return Ok(record);
        }

        record.shared_with_provider = shared;
        record.modified_by = actor.clone();
        record.modified_at = now;
        record.append_history(HistoryEntry::CoordinatorAction {
            action: if shared {
                CoordinatorActionKind::SharedWithProvider
            } else {
                CoordinatorActionKind::RevokedProviderShare
            },
            actor,
            at: now,
        });
        self.store.put(&record)?;
        self.publish_unless_draft(&record)?;
        Ok(record)
    }

    /// Physically remove a record. Allowed only while it is still a draft
    /// with no decision and no change history beyond its registration.
    pub fn delete_draft(&self, id: &EnrollmentId) -> Result<(), ServiceError> {
        let record = self.get(id)?;
        if !record.is_draft() {
            return Err(ServiceError::NotDeletable);
        }
        if !self.decisions.for_enrollment(id)?.is_empty() {
            return Err(ServiceError::NotDeletable);
        }
        let mutated = record.history().iter().any(|entry| {
            matches!(
                entry,
                HistoryEntry::Change { change, .. } if change.kind() != MutationKind::RegisterDraft
            )
        });
        if mutated {
            return Err(ServiceError::NotDeletable);
        }

        Ok(self.store.delete(id)?)
    }

    fn publish_unless_draft(&self, record: &Enrollment) -> Result<(), ServiceError> {
        if record.is_draft() {
            tracing::debug!(id = %record.id, "draft enrollment is not published downstream");
            return Ok(());
        }
        self.publisher.publish(record)?;
        Ok(())
    }
}
