use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Actor, ConsentId, DecisionId, Enrollment, EnrollmentId};
use super::engine::TransitionEngine;
use super::mutation::{Mutation, MutationRequest};
use super::repository::{ConsentStore, DecisionStore, StoreError};
use super::status::StatusKind;
use super::validation::RejectionReason;

/// How long a signup proposal stays open before the pending consent lapses.
const PENDING_EXPIRY_DAYS: i64 = 14;

/// A case worker approving the signup on the person's behalf. The
/// justification is mandatory; the workflow rejects an empty one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseWorkerApproval {
    pub actor: Actor,
    pub justification: String,
}

/// A pending or completed agreement attached to an enrollment, carrying a
/// snapshot of the record as it looked when the proposal went out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consent {
    pub id: ConsentId,
    pub enrollment_id: EnrollmentId,
    pub granted_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub snapshot: serde_json::Value,
    pub approved_on_behalf: Option<CaseWorkerApproval>,
    pub created_at: DateTime<Utc>,
}

impl Consent {
    pub fn is_pending(&self) -> bool {
        self.granted_at.is_none()
    }
}

/// The formal ruling that binds an enrollment's current terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: DecisionId,
    pub enrollment_id: EnrollmentId,
    pub decided_at: Option<DateTime<Utc>>,
    pub valid_to: Option<NaiveDate>,
    pub snapshot: serde_json::Value,
    pub decided_by_case_worker: bool,
    pub created_by: Actor,
    pub created_at: DateTime<Utc>,
    pub modified_by: Actor,
    pub modified_at: DateTime<Utc>,
}

/// Error raised by the consent workflow.
#[derive(Debug, thiserror::Error)]
pub enum ConsentError {
    #[error(transparent)]
    Rejected(#[from] RejectionReason),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no undecided decision to finalize")]
    NothingToDecide,
    #[error("could not snapshot the record: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Draft → proposal → decision sub-lifecycle layered on the transition
/// engine. Every operation that moves the record does so through the engine,
/// so each consent step leaves exactly one change entry on the timeline.
///
/// The at-most-one-pending invariant holds because `pending_for` /
/// `undecided_for` are single-row lookups and both paths update the found row
/// in place (same id) instead of inserting a second one.
pub struct ConsentWorkflow<C, D> {
    engine: TransitionEngine,
    consents: Arc<C>,
    decisions: Arc<D>,
}

impl<C, D> ConsentWorkflow<C, D>
where
    C: ConsentStore,
    D: DecisionStore,
{
    pub fn new(engine: TransitionEngine, consents: Arc<C>, decisions: Arc<D>) -> Self {
        Self {
            engine,
            consents,
            decisions,
        }
    }

    /// Share (or re-share) the signup proposal. Re-snapshots the record as of
    /// this call; an existing pending consent keeps its id.
    pub fn open_or_update_draft(
        &self,
        record: &Enrollment,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<(Enrollment, Consent), ConsentError> {
        let next = if record.status().kind == StatusKind::PendingSignup {
            record.clone()
        } else {
            self.engine.apply(
                record,
                &MutationRequest::new(Mutation::SharePendingSignup, actor.clone()),
                now,
            )?
        };

        let snapshot = serde_json::to_value(&next)?;
        let consent = match self.consents.pending_for(&record.id)? {
            Some(mut pending) => {
                pending.snapshot = snapshot;
                pending.expires_at = now + Duration::days(PENDING_EXPIRY_DAYS);
                pending
            }
            None => Consent {
                id: ConsentId::new(),
                enrollment_id: record.id,
                granted_at: None,
                expires_at: now + Duration::days(PENDING_EXPIRY_DAYS),
                snapshot,
                approved_on_behalf: None,
                created_at: now,
            },
        };
        self.consents.put(&consent)?;

        Ok((next, consent))
    }

    /// Grant the signup on the person's behalf without waiting for their own
    /// answer. Reuses the pending consent's id when one exists, and opens the
    /// undecided decision that a later formal ruling will finalize.
    pub fn grant_on_behalf(
        &self,
        record: &Enrollment,
        approval: CaseWorkerApproval,
        now: DateTime<Utc>,
    ) -> Result<(Enrollment, Consent), ConsentError> {
        if approval.justification.trim().is_empty() {
            return Err(RejectionReason::MissingJustification.into());
        }

        let next = self.engine.apply(
            record,
            &MutationRequest::new(Mutation::GrantSignup, approval.actor.clone()),
            now,
        )?;
        let snapshot = serde_json::to_value(&next)?;

        let mut consent = match self.consents.pending_for(&record.id)? {
            Some(pending) => pending,
            None => Consent {
                id: ConsentId::new(),
                enrollment_id: record.id,
                granted_at: None,
                expires_at: now + Duration::days(PENDING_EXPIRY_DAYS),
                snapshot: snapshot.clone(),
                approved_on_behalf: None,
                created_at: now,
            },
        };
        consent.snapshot = snapshot.clone();
        consent.granted_at = Some(now);
        consent.approved_on_behalf = Some(approval.clone());
        self.consents.put(&consent)?;

        let decision = match self.decisions.undecided_for(&record.id)? {
            Some(mut undecided) => {
                undecided.snapshot = snapshot;
                undecided.modified_by = approval.actor;
                undecided.modified_at = now;
                undecided
            }
            None => Decision {
                id: DecisionId::new(),
                enrollment_id: record.id,
                decided_at: None,
                valid_to: None,
                snapshot,
                decided_by_case_worker: true,
                created_by: approval.actor.clone(),
                created_at: now,
                modified_by: approval.actor,
                modified_at: now,
            },
        };
        self.decisions.put(&decision)?;

        Ok((next, consent))
    }

    /// Withdraw an unanswered proposal. Past the proposal point there is
    /// nothing to withdraw, which is an expected outcome for the caller to
    /// branch on, so this returns `Ok(None)` rather than an error.
    pub fn withdraw_draft(
        &self,
        record: &Enrollment,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Option<Enrollment>, ConsentError> {
        if !matches!(
            record.status().kind,
            StatusKind::Draft | StatusKind::PendingSignup
        ) {
            return Ok(None);
        }

        let next = self.engine.apply(
            record,
            &MutationRequest::new(Mutation::CancelSignup, actor.clone()),
            now,
        )?;
        if let Some(pending) = self.consents.pending_for(&record.id)? {
            self.consents.delete(&pending.id)?;
        }

        Ok(Some(next))
    }

    /// Stamp the undecided decision, binding the record's current terms.
    pub fn finalize_decision(
        &self,
        record: &Enrollment,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<Decision, ConsentError> {
        let mut decision = self
            .decisions
            .undecided_for(&record.id)?
            .ok_or(ConsentError::NothingToDecide)?;

        decision.decided_at = Some(now);
        decision.valid_to = record.end_date;
        decision.snapshot = serde_json::to_value(record)?;
        decision.modified_by = actor;
        decision.modified_at = now;
        self.decisions.put(&decision)?;

        Ok(decision)
    }
}
