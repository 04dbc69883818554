use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::domain::{Actor, Enrollment, PersonRef, ProgramContent, ProgramRef};
use super::history::HistoryEntry;
use super::mutation::{Mutation, MutationRequest};
use super::validation::{RejectionReason, ValidationRuleset};

/// Applies accepted mutations to produce the next record version.
///
/// Every path through the engine follows the same steps: validate, supersede
/// the status when the mutation moves it, apply the field delta, bump the
/// modified stamp, append exactly one change entry. The result is a new
/// aggregate value; callers persist it as one unit.
#[derive(Debug, Clone)]
pub struct TransitionEngine {
    ruleset: ValidationRuleset,
}

impl TransitionEngine {
    pub fn new(ruleset: ValidationRuleset) -> Self {
        Self { ruleset }
    }

    pub fn ruleset(&self) -> &ValidationRuleset {
        &self.ruleset
    }

    pub fn apply(
        &self,
        record: &Enrollment,
        request: &MutationRequest,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, RejectionReason> {
        self.ruleset.validate(record, &request.mutation)?;

        let mut next = record.clone();
        if let Some((kind, reason)) = request.mutation.target_status() {
            next.set_status(kind, reason, now);
        }
        apply_delta(&mut next, &request.mutation);
        next.modified_by = request.actor.clone();
        next.modified_at = now;
        next.append_history(HistoryEntry::Change {
            id: Uuid::new_v4(),
            change: request.mutation.clone(),
            actor: request.actor.clone(),
            at: now,
        });

        Ok(next)
    }

    /// Same path as [`TransitionEngine::apply`] for a record that does not
    /// exist yet: the id is allocated here and the must-differ check does not
    /// apply to a fresh draft.
    pub fn register_draft(
        &self,
        person: PersonRef,
        program: ProgramRef,
        background: Option<String>,
        content: ProgramContent,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, RejectionReason> {
        let mutation = Mutation::RegisterDraft {
            background,
            content,
        };
        let mut record = Enrollment::draft(person, program, actor.clone(), now);
        self.ruleset.validate(&record, &mutation)?;

        apply_delta(&mut record, &mutation);
        record.append_history(HistoryEntry::Change {
            id: Uuid::new_v4(),
            change: mutation,
            actor,
            at: now,
        });

        Ok(record)
    }
}

impl Default for TransitionEngine {
    fn default() -> Self {
        Self::new(ValidationRuleset::default())
    }
}

fn apply_delta(record: &mut Enrollment, mutation: &Mutation) {
    match mutation {
        Mutation::RegisterDraft {
            background,
            content,
        } => {
            record.background = background.clone();
            record.content = content.clone();
        }
        Mutation::EditBackground { background } => {
            record.background = background.clone();
        }
        Mutation::EditContent { content } => {
            record.content = content.clone();
        }
        Mutation::EditAttendance {
            participation_percent,
            days_per_week,
        } => {
            record.participation_percent = Some(*participation_percent);
            record.days_per_week = *days_per_week;
        }
        Mutation::SetStartDate {
            start_date,
            end_date,
        } => {
            record.start_date = *start_date;
            record.end_date = *end_date;
        }
        Mutation::ExtendParticipation { end_date }
        | Mutation::ConcludeParticipation { end_date, .. }
        | Mutation::CorrectEndDate { end_date } => {
            record.end_date = Some(*end_date);
        }
        // Pure status moves; the transition itself is the change.
        Mutation::WithdrawAsNotEligible { .. }
        | Mutation::CorrectEndReason { .. }
        | Mutation::SharePendingSignup
        | Mutation::GrantSignup
        | Mutation::CancelSignup => {}
    }
}
