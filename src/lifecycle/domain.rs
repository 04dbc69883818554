use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::duration::{max_duration, soft_max_duration, NeedsCategory, ProgramKind};
use super::history::HistoryEntry;
use super::status::{StatusKind, StatusReason};

/// Identifier wrapper for enrollments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnrollmentId(pub Uuid);

impl EnrollmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EnrollmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusId(pub Uuid);

impl StatusId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StatusId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsentId(pub Uuid);

impl ConsentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecisionId(pub Uuid);

impl DecisionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Which upstream system authored a change. The legacy system's writes take
/// precedence over records the canonical system already holds locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSystem {
    Canonical,
    Legacy,
}

/// Case worker (or system actor) attributed to a change, with the office
/// unit they acted for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub unit: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            unit: unit.into(),
        }
    }
}

/// Reference to the enrolled person as held by the person registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: Uuid,
    pub identity: String,
    pub needs_category: Option<NeedsCategory>,
    pub has_address: bool,
}

/// Reference to the program run the person is enrolled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRef {
    pub id: Uuid,
    pub kind: ProgramKind,
    pub name: String,
}

/// One checklist item the case worker selected for this enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub code: String,
    pub label: String,
}

/// Program-specific checklist selection plus optional free text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgramContent {
    pub items: Vec<ContentItem>,
    pub note: Option<String>,
}

/// One phase of the enrollment with a closed validity interval. The open
/// entry (`valid_to = None`) is the current status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: StatusId,
    pub kind: StatusKind,
    pub reason: Option<StatusReason>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Status {
    pub fn open(kind: StatusKind, reason: Option<StatusReason>, now: DateTime<Utc>) -> Self {
        Self {
            id: StatusId::new(),
            kind,
            reason,
            valid_from: now,
            valid_to: None,
            created_at: now,
        }
    }
}

/// The aggregate root tracking one person's enrollment in one program run.
///
/// The current status and the log of superseded statuses are separate fields,
/// so "exactly one open status" holds by construction, and history is only
/// reachable through [`Enrollment::append_history`], keeping it append-only.
/// Persisting the aggregate is one `put`; a status change can never be stored
/// without the history entry written in the same step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub person: PersonRef,
    pub program: ProgramRef,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub days_per_week: Option<f32>,
    pub participation_percent: Option<f32>,
    pub background: Option<String>,
    pub content: ProgramContent,
    pub editable: bool,
    pub shared_with_provider: bool,
    pub modified_by: Actor,
    pub modified_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    status: Status,
    status_log: Vec<Status>,
    history: Vec<HistoryEntry>,
}

impl Enrollment {
    /// A fresh draft as the case worker first registers it.
    pub fn draft(person: PersonRef, program: ProgramRef, actor: Actor, now: DateTime<Utc>) -> Self {
        Self {
            id: EnrollmentId::new(),
            person,
            program,
            start_date: None,
            end_date: None,
            days_per_week: None,
            participation_percent: None,
            background: None,
            content: ProgramContent::default(),
            editable: true,
            shared_with_provider: false,
            modified_by: actor,
            modified_at: now,
            created_at: now,
            status: Status::open(StatusKind::Draft, None, now),
            status_log: Vec::new(),
            history: Vec::new(),
        }
    }

    /// A record rebuilt from an authoritative upstream payload. The status is
    /// taken verbatim, ids included, so replaying the same payload converges.
    #[allow(clippy::too_many_arguments)]
    pub fn imported(
        id: EnrollmentId,
        person: PersonRef,
        program: ProgramRef,
        status: Status,
        modified_by: Actor,
        modified_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            person,
            program,
            start_date: None,
            end_date: None,
            days_per_week: None,
            participation_percent: None,
            background: None,
            content: ProgramContent::default(),
            editable: true,
            shared_with_provider: false,
            modified_by,
            modified_at,
            created_at,
            status,
            status_log: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Superseded statuses, oldest first. All carry closed intervals.
    pub fn status_log(&self) -> &[Status] {
        &self.status_log
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn is_draft(&self) -> bool {
        self.status.kind == StatusKind::Draft
    }

    /// Close the current status and open a new one in the same step.
    pub(crate) fn set_status(
        &mut self,
        kind: StatusKind,
        reason: Option<StatusReason>,
        now: DateTime<Utc>,
    ) {
        self.adopt_status(Status::open(kind, reason, now), now);
    }

    /// Like [`Enrollment::set_status`] but keeps the supplied status entry
    /// as-is, id included. Used when the status is authored upstream.
    pub(crate) fn adopt_status(&mut self, status: Status, now: DateTime<Utc>) {
        let mut superseded = std::mem::replace(&mut self.status, status);
        superseded.valid_to = Some(now);
        self.status_log.push(superseded);
    }

    pub(crate) fn append_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }

    /// The end dates the program rules advise for this enrollment, resolved
    /// against its start date. Advisory: presentation surfaces an overrun as
    /// a warning, nothing rejects on it.
    pub fn advised_duration(&self) -> DurationAdvice {
        let Some(start) = self.start_date else {
            return DurationAdvice::default();
        };
        let needs = self.person.needs_category;
        DurationAdvice {
            soft_end: soft_max_duration(self.program.kind, needs).map(|cap| cap.end_from(start)),
            hard_end: max_duration(self.program.kind, needs).map(|cap| cap.end_from(start)),
        }
    }
}

/// Advisory participation boundaries, `None` where no cap applies or no
/// start date is set yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DurationAdvice {
    pub soft_end: Option<NaiveDate>,
    pub hard_end: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> PersonRef {
        PersonRef {
            id: Uuid::new_v4(),
            identity: "01017012345".to_string(),
            needs_category: None,
            has_address: true,
        }
    }

    fn program() -> ProgramRef {
        ProgramRef {
            id: Uuid::new_v4(),
            kind: ProgramKind::FollowUp,
            name: "Follow-up, central district".to_string(),
        }
    }

    #[test]
    fn set_status_closes_the_superseded_entry() {
        let now = Utc::now();
        let mut record = Enrollment::draft(person(), program(), Actor::new("Z1", "0314"), now);
        let later = now + chrono::Duration::hours(1);

        record.set_status(StatusKind::PendingSignup, None, later);

        assert_eq!(record.status().kind, StatusKind::PendingSignup);
        assert_eq!(record.status().valid_to, None);
        assert_eq!(record.status_log().len(), 1);
        assert_eq!(record.status_log()[0].kind, StatusKind::Draft);
        assert_eq!(record.status_log()[0].valid_to, Some(later));
    }

    #[test]
    fn advised_duration_resolves_caps_against_the_start_date() {
        let now = Utc::now();
        let mut with_needs = person();
        with_needs.needs_category = Some(NeedsCategory::Situational);
        let mut record = Enrollment::draft(with_needs, program(), Actor::new("Z1", "0314"), now);

        assert_eq!(record.advised_duration(), DurationAdvice::default());

        record.start_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        let advice = record.advised_duration();
        assert_eq!(advice.soft_end, NaiveDate::from_ymd_opt(2024, 7, 1));
        assert_eq!(advice.hard_end, NaiveDate::from_ymd_opt(2025, 1, 1));
    }

    #[test]
    fn adopt_status_keeps_the_supplied_id() {
        let now = Utc::now();
        let mut record = Enrollment::draft(person(), program(), Actor::new("Z1", "0314"), now);
        let incoming = Status::open(StatusKind::Participating, None, now);
        let incoming_id = incoming.id;

        record.adopt_status(incoming, now);

        assert_eq!(record.status().id, incoming_id);
    }
}
