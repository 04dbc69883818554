use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::domain::{Actor, EnrollmentId, ProgramContent, SourceSystem, Status, StatusId};
use crate::lifecycle::duration::ProgramKind;
use crate::lifecycle::status::{StatusKind, StatusReason};

/// One keyed change notification from the authoritative upstream. A missing
/// payload is a tombstone: the local record is to be removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamEnvelope {
    pub key: EnrollmentId,
    pub payload: Option<UpstreamPayload>,
}

impl UpstreamEnvelope {
    pub fn tombstone(key: EnrollmentId) -> Self {
        Self { key, payload: None }
    }

    pub fn change(key: EnrollmentId, payload: UpstreamPayload) -> Self {
        Self {
            key,
            payload: Some(payload),
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.payload.is_none()
    }
}

/// The externally-authored record state. Field names follow the upstream
/// contract; the reconciler maps them onto the local aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamPayload {
    pub id: EnrollmentId,
    pub source: SourceSystem,
    pub person_identity: String,
    pub program_id: Uuid,
    pub program_kind: ProgramKind,
    pub status: Option<UpstreamStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub days_per_week: Option<f32>,
    pub participation_percent: Option<f32>,
    pub background: Option<String>,
    pub content: ProgramContent,
    pub modified_by: Actor,
    pub modified_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Status as the upstream ships it. The id is nullable on the wire but a
/// payload without one is malformed, see [`UpstreamPayload::checked_status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamStatus {
    pub id: Option<StatusId>,
    pub kind: StatusKind,
    pub reason: Option<StatusReason>,
    pub valid_from: DateTime<Utc>,
}

/// Data-quality failures that make a notification unusable. These are
/// dropped after logging, not retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MalformedPayload {
    #[error("payload carries no status")]
    MissingStatus,
    #[error("payload status carries no id")]
    MissingStatusId,
}

impl UpstreamPayload {
    /// The authoritative status taken verbatim, keyed by the upstream's own
    /// status id so replays converge instead of stacking entries.
    pub fn checked_status(&self) -> Result<Status, MalformedPayload> {
        let status = self.status.as_ref().ok_or(MalformedPayload::MissingStatus)?;
        let id = status.id.ok_or(MalformedPayload::MissingStatusId)?;
        Ok(Status {
            id,
            kind: status.kind,
            reason: status.reason.clone(),
            valid_from: status.valid_from,
            valid_to: None,
            created_at: status.valid_from,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(status: Option<UpstreamStatus>) -> UpstreamPayload {
        UpstreamPayload {
            id: EnrollmentId::new(),
            source: SourceSystem::Canonical,
            person_identity: "01017012345".to_string(),
            program_id: Uuid::new_v4(),
            program_kind: ProgramKind::FollowUp,
            status,
            start_date: None,
            end_date: None,
            days_per_week: None,
            participation_percent: None,
            background: None,
            content: ProgramContent::default(),
            modified_by: Actor::new("system", "0000"),
            modified_at: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn status_is_required() {
        assert_eq!(
            payload(None).checked_status(),
            Err(MalformedPayload::MissingStatus)
        );
    }

    #[test]
    fn status_id_is_required() {
        let missing_id = payload(Some(UpstreamStatus {
            id: None,
            kind: StatusKind::Participating,
            reason: None,
            valid_from: Utc::now(),
        }));
        assert_eq!(
            missing_id.checked_status(),
            Err(MalformedPayload::MissingStatusId)
        );
    }

    #[test]
    fn checked_status_is_taken_verbatim() {
        let id = StatusId::new();
        let valid_from = Utc::now();
        let from_upstream = payload(Some(UpstreamStatus {
            id: Some(id),
            kind: StatusKind::Participating,
            reason: None,
            valid_from,
        }));

        let status = from_upstream.checked_status().expect("status is present");
        assert_eq!(status.id, id);
        assert_eq!(status.kind, StatusKind::Participating);
        assert_eq!(status.valid_from, valid_from);
        assert_eq!(status.valid_to, None);
    }
}
