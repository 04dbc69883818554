use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Actor, ProgramContent};
use super::status::{StatusKind, StatusReason};

/// One requested change to an enrollment. Each variant carries exactly the
/// fields that kind of change is allowed to touch, so "which fields can this
/// mutation change" is part of the type, not a convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    RegisterDraft {
        background: Option<String>,
        content: ProgramContent,
    },
    EditBackground {
        background: Option<String>,
    },
    EditContent {
        content: ProgramContent,
    },
    EditAttendance {
        participation_percent: f32,
        days_per_week: Option<f32>,
    },
    SetStartDate {
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    },
    ExtendParticipation {
        end_date: NaiveDate,
    },
    ConcludeParticipation {
        end_date: NaiveDate,
        reason: StatusReason,
    },
    WithdrawAsNotEligible {
        reason: StatusReason,
    },
    CorrectEndReason {
        reason: StatusReason,
    },
    CorrectEndDate {
        end_date: NaiveDate,
    },
    SharePendingSignup,
    GrantSignup,
    CancelSignup,
}

/// Discriminant-only view of [`Mutation`] used as the history tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    RegisterDraft,
    EditBackground,
    EditContent,
    EditAttendance,
    SetStartDate,
    ExtendParticipation,
    ConcludeParticipation,
    WithdrawAsNotEligible,
    CorrectEndReason,
    CorrectEndDate,
    SharePendingSignup,
    GrantSignup,
    CancelSignup,
}

impl MutationKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::RegisterDraft => "Draft registered",
            Self::EditBackground => "Background updated",
            Self::EditContent => "Content updated",
            Self::EditAttendance => "Attendance updated",
            Self::SetStartDate => "Start date set",
            Self::ExtendParticipation => "Participation extended",
            Self::ConcludeParticipation => "Participation concluded",
            Self::WithdrawAsNotEligible => "Withdrawn as not eligible",
            Self::CorrectEndReason => "End reason corrected",
            Self::CorrectEndDate => "End date corrected",
            Self::SharePendingSignup => "Signup proposal shared",
            Self::GrantSignup => "Signup granted",
            Self::CancelSignup => "Signup cancelled",
        }
    }
}

impl Mutation {
    pub const fn kind(&self) -> MutationKind {
        match self {
            Self::RegisterDraft { .. } => MutationKind::RegisterDraft,
            Self::EditBackground { .. } => MutationKind::EditBackground,
            Self::EditContent { .. } => MutationKind::EditContent,
            Self::EditAttendance { .. } => MutationKind::EditAttendance,
            Self::SetStartDate { .. } => MutationKind::SetStartDate,
            Self::ExtendParticipation { .. } => MutationKind::ExtendParticipation,
            Self::ConcludeParticipation { .. } => MutationKind::ConcludeParticipation,
            Self::WithdrawAsNotEligible { .. } => MutationKind::WithdrawAsNotEligible,
            Self::CorrectEndReason { .. } => MutationKind::CorrectEndReason,
            Self::CorrectEndDate { .. } => MutationKind::CorrectEndDate,
            Self::SharePendingSignup => MutationKind::SharePendingSignup,
            Self::GrantSignup => MutationKind::GrantSignup,
            Self::CancelSignup => MutationKind::CancelSignup,
        }
    }

    /// Whether this mutation may be requested while the enrollment sits in
    /// `current`. Each kind only picks which rule applies; the editability
    /// and terminality classification itself lives on [`StatusKind`].
    pub const fn allowed_in(&self, current: StatusKind) -> bool {
        match self {
            Self::RegisterDraft { .. } | Self::SharePendingSignup => {
                matches!(current, StatusKind::Draft)
            }
            Self::EditBackground { .. } | Self::EditContent { .. } | Self::EditAttendance { .. } => {
                current.allows_content_mutation()
            }
            Self::SetStartDate { .. } => {
                matches!(current, StatusKind::AwaitingStart | StatusKind::Participating)
            }
            Self::ExtendParticipation { .. } => matches!(current, StatusKind::Participating),
            // Also reachable after leaving so a replayed conclusion is told
            // apart as a no-op instead of a blanket wrong-status.
            Self::ConcludeParticipation { .. } => {
                matches!(current, StatusKind::Participating) || current.allows_end_correction()
            }
            Self::WithdrawAsNotEligible { .. } => !current.is_terminal(),
            Self::CorrectEndReason { .. } | Self::CorrectEndDate { .. } => {
                current.allows_end_correction()
            }
            Self::GrantSignup | Self::CancelSignup => {
                matches!(current, StatusKind::Draft | StatusKind::PendingSignup)
            }
        }
    }

    /// The status this mutation moves the record into, when it moves it at
    /// all. Correcting the end reason re-opens `Left` with the new reason so
    /// the superseded entry keeps its closed interval.
    pub fn target_status(&self) -> Option<(StatusKind, Option<StatusReason>)> {
        match self {
            Self::ConcludeParticipation { reason, .. } => {
                Some((StatusKind::Left, Some(reason.clone())))
            }
            Self::WithdrawAsNotEligible { reason } => {
                Some((StatusKind::NotEligible, Some(reason.clone())))
            }
            Self::CorrectEndReason { reason } => Some((StatusKind::Left, Some(reason.clone()))),
            Self::SharePendingSignup => Some((StatusKind::PendingSignup, None)),
            Self::GrantSignup => Some((StatusKind::AwaitingStart, None)),
            Self::CancelSignup => Some((StatusKind::CancelledSignup, None)),
            Self::RegisterDraft { .. }
            | Self::EditBackground { .. }
            | Self::EditContent { .. }
            | Self::EditAttendance { .. }
            | Self::SetStartDate { .. }
            | Self::ExtendParticipation { .. }
            | Self::CorrectEndDate { .. } => None,
        }
    }

    /// Reasons attached anywhere in the mutation, for shared validation.
    pub fn reason(&self) -> Option<&StatusReason> {
        match self {
            Self::ConcludeParticipation { reason, .. }
            | Self::WithdrawAsNotEligible { reason }
            | Self::CorrectEndReason { reason } => Some(reason),
            _ => None,
        }
    }
}

/// A mutation together with the actor requesting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRequest {
    pub mutation: Mutation,
    pub actor: Actor,
}

impl MutationRequest {
    pub fn new(mutation: Mutation, actor: Actor) -> Self {
        Self { mutation, actor }
    }
}
