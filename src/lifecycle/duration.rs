use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Kinds of labor-market programs an enrollment can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramKind {
    Clarification,
    WorkRehabilitation,
    WorkPrepTraining,
    JobClub,
    DigitalFollowUp,
    FollowUp,
    GroupLaborMarketTraining,
    GroupVocationalTraining,
    PermanentShelteredWork,
}

impl ProgramKind {
    pub const fn ordered() -> [Self; 9] {
        [
            Self::Clarification,
            Self::WorkRehabilitation,
            Self::WorkPrepTraining,
            Self::JobClub,
            Self::DigitalFollowUp,
            Self::FollowUp,
            Self::GroupLaborMarketTraining,
            Self::GroupVocationalTraining,
            Self::PermanentShelteredWork,
        ]
    }

    /// Stable key used in configuration and on the wire.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Clarification => "clarification",
            Self::WorkRehabilitation => "work_rehabilitation",
            Self::WorkPrepTraining => "work_prep_training",
            Self::JobClub => "job_club",
            Self::DigitalFollowUp => "digital_follow_up",
            Self::FollowUp => "follow_up",
            Self::GroupLaborMarketTraining => "group_labor_market_training",
            Self::GroupVocationalTraining => "group_vocational_training",
            Self::PermanentShelteredWork => "permanent_sheltered_work",
        }
    }

    pub fn from_key(value: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|kind| kind.key() == value.trim())
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Clarification => "Clarification",
            Self::WorkRehabilitation => "Work Rehabilitation",
            Self::WorkPrepTraining => "Work Preparation Training",
            Self::JobClub => "Job Club",
            Self::DigitalFollowUp => "Digital Follow-Up",
            Self::FollowUp => "Follow-Up",
            Self::GroupLaborMarketTraining => "Group Labor Market Training",
            Self::GroupVocationalTraining => "Group Vocational Training",
            Self::PermanentShelteredWork => "Permanent Sheltered Work",
        }
    }
}

/// Needs-assessment category assigned to the person by their case office.
/// Only the follow-up program differentiates durations by this dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedsCategory {
    Standard,
    Situational,
    SpeciallyAdapted,
    PartiallyPermanentlyAdapted,
    PermanentlyAdapted,
}

/// A participation cap expressed in the unit the program rules use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapPeriod {
    Weeks(u32),
    Months(u32),
    Years(u32),
}

impl CapPeriod {
    /// Resolve the cap against a concrete start date.
    pub fn end_from(self, start: NaiveDate) -> NaiveDate {
        match self {
            CapPeriod::Weeks(weeks) => start + Duration::weeks(i64::from(weeks)),
            CapPeriod::Months(months) => start + Months::new(months),
            CapPeriod::Years(years) => start + Months::new(years * 12),
        }
    }
}

/// Upper bound on participation for a program kind, or `None` when no cap
/// applies. The policy computes a boundary; callers surface it as a warning
/// and never reject on it.
pub fn max_duration(program: ProgramKind, needs: Option<NeedsCategory>) -> Option<CapPeriod> {
    match program {
        ProgramKind::Clarification => Some(CapPeriod::Weeks(12)),
        ProgramKind::WorkRehabilitation => Some(CapPeriod::Weeks(52)),
        ProgramKind::WorkPrepTraining => Some(CapPeriod::Years(3)),
        ProgramKind::JobClub => Some(CapPeriod::Months(6)),
        ProgramKind::DigitalFollowUp => Some(CapPeriod::Months(6)),
        ProgramKind::FollowUp => match needs? {
            NeedsCategory::Standard | NeedsCategory::Situational => Some(CapPeriod::Years(1)),
            NeedsCategory::SpeciallyAdapted
            | NeedsCategory::PartiallyPermanentlyAdapted
            | NeedsCategory::PermanentlyAdapted => Some(CapPeriod::Years(3)),
        },
        ProgramKind::GroupLaborMarketTraining => Some(CapPeriod::Years(1)),
        ProgramKind::GroupVocationalTraining => Some(CapPeriod::Years(2)),
        ProgramKind::PermanentShelteredWork => None,
    }
}

/// Soft boundary used to prompt a review before the hard cap is reached.
pub fn soft_max_duration(program: ProgramKind, needs: Option<NeedsCategory>) -> Option<CapPeriod> {
    match program {
        ProgramKind::Clarification => Some(CapPeriod::Weeks(4)),
        ProgramKind::WorkRehabilitation => Some(CapPeriod::Weeks(12)),
        ProgramKind::WorkPrepTraining => Some(CapPeriod::Years(1)),
        ProgramKind::JobClub => Some(CapPeriod::Weeks(6)),
        ProgramKind::DigitalFollowUp => Some(CapPeriod::Weeks(8)),
        ProgramKind::FollowUp => match needs? {
            NeedsCategory::Standard | NeedsCategory::Situational => Some(CapPeriod::Months(6)),
            NeedsCategory::SpeciallyAdapted
            | NeedsCategory::PartiallyPermanentlyAdapted
            | NeedsCategory::PermanentlyAdapted => Some(CapPeriod::Years(1)),
        },
        ProgramKind::GroupLaborMarketTraining
        | ProgramKind::GroupVocationalTraining
        | ProgramKind::PermanentShelteredWork => None,
    }
}
