use super::domain::Enrollment;
use super::mutation::{Mutation, MutationKind};
use super::status::StatusKind;

/// Why a requested mutation was turned away. Callers render these as
/// user-facing messages, so the variants stay discriminable: a wrong status
/// is not a no-op is not a range failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectionReason {
    #[error("{requested:?} is not allowed while the enrollment is {current:?}")]
    WrongStatus {
        current: StatusKind,
        requested: MutationKind,
    },
    #[error("the request changes nothing")]
    NoChange,
    #[error("{field} out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: String,
    },
    #[error("a justification is required for this operation")]
    MissingJustification,
    #[error("the chosen reason requires a free-text detail")]
    MissingReasonDetail,
    #[error("the enrollment is locked and can no longer be edited")]
    NotEditable,
}

/// Field-level limits consulted by the ruleset. Loaded once from
/// configuration and shared by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationLimits {
    pub max_background_len: usize,
    pub max_content_note_len: usize,
    pub max_reason_detail_len: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_background_len: 1000,
            max_content_note_len: 500,
            max_reason_detail_len: 40,
        }
    }
}

/// Per-mutation-kind precondition checks over (current record, proposed
/// change). Validation never touches a store; a failure here means nothing
/// was written.
#[derive(Debug, Clone)]
pub struct ValidationRuleset {
    limits: ValidationLimits,
}

impl ValidationRuleset {
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ValidationLimits {
        &self.limits
    }

    pub fn validate(&self, record: &Enrollment, mutation: &Mutation) -> Result<(), RejectionReason> {
        if !record.editable {
            return Err(RejectionReason::NotEditable);
        }

        let current = record.status().kind;
        if !mutation.allowed_in(current) {
            return Err(RejectionReason::WrongStatus {
                current,
                requested: mutation.kind(),
            });
        }

        if let Some(reason) = mutation.reason() {
            self.check_reason_detail(reason.kind.requires_detail(), reason.detail.as_deref())?;
        }

        match mutation {
            Mutation::RegisterDraft {
                background,
                content,
            } => {
                // Creation path: no must-differ check, only field limits.
                self.check_background(background.as_deref())?;
                self.check_content_note(content.note.as_deref())?;
            }
            Mutation::EditBackground { background } => {
                self.check_background(background.as_deref())?;
                if *background == record.background {
                    return Err(RejectionReason::NoChange);
                }
            }
            Mutation::EditContent { content } => {
                self.check_content_note(content.note.as_deref())?;
                if *content == record.content {
                    return Err(RejectionReason::NoChange);
                }
            }
            Mutation::EditAttendance {
                participation_percent,
                days_per_week,
            } => {
                if !(*participation_percent > 0.0 && *participation_percent <= 100.0) {
                    return Err(RejectionReason::OutOfRange {
                        field: "participation_percent",
                        detail: format!("{participation_percent} must be within (0, 100]"),
                    });
                }
                if let Some(days) = days_per_week {
                    if !(*days > 0.0 && *days <= 7.0) {
                        return Err(RejectionReason::OutOfRange {
                            field: "days_per_week",
                            detail: format!("{days} must be within (0, 7]"),
                        });
                    }
                }
                if same_fraction(Some(*participation_percent), record.participation_percent)
                    && same_fraction(*days_per_week, record.days_per_week)
                {
                    return Err(RejectionReason::NoChange);
                }
            }
            Mutation::SetStartDate {
                start_date,
                end_date,
            } => {
                if let (Some(start), Some(end)) = (start_date, end_date) {
                    if end < start {
                        return Err(end_before_start(*end));
                    }
                }
                if *start_date == record.start_date && *end_date == record.end_date {
                    return Err(RejectionReason::NoChange);
                }
            }
            Mutation::ExtendParticipation { end_date } => {
                let current_end = record.end_date.ok_or(RejectionReason::OutOfRange {
                    field: "end_date",
                    detail: "cannot extend an enrollment with no end date".to_string(),
                })?;
                if *end_date <= current_end {
                    return Err(RejectionReason::OutOfRange {
                        field: "end_date",
                        detail: format!("{end_date} must move the end date past {current_end}"),
                    });
                }
            }
            Mutation::ConcludeParticipation { end_date, reason } => {
                if let Some(start) = record.start_date {
                    if *end_date < start {
                        return Err(end_before_start(*end_date));
                    }
                }
                // Already left: an identical request is a no-op, anything
                // else tries to supersede a terminal status.
                if current.allows_end_correction() {
                    if Some(*end_date) == record.end_date
                        && record.status().reason.as_ref() == Some(reason)
                    {
                        return Err(RejectionReason::NoChange);
                    }
                    return Err(RejectionReason::WrongStatus {
                        current,
                        requested: mutation.kind(),
                    });
                }
            }
            Mutation::WithdrawAsNotEligible { .. } => {}
            Mutation::CorrectEndReason { reason } => {
                if record.status().reason.as_ref() == Some(reason) {
                    return Err(RejectionReason::NoChange);
                }
            }
            Mutation::CorrectEndDate { end_date } => {
                if let Some(start) = record.start_date {
                    if *end_date < start {
                        return Err(end_before_start(*end_date));
                    }
                }
                if Some(*end_date) == record.end_date {
                    return Err(RejectionReason::NoChange);
                }
            }
            Mutation::SharePendingSignup | Mutation::GrantSignup | Mutation::CancelSignup => {}
        }

        Ok(())
    }

    fn check_background(&self, background: Option<&str>) -> Result<(), RejectionReason> {
        match background {
            Some(text) if text.chars().count() > self.limits.max_background_len => {
                Err(RejectionReason::OutOfRange {
                    field: "background",
                    detail: format!("longer than {} characters", self.limits.max_background_len),
                })
            }
            _ => Ok(()),
        }
    }

    fn check_content_note(&self, note: Option<&str>) -> Result<(), RejectionReason> {
        match note {
            Some(text) if text.chars().count() > self.limits.max_content_note_len => {
                Err(RejectionReason::OutOfRange {
                    field: "content_note",
                    detail: format!("longer than {} characters", self.limits.max_content_note_len),
                })
            }
            _ => Ok(()),
        }
    }

    fn check_reason_detail(
        &self,
        required: bool,
        detail: Option<&str>,
    ) -> Result<(), RejectionReason> {
        match detail {
            None if required => Err(RejectionReason::MissingReasonDetail),
            Some(text) if required && text.trim().is_empty() => {
                Err(RejectionReason::MissingReasonDetail)
            }
            Some(text) if text.chars().count() > self.limits.max_reason_detail_len => {
                Err(RejectionReason::OutOfRange {
                    field: "reason_detail",
                    detail: format!(
                        "longer than {} characters",
                        self.limits.max_reason_detail_len
                    ),
                })
            }
            _ => Ok(()),
        }
    }
}

impl Default for ValidationRuleset {
    fn default() -> Self {
        Self::new(ValidationLimits::default())
    }
}

fn end_before_start(end: chrono::NaiveDate) -> RejectionReason {
    RejectionReason::OutOfRange {
        field: "end_date",
        detail: format!("{end} is before the start date"),
    }
}

fn same_fraction(a: Option<f32>, b: Option<f32>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => (a - b).abs() < f32::EPSILON,
        (None, None) => true,
        _ => false,
    }
}
