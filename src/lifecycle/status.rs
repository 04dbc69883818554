use serde::{Deserialize, Serialize};

/// Phases an enrollment moves through, from the case worker's first draft to
/// one of the terminal outcomes. Every other module consults the
/// classification predicates below instead of hard-coding status sets, so
/// this table is the single place editability policy lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Draft,
    PendingSignup,
    CancelledSignup,
    AppliedIn,
    UnderAssessment,
    Waitlisted,
    AwaitingStart,
    Participating,
    Left,
    NotEligible,
    Aborted,
    Completed,
    Misregistered,
}

impl StatusKind {
    pub const fn ordered() -> [Self; 13] {
        [
            Self::Draft,
            Self::PendingSignup,
            Self::CancelledSignup,
            Self::AppliedIn,
            Self::UnderAssessment,
            Self::Waitlisted,
            Self::AwaitingStart,
            Self::Participating,
            Self::Left,
            Self::NotEligible,
            Self::Aborted,
            Self::Completed,
            Self::Misregistered,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::PendingSignup => "Pending Signup",
            Self::CancelledSignup => "Cancelled Signup",
            Self::AppliedIn => "Applied In",
            Self::UnderAssessment => "Under Assessment",
            Self::Waitlisted => "Waitlisted",
            Self::AwaitingStart => "Awaiting Start",
            Self::Participating => "Participating",
            Self::Left => "Left",
            Self::NotEligible => "Not Eligible",
            Self::Aborted => "Aborted",
            Self::Completed => "Completed",
            Self::Misregistered => "Misregistered",
        }
    }

    /// Terminal statuses close the enrollment; no later status supersedes
    /// them through the ordinary mutation path.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::CancelledSignup
                | Self::Left
                | Self::NotEligible
                | Self::Aborted
                | Self::Completed
                | Self::Misregistered
        )
    }

    /// Whether content, date, and background mutations are accepted while an
    /// enrollment sits in this status.
    pub const fn allows_content_mutation(self) -> bool {
        matches!(
            self,
            Self::Draft | Self::PendingSignup | Self::AwaitingStart | Self::Participating
        )
    }

    /// `Left` keeps two narrow correction rule sets open (end reason and end
    /// date) even though it is terminal for every other mutation.
    pub const fn allows_end_correction(self) -> bool {
        matches!(self, Self::Left)
    }
}

/// Why an enrollment ended up in a reason-carrying status such as `Left` or
/// `NotEligible`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    Sick,
    GotJob,
    Education,
    NeedsOtherSupport,
    DidNotShow,
    Moved,
    Other,
}

impl ReasonKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sick => "Sick",
            Self::GotJob => "Got Job",
            Self::Education => "Education",
            Self::NeedsOtherSupport => "Needs Other Support",
            Self::DidNotShow => "Did Not Show",
            Self::Moved => "Moved",
            Self::Other => "Other",
        }
    }

    /// `Other` is the only kind that must carry free text.
    pub const fn requires_detail(self) -> bool {
        matches!(self, Self::Other)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReason {
    pub kind: ReasonKind,
    pub detail: Option<String>,
}

impl StatusReason {
    pub fn of(kind: ReasonKind) -> Self {
        Self { kind, detail: None }
    }

    pub fn other(detail: impl Into<String>) -> Self {
        Self {
            kind: ReasonKind::Other,
            detail: Some(detail.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_is_classified_exactly_once() {
        for kind in StatusKind::ordered() {
            let terminal = kind.is_terminal();
            let editable = kind.allows_content_mutation();
            assert!(
                !(terminal && editable),
                "{kind:?} cannot be both terminal and content-editable"
            );
        }
    }

    #[test]
    fn left_is_the_only_correctable_terminal_status() {
        for kind in StatusKind::ordered() {
            if kind.allows_end_correction() {
                assert_eq!(kind, StatusKind::Left);
                assert!(kind.is_terminal());
            }
        }
    }

    #[test]
    fn draft_and_participating_accept_content_mutations() {
        assert!(StatusKind::Draft.allows_content_mutation());
        assert!(StatusKind::Participating.allows_content_mutation());
        assert!(!StatusKind::Completed.allows_content_mutation());
        assert!(!StatusKind::Waitlisted.allows_content_mutation());
    }
}
