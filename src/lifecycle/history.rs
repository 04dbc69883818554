use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::consent::{Consent, Decision};
use super::domain::{Actor, ConsentId, DecisionId, Enrollment, SourceSystem, StatusId};
use super::mutation::Mutation;
use super::repository::{NameDirectory, NameResolver, ResolverError};

/// Everything that can appear on an enrollment's timeline. The match in
/// [`HistoryAggregator::render`] is exhaustive on purpose: a new entry kind
/// must be wired through presentation before the crate compiles again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEntry {
    Change {
        id: Uuid,
        change: Mutation,
        actor: Actor,
        at: DateTime<Utc>,
    },
    DecisionRef {
        decision_id: DecisionId,
        at: DateTime<Utc>,
    },
    ConsentRef {
        consent_id: ConsentId,
        at: DateTime<Utc>,
    },
    Import {
        source: SourceSystem,
        status_id: StatusId,
        at: DateTime<Utc>,
    },
    CoordinatorAction {
        action: CoordinatorActionKind,
        actor: Actor,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorActionKind {
    SharedWithProvider,
    RevokedProviderShare,
}

impl CoordinatorActionKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::SharedWithProvider => "Shared with provider",
            Self::RevokedProviderShare => "Provider share revoked",
        }
    }
}

impl HistoryEntry {
    /// Each variant reads its ordering key from its own timestamp field.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            HistoryEntry::Change { at, .. }
            | HistoryEntry::DecisionRef { at, .. }
            | HistoryEntry::ConsentRef { at, .. }
            | HistoryEntry::Import { at, .. }
            | HistoryEntry::CoordinatorAction { at, .. } => *at,
        }
    }

    fn actor(&self) -> Option<&Actor> {
        match self {
            HistoryEntry::Change { actor, .. } | HistoryEntry::CoordinatorAction { actor, .. } => {
                Some(actor)
            }
            HistoryEntry::DecisionRef { .. }
            | HistoryEntry::ConsentRef { .. }
            | HistoryEntry::Import { .. } => None,
        }
    }
}

/// Presentation row: the typed entry plus resolved display names.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub at: DateTime<Utc>,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
    pub entry: HistoryEntry,
}

/// Read-only merge of every event kind attached to an enrollment into one
/// correctly ordered timeline.
pub struct HistoryAggregator<N> {
    names: Arc<N>,
}

impl<N: NameResolver> HistoryAggregator<N> {
    pub fn new(names: Arc<N>) -> Self {
        Self { names }
    }

    /// Most recent first. Undecided decisions and ungranted consents are not
    /// part of history yet and are left out. Equal timestamps keep their
    /// input order.
    pub fn render(
        &self,
        record: &Enrollment,
        consents: &[Consent],
        decisions: &[Decision],
    ) -> Result<Vec<HistoryView>, ResolverError> {
        let mut entries: Vec<HistoryEntry> = record.history().to_vec();

        for consent in consents {
            if let Some(at) = consent.granted_at {
                entries.push(HistoryEntry::ConsentRef {
                    consent_id: consent.id,
                    at,
                });
            }
        }
        for decision in decisions {
            if let Some(at) = decision.decided_at {
                entries.push(HistoryEntry::DecisionRef {
                    decision_id: decision.id,
                    at,
                });
            }
        }

        let directory = self.resolve_directory(&entries)?;

        let mut views: Vec<HistoryView> = entries
            .into_iter()
            .map(|entry| view_of(entry, &directory))
            .collect();
        views.sort_by(|a, b| b.at.cmp(&a.at));
        Ok(views)
    }

    fn resolve_directory(&self, entries: &[HistoryEntry]) -> Result<NameDirectory, ResolverError> {
        let mut actor_ids: Vec<String> = Vec::new();
        let mut unit_ids: Vec<String> = Vec::new();
        for entry in entries {
            if let Some(actor) = entry.actor() {
                if !actor_ids.contains(&actor.id) {
                    actor_ids.push(actor.id.clone());
                }
                if !unit_ids.contains(&actor.unit) {
                    unit_ids.push(actor.unit.clone());
                }
            }
        }
        self.names.resolve_names(&actor_ids, &unit_ids)
    }
}

fn view_of(entry: HistoryEntry, directory: &NameDirectory) -> HistoryView {
    let label = match &entry {
        HistoryEntry::Change { change, .. } => change.kind().label(),
        HistoryEntry::DecisionRef { .. } => "Decision made",
        HistoryEntry::ConsentRef { .. } => "Consent granted",
        HistoryEntry::Import { source, .. } => match source {
            SourceSystem::Canonical => "Updated from case processing",
            SourceSystem::Legacy => "Imported from legacy register",
        },
        HistoryEntry::CoordinatorAction { action, .. } => action.label(),
    };

    let (actor_name, unit_name) = match entry.actor() {
        Some(actor) => (
            directory.actor(&actor.id).map(str::to_string),
            directory.unit(&actor.unit).map(str::to_string),
        ),
        None => (None, None),
    };

    HistoryView {
        at: entry.occurred_at(),
        label,
        actor_name,
        unit_name,
        entry,
    }
}
