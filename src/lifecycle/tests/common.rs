use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::lifecycle::consent::{Consent, Decision};
use crate::lifecycle::domain::{
    Actor, ConsentId, Enrollment, EnrollmentId, PersonRef, ProgramContent, ProgramRef, Status,
};
use crate::lifecycle::duration::ProgramKind;
use crate::lifecycle::engine::TransitionEngine;
use crate::lifecycle::repository::{
    ConsentStore, DecisionStore, EnrollmentPublisher, EnrollmentStore, NameDirectory, NameResolver,
    PublishError, ResolverError, StoreError,
};
use crate::lifecycle::service::EnrollmentService;
use crate::lifecycle::status::StatusKind;
use crate::lifecycle::validation::ValidationLimits;

pub(super) fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).single().expect("valid timestamp")
}

pub(super) fn actor() -> Actor {
    Actor::new("Z999123", "0314")
}

pub(super) fn person() -> PersonRef {
    PersonRef {
        id: Uuid::new_v4(),
        identity: "01017012345".to_string(),
        needs_category: None,
        has_address: true,
    }
}

pub(super) fn program() -> ProgramRef {
    ProgramRef {
        id: Uuid::new_v4(),
        kind: ProgramKind::FollowUp,
        name: "Follow-up, central district".to_string(),
    }
}

pub(super) fn draft(now: DateTime<Utc>) -> Enrollment {
    TransitionEngine::default()
        .register_draft(
            person(),
            program(),
            Some("Referred after assessment.".to_string()),
            ProgramContent::default(),
            actor(),
            now,
        )
        .expect("draft registers")
}

/// A record mid-participation, as it would look after upstream activation.
pub(super) fn participating(now: DateTime<Utc>) -> Enrollment {
    let mut record = draft(now);
    record.set_status(StatusKind::Participating, None, now);
    record.start_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1);
    record
}

pub(super) type Service =
    EnrollmentService<MemoryStore, MemoryConsents, MemoryDecisions, MemoryPublisher>;

pub(super) fn build_service() -> (
    Service,
    Arc<MemoryStore>,
    Arc<MemoryConsents>,
    Arc<MemoryDecisions>,
    Arc<MemoryPublisher>,
) {
    let store = Arc::new(MemoryStore::default());
    let consents = Arc::new(MemoryConsents::default());
    let decisions = Arc::new(MemoryDecisions::default());
    let publisher = Arc::new(MemoryPublisher::default());
    let service = EnrollmentService::new(
        store.clone(),
        consents.clone(),
        decisions.clone(),
        publisher.clone(),
        ValidationLimits::default(),
    );
    (service, store, consents, decisions, publisher)
}

#[derive(Default)]
pub(super) struct MemoryStore {
    records: Mutex<HashMap<EnrollmentId, Enrollment>>,
}

impl MemoryStore {
    pub(super) fn seed(&self, record: &Enrollment) {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .insert(record.id, record.clone());
    }
}

impl EnrollmentStore for MemoryStore {
    fn get(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("store mutex poisoned")
            .get(id)
            .cloned())
    }

    fn get_for_person(&self, identity: &str) -> Result<Vec<Enrollment>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("store mutex poisoned")
            .values()
            .filter(|record| record.person.identity == identity)
            .cloned()
            .collect())
    }

    fn put(&self, record: &Enrollment) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .insert(record.id, record.clone());
        Ok(())
    }

    fn delete(&self, id: &EnrollmentId) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .remove(id);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryConsents {
    rows: Mutex<HashMap<ConsentId, Consent>>,
}

impl MemoryConsents {
    pub(super) fn all(&self) -> Vec<Consent> {
        self.rows
            .lock()
            .expect("consent mutex poisoned")
            .values()
            .cloned()
            .collect()
    }
}

impl ConsentStore for MemoryConsents {
    fn pending_for(&self, id: &EnrollmentId) -> Result<Option<Consent>, StoreError> {
        Ok(self
            .rows
            .lock()
            .expect("consent mutex poisoned")
            .values()
            .find(|consent| consent.enrollment_id == *id && consent.is_pending())
            .cloned())
    }

    fn for_enrollment(&self, id: &EnrollmentId) -> Result<Vec<Consent>, StoreError> {
        Ok(self
            .rows
            .lock()
            .expect("consent mutex poisoned")
            .values()
            .filter(|consent| consent.enrollment_id == *id)
            .cloned()
            .collect())
    }

    fn put(&self, consent: &Consent) -> Result<(), StoreError> {
        self.rows
            .lock()
            .expect("consent mutex poisoned")
            .insert(consent.id, consent.clone());
        Ok(())
    }

    fn delete(&self, id: &ConsentId) -> Result<(), StoreError> {
        self.rows
            .lock()
            .expect("consent mutex poisoned")
            .remove(id);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryDecisions {
    rows: Mutex<Vec<Decision>>,
}

impl MemoryDecisions {
    pub(super) fn all(&self) -> Vec<Decision> {
        self.rows.lock().expect("decision mutex poisoned").clone()
    }
}

impl DecisionStore for MemoryDecisions {
    fn undecided_for(&self, id: &EnrollmentId) -> Result<Option<Decision>, StoreError> {
        Ok(self
            .rows
            .lock()
            .expect("decision mutex poisoned")
            .iter()
            .find(|decision| decision.enrollment_id == *id && decision.decided_at.is_none())
            .cloned())
    }

    fn for_enrollment(&self, id: &EnrollmentId) -> Result<Vec<Decision>, StoreError> {
        Ok(self
            .rows
            .lock()
            .expect("decision mutex poisoned")
            .iter()
            .filter(|decision| decision.enrollment_id == *id)
            .cloned()
            .collect())
    }

    fn put(&self, decision: &Decision) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().expect("decision mutex poisoned");
        match rows.iter_mut().find(|row| row.id == decision.id) {
            Some(row) => *row = decision.clone(),
            None => rows.push(decision.clone()),
        }
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryPublisher {
    events: Mutex<Vec<Enrollment>>,
}

impl MemoryPublisher {
    pub(super) fn published(&self) -> Vec<Enrollment> {
        self.events.lock().expect("publisher mutex poisoned").clone()
    }
}

impl EnrollmentPublisher for MemoryPublisher {
    fn publish(&self, record: &Enrollment) -> Result<(), PublishError> {
        self.events
            .lock()
            .expect("publisher mutex poisoned")
            .push(record.clone());
        Ok(())
    }
}

pub(super) struct UnavailableStore;

impl EnrollmentStore for UnavailableStore {
    fn get(&self, _id: &EnrollmentId) -> Result<Option<Enrollment>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn get_for_person(&self, _identity: &str) -> Result<Vec<Enrollment>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn put(&self, _record: &Enrollment) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &EnrollmentId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Fixed directory so history tests can assert resolved names.
pub(super) struct StaticNames;

impl NameResolver for StaticNames {
    fn resolve_names(
        &self,
        actor_ids: &[String],
        unit_ids: &[String],
    ) -> Result<NameDirectory, ResolverError> {
        let mut actors = BTreeMap::new();
        for id in actor_ids {
            if id == "Z999123" {
                actors.insert(id.clone(), "Kari Saksbehandler".to_string());
            }
        }
        let mut units = BTreeMap::new();
        for id in unit_ids {
            if id == "0314" {
                units.insert(id.clone(), "Central District Office".to_string());
            }
        }
        Ok(NameDirectory::new(actors, units))
    }
}

pub(super) fn open_status_count(record: &Enrollment) -> usize {
    let open_in_log = record
        .status_log()
        .iter()
        .filter(|status| status.valid_to.is_none())
        .count();
    open_in_log + usize::from(record.status().valid_to.is_none())
}

pub(super) fn all_statuses(record: &Enrollment) -> Vec<Status> {
    let mut statuses = record.status_log().to_vec();
    statuses.push(record.status().clone());
    statuses
}
