pub mod consent;
pub mod domain;
pub mod duration;
pub mod engine;
pub mod history;
pub mod mutation;
pub mod repository;
pub mod service;
pub mod status;
pub mod validation;

#[cfg(test)]
mod tests;

pub use consent::{CaseWorkerApproval, Consent, ConsentError, ConsentWorkflow, Decision};
pub use domain::{
    Actor, ConsentId, ContentItem, DecisionId, DurationAdvice, Enrollment, EnrollmentId, PersonRef,
    ProgramContent, ProgramRef, SourceSystem, Status, StatusId,
};
pub use duration::{max_duration, soft_max_duration, CapPeriod, NeedsCategory, ProgramKind};
pub use engine::TransitionEngine;
pub use history::{CoordinatorActionKind, HistoryAggregator, HistoryEntry, HistoryView};
pub use mutation::{Mutation, MutationKind, MutationRequest};
pub use repository::{
    ConsentStore, DecisionStore, EnrollmentPublisher, EnrollmentStore, NameDirectory, NameResolver,
    PersonResolver, ProgramResolver, PublishError, ResolverError, StoreError,
};
pub use service::{EnrollmentService, NewDraft, ServiceError};
pub use status::{ReasonKind, StatusKind, StatusReason};
pub use validation::{RejectionReason, ValidationLimits, ValidationRuleset};
