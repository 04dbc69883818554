//! Domain engine tracking a person's enrollment in a labor-market program
//! from draft through termination, kept consistent with the authoritative
//! upstream copy of the same data.
//!
//! The crate is the core only: the status/transition engine, the consent
//! workflow, the history timeline, and the upstream reconciliation contract.
//! Storage, person/program lookups, and outbound notifications are
//! collaborator traits implemented elsewhere.

pub mod config;
pub mod lifecycle;
pub mod sync;
pub mod telemetry;
