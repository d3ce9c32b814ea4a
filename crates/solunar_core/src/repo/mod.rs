//! Persistence layer for event records.
//!
//! # Responsibility
//! - Define the data access contract the service layer programs against.
//! - Keep SQL text and row mapping out of business orchestration.
//!
//! # Invariants
//! - Writes run `EventDefinition::validate()` before touching SQL and null
//!   the inactive calendar columns.
//! - Lookups distinguish `NotFound` from transport failures.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod event_repo;
