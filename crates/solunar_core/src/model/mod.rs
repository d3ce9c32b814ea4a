//! Domain model for solar/lunar recurring events.
//!
//! # Responsibility
//! - Define the validated event record consumed by occurrence resolution.
//! - Keep one date-field shape for both calendar systems.
//!
//! # Invariants
//! - Every event is identified by a stable `EventId`.
//! - Field-shape violations are rejected at construction, never deferred to
//!   date arithmetic.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod event;
