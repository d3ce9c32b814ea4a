//! Occurrence resolution for recurring events.
//!
//! # Responsibility
//! - Answer "when is the next occurrence?" and "does this event fall on this
//!   date?" for solar and lunar event definitions.
//!
//! # Invariants
//! - Both queries consume the same per-event recurrence rule, so they cannot
//!   drift apart on which date an occurrence lands on.
//! - Resolution is pure: no storage, clock, or network access.
//!
//! # See also
//! - docs/architecture/occurrence-resolution.md

pub mod occurrence;
