//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository reads with occurrence resolution into the feeds
//!   consumers render: upcoming events and calendar-range occurrences.
//! - Keep callers decoupled from storage and conversion details.
//!
//! # See also
//! - docs/architecture/occurrence-resolution.md

pub mod event_service;
