//! Core domain logic for Solunar.
//! Every rule about events and their dates lives here; embedding
//! processes stay thin.

pub mod convert;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod resolve;
pub mod service;

pub use convert::lunisolar::{ConvertError, IcuLunisolarConverter, LunarDate, LunisolarConverter};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::event::{
    CalendarSystem, EventDefinition, EventId, EventValidationError, Recurrence,
};
pub use repo::event_repo::{
    EventListQuery, EventRepository, RepoError, RepoResult, SqliteEventRepository,
};
pub use resolve::occurrence::{nearest_occurrence, occurs_on, ResolvedOccurrence};
pub use service::event_service::{EventService, Occurrence, UpcomingEvent};

/// Version of the core library, for startup logs and support bundles.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
