//! Event use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD entry points for core callers.
//! - Join stored events with occurrence resolution for the two consumer
//!   feeds: upcoming events (dashboard) and range occurrences (calendar).
//!
//! # Invariants
//! - Reference dates and ranges always come from the caller.
//! - Events without a resolvable occurrence degrade to absence in feed
//!   output, never to a failed query.

use crate::convert::lunisolar::LunisolarConverter;
use crate::model::event::{EventDefinition, EventId};
use crate::repo::event_repo::{EventListQuery, EventRepository, RepoError, RepoResult};
use crate::resolve::occurrence::{nearest_occurrence, occurs_on, ResolvedOccurrence};
use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

/// One entry of the upcoming-events feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingEvent {
    pub event: EventDefinition,
    /// Nearest occurrence on/after the requested reference date.
    pub occurs_on: ResolvedOccurrence,
    /// Whole days between the reference date and `occurs_on`; 0 means the
    /// event occurs on the reference date itself.
    pub days_until: i64,
}

/// One concrete occurrence inside a requested date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    /// Stable per-day identifier, `<event uuid>_<yyyymmdd>`.
    pub uid: String,
    pub event_uuid: EventId,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
}

/// Use-case service joining event storage with occurrence resolution.
pub struct EventService<R: EventRepository, C: LunisolarConverter> {
    repo: R,
    converter: C,
}

impl<R: EventRepository, C: LunisolarConverter> EventService<R, C> {
    /// Creates a service over the provided repository and converter.
    pub fn new(repo: R, converter: C) -> Self {
        Self { repo, converter }
    }

    /// Creates a new event through repository persistence.
    pub fn create_event(&self, event: &EventDefinition) -> RepoResult<EventId> {
        self.repo.create_event(event)
    }

    /// Updates an existing event by stable ID.
    ///
    /// Returns repository-level not-found or validation errors unchanged.
    pub fn update_event(&self, event: &EventDefinition) -> RepoResult<()> {
        self.repo.update_event(event)
    }

    /// Gets one event by ID.
    pub fn get_event(&self, id: EventId) -> RepoResult<Option<EventDefinition>> {
        self.repo.get_event(id)
    }

    /// Lists events using filter and pagination options.
    pub fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<EventDefinition>> {
        self.repo.list_events(query)
    }

    /// Deletes an event by ID.
    pub fn delete_event(&self, id: EventId) -> RepoResult<()> {
        self.repo.delete_event(id)
    }

    /// Resolves the nearest occurrence of one stored event.
    ///
    /// Returns `Ok(None)` when the event exists but its fields cannot
    /// resolve to a date.
    pub fn next_occurrence(
        &self,
        id: EventId,
        reference: NaiveDate,
    ) -> RepoResult<Option<ResolvedOccurrence>> {
        let event = self.repo.get_event(id)?.ok_or(RepoError::NotFound(id))?;
        Ok(nearest_occurrence(&event, reference, &self.converter))
    }

    /// Builds the upcoming-events feed for dashboard consumers.
    ///
    /// Every stored event contributes its nearest occurrence and a
    /// day countdown; unresolvable events are omitted. Entries are ordered
    /// by occurrence date, then title.
    pub fn upcoming(&self, reference: NaiveDate) -> RepoResult<Vec<UpcomingEvent>> {
        let events = self.repo.list_events(&EventListQuery::default())?;
        let mut feed = Vec::with_capacity(events.len());

        for event in events {
            match nearest_occurrence(&event, reference, &self.converter) {
                Some(occurs_on) => {
                    let days_until = (occurs_on - reference).num_days();
                    feed.push(UpcomingEvent {
                        event,
                        occurs_on,
                        days_until,
                    });
                }
                None => {
                    debug!(
                        "event=upcoming_skip module=service status=none event_uuid={}",
                        event.uuid
                    );
                }
            }
        }

        feed.sort_by(|a, b| (a.occurs_on, &a.event.title).cmp(&(b.occurs_on, &b.event.title)));
        Ok(feed)
    }

    /// Enumerates event occurrences across an inclusive date range.
    ///
    /// A reversed range yields an empty list. Results are ordered by date,
    /// then title.
    pub fn occurrences_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<Occurrence>> {
        let mut occurrences = Vec::new();
        if start > end {
            return Ok(occurrences);
        }

        let events = self.repo.list_events(&EventListQuery::default())?;
        for date in start.iter_days().take_while(|date| *date <= end) {
            for event in &events {
                if occurs_on(event, date, &self.converter) {
                    occurrences.push(Occurrence {
                        uid: format!("{}_{}", event.uuid, date.format("%Y%m%d")),
                        event_uuid: event.uuid,
                        title: event.title.clone(),
                        description: event.description.clone(),
                        date,
                    });
                }
            }
        }

        occurrences.sort_by(|a, b| (a.date, &a.title).cmp(&(b.date, &b.title)));
        Ok(occurrences)
    }
}
