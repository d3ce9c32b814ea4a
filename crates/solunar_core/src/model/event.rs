//! Event definition domain model.
//!
//! # Responsibility
//! - Define the canonical record for a solar- or lunar-dated event.
//! - Enforce field-shape invariants once, at construction and on write.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another event.
//! - `day`/`month`/`year` are expressed in the calendar system named by
//!   `calendar`; the model never carries a second calendar's fields.
//! - Recurring events never pin a `year`; only one-off events are fully
//!   dated.
//!
//! # See also
//! - docs/architecture/data-model.md

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// First year covered by the lunar conversion tables.
pub const MIN_SUPPORTED_YEAR: i32 = 1900;
/// Last year covered by the lunar conversion tables.
pub const MAX_SUPPORTED_YEAR: i32 = 2100;

/// Stable identifier for every stored event definition.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type EventId = Uuid;

/// Calendar system an event's date fields are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarSystem {
    /// Gregorian calendar.
    Solar,
    /// Traditional lunisolar calendar.
    Lunar,
}

impl CalendarSystem {
    /// Largest day-of-month value representable in this calendar.
    pub fn max_day(self) -> u8 {
        match self {
            Self::Solar => 31,
            Self::Lunar => 30,
        }
    }
}

/// Repetition rule for an event definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recurrence {
    /// Fixed single date; resolution needs `month` and `year`.
    #[serde(rename = "none")]
    Once,
    /// Repeats every month on `day`; `month`, when set, pins one month.
    #[serde(rename = "monthly")]
    Monthly,
    /// Repeats every year on `month`/`day`.
    #[serde(rename = "yearly")]
    Yearly,
}

/// Canonical record for a recurring or one-off calendar event.
///
/// Date fields are plain numbers rather than a date value because lunar
/// combinations cannot be represented by a Gregorian date type; their
/// calendrical validity is judged during resolution, per candidate year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EventDefinitionWire")]
pub struct EventDefinition {
    /// Stable global ID used for linking and per-occurrence uids.
    pub uuid: EventId,
    /// User-facing name; opaque to resolution.
    pub title: String,
    /// Calendar system the date fields below are expressed in.
    pub calendar: CalendarSystem,
    /// Repetition rule.
    pub recurrence: Recurrence,
    /// Day of month, 1-31 solar / 1-30 lunar.
    pub day: u8,
    /// Month 1-12. Required by yearly and one-off events; optional pin for
    /// monthly events.
    pub month: Option<u8>,
    /// Pinned year. Only one-off events may carry it.
    pub year: Option<i32>,
    /// Free-form notes; opaque to resolution.
    pub description: Option<String>,
}

impl EventDefinition {
    /// Creates an event with a generated stable ID.
    ///
    /// Optional fields start as `None`; callers set `month`/`year` as the
    /// recurrence needs and revalidate through the write path.
    pub fn new(
        title: impl Into<String>,
        calendar: CalendarSystem,
        recurrence: Recurrence,
        day: u8,
    ) -> Result<Self, EventValidationError> {
        Self::with_id(Uuid::new_v4(), title, calendar, recurrence, day)
    }

    /// Creates an event with a caller-provided stable ID.
    ///
    /// Used by read paths where identity already exists in storage.
    pub fn with_id(
        uuid: EventId,
        title: impl Into<String>,
        calendar: CalendarSystem,
        recurrence: Recurrence,
        day: u8,
    ) -> Result<Self, EventValidationError> {
        let event = Self {
            uuid,
            title: title.into(),
            calendar,
            recurrence,
            day,
            month: None,
            year: None,
            description: None,
        };
        event.validate()?;
        Ok(event)
    }

    /// Validates shape invariants.
    ///
    /// Shape covers identity, field ranges and the recurring-year rule.
    /// Whether the fields suffice for the recurrence (a yearly event needs
    /// `month`) is judged by resolution, which treats insufficient fields as
    /// "no occurrence" rather than an error.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.uuid.is_nil() {
            return Err(EventValidationError::NilUuid);
        }
        if self.title.trim().is_empty() {
            return Err(EventValidationError::EmptyTitle);
        }

        let max_day = self.calendar.max_day();
        if self.day < 1 || self.day > max_day {
            return Err(EventValidationError::DayOutOfRange {
                day: self.day,
                max: max_day,
            });
        }
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(EventValidationError::MonthOutOfRange(month));
            }
        }
        if let Some(year) = self.year {
            if !(MIN_SUPPORTED_YEAR..=MAX_SUPPORTED_YEAR).contains(&year) {
                return Err(EventValidationError::YearOutOfRange(year));
            }
            if self.is_recurring() {
                return Err(EventValidationError::YearOnRecurringEvent { year });
            }
        }

        Ok(())
    }

    /// Returns whether this event repeats.
    pub fn is_recurring(&self) -> bool {
        !matches!(self.recurrence, Recurrence::Once)
    }
}

/// Shape violations detected when constructing or persisting an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventValidationError {
    NilUuid,
    EmptyTitle,
    DayOutOfRange { day: u8, max: u8 },
    MonthOutOfRange(u8),
    YearOutOfRange(i32),
    YearOnRecurringEvent { year: i32 },
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "event uuid must not be nil"),
            Self::EmptyTitle => write!(f, "event title must not be empty"),
            Self::DayOutOfRange { day, max } => {
                write!(f, "event day {day} is outside 1..={max}")
            }
            Self::MonthOutOfRange(month) => {
                write!(f, "event month {month} is outside 1..=12")
            }
            Self::YearOutOfRange(year) => write!(
                f,
                "event year {year} is outside {MIN_SUPPORTED_YEAR}..={MAX_SUPPORTED_YEAR}"
            ),
            Self::YearOnRecurringEvent { year } => {
                write!(f, "recurring events must not pin a year, got {year}")
            }
        }
    }
}

impl Error for EventValidationError {}

/// Raw wire shape; promoted to `EventDefinition` through validation.
#[derive(Deserialize)]
struct EventDefinitionWire {
    uuid: EventId,
    title: String,
    calendar: CalendarSystem,
    recurrence: Recurrence,
    day: u8,
    #[serde(default)]
    month: Option<u8>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    description: Option<String>,
}

impl TryFrom<EventDefinitionWire> for EventDefinition {
    type Error = EventValidationError;

    fn try_from(wire: EventDefinitionWire) -> Result<Self, Self::Error> {
        let event = Self {
            uuid: wire.uuid,
            title: wire.title,
            calendar: wire.calendar,
            recurrence: wire.recurrence,
            day: wire.day,
            month: wire.month,
            year: wire.year,
            description: wire.description,
        };
        event.validate()?;
        Ok(event)
    }
}
