//! Nearest-occurrence and date-membership queries.
//!
//! # Responsibility
//! - Compute the earliest occurrence of an event on/after a reference date.
//! - Answer exact-date membership for calendar range scans.
//!
//! # Invariants
//! - One `OccurrenceRule` per event feeds both queries; the two operations
//!   agree on which calendar date an occurrence lands on.
//! - Malformed event data resolves to "no occurrence", never to an error:
//!   missing fields, impossible dates and converter failures all degrade the
//!   same way.
//! - Reference dates are caller-supplied; nothing here reads the clock.
//!
//! # See also
//! - docs/architecture/occurrence-resolution.md

use crate::convert::lunisolar::{LunarDate, LunisolarConverter};
use crate::model::event::{CalendarSystem, EventDefinition, Recurrence};
use chrono::{Datelike, NaiveDate};

/// Resolved occurrence date, always a Gregorian calendar date.
pub type ResolvedOccurrence = NaiveDate;

/// Upper bound for the monthly forward search, in month steps.
///
/// Thirteen steps reach the same month of the following year even when a
/// pinned month has just passed, and cover the invalid-day gaps of every
/// month in between.
const MONTH_SEARCH_HORIZON: u8 = 13;

/// Returns the earliest date on/after `reference` on which `event` occurs.
///
/// Returns `None` when the event's fields are insufficient for its
/// recurrence, when no candidate forms a real calendar date, or when the
/// converter rejects every candidate. One-off events that already passed
/// also resolve to `None`.
pub fn nearest_occurrence<C: LunisolarConverter>(
    event: &EventDefinition,
    reference: NaiveDate,
    converter: &C,
) -> Option<ResolvedOccurrence> {
    match occurrence_rule(event)? {
        OccurrenceRule::Fixed { year, month, day } => {
            let date = solar_date_for(event.calendar, year, month, day, converter)?;
            (date >= reference).then_some(date)
        }
        OccurrenceRule::MonthDay { month, day } => {
            nearest_yearly(event.calendar, month, day, reference, converter)
        }
        OccurrenceRule::DayOfMonth { month, day } => {
            nearest_monthly(event.calendar, month, day, reference, converter)
        }
    }
}

/// Returns whether `event` occurs exactly on `date`.
///
/// Probes one date at a time so range scans stay embarrassingly parallel;
/// malformed events answer `false` for every date.
pub fn occurs_on<C: LunisolarConverter>(
    event: &EventDefinition,
    date: NaiveDate,
    converter: &C,
) -> bool {
    let Some(rule) = occurrence_rule(event) else {
        return false;
    };
    let Some(probe) = field_coordinates(event.calendar, date, converter) else {
        return false;
    };

    match rule {
        OccurrenceRule::Fixed { year, month, day } => {
            probe.year == year && probe.month == month && probe.day == day
        }
        OccurrenceRule::MonthDay { month, day } => probe.month == month && probe.day == day,
        OccurrenceRule::DayOfMonth { month, day } => {
            probe.day == day && month.map_or(true, |pinned| probe.month == pinned)
        }
    }
}

/// Per-event recurrence rule shared by both queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OccurrenceRule {
    /// Single fully-dated occurrence.
    Fixed { year: i32, month: u8, day: u8 },
    /// Same month and day every year.
    MonthDay { month: u8, day: u8 },
    /// Same day every month, optionally pinned to one month.
    DayOfMonth { month: Option<u8>, day: u8 },
}

/// Field coordinates of a date expressed in one event's calendar system.
///
/// Leap months keep their base month's number here; membership treats a
/// leap-month day like its base month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldDate {
    year: i32,
    month: u8,
    day: u8,
}

/// Extracts the recurrence rule, or `None` when required fields are absent.
fn occurrence_rule(event: &EventDefinition) -> Option<OccurrenceRule> {
    match event.recurrence {
        Recurrence::Once => Some(OccurrenceRule::Fixed {
            year: event.year?,
            month: event.month?,
            day: event.day,
        }),
        Recurrence::Yearly => Some(OccurrenceRule::MonthDay {
            month: event.month?,
            day: event.day,
        }),
        Recurrence::Monthly => Some(OccurrenceRule::DayOfMonth {
            month: event.month,
            day: event.day,
        }),
    }
}

fn nearest_yearly<C: LunisolarConverter>(
    calendar: CalendarSystem,
    month: u8,
    day: u8,
    reference: NaiveDate,
    converter: &C,
) -> Option<NaiveDate> {
    for year in [reference.year(), reference.year() + 1] {
        if let Some(candidate) = solar_date_for(calendar, year, month, day, converter) {
            if candidate >= reference {
                return Some(candidate);
            }
        }
    }

    match calendar {
        CalendarSystem::Solar => None,
        // Lunar yearly keeps the following year's conversion even when it
        // precedes the reference; only a failed conversion yields nothing.
        CalendarSystem::Lunar => {
            solar_date_for(calendar, reference.year() + 1, month, day, converter)
        }
    }
}

fn nearest_monthly<C: LunisolarConverter>(
    calendar: CalendarSystem,
    pinned_month: Option<u8>,
    day: u8,
    reference: NaiveDate,
    converter: &C,
) -> Option<NaiveDate> {
    let start = field_coordinates(calendar, reference, converter)?;
    let mut year = start.year;
    let mut month = start.month;

    // Candidates that are impossible dates (day 31 in a 30-day month, day 30
    // in a short lunar month) advance the search instead of ending it.
    for _ in 0..=MONTH_SEARCH_HORIZON {
        if pinned_month.map_or(true, |pinned| month == pinned) {
            if let Some(candidate) = solar_date_for(calendar, year, month, day, converter) {
                if candidate >= reference {
                    return Some(candidate);
                }
            }
        }
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }

    None
}

/// Expresses `date` in the coordinates of `calendar`.
fn field_coordinates<C: LunisolarConverter>(
    calendar: CalendarSystem,
    date: NaiveDate,
    converter: &C,
) -> Option<FieldDate> {
    match calendar {
        CalendarSystem::Solar => Some(FieldDate {
            year: date.year(),
            month: date.month() as u8,
            day: date.day() as u8,
        }),
        CalendarSystem::Lunar => converter.solar_to_lunar(date).ok().map(|lunar| FieldDate {
            year: lunar.year,
            month: lunar.month,
            day: lunar.day,
        }),
    }
}

/// Builds the Gregorian date for field coordinates in `calendar`.
///
/// `None` covers both impossible dates and converter failures; callers
/// treat the two identically.
fn solar_date_for<C: LunisolarConverter>(
    calendar: CalendarSystem,
    year: i32,
    month: u8,
    day: u8,
    converter: &C,
) -> Option<NaiveDate> {
    match calendar {
        CalendarSystem::Solar => NaiveDate::from_ymd_opt(year, u32::from(month), u32::from(day)),
        CalendarSystem::Lunar => converter
            .lunar_to_solar(LunarDate {
                year,
                month,
                day,
                is_leap_month: false,
            })
            .ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::{nearest_occurrence, occurs_on};
    use crate::convert::lunisolar::{ConvertError, LunarDate, LunisolarConverter};
    use crate::model::event::{CalendarSystem, EventDefinition, Recurrence};
    use chrono::{Datelike, NaiveDate};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn solar_event(recurrence: Recurrence, day: u8) -> EventDefinition {
        EventDefinition::new("solar probe", CalendarSystem::Solar, recurrence, day).unwrap()
    }

    fn lunar_event(recurrence: Recurrence, day: u8) -> EventDefinition {
        EventDefinition::new("lunar probe", CalendarSystem::Lunar, recurrence, day).unwrap()
    }

    /// Converter that rejects everything, for paths that must not reach it
    /// and for converter-failure degradation.
    struct RefusingConverter;

    impl LunisolarConverter for RefusingConverter {
        fn lunar_to_solar(&self, lunar: LunarDate) -> Result<NaiveDate, ConvertError> {
            Err(ConvertError::InvalidLunarDate {
                year: lunar.year,
                month: lunar.month,
                day: lunar.day,
                is_leap_month: lunar.is_leap_month,
            })
        }

        fn solar_to_lunar(&self, solar: NaiveDate) -> Result<LunarDate, ConvertError> {
            Err(ConvertError::UnsupportedDate {
                year: solar.year(),
                month: solar.month(),
                day: solar.day(),
            })
        }
    }

    /// Converter where the current year's date is gone and the next year's
    /// conversion lands before the reference.
    struct CompressedYearConverter;

    impl LunisolarConverter for CompressedYearConverter {
        fn lunar_to_solar(&self, lunar: LunarDate) -> Result<NaiveDate, ConvertError> {
            match lunar.year {
                2025 => Ok(date(2024, 5, 1)),
                _ => Err(ConvertError::InvalidLunarDate {
                    year: lunar.year,
                    month: lunar.month,
                    day: lunar.day,
                    is_leap_month: lunar.is_leap_month,
                }),
            }
        }

        fn solar_to_lunar(&self, _solar: NaiveDate) -> Result<LunarDate, ConvertError> {
            Ok(LunarDate {
                year: 2024,
                month: 6,
                day: 1,
                is_leap_month: false,
            })
        }
    }

    #[test]
    fn one_off_event_in_the_past_resolves_to_nothing() {
        let mut event = solar_event(Recurrence::Once, 10);
        event.month = Some(6);
        event.year = Some(2024);

        let next = nearest_occurrence(&event, date(2024, 6, 11), &RefusingConverter);
        assert_eq!(next, None);

        let next = nearest_occurrence(&event, date(2024, 6, 10), &RefusingConverter);
        assert_eq!(next, Some(date(2024, 6, 10)));
    }

    #[test]
    fn missing_required_fields_resolve_to_nothing_for_both_queries() {
        let yearly_without_month = solar_event(Recurrence::Yearly, 15);

        assert_eq!(
            nearest_occurrence(&yearly_without_month, date(2024, 1, 1), &RefusingConverter),
            None
        );
        assert!(!occurs_on(
            &yearly_without_month,
            date(2024, 8, 15),
            &RefusingConverter
        ));
    }

    #[test]
    fn monthly_skips_months_without_the_target_day() {
        let event = solar_event(Recurrence::Monthly, 31);

        let next = nearest_occurrence(&event, date(2024, 4, 20), &RefusingConverter);
        assert_eq!(next, Some(date(2024, 5, 31)));
    }

    #[test]
    fn pinned_month_restricts_monthly_candidates() {
        let mut event = solar_event(Recurrence::Monthly, 31);
        event.month = Some(1);

        let next = nearest_occurrence(&event, date(2024, 12, 20), &RefusingConverter);
        assert_eq!(next, Some(date(2025, 1, 31)));

        assert!(occurs_on(&event, date(2025, 1, 31), &RefusingConverter));
        assert!(!occurs_on(&event, date(2024, 12, 31), &RefusingConverter));
    }

    #[test]
    fn converter_failure_degrades_to_no_occurrence() {
        let mut event = lunar_event(Recurrence::Yearly, 15);
        event.month = Some(8);

        assert_eq!(
            nearest_occurrence(&event, date(2024, 1, 1), &RefusingConverter),
            None
        );
        assert!(!occurs_on(&event, date(2024, 9, 17), &RefusingConverter));
    }

    #[test]
    fn lunar_yearly_falls_back_to_next_year_unverified() {
        let mut event = lunar_event(Recurrence::Yearly, 9);
        event.month = Some(9);

        // Probe year 2024 fails, probe year 2025 lands before the reference
        // and is skipped, then the fallback returns it anyway.
        let next = nearest_occurrence(&event, date(2024, 6, 1), &CompressedYearConverter);
        assert_eq!(next, Some(date(2024, 5, 1)));
    }
}
