use chrono::{Datelike, NaiveDate};
use solunar_core::db::open_db_in_memory;
use solunar_core::{
    CalendarSystem, ConvertError, EventDefinition, EventService, IcuLunisolarConverter, LunarDate,
    LunisolarConverter, Recurrence, RepoError, SqliteEventRepository,
};
use uuid::Uuid;

#[test]
fn upcoming_orders_by_occurrence_and_skips_unresolvable_events() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_new(&conn).unwrap();
    let service = EventService::new(repo, IcuLunisolarConverter::new());

    let rent =
        EventDefinition::new("rent", CalendarSystem::Solar, Recurrence::Monthly, 5).unwrap();
    let mut anniversary =
        EventDefinition::new("anniversary", CalendarSystem::Solar, Recurrence::Yearly, 15)
            .unwrap();
    anniversary.month = Some(8);
    let mut new_year =
        EventDefinition::new("Lunar New Year", CalendarSystem::Lunar, Recurrence::Yearly, 1)
            .unwrap();
    new_year.month = Some(1);
    // Yearly without a month never resolves; it must not poison the feed.
    let broken =
        EventDefinition::new("broken", CalendarSystem::Solar, Recurrence::Yearly, 15).unwrap();

    service.create_event(&rent).unwrap();
    service.create_event(&anniversary).unwrap();
    service.create_event(&new_year).unwrap();
    service.create_event(&broken).unwrap();

    let feed = service.upcoming(date(2024, 6, 1)).unwrap();

    let titles: Vec<&str> = feed.iter().map(|entry| entry.event.title.as_str()).collect();
    assert_eq!(titles, ["rent", "anniversary", "Lunar New Year"]);

    assert_eq!(feed[0].occurs_on, date(2024, 6, 5));
    assert_eq!(feed[0].days_until, 4);
    assert_eq!(feed[1].occurs_on, date(2024, 8, 15));
    assert_eq!(feed[1].days_until, 75);
    assert_eq!(feed[2].occurs_on, date(2025, 1, 29));
    assert_eq!(feed[2].days_until, 242);
}

#[test]
fn upcoming_breaks_date_ties_by_title() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_new(&conn).unwrap();
    let service = EventService::new(repo, IcuLunisolarConverter::new());

    let mut party =
        EventDefinition::new("b party", CalendarSystem::Solar, Recurrence::Yearly, 5).unwrap();
    party.month = Some(6);
    let chore =
        EventDefinition::new("a chore", CalendarSystem::Solar, Recurrence::Monthly, 5).unwrap();
    service.create_event(&party).unwrap();
    service.create_event(&chore).unwrap();

    let feed = service.upcoming(date(2024, 6, 5)).unwrap();

    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].event.title, "a chore");
    assert_eq!(feed[1].event.title, "b party");
    assert_eq!(feed[0].occurs_on, date(2024, 6, 5));
    assert_eq!(feed[0].days_until, 0);
}

#[test]
fn next_occurrence_distinguishes_missing_event_from_unresolvable_event() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_new(&conn).unwrap();
    let service = EventService::new(repo, IcuLunisolarConverter::new());

    let phantom = Uuid::new_v4();
    let err = service.next_occurrence(phantom, date(2024, 6, 1)).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == phantom));

    let unresolvable =
        EventDefinition::new("no month", CalendarSystem::Solar, Recurrence::Yearly, 15).unwrap();
    let id = service.create_event(&unresolvable).unwrap();
    assert_eq!(service.next_occurrence(id, date(2024, 6, 1)).unwrap(), None);

    let rent =
        EventDefinition::new("rent", CalendarSystem::Solar, Recurrence::Monthly, 5).unwrap();
    let id = service.create_event(&rent).unwrap();
    assert_eq!(
        service.next_occurrence(id, date(2024, 6, 1)).unwrap(),
        Some(date(2024, 6, 5))
    );
}

#[test]
fn occurrences_between_enumerates_each_day_with_stable_uids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_new(&conn).unwrap();
    let service = EventService::new(repo, IcuLunisolarConverter::new());

    let mut rent =
        EventDefinition::new("rent", CalendarSystem::Solar, Recurrence::Monthly, 5).unwrap();
    rent.description = Some("transfer before noon".to_string());
    service.create_event(&rent).unwrap();

    let occurrences = service
        .occurrences_between(date(2024, 6, 1), date(2024, 8, 31))
        .unwrap();

    assert_eq!(occurrences.len(), 3);
    assert_eq!(occurrences[0].date, date(2024, 6, 5));
    assert_eq!(occurrences[1].date, date(2024, 7, 5));
    assert_eq!(occurrences[2].date, date(2024, 8, 5));

    assert_eq!(occurrences[0].uid, format!("{}_20240605", rent.uuid));
    assert_eq!(occurrences[0].event_uuid, rent.uuid);
    assert_eq!(occurrences[0].title, "rent");
    assert_eq!(
        occurrences[0].description.as_deref(),
        Some("transfer before noon")
    );
}

#[test]
fn occurrences_between_orders_by_date_then_title() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_new(&conn).unwrap();
    let service = EventService::new(repo, IcuLunisolarConverter::new());

    let mut late =
        EventDefinition::new("z checkup", CalendarSystem::Solar, Recurrence::Yearly, 5).unwrap();
    late.month = Some(6);
    let early =
        EventDefinition::new("a chore", CalendarSystem::Solar, Recurrence::Monthly, 5).unwrap();
    let mut other =
        EventDefinition::new("m visit", CalendarSystem::Solar, Recurrence::Yearly, 20).unwrap();
    other.month = Some(6);

    service.create_event(&late).unwrap();
    service.create_event(&early).unwrap();
    service.create_event(&other).unwrap();

    let occurrences = service
        .occurrences_between(date(2024, 6, 1), date(2024, 6, 30))
        .unwrap();

    let summary: Vec<(NaiveDate, &str)> = occurrences
        .iter()
        .map(|occurrence| (occurrence.date, occurrence.title.as_str()))
        .collect();
    assert_eq!(
        summary,
        [
            (date(2024, 6, 5), "a chore"),
            (date(2024, 6, 5), "z checkup"),
            (date(2024, 6, 20), "m visit"),
        ]
    );
}

#[test]
fn occurrences_between_with_reversed_range_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_new(&conn).unwrap();
    let service = EventService::new(repo, IcuLunisolarConverter::new());

    let rent =
        EventDefinition::new("rent", CalendarSystem::Solar, Recurrence::Monthly, 5).unwrap();
    service.create_event(&rent).unwrap();

    let occurrences = service
        .occurrences_between(date(2024, 8, 31), date(2024, 6, 1))
        .unwrap();
    assert!(occurrences.is_empty());
}

#[test]
fn occurrences_between_spans_calendar_year_boundaries() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_new(&conn).unwrap();
    let service = EventService::new(repo, IcuLunisolarConverter::new());

    let solar_first =
        EventDefinition::new("solar first", CalendarSystem::Solar, Recurrence::Monthly, 1)
            .unwrap();
    let lunar_first =
        EventDefinition::new("lunar first", CalendarSystem::Lunar, Recurrence::Monthly, 1)
            .unwrap();
    service.create_event(&solar_first).unwrap();
    service.create_event(&lunar_first).unwrap();

    let occurrences = service
        .occurrences_between(date(2024, 12, 15), date(2025, 1, 15))
        .unwrap();

    let summary: Vec<(NaiveDate, &str)> = occurrences
        .iter()
        .map(|occurrence| (occurrence.date, occurrence.title.as_str()))
        .collect();
    // 2024-12-31 opens the twelfth lunar month; 2025-01-01 is a solar first.
    assert_eq!(
        summary,
        [
            (date(2024, 12, 31), "lunar first"),
            (date(2025, 1, 1), "solar first"),
        ]
    );
}

#[test]
fn feeds_degrade_when_the_converter_fails() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_new(&conn).unwrap();
    let service = EventService::new(repo, FailingConverter);

    let mut lunar =
        EventDefinition::new("Lunar New Year", CalendarSystem::Lunar, Recurrence::Yearly, 1)
            .unwrap();
    lunar.month = Some(1);
    let solar =
        EventDefinition::new("rent", CalendarSystem::Solar, Recurrence::Monthly, 5).unwrap();
    let lunar_id = service.create_event(&lunar).unwrap();
    service.create_event(&solar).unwrap();

    let feed = service.upcoming(date(2024, 6, 1)).unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].event.title, "rent");

    assert_eq!(
        service.next_occurrence(lunar_id, date(2024, 6, 1)).unwrap(),
        None
    );

    let occurrences = service
        .occurrences_between(date(2024, 6, 1), date(2024, 6, 30))
        .unwrap();
    assert_eq!(occurrences.len(), 1);
    assert_eq!(occurrences[0].title, "rent");
}

/// Converter stub for degradation paths where every conversion fails.
struct FailingConverter;

impl LunisolarConverter for FailingConverter {
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

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
