//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `solunar_core` linkage.
//! - Exercise the storage and resolution stack end to end against an
//!   in-memory database for quick local sanity checks.

use chrono::Local;
use solunar_core::{
    db, CalendarSystem, EventDefinition, EventService, IcuLunisolarConverter, Recurrence,
    SqliteEventRepository,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("solunar_core version={}", solunar_core::core_version());

    let conn = db::open_db_in_memory()?;
    let repo = SqliteEventRepository::try_new(&conn)?;
    let service = EventService::new(repo, IcuLunisolarConverter::new());

    let mut event =
        EventDefinition::new("Lunar New Year", CalendarSystem::Lunar, Recurrence::Yearly, 1)?;
    event.month = Some(1);
    let id = service.create_event(&event)?;

    let today = Local::now().date_naive();
    match service.next_occurrence(id, today)? {
        Some(date) => println!("next Lunar New Year on/after {today}: {date}"),
        None => println!("next Lunar New Year on/after {today}: unresolved"),
    }

    Ok(())
}
