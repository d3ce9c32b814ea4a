//! Event repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over persisted `events` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate the model and null the inactive calendar triple,
//!   so stale fields cannot survive a calendar-system switch.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Deletion removes the row; there are no tombstones.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::event::{
    CalendarSystem, EventDefinition, EventId, EventValidationError, Recurrence,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const EVENT_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    calendar,
    recurrence,
    lunar_day,
    lunar_month,
    lunar_year,
    solar_day,
    solar_month,
    solar_year,
    description
FROM events";

const EVENTS_TABLE: &str = "events";

const REQUIRED_EVENT_COLUMNS: [&str; 13] = [
    "uuid",
    "title",
    "calendar",
    "recurrence",
    "lunar_day",
    "lunar_month",
    "lunar_year",
    "solar_day",
    "solar_month",
    "solar_year",
    "description",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for event persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Model shape violation caught before or after SQL.
    Validation(EventValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target event does not exist.
    NotFound(EventId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "event not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "event repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "event repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "event repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted event data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<EventValidationError> for RepoError {
    fn from(value: EventValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing events.
#[derive(Debug, Clone, Default)]
pub struct EventListQuery {
    pub calendar: Option<CalendarSystem>,
    pub recurrence: Option<Recurrence>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for event CRUD operations.
pub trait EventRepository {
    fn create_event(&self, event: &EventDefinition) -> RepoResult<EventId>;
    fn update_event(&self, event: &EventDefinition) -> RepoResult<()>;
    fn get_event(&self, id: EventId) -> RepoResult<Option<EventDefinition>>;
    fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<EventDefinition>>;
    fn delete_event(&self, id: EventId) -> RepoResult<()>;
}

/// SQLite-backed event repository.
pub struct SqliteEventRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEventRepository<'conn> {
    /// Creates a repository after verifying the connection is migrated and
    /// carries the expected schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_event_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl EventRepository for SqliteEventRepository<'_> {
    fn create_event(&self, event: &EventDefinition) -> RepoResult<EventId> {
        event.validate()?;
        let fields = CalendarColumns::split(event);

        self.conn.execute(
            "INSERT INTO events (
                uuid,
                title,
                calendar,
                recurrence,
                lunar_day,
                lunar_month,
                lunar_year,
                solar_day,
                solar_month,
                solar_year,
                description
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                event.uuid.to_string(),
                event.title.as_str(),
                calendar_to_db(event.calendar),
                recurrence_to_db(event.recurrence),
                fields.lunar_day,
                fields.lunar_month,
                fields.lunar_year,
                fields.solar_day,
                fields.solar_month,
                fields.solar_year,
                event.description.as_deref(),
            ],
        )?;

        Ok(event.uuid)
    }

    fn update_event(&self, event: &EventDefinition) -> RepoResult<()> {
        event.validate()?;
        let fields = CalendarColumns::split(event);

        let changed = self.conn.execute(
            "UPDATE events
             SET
                title = ?1,
                calendar = ?2,
                recurrence = ?3,
                lunar_day = ?4,
                lunar_month = ?5,
                lunar_year = ?6,
                solar_day = ?7,
                solar_month = ?8,
                solar_year = ?9,
                description = ?10,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?11;",
            params![
                event.title.as_str(),
                calendar_to_db(event.calendar),
                recurrence_to_db(event.recurrence),
                fields.lunar_day,
                fields.lunar_month,
                fields.lunar_year,
                fields.solar_day,
                fields.solar_month,
                fields.solar_year,
                event.description.as_deref(),
                event.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(event.uuid));
        }

        Ok(())
    }

    fn get_event(&self, id: EventId) -> RepoResult<Option<EventDefinition>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EVENT_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_event_row(row)?));
        }

        Ok(None)
    }

    fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<EventDefinition>> {
        let mut sql = format!("{EVENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(calendar) = query.calendar {
            sql.push_str(" AND calendar = ?");
            bind_values.push(Value::Text(calendar_to_db(calendar).to_string()));
        }

        if let Some(recurrence) = query.recurrence {
            sql.push_str(" AND recurrence = ?");
            bind_values.push(Value::Text(recurrence_to_db(recurrence).to_string()));
        }

        sql.push_str(" ORDER BY updated_at DESC, uuid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut events = Vec::new();

        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }

        Ok(events)
    }

    fn delete_event(&self, id: EventId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM events WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

/// The six persisted date columns for one event.
///
/// The inactive calendar's columns are always written as NULL.
struct CalendarColumns {
    lunar_day: Option<i64>,
    lunar_month: Option<i64>,
    lunar_year: Option<i64>,
    solar_day: Option<i64>,
    solar_month: Option<i64>,
    solar_year: Option<i64>,
}

impl CalendarColumns {
    fn split(event: &EventDefinition) -> Self {
        let day = Some(i64::from(event.day));
        let month = event.month.map(i64::from);
        let year = event.year.map(i64::from);

        match event.calendar {
            CalendarSystem::Solar => Self {
                lunar_day: None,
                lunar_month: None,
                lunar_year: None,
                solar_day: day,
                solar_month: month,
                solar_year: year,
            },
            CalendarSystem::Lunar => Self {
                lunar_day: day,
                lunar_month: month,
                lunar_year: year,
                solar_day: None,
                solar_month: None,
                solar_year: None,
            },
        }
    }
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<EventDefinition> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in events.uuid"))
    })?;

    let calendar_text: String = row.get("calendar")?;
    let calendar = parse_calendar(&calendar_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid calendar tag `{calendar_text}` in events.calendar"
        ))
    })?;

    let recurrence_text: String = row.get("recurrence")?;
    let recurrence = parse_recurrence(&recurrence_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid recurrence tag `{recurrence_text}` in events.recurrence"
        ))
    })?;

    let lunar = read_date_columns(row, "lunar_day", "lunar_month", "lunar_year")?;
    let solar = read_date_columns(row, "solar_day", "solar_month", "solar_year")?;

    let (active, inactive, inactive_name) = match calendar {
        CalendarSystem::Solar => (solar, lunar, "lunar"),
        CalendarSystem::Lunar => (lunar, solar, "solar"),
    };

    if inactive.0.is_some() || inactive.1.is_some() || inactive.2.is_some() {
        return Err(RepoError::InvalidData(format!(
            "{inactive_name} fields populated on {calendar_text} event `{uuid_text}`"
        )));
    }

    let Some(day) = active.0 else {
        return Err(RepoError::InvalidData(format!(
            "missing day value for event `{uuid_text}`"
        )));
    };

    let event = EventDefinition {
        uuid,
        title: row.get("title")?,
        calendar,
        recurrence,
        day: column_to_u8(day, "day", &uuid_text)?,
        month: active
            .1
            .map(|month| column_to_u8(month, "month", &uuid_text))
            .transpose()?,
        year: active
            .2
            .map(|year| column_to_i32(year, "year", &uuid_text))
            .transpose()?,
        description: row.get("description")?,
    };
    event.validate()?;
    Ok(event)
}

fn read_date_columns(
    row: &Row<'_>,
    day: &str,
    month: &str,
    year: &str,
) -> RepoResult<(Option<i64>, Option<i64>, Option<i64>)> {
    Ok((row.get(day)?, row.get(month)?, row.get(year)?))
}

fn column_to_u8(value: i64, field: &str, uuid: &str) -> RepoResult<u8> {
    u8::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!(
            "{field} value {value} out of range for event `{uuid}`"
        ))
    })
}

fn column_to_i32(value: i64, field: &str, uuid: &str) -> RepoResult<i32> {
    i32::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!(
            "{field} value {value} out of range for event `{uuid}`"
        ))
    })
}

fn calendar_to_db(calendar: CalendarSystem) -> &'static str {
    match calendar {
        CalendarSystem::Solar => "solar",
        CalendarSystem::Lunar => "lunar",
    }
}

fn parse_calendar(value: &str) -> Option<CalendarSystem> {
    match value {
        "solar" => Some(CalendarSystem::Solar),
        "lunar" => Some(CalendarSystem::Lunar),
        _ => None,
    }
}

fn recurrence_to_db(recurrence: Recurrence) -> &'static str {
    match recurrence {
        Recurrence::Once => "none",
        Recurrence::Monthly => "monthly",
        Recurrence::Yearly => "yearly",
    }
}

fn parse_recurrence(value: &str) -> Option<Recurrence> {
    match value {
        "none" => Some(Recurrence::Once),
        "monthly" => Some(Recurrence::Monthly),
        "yearly" => Some(Recurrence::Yearly),
        _ => None,
    }
}

fn ensure_event_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, EVENTS_TABLE)? {
        return Err(RepoError::MissingRequiredTable(EVENTS_TABLE));
    }

    let present = table_columns(conn, EVENTS_TABLE)?;
    for column in REQUIRED_EVENT_COLUMNS {
        if !present.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: EVENTS_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let found: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1;",
        [table],
        |row| row.get(0),
    )?;
    Ok(found > 0)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}
