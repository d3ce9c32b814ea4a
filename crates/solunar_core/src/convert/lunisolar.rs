//! Lunisolar calendar conversion contract and ICU-backed implementation.
//!
//! # Responsibility
//! - Convert between Gregorian dates and traditional lunisolar dates.
//! - Keep the conversion library's types off every other module.
//!
//! # Invariants
//! - Lunar years are numbered by the Gregorian year containing their first
//!   day (the year Lunar New Year falls in).
//! - `lunar_to_solar` fails for combinations that do not exist in the given
//!   lunar year; `solar_to_lunar` is total over supported Gregorian dates.

use chrono::{Datelike, NaiveDate};
use icu_calendar::chinese::Chinese;
use icu_calendar::types::MonthCode;
use icu_calendar::{Date, Iso};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Continuous lunisolar year count minus the Gregorian year its first day
/// falls in. Fallback for calendars that do not report a related ISO year.
const CHINESE_YEAR_NUMBER_OFFSET: i32 = 2637;

/// A date in the traditional lunisolar calendar.
///
/// `year` is the Gregorian year the lunar year begins in, matching how the
/// events this engine serves are written down (e.g. "lunar 8/15 of 2024").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LunarDate {
    pub year: i32,
    /// Month number 1-12; a leap month repeats its base month's number.
    pub month: u8,
    /// Day of month 1-30.
    pub day: u8,
    /// Marks the intercalary repetition of `month`.
    pub is_leap_month: bool,
}

/// Conversion failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// The lunar combination does not exist in that lunar year, e.g. day 30
    /// of a 29-day month, or a leap month the year does not have.
    InvalidLunarDate {
        year: i32,
        month: u8,
        day: u8,
        is_leap_month: bool,
    },
    /// The Gregorian date lies outside what the calendar library supports.
    UnsupportedDate { year: i32, month: u32, day: u32 },
}

impl Display for ConvertError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLunarDate {
                year,
                month,
                day,
                is_leap_month,
            } => {
                let leap = if *is_leap_month { " (leap)" } else { "" };
                write!(
                    f,
                    "lunar date {year}-{month:02}-{day:02}{leap} does not exist"
                )
            }
            Self::UnsupportedDate { year, month, day } => {
                write!(f, "date {year}-{month:02}-{day:02} is not supported")
            }
        }
    }
}

impl Error for ConvertError {}

/// Conversion between Gregorian dates and lunisolar calendar dates.
///
/// Resolution depends only on this trait, so tests and alternative calendar
/// backends can stand in for the ICU implementation.
pub trait LunisolarConverter {
    /// Converts a lunar date to its Gregorian date.
    ///
    /// # Errors
    /// - `ConvertError::InvalidLunarDate` when the combination does not
    ///   exist for that lunar year.
    fn lunar_to_solar(&self, lunar: LunarDate) -> Result<NaiveDate, ConvertError>;

    /// Converts a Gregorian date to its lunisolar representation.
    fn solar_to_lunar(&self, solar: NaiveDate) -> Result<LunarDate, ConvertError>;
}

/// Production converter backed by the ICU Chinese lunisolar calendar.
#[derive(Debug, Clone)]
pub struct IcuLunisolarConverter {
    calendar: Chinese,
}

impl IcuLunisolarConverter {
    pub fn new() -> Self {
        Self {
            calendar: Chinese::new(),
        }
    }

    /// Continuous year count of the lunar year beginning in `lunar_year`.
    ///
    /// July 1 always falls inside that lunar year (Lunar New Year lands
    /// between late January and late February), so probing it anchors
    /// construction for the whole year.
    fn chinese_year_number(&self, lunar_year: i32) -> Result<i32, ConvertError> {
        let anchor = Date::try_new_iso_date(lunar_year, 7, 1).map_err(|_| {
            ConvertError::UnsupportedDate {
                year: lunar_year,
                month: 7,
                day: 1,
            }
        })?;
        Ok(anchor.to_calendar(self.calendar.clone()).year().number)
    }
}

impl Default for IcuLunisolarConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl LunisolarConverter for IcuLunisolarConverter {
    fn lunar_to_solar(&self, lunar: LunarDate) -> Result<NaiveDate, ConvertError> {
        let invalid = ConvertError::InvalidLunarDate {
            year: lunar.year,
            month: lunar.month,
            day: lunar.day,
            is_leap_month: lunar.is_leap_month,
        };
        if !(1..=12).contains(&lunar.month) || !(1..=30).contains(&lunar.day) {
            return Err(invalid);
        }

        let year_number = self.chinese_year_number(lunar.year)?;

        // The calendar addresses months by ordinal. A leap month shifts every
        // later ordinal by one, so the target month sits at its own number or
        // one past it; the month code tells which candidate is the right one.
        for ordinal in [lunar.month, lunar.month + 1] {
            let Ok(candidate) = Date::try_new_chinese_date_with_calendar(
                year_number,
                ordinal,
                lunar.day,
                self.calendar.clone(),
            ) else {
                continue;
            };
            let Some((month, is_leap_month)) = month_from_code(&candidate.month().code) else {
                continue;
            };
            if month == lunar.month && is_leap_month == lunar.is_leap_month {
                return naive_date_from_iso(&candidate.to_iso());
            }
        }

        Err(invalid)
    }

    fn solar_to_lunar(&self, solar: NaiveDate) -> Result<LunarDate, ConvertError> {
        let iso = Date::try_new_iso_date(solar.year(), solar.month() as u8, solar.day() as u8)
            .map_err(|_| unsupported(solar))?;
        let chinese = iso.to_calendar(self.calendar.clone());

        let year_info = chinese.year();
        let year = year_info
            .related_iso
            .unwrap_or(year_info.number - CHINESE_YEAR_NUMBER_OFFSET);
        let (month, is_leap_month) =
            month_from_code(&chinese.month().code).ok_or_else(|| unsupported(solar))?;
        let day = u8::try_from(chinese.day_of_month().0).map_err(|_| unsupported(solar))?;

        Ok(LunarDate {
            year,
            month,
            day,
            is_leap_month,
        })
    }
}

/// Splits a month code (`M01`..`M12`, leap `M01L`..`M12L`) into its month
/// number and leap flag.
fn month_from_code(code: &MonthCode) -> Option<(u8, bool)> {
    let code = code.0.as_str();
    if !code.starts_with('M') || !(3..=4).contains(&code.len()) {
        return None;
    }
    let number = code.get(1..3)?.parse::<u8>().ok()?;
    if !(1..=12).contains(&number) {
        return None;
    }
    let is_leap = match &code[3..] {
        "" => false,
        "L" => true,
        _ => return None,
    };
    Some((number, is_leap))
}

fn naive_date_from_iso(iso: &Date<Iso>) -> Result<NaiveDate, ConvertError> {
    let year = iso.year().number;
    let month = iso.month().ordinal;
    let day = iso.day_of_month().0;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(ConvertError::UnsupportedDate { year, month, day })
}

fn unsupported(date: NaiveDate) -> ConvertError {
    ConvertError::UnsupportedDate {
        year: date.year(),
        month: date.month(),
        day: date.day(),
    }
}
