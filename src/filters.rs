//! Month and weekday filters chosen at the prompt.

use chrono::{Month, Weekday};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::city::City;

/// Months covered by the datasets, in calendar order.
pub const MONTHS: [Month; 6] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
];

/// Weekdays in the order they are offered at the prompt.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Full English name of a weekday, e.g. `Monday`.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Full English name of a calendar month number (1-12).
pub fn month_name(month: u32) -> Option<&'static str> {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthFilter {
    All,
    Only(Month),
}

impl MonthFilter {
    /// 1-based calendar number of the selected month.
    pub fn number(self) -> Option<u32> {
        match self {
            MonthFilter::All => None,
            MonthFilter::Only(month) => Some(month.number_from_month()),
        }
    }
}

impl FromStr for MonthFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        if wanted == "all" {
            return Ok(MonthFilter::All);
        }
        MONTHS
            .into_iter()
            .find(|month| month.name().to_lowercase() == wanted)
            .map(MonthFilter::Only)
            .ok_or_else(|| anyhow::anyhow!("month must be all or one of January-June, got {s:?}"))
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthFilter::All => f.write_str("all"),
            MonthFilter::Only(month) => f.write_str(month.name()),
        }
    }
}

impl Serialize for MonthFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayFilter {
    All,
    Only(Weekday),
}

impl DayFilter {
    pub fn weekday(self) -> Option<Weekday> {
        match self {
            DayFilter::All => None,
            DayFilter::Only(day) => Some(day),
        }
    }
}

impl FromStr for DayFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        if wanted == "all" {
            return Ok(DayFilter::All);
        }
        WEEKDAYS
            .into_iter()
            .find(|day| weekday_name(*day).to_lowercase() == wanted)
            .map(DayFilter::Only)
            .ok_or_else(|| anyhow::anyhow!("day must be all or a weekday name, got {s:?}"))
    }
}

impl fmt::Display for DayFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayFilter::All => f.write_str("all"),
            DayFilter::Only(day) => f.write_str(weekday_name(*day)),
        }
    }
}

impl Serialize for DayFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The (city, month, weekday) triple analyzed in one session iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub city: City,
    pub month: MonthFilter,
    pub day: DayFilter,
}

impl FilterSelection {
    pub fn new(city: City, month: MonthFilter, day: DayFilter) -> Self {
        Self { city, month, day }
    }
}
