//! Descriptive statistics over a filtered trip table.
//!
//! Every "most frequent" value is computed by [`value_counts`]: highest count
//! first, ties broken by the lowest value.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::city::City;
use crate::filters::{FilterSelection, WEEKDAYS, month_name, weekday_name};
use crate::loader::Trip;

/// A distinct value and the number of trips carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Count<T> {
    pub value: T,
    pub count: usize,
}

/// Counts occurrences of each value, most frequent first.
///
/// Equal counts are ordered by ascending value so the result never depends
/// on hash iteration order.
pub fn value_counts<T, I>(values: I) -> Vec<Count<T>>
where
    T: Eq + Hash + Ord,
    I: IntoIterator<Item = T>,
{
    let mut counts: HashMap<T, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    let mut counts: Vec<Count<T>> = counts
        .into_iter()
        .map(|(value, count)| Count { value, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    counts
}

/// The most frequent value, or `None` for no values at all.
pub fn mode<T, I>(values: I) -> Option<T>
where
    T: Eq + Hash + Ord,
    I: IntoIterator<Item = T>,
{
    value_counts(values).into_iter().next().map(|c| c.value)
}

/// Most frequent times of travel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeStats {
    pub most_common_month: Option<String>,
    pub most_common_day: Option<String>,
    pub most_common_hour: Option<u32>,
}

#[tracing::instrument(skip_all, fields(trips = trips.len()))]
pub fn time_stats(trips: &[Trip]) -> TimeStats {
    let month = mode(trips.iter().map(|t| t.month));
    // Sunday-first index keeps ties in prompt order.
    let day = mode(trips.iter().map(|t| t.weekday.num_days_from_sunday()));
    let hour = mode(trips.iter().map(|t| t.hour));

    TimeStats {
        most_common_month: month.and_then(month_name).map(str::to_string),
        most_common_day: day.map(|d| weekday_name(WEEKDAYS[d as usize]).to_string()),
        most_common_hour: hour,
    }
}

/// A start station and end station travelled between.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StationPair {
    pub start: String,
    pub end: String,
}

impl fmt::Display for StationPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Most popular stations and trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationStats {
    pub most_common_start: Option<String>,
    pub most_common_end: Option<String>,
    pub most_common_trip: Option<StationPair>,
}

#[tracing::instrument(skip_all, fields(trips = trips.len()))]
pub fn station_stats(trips: &[Trip]) -> StationStats {
    StationStats {
        most_common_start: mode(trips.iter().map(|t| t.start_station.as_str()))
            .map(str::to_string),
        most_common_end: mode(trips.iter().map(|t| t.end_station.as_str())).map(str::to_string),
        most_common_trip: mode(
            trips
                .iter()
                .map(|t| (t.start_station.as_str(), t.end_station.as_str())),
        )
        .map(|(start, end)| StationPair {
            start: start.to_string(),
            end: end.to_string(),
        }),
    }
}

/// Total and average trip duration, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub trip_count: usize,
    pub total_secs: f64,
    pub mean_secs: Option<f64>,
}

#[tracing::instrument(skip_all, fields(trips = trips.len()))]
pub fn trip_duration_stats(trips: &[Trip]) -> DurationStats {
    let total_secs: f64 = trips.iter().map(|t| t.duration_secs).sum();
    let mean_secs = if trips.is_empty() {
        None
    } else {
        Some(total_secs / trips.len() as f64)
    };

    DurationStats {
        trip_count: trips.len(),
        total_secs,
        mean_secs,
    }
}

/// Gender and birth year statistics, for cities that publish them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Demographics {
    pub genders: Vec<Count<String>>,
    pub earliest_birth_year: Option<i64>,
    pub most_recent_birth_year: Option<i64>,
    pub most_common_birth_year: Option<i64>,
}

/// Rider statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub trip_count: usize,
    pub user_types: Vec<Count<String>>,
    /// `None` when the city's dataset has no Gender/Birth Year columns.
    pub demographics: Option<Demographics>,
}

#[tracing::instrument(skip_all, fields(city = %city, trips = trips.len()))]
pub fn user_stats(trips: &[Trip], city: City) -> UserStats {
    let user_types = owned_counts(trips.iter().filter_map(|t| t.user_type.as_deref()));

    let demographics = city.has_demographics().then(|| {
        let years: Vec<i64> = trips
            .iter()
            .filter_map(|t| t.birth_year)
            .map(|year| year.trunc() as i64)
            .collect();

        Demographics {
            genders: owned_counts(trips.iter().filter_map(|t| t.gender.as_deref())),
            earliest_birth_year: years.iter().min().copied(),
            most_recent_birth_year: years.iter().max().copied(),
            most_common_birth_year: mode(years),
        }
    });

    UserStats {
        trip_count: trips.len(),
        user_types,
        demographics,
    }
}

fn owned_counts<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<Count<String>> {
    value_counts(values)
        .into_iter()
        .map(|c| Count {
            value: c.value.to_string(),
            count: c.count,
        })
        .collect()
}

/// All four reports for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub selection: FilterSelection,
    pub time: TimeStats,
    pub stations: StationStats,
    pub durations: DurationStats,
    pub users: UserStats,
}

impl Report {
    pub fn from_trips(selection: FilterSelection, trips: &[Trip]) -> Self {
        Report {
            selection,
            time: time_stats(trips),
            stations: station_stats(trips),
            durations: trip_duration_stats(trips),
            users: user_stats(trips, selection.city),
        }
    }
}
