//! CSV loading of trip records and month/weekday filtering.

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::city::City;
use crate::filters::{DayFilter, FilterSelection, MonthFilter};

const START_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const REQUIRED_COLUMNS: &[&str] = &[
    "Start Time",
    "Start Station",
    "End Station",
    "Trip Duration",
    "User Type",
];

const DEMOGRAPHIC_COLUMNS: &[&str] = &["Gender", "Birth Year"];

/// Row layout shared by every city.
#[derive(Debug, Deserialize)]
struct TripRow {
    #[serde(rename = "Start Time")]
    start_time: String,
    #[serde(rename = "Start Station")]
    start_station: String,
    #[serde(rename = "End Station")]
    end_station: String,
    #[serde(rename = "Trip Duration")]
    trip_duration: f64,
    #[serde(rename = "User Type")]
    user_type: Option<String>,
}

/// Row layout for cities that also publish rider demographics.
#[derive(Debug, Deserialize)]
struct DemographicTripRow {
    #[serde(rename = "Start Time")]
    start_time: String,
    #[serde(rename = "Start Station")]
    start_station: String,
    #[serde(rename = "End Station")]
    end_station: String,
    #[serde(rename = "Trip Duration")]
    trip_duration: f64,
    #[serde(rename = "User Type")]
    user_type: Option<String>,
    #[serde(rename = "Gender")]
    gender: Option<String>,
    #[serde(rename = "Birth Year")]
    birth_year: Option<f64>,
}

/// One bike trip with its derived month, weekday and hour.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub start_time: NaiveDateTime,
    pub start_station: String,
    pub end_station: String,
    pub duration_secs: f64,
    pub user_type: Option<String>,
    pub gender: Option<String>,
    pub birth_year: Option<f64>,

    // derived from start_time
    pub month: u32,
    pub weekday: Weekday,
    pub hour: u32,
}

impl Trip {
    pub fn new(
        start_time: NaiveDateTime,
        start_station: impl Into<String>,
        end_station: impl Into<String>,
        duration_secs: f64,
    ) -> Self {
        Trip {
            start_time,
            start_station: start_station.into(),
            end_station: end_station.into(),
            duration_secs,
            user_type: None,
            gender: None,
            birth_year: None,
            month: start_time.month(),
            weekday: start_time.weekday(),
            hour: start_time.hour(),
        }
    }

    pub fn with_user_type(mut self, user_type: Option<String>) -> Self {
        self.user_type = non_blank(user_type);
        self
    }

    pub fn with_demographics(mut self, gender: Option<String>, birth_year: Option<f64>) -> Self {
        self.gender = non_blank(gender);
        self.birth_year = birth_year.filter(|year| year.is_finite());
        self
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parses a `Start Time` cell such as `2017-01-01 09:07:57`.
pub fn parse_start_time(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    START_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .with_context(|| format!("unrecognised start time {raw:?}"))
}

fn check_columns(headers: &csv::StringRecord, city: City) -> Result<()> {
    let mut expected: Vec<&str> = REQUIRED_COLUMNS.to_vec();
    if city.has_demographics() {
        expected.extend_from_slice(DEMOGRAPHIC_COLUMNS);
    }

    let missing: Vec<&str> = expected
        .into_iter()
        .filter(|column| !headers.iter().any(|h| h.trim() == *column))
        .collect();

    if !missing.is_empty() {
        bail!("missing column(s) {} for {}", missing.join(", "), city);
    }
    Ok(())
}

/// Reads every trip from CSV data laid out like `city`'s dataset.
///
/// Gender and Birth Year are only read for cities that publish them.
pub fn read_trips<R: Read>(reader: R, city: City) -> Result<Vec<Trip>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    check_columns(&headers, city)?;

    let mut trips = Vec::new();

    if city.has_demographics() {
        for (index, result) in rdr.deserialize::<DemographicTripRow>().enumerate() {
            let row = result.with_context(|| format!("malformed trip record {}", index + 1))?;
            let start_time = parse_start_time(&row.start_time)
                .with_context(|| format!("trip record {}", index + 1))?;
            trips.push(
                Trip::new(start_time, row.start_station, row.end_station, row.trip_duration)
                    .with_user_type(row.user_type)
                    .with_demographics(row.gender, row.birth_year),
            );
        }
    } else {
        for (index, result) in rdr.deserialize::<TripRow>().enumerate() {
            let row = result.with_context(|| format!("malformed trip record {}", index + 1))?;
            let start_time = parse_start_time(&row.start_time)
                .with_context(|| format!("trip record {}", index + 1))?;
            trips.push(
                Trip::new(start_time, row.start_station, row.end_station, row.trip_duration)
                    .with_user_type(row.user_type),
            );
        }
    }

    Ok(trips)
}

/// Loads all trips for `city` from the CSV file at `path`.
#[tracing::instrument(skip_all, fields(city = %city, path = %path.display()))]
pub fn load_trips(path: &Path, city: City) -> Result<Vec<Trip>> {
    let file =
        File::open(path).with_context(|| format!("failed to open trip data {}", path.display()))?;
    let trips =
        read_trips(file, city).with_context(|| format!("failed to read {}", path.display()))?;

    debug!(rows = trips.len(), "Trip data loaded");
    Ok(trips)
}

/// Keeps the trips matching the month and weekday filters.
pub fn apply_filters(trips: Vec<Trip>, month: MonthFilter, day: DayFilter) -> Vec<Trip> {
    let month = month.number();
    let day = day.weekday();

    trips
        .into_iter()
        .filter(|trip| month.is_none_or(|m| trip.month == m))
        .filter(|trip| day.is_none_or(|d| trip.weekday == d))
        .collect()
}

/// Loads the selected city's trips from `data_dir` and applies the filters.
pub fn load_data(data_dir: &Path, selection: &FilterSelection) -> Result<Vec<Trip>> {
    let trips = load_trips(&selection.city.data_path(data_dir), selection.city)?;
    let total = trips.len();

    let filtered = apply_filters(trips, selection.month, selection.day);

    info!(
        city = %selection.city,
        month = %selection.month,
        day = %selection.day,
        total,
        kept = filtered.len(),
        "Filters applied"
    );
    Ok(filtered)
}
