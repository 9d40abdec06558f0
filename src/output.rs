//! Console rendering of the trip reports.
//!
//! Supports the sectioned text layout and pretty JSON.

use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::time::Instant;
use tracing::debug;

use crate::filters::FilterSelection;
use crate::loader::Trip;
use crate::prompt::SEPARATOR;
use crate::stats::{
    Count, DurationStats, Report, StationStats, TimeStats, UserStats, station_stats, time_stats,
    trip_duration_stats, user_stats,
};

pub const NO_DATA: &str = "No trips match the selected filters.";
pub const WASHINGTON_NOTICE: &str =
    "Ops, no information of gender and birth for Washington, sorry!";

pub const TIME_TITLE: &str = "The Most Frequent Times of Travel";
pub const STATION_TITLE: &str = "The Most Popular Stations and Trip";
pub const DURATION_TITLE: &str = "Trip Duration";
pub const USER_TITLE: &str = "User Stats";

/// Writes one titled section, timing how long `body` takes to compute.
pub fn write_section<W, F>(out: &mut W, title: &str, body: F) -> Result<()>
where
    W: Write,
    F: FnOnce() -> Vec<String>,
{
    writeln!(out, "\nCalculating {title}...\n")?;
    let started = Instant::now();

    let lines = body();
    for line in &lines {
        writeln!(out, "{line}")?;
    }

    let elapsed = started.elapsed();
    debug!(section = title, elapsed_ms = elapsed.as_millis() as u64, "Section rendered");

    writeln!(out, "\nThis took {} seconds.", elapsed.as_secs_f64())?;
    writeln!(out, "{SEPARATOR}")?;
    Ok(())
}

/// Renders a frequency table under `header`, one `value  count` row per entry.
pub fn frequency_table(header: &str, counts: &[Count<String>]) -> Vec<String> {
    let width = counts
        .iter()
        .map(|c| c.value.chars().count())
        .max()
        .unwrap_or(0)
        .max(header.chars().count());

    let mut lines = vec![format!("{header:<width$}  count")];
    lines.extend(
        counts
            .iter()
            .map(|c| format!("{:<width$}  {}", c.value, c.count)),
    );
    lines
}

pub fn time_lines(stats: &TimeStats) -> Vec<String> {
    match (
        &stats.most_common_month,
        &stats.most_common_day,
        stats.most_common_hour,
    ) {
        (Some(month), Some(day), Some(hour)) => vec![
            format!("Most common month is {month}."),
            format!("Most common day of week is {day}."),
            format!("Most common start hour is {hour}."),
        ],
        _ => vec![NO_DATA.to_string()],
    }
}

pub fn station_lines(stats: &StationStats) -> Vec<String> {
    match (
        &stats.most_common_start,
        &stats.most_common_end,
        &stats.most_common_trip,
    ) {
        (Some(start), Some(end), Some(trip)) => vec![
            format!("Most common start station is {start}."),
            format!("Most common end station is {end}."),
            format!("Most common combination is {trip}."),
        ],
        _ => vec![NO_DATA.to_string()],
    }
}

pub fn duration_lines(stats: &DurationStats) -> Vec<String> {
    match stats.mean_secs {
        Some(mean) => vec![
            format!("Total trip duration is {} seconds.", stats.total_secs),
            format!("Mean trip duration is {mean} seconds."),
        ],
        None => vec![NO_DATA.to_string()],
    }
}

pub fn user_lines(stats: &UserStats) -> Vec<String> {
    let mut lines = if stats.trip_count == 0 {
        vec![NO_DATA.to_string()]
    } else {
        frequency_table("User Type", &stats.user_types)
    };

    let Some(demo) = &stats.demographics else {
        lines.push(String::new());
        lines.push(WASHINGTON_NOTICE.to_string());
        return lines;
    };

    if stats.trip_count == 0 {
        return lines;
    }

    lines.push(String::new());
    lines.extend(frequency_table("Gender", &demo.genders));

    if let (Some(earliest), Some(latest), Some(common)) = (
        demo.earliest_birth_year,
        demo.most_recent_birth_year,
        demo.most_common_birth_year,
    ) {
        lines.push(String::new());
        lines.push(format!("The eldest client was born in {earliest}."));
        lines.push(format!("The youngest client was born in {latest}."));
        lines.push(format!("Most popular birth year is {common}."));
    }

    lines
}

/// Computes and writes the four report sections in order.
pub fn write_text_report<W: Write>(
    out: &mut W,
    selection: &FilterSelection,
    trips: &[Trip],
) -> Result<()> {
    write_section(out, TIME_TITLE, || time_lines(&time_stats(trips)))?;
    write_section(out, STATION_TITLE, || station_lines(&station_stats(trips)))?;
    write_section(out, DURATION_TITLE, || {
        duration_lines(&trip_duration_stats(trips))
    })?;
    write_section(out, USER_TITLE, || {
        user_lines(&user_stats(trips, selection.city))
    })?;
    Ok(())
}

/// Writes any serializable value as pretty-printed JSON.
pub fn write_json<W: Write>(out: &mut W, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_json_report<W: Write>(
    out: &mut W,
    selection: &FilterSelection,
    trips: &[Trip],
) -> Result<()> {
    write_json(out, &Report::from_trips(*selection, trips))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::City;
    use crate::filters::{DayFilter, MonthFilter};
    use crate::stats::Demographics;
    use chrono::NaiveDate;

    fn selection(city: City) -> FilterSelection {
        FilterSelection::new(city, MonthFilter::All, DayFilter::All)
    }

    fn one_trip() -> Trip {
        let start = NaiveDate::from_ymd_opt(2017, 6, 23)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        Trip::new(start, "Lake St", "Canal St", 601.0)
            .with_user_type(Some("Subscriber".into()))
            .with_demographics(Some("Female".into()), Some(1992.0))
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_write_section_layout() {
        let text = render(|out| {
            write_section(out, "Things", || vec!["one".into(), "two".into()])
        });

        assert!(text.starts_with("\nCalculating Things...\n\none\ntwo\n\nThis took "));
        assert!(text.ends_with(&format!(" seconds.\n{SEPARATOR}\n")));
    }

    #[test]
    fn test_frequency_table_alignment() {
        let counts = vec![
            Count {
                value: "Subscriber".to_string(),
                count: 12,
            },
            Count {
                value: "Customer".to_string(),
                count: 3,
            },
        ];
        let lines = frequency_table("User Type", &counts);
        assert_eq!(
            lines,
            vec![
                "User Type   count".to_string(),
                "Subscriber  12".to_string(),
                "Customer    3".to_string(),
            ]
        );
    }

    #[test]
    fn test_text_report_for_chicago() {
        let trips = vec![one_trip()];
        let text = render(|out| write_text_report(out, &selection(City::Chicago), &trips));

        assert!(text.contains("Most common month is June."));
        assert!(text.contains("Most common day of week is Friday."));
        assert!(text.contains("Most common start hour is 23."));
        assert!(text.contains("Most common combination is Lake St to Canal St."));
        assert!(text.contains("Total trip duration is 601 seconds."));
        assert!(text.contains("Mean trip duration is 601 seconds."));
        assert!(text.contains("The eldest client was born in 1992."));
        assert!(text.contains("The youngest client was born in 1992."));
        assert!(text.contains("Most popular birth year is 1992."));
        assert!(!text.contains(WASHINGTON_NOTICE));
        assert_eq!(text.matches(SEPARATOR).count(), 4);
    }

    #[test]
    fn test_text_report_for_washington() {
        let trips = vec![one_trip().with_demographics(None, None)];
        let text = render(|out| write_text_report(out, &selection(City::Washington), &trips));

        assert!(text.contains("Subscriber"));
        assert!(text.contains(WASHINGTON_NOTICE));
        assert!(!text.contains("Gender"));
        assert!(!text.contains("born in"));
    }

    #[test]
    fn test_text_report_for_empty_table() {
        let text = render(|out| write_text_report(out, &selection(City::Chicago), &[]));
        assert_eq!(text.matches(NO_DATA).count(), 4);
    }

    #[test]
    fn test_washington_notice_survives_empty_table() {
        let text = render(|out| write_text_report(out, &selection(City::Washington), &[]));
        assert_eq!(text.matches(NO_DATA).count(), 4);
        assert_eq!(text.matches(WASHINGTON_NOTICE).count(), 1);
    }

    #[test]
    fn test_birth_years_omitted_when_all_missing() {
        let stats = UserStats {
            trip_count: 1,
            user_types: vec![],
            demographics: Some(Demographics {
                genders: vec![],
                earliest_birth_year: None,
                most_recent_birth_year: None,
                most_common_birth_year: None,
            }),
        };
        let lines = user_lines(&stats);
        assert!(lines.iter().all(|l| !l.contains("born in")));
        assert!(lines.iter().any(|l| l.starts_with("Gender")));
    }

    #[test]
    fn test_json_report() {
        let trips = vec![one_trip()];
        let text = render(|out| write_json_report(out, &selection(City::Chicago), &trips));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["selection"]["city"], "chicago");
        assert_eq!(value["selection"]["month"], "all");
        assert_eq!(value["time"]["most_common_month"], "June");
        assert_eq!(value["durations"]["trip_count"], 1);
        assert_eq!(value["users"]["demographics"]["earliest_birth_year"], 1992);
    }
}
