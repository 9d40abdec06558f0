//! Interactive collection of the filter selection.
//!
//! Every prompt is generic over [`BufRead`]/[`Write`] so the session can be
//! driven from stdin/stdout or from in-memory buffers.

use anyhow::{Result, bail};
use std::io::{BufRead, Write};
use std::str::FromStr;
use tracing::debug;

use crate::city::City;
use crate::filters::{DayFilter, FilterSelection, MonthFilter};

pub const GREETING: &str = "Hello! Let's explore some US bikeshare data!";
pub const CITY_PROMPT: &str = "Please insert a valid city (Chicago, New York City, Washington): ";
pub const MONTH_PROMPT: &str = "Please insert a month within January-June or all: ";
pub const DAY_PROMPT: &str = "Please insert a specific weekday or all: ";
pub const RETRY_MESSAGE: &str = "Please type again, something was wrong.";
pub const RESTART_PROMPT: &str = "\nWould you like to restart? Enter yes or no.\n";
pub const SEPARATOR: &str = "----------------------------------------";

enum PromptState<T> {
    Awaiting,
    Invalid,
    Valid(T),
}

/// Reads one line, without its line terminator. `None` once input is exhausted.
fn read_answer<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Asks `question` until the answer parses as `T`.
///
/// An unparseable answer prints [`RETRY_MESSAGE`] and asks again; only closed
/// input ends the loop without a value.
pub fn prompt_until_valid<T, R, W>(
    input: &mut R,
    output: &mut W,
    question: &str,
    field: &str,
) -> Result<T>
where
    T: FromStr,
    R: BufRead,
    W: Write,
{
    let mut state = PromptState::Awaiting;
    let mut attempts = 0u32;

    loop {
        state = match state {
            PromptState::Valid(value) => {
                debug!(field, attempts, "Prompt answer accepted");
                return Ok(value);
            }
            PromptState::Invalid => {
                writeln!(output, "{RETRY_MESSAGE}")?;
                PromptState::Awaiting
            }
            PromptState::Awaiting => {
                write!(output, "{question}")?;
                output.flush()?;

                let Some(answer) = read_answer(input)? else {
                    bail!("input closed while waiting for {field}");
                };
                attempts += 1;

                match answer.parse::<T>() {
                    Ok(value) => PromptState::Valid(value),
                    Err(_) => {
                        debug!(field, answer = %answer, "Rejected prompt answer");
                        PromptState::Invalid
                    }
                }
            }
        };
    }
}

/// Greets the user and collects city, month and weekday in that order.
pub fn get_filters<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<FilterSelection> {
    writeln!(output, "{GREETING}")?;

    let city: City = prompt_until_valid(input, output, CITY_PROMPT, "city")?;
    let month: MonthFilter = prompt_until_valid(input, output, MONTH_PROMPT, "month")?;
    let day: DayFilter = prompt_until_valid(input, output, DAY_PROMPT, "day")?;

    writeln!(output, "{SEPARATOR}")?;
    Ok(FilterSelection::new(city, month, day))
}

/// Returns true only for exactly `yes`, in any case. Closed input counts as no.
pub fn ask_restart<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<bool> {
    write!(output, "{RESTART_PROMPT}")?;
    output.flush()?;

    let answer = read_answer(input)?.unwrap_or_default();
    Ok(answer.eq_ignore_ascii_case("yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Month, Weekday};
    use std::io::Cursor;

    fn run_filters(script: &str) -> (Result<FilterSelection>, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = get_filters(&mut input, &mut output);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_valid_answers_first_time() {
        let (result, printed) = run_filters("Chicago\nMarch\nall\n");
        let selection = result.unwrap();

        assert_eq!(selection.city, City::Chicago);
        assert_eq!(selection.month, MonthFilter::Only(Month::March));
        assert_eq!(selection.day, DayFilter::All);
        assert!(printed.starts_with(GREETING));
        assert!(!printed.contains(RETRY_MESSAGE));
        assert!(printed.ends_with(&format!("{SEPARATOR}\n")));
    }

    #[test]
    fn test_invalid_answers_are_retried() {
        let (result, printed) =
            run_filters("boston\n\nnew york city\njuly\nJUNE\nfunday\nfriday\n");
        let selection = result.unwrap();

        assert_eq!(selection.city, City::NewYorkCity);
        assert_eq!(selection.month, MonthFilter::Only(Month::June));
        assert_eq!(selection.day, DayFilter::Only(Weekday::Fri));
        assert_eq!(printed.matches(RETRY_MESSAGE).count(), 4);
        assert_eq!(printed.matches(CITY_PROMPT).count(), 3);
        assert_eq!(printed.matches(MONTH_PROMPT).count(), 2);
        assert_eq!(printed.matches(DAY_PROMPT).count(), 2);
    }

    #[test]
    fn test_many_invalid_attempts_never_yield_a_value() {
        let mut script = "nowhere\n".repeat(50);
        script.push_str("washington\n");
        let mut input = Cursor::new(script.into_bytes());
        let mut output = Vec::new();

        let city: City = prompt_until_valid(&mut input, &mut output, CITY_PROMPT, "city").unwrap();
        assert_eq!(city, City::Washington);
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let (result, _) = run_filters("chicago\n");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("month"));
    }

    #[test]
    fn test_windows_line_endings_accepted() {
        let (result, _) = run_filters("washington\r\nall\r\nmonday\r\n");
        let selection = result.unwrap();
        assert_eq!(selection.city, City::Washington);
        assert_eq!(selection.day, DayFilter::Only(Weekday::Mon));
    }

    #[test]
    fn test_restart_answers() {
        let ask = |script: &str| {
            let mut input = Cursor::new(script.as_bytes().to_vec());
            let mut output = Vec::new();
            ask_restart(&mut input, &mut output).unwrap()
        };

        assert!(ask("yes\n"));
        assert!(ask("YES\n"));
        assert!(!ask(" Yes \n"));
        assert!(!ask("No\n"));
        assert!(!ask("y\n"));
        assert!(!ask("yes please\n"));
        assert!(!ask(""));
    }
}
