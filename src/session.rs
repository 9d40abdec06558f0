//! The interactive prompt → load → report loop.

use anyhow::Result;
use clap::ValueEnum;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::info;

use crate::loader::load_data;
use crate::output::{write_json_report, write_text_report};
use crate::prompt::{ask_restart, get_filters};

/// How each iteration's report is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory holding `chicago.csv`, `new_york_city.csv` and `washington.csv`.
    pub data_dir: PathBuf,
    pub format: OutputFormat,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            format: OutputFormat::default(),
        }
    }
}

/// Runs report cycles until the user declines to restart.
///
/// Returns the number of completed cycles. Each cycle reloads the city's
/// data from disk; nothing is carried over between cycles.
pub fn run_session<R, W>(input: &mut R, output: &mut W, config: &SessionConfig) -> Result<usize>
where
    R: BufRead,
    W: Write,
{
    let mut cycles = 0;

    loop {
        let selection = get_filters(input, output)?;
        let trips = load_data(&config.data_dir, &selection)?;

        match config.format {
            OutputFormat::Text => write_text_report(output, &selection, &trips)?,
            OutputFormat::Json => write_json_report(output, &selection, &trips)?,
        }
        cycles += 1;

        if !ask_restart(input, output)? {
            break;
        }
    }

    info!(cycles, "Session finished");
    Ok(cycles)
}
