//! Registry of the cities with bikeshare datasets.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A city whose trip data can be analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum City {
    Chicago,
    NewYorkCity,
    Washington,
}

impl City {
    pub const ALL: [City; 3] = [City::Chicago, City::NewYorkCity, City::Washington];

    /// Lowercase name as typed at the prompt.
    pub fn name(self) -> &'static str {
        match self {
            City::Chicago => "chicago",
            City::NewYorkCity => "new york city",
            City::Washington => "washington",
        }
    }

    /// CSV file holding this city's trips.
    pub fn file_name(self) -> &'static str {
        match self {
            City::Chicago => "chicago.csv",
            City::NewYorkCity => "new_york_city.csv",
            City::Washington => "washington.csv",
        }
    }

    /// Whether the dataset carries `Gender` and `Birth Year` columns.
    pub fn has_demographics(self) -> bool {
        !matches!(self, City::Washington)
    }

    pub fn data_path(self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.file_name())
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for City {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        City::ALL
            .into_iter()
            .find(|city| city.name() == wanted)
            .ok_or_else(|| anyhow::anyhow!("unknown city: {s:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Chicago".parse::<City>().unwrap(), City::Chicago);
        assert_eq!("NEW YORK CITY".parse::<City>().unwrap(), City::NewYorkCity);
        assert_eq!("washington".parse::<City>().unwrap(), City::Washington);
    }

    #[test]
    fn test_parse_rejects_unknown_city() {
        assert!("boston".parse::<City>().is_err());
        assert!("new york".parse::<City>().is_err());
        assert!("".parse::<City>().is_err());
        assert!("  chicago  ".parse::<City>().is_err());
    }

    #[test]
    fn test_file_names() {
        assert_eq!(City::Chicago.file_name(), "chicago.csv");
        assert_eq!(City::NewYorkCity.file_name(), "new_york_city.csv");
        assert_eq!(City::Washington.file_name(), "washington.csv");
    }

    #[test]
    fn test_only_washington_lacks_demographics() {
        assert!(City::Chicago.has_demographics());
        assert!(City::NewYorkCity.has_demographics());
        assert!(!City::Washington.has_demographics());
    }

    #[test]
    fn test_data_path_joins_dir() {
        let path = City::NewYorkCity.data_path(Path::new("data"));
        assert_eq!(path, Path::new("data").join("new_york_city.csv"));
    }
}
