//! # schichtplan-core
//!
//! Core domain model for the schichtplan workbook generator.
//!
//! This crate provides:
//! - Domain types: `Day`, `GenerationContext`
//! - Holiday calendars behind the `HolidayProvider` trait
//! - Run configuration (`GeneratorConfig`) and template profiles
//! - Error types
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use schichtplan_core::{GenerationContext, GeneratorConfig};
//!
//! let config = GeneratorConfig {
//!     year: Some("2020".into()),
//!     names: vec!["Erika Mustermann".into()],
//!     ..GeneratorConfig::default()
//! };
//! let today = NaiveDate::from_ymd_opt(2019, 6, 1).unwrap();
//! let context = GenerationContext::build(&config, today).unwrap();
//!
//! assert_eq!(context.days_in(2).len(), 29);
//! ```

pub mod config;
pub mod context;
pub mod holidays;

pub use config::GeneratorConfig;
pub use context::GenerationContext;
pub use holidays::{GermanHolidays, HolidayProvider, Subdivision};

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Day
// ============================================================================

/// A calendar date paired with its public-holiday flag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Day {
    date: NaiveDate,
    is_holiday: bool,
}

impl Day {
    pub const fn new(date: NaiveDate, is_holiday: bool) -> Self {
        Self { date, is_holiday }
    }

    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    pub const fn is_holiday(&self) -> bool {
        self.is_holiday
    }
}

// ============================================================================
// Locale
// ============================================================================

/// Language used for month sheet labels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    German,
    English,
}

const GERMAN_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mrz", "Apr", "Mai", "Jun", "Jul", "Aug", "Sep", "Okt", "Nov", "Dez",
];

const ENGLISH_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

impl Locale {
    /// Abbreviated month name, `month` in 1..=12
    pub fn month_abbreviation(self, month: u32) -> &'static str {
        let names = match self {
            Locale::German => &GERMAN_MONTHS,
            Locale::English => &ENGLISH_MONTHS,
        };
        names[(month.clamp(1, 12) - 1) as usize]
    }

    /// Sheet label for a month, e.g. `"Mrz 2019"`
    pub fn month_label(self, year: i32, month: u32) -> String {
        format!("{} {:04}", self.month_abbreviation(month), year)
    }
}

impl FromStr for Locale {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "de" | "de-de" | "german" => Ok(Locale::German),
            "en" | "en-us" | "en-gb" | "english" => Ok(Locale::English),
            other => Err(ConfigError::UnknownLocale(other.to_string())),
        }
    }
}

// ============================================================================
// Template Profiles
// ============================================================================

/// Which year the summary sheet shows next to the current one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompanionYear {
    Previous,
    Next,
}

/// Layout generation of the template workbook.
///
/// The two generations differ in the year tokens embedded in the summary
/// texts, in the row offsets between summary rows and month totals, and in
/// whether formulas of non-existent day rows are cleared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TemplateProfile {
    #[default]
    Legacy,
    Planning,
}

/// Offsets and tokens of one template generation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProfileTable {
    /// Literal year in summary texts that stands for the current year
    pub current_year_token: &'static str,
    /// Literal year in summary texts that stands for the companion year
    pub companion_year_token: &'static str,
    pub companion: CompanionYear,
    /// Row offset for summary rows below `split_row`
    pub near_offset: u32,
    /// Row offset for summary rows at or below `split_row`
    pub far_offset: u32,
    pub split_row: u32,
    /// Summary rows whose formulas are derived locally and never rewritten
    pub excluded_rows: &'static [u32],
    /// Clear formulas on month rows that have no calendar day
    pub blank_missing_day_formulas: bool,
}

impl ProfileTable {
    /// 1-based month-sheet row referenced from summary row `row` (0-based)
    pub fn month_total_row(&self, row: u32) -> u32 {
        if row >= self.split_row {
            row + self.far_offset
        } else {
            row + self.near_offset
        }
    }

    pub fn is_excluded(&self, row: u32) -> bool {
        self.excluded_rows.contains(&row)
    }
}

const LEGACY_TABLE: ProfileTable = ProfileTable {
    current_year_token: "2018",
    companion_year_token: "2017",
    companion: CompanionYear::Previous,
    near_offset: 25,
    far_offset: 24,
    split_row: 13,
    excluded_rows: &[12, 15],
    blank_missing_day_formulas: true,
};

const PLANNING_TABLE: ProfileTable = ProfileTable {
    current_year_token: "2018",
    companion_year_token: "2019",
    companion: CompanionYear::Next,
    near_offset: 26,
    far_offset: 25,
    split_row: 13,
    excluded_rows: &[12, 16],
    blank_missing_day_formulas: false,
};

impl TemplateProfile {
    pub fn table(self) -> &'static ProfileTable {
        match self {
            TemplateProfile::Legacy => &LEGACY_TABLE,
            TemplateProfile::Planning => &PLANNING_TABLE,
        }
    }
}

impl FromStr for TemplateProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(TemplateProfile::Legacy),
            "planning" => Ok(TemplateProfile::Planning),
            other => Err(ConfigError::UnknownProfile(other.to_string())),
        }
    }
}

impl fmt::Display for TemplateProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateProfile::Legacy => write!(f, "legacy"),
            TemplateProfile::Planning => write!(f, "planning"),
        }
    }
}

// ============================================================================
// Output Naming
// ============================================================================

/// File name pattern of generated workbooks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FileNaming {
    /// `"<Name> Schichtplan <Year>.xlsx"`
    #[default]
    PersonFirst,
    /// `"Schichtplan <Name> <Year>.xlsx"`, used by single-person runs of old releases
    Legacy,
}

impl FileNaming {
    pub fn file_name(self, name: &str, year: i32) -> String {
        match self {
            FileNaming::PersonFirst => format!("{name} Schichtplan {year}.xlsx"),
            FileNaming::Legacy => format!("Schichtplan {name} {year}.xlsx"),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Configuration error, raised before any file is written
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid year: {0}")]
    InvalidYear(String),

    #[error("Invalid person name: {0:?}")]
    InvalidName(String),

    #[error("Unknown holiday region: {0}")]
    UnknownRegion(String),

    #[error("Unknown holiday subdivision {subdivision} for region {region}")]
    UnknownSubdivision { region: String, subdivision: String },

    #[error("Unknown template profile: {0}")]
    UnknownProfile(String),

    #[error("Unknown locale: {0}")]
    UnknownLocale(String),

    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn german_month_labels() {
        assert_eq!(Locale::German.month_label(2019, 3), "Mrz 2019");
        assert_eq!(Locale::German.month_label(2019, 10), "Okt 2019");
        assert_eq!(Locale::English.month_label(2019, 12), "Dec 2019");
    }

    #[test]
    fn legacy_profile_offsets() {
        let table = TemplateProfile::Legacy.table();
        assert_eq!(table.month_total_row(8), 33);
        assert_eq!(table.month_total_row(11), 36);
        assert_eq!(table.month_total_row(13), 37);
        assert_eq!(table.month_total_row(20), 44);
        assert!(table.is_excluded(12));
        assert!(table.is_excluded(15));
        assert!(!table.is_excluded(16));
    }

    #[test]
    fn planning_profile_offsets() {
        let table = TemplateProfile::Planning.table();
        assert_eq!(table.month_total_row(8), 34);
        assert_eq!(table.month_total_row(13), 38);
        assert_eq!(table.companion, CompanionYear::Next);
        assert!(!table.blank_missing_day_formulas);
    }

    #[test]
    fn profile_and_locale_parsing() {
        assert_eq!("Planning".parse::<TemplateProfile>().unwrap(), TemplateProfile::Planning);
        assert_eq!("de".parse::<Locale>().unwrap(), Locale::German);
        assert!(matches!(
            "v3".parse::<TemplateProfile>(),
            Err(ConfigError::UnknownProfile(_))
        ));
    }

    #[test]
    fn file_naming_patterns() {
        assert_eq!(
            FileNaming::PersonFirst.file_name("Anna", 2019),
            "Anna Schichtplan 2019.xlsx"
        );
        assert_eq!(
            FileNaming::Legacy.file_name("Anna", 2019),
            "Schichtplan Anna 2019.xlsx"
        );
    }
}
