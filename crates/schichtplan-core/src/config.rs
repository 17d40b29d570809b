//! Run configuration
//!
//! A `GeneratorConfig` holds the raw, unvalidated settings of a run. It can be
//! read from a TOML file and overlaid with command-line values; validation
//! happens when the [`GenerationContext`](crate::GenerationContext) is built.
//!
//! ```toml
//! year = "2020"
//! names = ["Anna Schulz", "Ben Krause"]
//! country = "de"
//! subdivision = "mv"
//! profile = "legacy"
//! locale = "de"
//! ```

use crate::{ConfigError, FileNaming, GermanHolidays, Locale, TemplateProfile};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Placeholder used when no person name is given
pub const DEFAULT_NAME: &str = "Unknown";
pub const DEFAULT_COUNTRY: &str = "de";
/// Mecklenburg-Vorpommern
pub const DEFAULT_SUBDIVISION: &str = "mv";

/// Earliest year a workbook can be generated for (Excel's 1900 date system)
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 9999;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Target year; next calendar year when unset
    pub year: Option<String>,
    /// People to generate for, the first one is rendered, the others copied
    pub names: Vec<String>,
    pub country: Option<String>,
    pub subdivision: Option<String>,
    pub profile: Option<String>,
    pub locale: Option<String>,
    /// Use the `Schichtplan <Name> <Year>.xlsx` naming of old releases
    pub legacy_names: Option<bool>,
    pub output_dir: Option<PathBuf>,
    /// External template workbook, the built-in one when unset
    pub template: Option<PathBuf>,
}

impl GeneratorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Overlay `other` on top of `self`; set values in `other` win
    pub fn merge(mut self, other: GeneratorConfig) -> Self {
        if other.year.is_some() {
            self.year = other.year;
        }
        if !other.names.is_empty() {
            self.names = other.names;
        }
        if other.country.is_some() {
            self.country = other.country;
        }
        if other.subdivision.is_some() {
            self.subdivision = other.subdivision;
        }
        if other.profile.is_some() {
            self.profile = other.profile;
        }
        if other.locale.is_some() {
            self.locale = other.locale;
        }
        if other.legacy_names.is_some() {
            self.legacy_names = other.legacy_names;
        }
        if other.output_dir.is_some() {
            self.output_dir = other.output_dir;
        }
        if other.template.is_some() {
            self.template = other.template;
        }
        self
    }

    pub fn target_year(&self, today: NaiveDate) -> Result<i32, ConfigError> {
        match &self.year {
            None => Ok(today.year() + 1),
            Some(raw) => parse_year(raw),
        }
    }

    pub fn person_names(&self) -> Result<Vec<String>, ConfigError> {
        if self.names.is_empty() {
            return Ok(vec![DEFAULT_NAME.to_string()]);
        }
        self.names
            .iter()
            .map(|name| {
                let trimmed = name.trim();
                if trimmed.is_empty() || trimmed.contains(['/', '\\']) {
                    Err(ConfigError::InvalidName(name.clone()))
                } else {
                    Ok(trimmed.to_string())
                }
            })
            .collect()
    }

    pub fn holiday_calendar(&self) -> Result<GermanHolidays, ConfigError> {
        let country = self.country.as_deref().unwrap_or(DEFAULT_COUNTRY);
        let subdivision = self.subdivision.as_deref().or(Some(DEFAULT_SUBDIVISION));
        GermanHolidays::from_codes(country, subdivision)
    }

    pub fn template_profile(&self) -> Result<TemplateProfile, ConfigError> {
        self.profile
            .as_deref()
            .map_or(Ok(TemplateProfile::default()), str::parse)
    }

    pub fn locale(&self) -> Result<Locale, ConfigError> {
        self.locale.as_deref().map_or(Ok(Locale::default()), str::parse)
    }

    pub fn file_naming(&self) -> FileNaming {
        if self.legacy_names.unwrap_or(false) {
            FileNaming::Legacy
        } else {
            FileNaming::PersonFirst
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Parse a four-digit year within the supported range
pub fn parse_year(raw: &str) -> Result<i32, ConfigError> {
    let year: i32 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidYear(raw.to_string()))?;
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(year)
    } else {
        Err(ConfigError::InvalidYear(raw.to_string()))
    }
}
