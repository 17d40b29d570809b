//! Calendar context of one generation run

use crate::config::{MAX_YEAR, MIN_YEAR};
use crate::{ConfigError, Day, GeneratorConfig, HolidayProvider};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Everything a run needs to know about the target year.
///
/// Built once, read-only afterwards. `days_by_month` always holds the twelve
/// months 1..=12, each with one [`Day`] per calendar day in ascending order.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationContext {
    target_year: i32,
    current_year: i32,
    person_names: Vec<String>,
    days_by_month: BTreeMap<u32, Vec<Day>>,
}

impl GenerationContext {
    /// Validate `config` and build the calendar for its target year
    pub fn build(config: &GeneratorConfig, today: NaiveDate) -> Result<Self, ConfigError> {
        let target_year = config.target_year(today)?;
        let person_names = config.person_names()?;
        let calendar = config.holiday_calendar()?;
        Self::with_provider(target_year, today.year(), person_names, &calendar)
    }

    pub fn with_provider(
        target_year: i32,
        current_year: i32,
        person_names: Vec<String>,
        provider: &dyn HolidayProvider,
    ) -> Result<Self, ConfigError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&target_year) {
            return Err(ConfigError::InvalidYear(target_year.to_string()));
        }
        if person_names.is_empty() {
            return Err(ConfigError::InvalidName(String::new()));
        }

        let holidays = provider.holidays(target_year);
        let mut days_by_month = BTreeMap::new();
        for month in 1..=12 {
            let days = (1..=days_in_month(target_year, month))
                .filter_map(|day| NaiveDate::from_ymd_opt(target_year, month, day))
                .map(|date| Day::new(date, holidays.contains(&date)))
                .collect();
            days_by_month.insert(month, days);
        }

        Ok(Self {
            target_year,
            current_year,
            person_names,
            days_by_month,
        })
    }

    pub fn target_year(&self) -> i32 {
        self.target_year
    }

    /// Year the run happens in
    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn previous_year(&self) -> i32 {
        self.current_year - 1
    }

    pub fn next_year(&self) -> i32 {
        self.current_year + 1
    }

    pub fn person_names(&self) -> &[String] {
        &self.person_names
    }

    /// The person whose workbook is rendered; the others receive copies
    pub fn primary_name(&self) -> &str {
        &self.person_names[0]
    }

    /// Days of `month` (1..=12), empty for any other value
    pub fn days_in(&self, month: u32) -> &[Day] {
        self.days_by_month.get(&month).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn days_by_month(&self) -> &BTreeMap<u32, Vec<Day>> {
        &self.days_by_month
    }
}

/// Number of days in `month` of `year`, leap-year aware
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 0,
    }
}
