//! Public holiday calendars
//!
//! Holiday data sits behind the [`HolidayProvider`] trait so the calendar
//! context can be built against any region. [`GermanHolidays`] covers the
//! national holidays of Germany plus the federal-state ones.
//!
//! Observed national holidays:
//! * New Year's Day (Jan 1)
//! * Good Friday (Easter - 2)
//! * Easter Monday (Easter + 1)
//! * Labour Day (May 1)
//! * Ascension Day (Easter + 39)
//! * Whit Monday (Easter + 50)
//! * German Unity Day (Oct 3, since 1990)
//! * Christmas Day, St. Stephen's Day (Dec 25/26)
//! * Reformation Day (Oct 31) in 2017 only, for the 500th anniversary

use crate::ConfigError;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Source of public holiday dates
pub trait HolidayProvider {
    /// All holidays that fall into `year`
    fn holidays(&self, year: i32) -> BTreeSet<NaiveDate>;

    /// Check a single date. Builds the whole year, callers looping over a
    /// year should call [`HolidayProvider::holidays`] once instead.
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays(date.year()).contains(&date)
    }
}

// ============================================================================
// Subdivisions
// ============================================================================

/// German federal state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Subdivision {
    BadenWuerttemberg,
    Bayern,
    Berlin,
    Brandenburg,
    Bremen,
    Hamburg,
    Hessen,
    MecklenburgVorpommern,
    Niedersachsen,
    NordrheinWestfalen,
    RheinlandPfalz,
    Saarland,
    Sachsen,
    SachsenAnhalt,
    SchleswigHolstein,
    Thueringen,
}

impl Subdivision {
    pub const ALL: [Subdivision; 16] = [
        Subdivision::BadenWuerttemberg,
        Subdivision::Bayern,
        Subdivision::Berlin,
        Subdivision::Brandenburg,
        Subdivision::Bremen,
        Subdivision::Hamburg,
        Subdivision::Hessen,
        Subdivision::MecklenburgVorpommern,
        Subdivision::Niedersachsen,
        Subdivision::NordrheinWestfalen,
        Subdivision::RheinlandPfalz,
        Subdivision::Saarland,
        Subdivision::Sachsen,
        Subdivision::SachsenAnhalt,
        Subdivision::SchleswigHolstein,
        Subdivision::Thueringen,
    ];

    /// Two-letter code as used on the command line
    pub fn code(self) -> &'static str {
        match self {
            Subdivision::BadenWuerttemberg => "bw",
            Subdivision::Bayern => "by",
            Subdivision::Berlin => "be",
            Subdivision::Brandenburg => "bb",
            Subdivision::Bremen => "hb",
            Subdivision::Hamburg => "hh",
            Subdivision::Hessen => "he",
            Subdivision::MecklenburgVorpommern => "mv",
            Subdivision::Niedersachsen => "ni",
            Subdivision::NordrheinWestfalen => "nw",
            Subdivision::RheinlandPfalz => "rp",
            Subdivision::Saarland => "sl",
            Subdivision::Sachsen => "sn",
            Subdivision::SachsenAnhalt => "st",
            Subdivision::SchleswigHolstein => "sh",
            Subdivision::Thueringen => "th",
        }
    }
}

impl FromStr for Subdivision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Subdivision::ALL
            .into_iter()
            .find(|sub| sub.code() == code)
            .ok_or(code)
    }
}

impl fmt::Display for Subdivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// Germany
// ============================================================================

/// Germany, optionally narrowed to one federal state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GermanHolidays {
    pub subdivision: Option<Subdivision>,
}

impl GermanHolidays {
    pub const fn national() -> Self {
        Self { subdivision: None }
    }

    pub const fn for_subdivision(subdivision: Subdivision) -> Self {
        Self {
            subdivision: Some(subdivision),
        }
    }

    /// Resolve region codes as given on the command line (`de`, `mv`)
    pub fn from_codes(country: &str, subdivision: Option<&str>) -> Result<Self, ConfigError> {
        let country = country.trim().to_ascii_lowercase();
        if !matches!(country.as_str(), "de" | "germany") {
            return Err(ConfigError::UnknownRegion(country));
        }
        match subdivision.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Self::national()),
            Some(code) => code
                .parse::<Subdivision>()
                .map(Self::for_subdivision)
                .map_err(|subdivision| ConfigError::UnknownSubdivision {
                    region: country,
                    subdivision,
                }),
        }
    }

    fn observes(&self, states: &[Subdivision]) -> bool {
        self.subdivision.is_some_and(|s| states.contains(&s))
    }
}

impl HolidayProvider for GermanHolidays {
    fn holidays(&self, year: i32) -> BTreeSet<NaiveDate> {
        use Subdivision::*;

        let mut days = BTreeSet::new();
        let Some(easter) = easter_sunday(year) else {
            return days;
        };
        let fixed = |month: u32, day: u32| NaiveDate::from_ymd_opt(year, month, day);
        let relative = |offset: i64| easter + Duration::days(offset);

        days.extend(fixed(1, 1));
        days.insert(relative(-2));
        days.insert(relative(1));
        days.extend(fixed(5, 1));
        days.insert(relative(39));
        days.insert(relative(50));
        if year >= 1990 {
            days.extend(fixed(10, 3));
        }
        days.extend(fixed(12, 25));
        days.extend(fixed(12, 26));

        if self.observes(&[BadenWuerttemberg, Bayern, SachsenAnhalt]) {
            days.extend(fixed(1, 6));
        }
        if self.observes(&[Brandenburg]) {
            days.insert(easter);
            days.insert(relative(49));
        }
        if self.observes(&[
            BadenWuerttemberg,
            Bayern,
            Hessen,
            NordrheinWestfalen,
            RheinlandPfalz,
            Saarland,
        ]) {
            days.insert(relative(60));
        }
        if self.observes(&[Bayern, Saarland]) {
            days.extend(fixed(8, 15));
        }
        let reformation_day = year == 2017
            || self.observes(&[Brandenburg, MecklenburgVorpommern, Sachsen, SachsenAnhalt, Thueringen])
            || (year >= 2018 && self.observes(&[Bremen, Hamburg, Niedersachsen, SchleswigHolstein]));
        if reformation_day {
            days.extend(fixed(10, 31));
        }
        if self.observes(&[BadenWuerttemberg, Bayern, NordrheinWestfalen, RheinlandPfalz, Saarland]) {
            days.extend(fixed(11, 1));
        }
        if self.observes(&[Sachsen]) {
            days.extend(repentance_day(year));
        }
        if (year >= 2019 && self.observes(&[Berlin]))
            || (year >= 2023 && self.observes(&[MecklenburgVorpommern]))
        {
            days.extend(fixed(3, 8));
        }
        if year >= 2019 && self.observes(&[Thueringen]) {
            days.extend(fixed(9, 20));
        }

        days
    }
}

/// Easter Sunday (anonymous Gregorian algorithm)
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// Day of Repentance and Prayer: the Wednesday before November 23
fn repentance_day(year: i32) -> Option<NaiveDate> {
    let nov_22 = NaiveDate::from_ymd_opt(year, 11, 22)?;
    let back = (nov_22.weekday().num_days_from_monday() + 7
        - Weekday::Wed.num_days_from_monday())
        % 7;
    Some(nov_22 - Duration::days(i64::from(back)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn easter_dates() {
        assert_eq!(easter_sunday(2018), Some(date(2018, 4, 1)));
        assert_eq!(easter_sunday(2019), Some(date(2019, 4, 21)));
        assert_eq!(easter_sunday(2020), Some(date(2020, 4, 12)));
        assert_eq!(easter_sunday(2024), Some(date(2024, 3, 31)));
    }

    #[test]
    fn national_holidays_2019() {
        let cal = GermanHolidays::national();
        let days = cal.holidays(2019);

        assert!(days.contains(&date(2019, 1, 1)));
        assert!(days.contains(&date(2019, 4, 19))); // Good Friday
        assert!(days.contains(&date(2019, 4, 22))); // Easter Monday
        assert!(days.contains(&date(2019, 5, 30))); // Ascension
        assert!(days.contains(&date(2019, 6, 10))); // Whit Monday
        assert!(days.contains(&date(2019, 10, 3)));
        assert!(days.contains(&date(2019, 12, 26)));
        assert_eq!(days.len(), 9);
    }

    #[test]
    fn reformation_day_by_state() {
        let mv = GermanHolidays::for_subdivision(Subdivision::MecklenburgVorpommern);
        let by = GermanHolidays::for_subdivision(Subdivision::Bayern);
        let hh = GermanHolidays::for_subdivision(Subdivision::Hamburg);

        assert!(mv.is_holiday(date(2019, 10, 31)));
        assert!(!by.is_holiday(date(2019, 10, 31)));
        assert!(!hh.is_holiday(date(2016, 10, 31)));
        assert!(hh.is_holiday(date(2018, 10, 31)));
        // Nationwide for the 500th anniversary
        assert!(by.is_holiday(date(2017, 10, 31)));
    }

    #[test]
    fn regional_extras() {
        let by = GermanHolidays::for_subdivision(Subdivision::Bayern);
        assert!(by.is_holiday(date(2019, 1, 6)));
        assert!(by.is_holiday(date(2019, 6, 20))); // Corpus Christi
        assert!(by.is_holiday(date(2019, 8, 15)));
        assert!(by.is_holiday(date(2019, 11, 1)));

        let sn = GermanHolidays::for_subdivision(Subdivision::Sachsen);
        assert!(sn.is_holiday(date(2019, 11, 20)));
        assert!(sn.is_holiday(date(2023, 11, 22)));

        let mv = GermanHolidays::for_subdivision(Subdivision::MecklenburgVorpommern);
        assert!(!mv.is_holiday(date(2022, 3, 8)));
        assert!(mv.is_holiday(date(2023, 3, 8)));
    }

    #[test]
    fn ordinary_weekday_is_not_a_holiday() {
        let cal = GermanHolidays::for_subdivision(Subdivision::MecklenburgVorpommern);
        // 2019-06-12 is a Wednesday
        assert!(!cal.is_holiday(date(2019, 6, 12)));
    }

    #[test]
    fn region_codes() {
        assert_eq!(
            GermanHolidays::from_codes("DE", Some("mv")).unwrap(),
            GermanHolidays::for_subdivision(Subdivision::MecklenburgVorpommern)
        );
        assert_eq!(GermanHolidays::from_codes("de", None).unwrap(), GermanHolidays::national());
        assert!(matches!(
            GermanHolidays::from_codes("fr", None),
            Err(ConfigError::UnknownRegion(_))
        ));
        assert!(matches!(
            GermanHolidays::from_codes("de", Some("xx")),
            Err(ConfigError::UnknownSubdivision { .. })
        ));
    }
}
