//! Template cell transformers
//!
//! Both transformers walk the cells of an archetype sheet and write the
//! result cell by cell into a destination sheet. Per-run state travels in a
//! [`TransformContext`] instead of living on a long-lived handler object.

pub mod month;
pub mod summary;

pub use month::transform_month;
pub use summary::transform_summary;

use schichtplan_core::{CompanionYear, GenerationContext, Locale, ProfileTable};

pub const DATE_FORMAT: &str = "dd.mm.yyyy";
pub const TIME_FORMAT: &str = "hh:mm";
pub const MONTH_YEAR_FORMAT: &str = "mmm yyyy";
pub const HOURS_FORMAT: &str = "0.00";

/// Marker written into the holiday column of a holiday row
pub const HOLIDAY_MARK: &str = "F";

/// Read-only inputs shared by all transformations of one run
#[derive(Clone, Copy, Debug)]
pub struct TransformContext<'a> {
    pub calendar: &'a GenerationContext,
    pub profile: &'a ProfileTable,
    pub locale: Locale,
}

impl<'a> TransformContext<'a> {
    pub fn new(calendar: &'a GenerationContext, profile: &'a ProfileTable, locale: Locale) -> Self {
        Self {
            calendar,
            profile,
            locale,
        }
    }

    /// Sheet name of `month` in the target year
    pub fn month_label(&self, month: u32) -> String {
        self.locale.month_label(self.calendar.target_year(), month)
    }

    /// The year substituted for the profile's companion token
    pub fn companion_year(&self) -> i32 {
        match self.profile.companion {
            CompanionYear::Previous => self.calendar.previous_year(),
            CompanionYear::Next => self.calendar.next_year(),
        }
    }
}
