//! Workbook assembly
//!
//! Turns a two-sheet template into the yearly workbook: the summary sheet
//! followed by one sheet per month of the target year.

use crate::template::{MONTH_SHEET, SUMMARY_SHEET};
use crate::transform::{transform_month, transform_summary, TransformContext};
use crate::workbook::Workbook;
use crate::RenderError;
use schichtplan_core::{GenerationContext, Locale, TemplateProfile};
use tracing::{debug, info};

/// Builds the populated workbook from a template
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkbookAssembler {
    profile: TemplateProfile,
    locale: Locale,
}

impl WorkbookAssembler {
    pub fn new(profile: TemplateProfile, locale: Locale) -> Self {
        Self { profile, locale }
    }

    /// Assemble the workbook for `calendar`.
    ///
    /// The template itself is left untouched. The result holds the
    /// transformed summary at index 0 and twelve month sheets named
    /// `"<Mon> <year>"` in calendar order.
    pub fn assemble(
        &self,
        template: &Workbook,
        calendar: &GenerationContext,
    ) -> Result<Workbook, RenderError> {
        let archetype = template.sheet(MONTH_SHEET).ok_or_else(|| {
            RenderError::Template(format!(
                "expected a summary and a month sheet, found {} sheet(s)",
                template.len()
            ))
        })?;

        let ctx = TransformContext::new(calendar, self.profile.table(), self.locale);
        let mut workbook = template.clone();

        let summary = workbook
            .sheet_mut(SUMMARY_SHEET)
            .ok_or_else(|| RenderError::Template("template has no summary sheet".into()))?;
        transform_summary(summary, &ctx);
        info!(profile = %self.profile, "summary sheet prepared");

        let labels: Vec<String> = (1..=12).map(|month| ctx.month_label(month)).collect();
        for (month, label) in (1..=12u32).zip(&labels) {
            let index = match workbook.position(label) {
                Some(index) => index,
                None => workbook.clone_sheet(MONTH_SHEET, label)?,
            };
            let sheet = workbook
                .sheet_mut(index)
                .ok_or_else(|| RenderError::InvalidData(format!("sheet {label} vanished")))?;
            transform_month(archetype, sheet, month, &ctx);
            info!(month = %label, days = calendar.days_in(month).len(), "month sheet prepared");
        }

        let archetype_is_label = workbook
            .sheet(MONTH_SHEET)
            .is_some_and(|sheet| labels.iter().any(|label| label == sheet.name()));
        if !archetype_is_label {
            if let Some(sheet) = workbook.remove_sheet(MONTH_SHEET) {
                debug!(name = sheet.name(), "dropped month archetype");
            }
        }

        Ok(workbook)
    }
}
