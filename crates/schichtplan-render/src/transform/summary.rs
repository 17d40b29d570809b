//! Summary sheet transformer

use super::{TransformContext, MONTH_YEAR_FORMAT};
use crate::template::{DATE_HEADER_ROW, TOTALS_COLUMN};
use crate::workbook::{Cell, CellValue, Sheet};
use crate::xlsx::excel_serial;
use chrono::NaiveDate;
use tracing::info;

/// Rewrite the summary archetype in place.
///
/// Year tokens in texts are replaced, month-start dates are written into the
/// date header row and every aggregated formula is pointed at its month
/// sheet. Each cell keeps the kind it had in the template.
pub fn transform_summary(sheet: &mut Sheet, ctx: &TransformContext<'_>) {
    let template = sheet.clone();
    let profile = ctx.profile;
    let current_year = ctx.calendar.current_year().to_string();
    let companion_year = ctx.companion_year().to_string();
    let tokens = [
        (profile.current_year_token, current_year.as_str()),
        (profile.companion_year_token, companion_year.as_str()),
    ];

    for ((row, col), tpl_cell) in template.cells() {
        let month = (1..=12).contains(&col).then_some(u32::from(col));
        let mut style = tpl_cell.style.clone();

        let value = match &tpl_cell.value {
            CellValue::Text(text) => CellValue::Text(replace_tokens(text, &tokens)),
            CellValue::Formula(formula) => match month {
                Some(month) if row > DATE_HEADER_ROW && !profile.is_excluded(row) => {
                    CellValue::Formula(month_reference(ctx, month, row))
                }
                _ => CellValue::Formula(formula.clone()),
            },
            CellValue::Number(n) => match month {
                Some(month) if row == DATE_HEADER_ROW => {
                    style.num_format = MONTH_YEAR_FORMAT.to_string();
                    NaiveDate::from_ymd_opt(ctx.calendar.target_year(), month, 1)
                        .map_or(CellValue::Number(*n), |start| {
                            CellValue::Number(excel_serial(start))
                        })
                }
                _ => CellValue::Number(*n),
            },
            other => CellValue::Text(other.as_text()),
        };

        sheet.set_cell(
            row,
            col,
            Cell::styled(value.coerce(tpl_cell.value.kind()), style),
        );
    }
    info!(year = ctx.calendar.target_year(), "generated summary");
}

/// Reference to the totals cell of `month` that feeds summary row `row`
pub fn month_reference(ctx: &TransformContext<'_>, month: u32, row: u32) -> String {
    format!(
        "'{}'!{TOTALS_COLUMN}{}",
        ctx.month_label(month),
        ctx.profile.month_total_row(row)
    )
}

/// Replace every occurrence of the tokens in a single left-to-right pass, so
/// a substituted year is never matched again by a later token.
fn replace_tokens(text: &str, tokens: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    'outer: while let Some(ch) = rest.chars().next() {
        for (token, value) in tokens {
            if !token.is_empty() && rest.starts_with(token) {
                result.push_str(value);
                rest = &rest[token.len()..];
                continue 'outer;
            }
        }
        result.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{builtin, SUMMARY_SHEET};
    use crate::workbook::{CellKind, CellStyle};
    use pretty_assertions::assert_eq;
    use schichtplan_core::{GenerationContext, GermanHolidays, Locale, TemplateProfile};

    fn calendar() -> GenerationContext {
        GenerationContext::with_provider(2019, 2018, vec!["Anna".into()], &GermanHolidays::national())
            .unwrap()
    }

    fn render(profile: TemplateProfile, mut sheet: Sheet) -> Sheet {
        let calendar = calendar();
        let ctx = TransformContext::new(&calendar, profile.table(), Locale::German);
        transform_summary(&mut sheet, &ctx);
        sheet
    }

    fn builtin_summary(profile: TemplateProfile) -> Sheet {
        builtin(profile).unwrap().sheet(SUMMARY_SHEET).unwrap().clone()
    }

    #[test]
    fn rewrites_formula_with_far_offset() {
        let mut sheet = Sheet::new("Summary");
        sheet.set_value(20, 3, CellValue::formula("'Mrz 2018'!H1"));
        let sheet = render(TemplateProfile::Legacy, sheet);

        assert_eq!(sheet.value(20, 3), Some(&CellValue::formula("'Mrz 2019'!H44")));
    }

    #[test]
    fn rewrites_formula_with_near_offset() {
        let mut sheet = Sheet::new("Summary");
        sheet.set_value(9, 1, CellValue::formula("0"));
        sheet.set_value(9, 12, CellValue::formula("0"));
        let sheet = render(TemplateProfile::Legacy, sheet);

        assert_eq!(sheet.value(9, 1), Some(&CellValue::formula("'Jan 2019'!H34")));
        assert_eq!(sheet.value(9, 12), Some(&CellValue::formula("'Dez 2019'!H34")));
    }

    #[test]
    fn planning_offsets() {
        let mut sheet = Sheet::new("Summary");
        sheet.set_value(8, 2, CellValue::formula("0"));
        sheet.set_value(20, 2, CellValue::formula("0"));
        let sheet = render(TemplateProfile::Planning, sheet);

        assert_eq!(sheet.value(8, 2), Some(&CellValue::formula("'Feb 2019'!H34")));
        assert_eq!(sheet.value(20, 2), Some(&CellValue::formula("'Feb 2019'!H45")));
    }

    #[test]
    fn excluded_rows_and_outer_columns_keep_their_formulas() {
        let mut sheet = Sheet::new("Summary");
        sheet.set_value(12, 4, CellValue::formula("SUM(E10:E12)"));
        sheet.set_value(15, 4, CellValue::formula("SUM($B$15:E15)"));
        sheet.set_value(9, 0, CellValue::formula("A1"));
        sheet.set_value(9, 13, CellValue::formula("SUM(B10:M10)"));
        sheet.set_value(5, 4, CellValue::formula("E1"));
        let sheet = render(TemplateProfile::Legacy, sheet);

        assert_eq!(sheet.value(12, 4), Some(&CellValue::formula("SUM(E10:E12)")));
        assert_eq!(sheet.value(15, 4), Some(&CellValue::formula("SUM($B$15:E15)")));
        assert_eq!(sheet.value(9, 0), Some(&CellValue::formula("A1")));
        assert_eq!(sheet.value(9, 13), Some(&CellValue::formula("SUM(B10:M10)")));
        assert_eq!(sheet.value(5, 4), Some(&CellValue::formula("E1")));
    }

    #[test]
    fn year_tokens_are_replaced() {
        let sheet = render(TemplateProfile::Legacy, builtin_summary(TemplateProfile::Legacy));
        assert_eq!(sheet.value(1, 0), Some(&CellValue::text("Stand 2018")));
        assert_eq!(sheet.value(2, 0), Some(&CellValue::text("Resturlaub aus 2017")));

        let mut sheet = Sheet::new("Summary");
        sheet.set_value(0, 0, CellValue::text("Plan 2018, Vorjahr 2017"));
        let calendar =
            GenerationContext::with_provider(2025, 2024, vec!["Anna".into()], &GermanHolidays::national())
                .unwrap();
        let ctx = TransformContext::new(&calendar, TemplateProfile::Legacy.table(), Locale::German);
        transform_summary(&mut sheet, &ctx);
        assert_eq!(sheet.value(0, 0), Some(&CellValue::text("Plan 2024, Vorjahr 2023")));
    }

    #[test]
    fn planning_tokens_use_next_year() {
        let sheet = render(TemplateProfile::Planning, builtin_summary(TemplateProfile::Planning));
        assert_eq!(sheet.value(3, 0), Some(&CellValue::text("Urlaubsanspruch 2019")));
        assert_eq!(sheet.value(2, 0), Some(&CellValue::text("Resturlaub aus 2018")));
    }

    #[test]
    fn substituted_year_is_not_replaced_twice() {
        let tokens = [("2018", "2017"), ("2017", "2016")];
        assert_eq!(replace_tokens("2018/2017", &tokens), "2017/2016");
        assert_eq!(replace_tokens("Übertrag 2018", &tokens), "Übertrag 2017");
    }

    #[test]
    fn date_header_holds_month_starts() {
        let sheet = render(TemplateProfile::Legacy, builtin_summary(TemplateProfile::Legacy));

        for month in 1..=12u16 {
            let start = NaiveDate::from_ymd_opt(2019, u32::from(month), 1).unwrap();
            let cell = sheet.cell(DATE_HEADER_ROW, month).unwrap();
            assert_eq!(cell.value, CellValue::Number(excel_serial(start)));
            assert_eq!(cell.style.num_format, MONTH_YEAR_FORMAT);
            assert!(cell.style.bold);
        }
        assert_eq!(sheet.value(DATE_HEADER_ROW, 13), Some(&CellValue::text("Summe")));
    }

    #[test]
    fn other_kinds_fall_back_to_text_and_keep_their_kind() {
        let mut sheet = Sheet::new("Summary");
        sheet.set_cell(1, 1, Cell::styled(CellValue::Blank, CellStyle::new().border()));
        sheet.set_value(1, 2, CellValue::Bool(true));
        sheet.set_value(1, 3, CellValue::Error("#DIV/0!".into()));
        sheet.set_value(4, 1, CellValue::Number(30.0));
        let sheet = render(TemplateProfile::Legacy, sheet);

        assert_eq!(sheet.value(1, 1), Some(&CellValue::Blank));
        assert!(sheet.cell(1, 1).unwrap().style.border);
        assert_eq!(sheet.value(1, 2), Some(&CellValue::Bool(true)));
        assert_eq!(sheet.value(1, 3).map(CellValue::kind), Some(CellKind::Text));
        assert_eq!(sheet.value(4, 1), Some(&CellValue::Number(30.0)));
    }

    #[test]
    fn builtin_summary_points_at_month_totals() {
        let sheet = render(TemplateProfile::Legacy, builtin_summary(TemplateProfile::Legacy));

        assert_eq!(sheet.value(8, 1), Some(&CellValue::formula("'Jan 2019'!H33")));
        assert_eq!(sheet.value(13, 3), Some(&CellValue::formula("'Mrz 2019'!H37")));
        assert_eq!(sheet.value(14, 12), Some(&CellValue::formula("'Dez 2019'!H38")));
        assert_eq!(sheet.value(8, 13), Some(&CellValue::formula("SUM(B9:M9)")));
    }
}
