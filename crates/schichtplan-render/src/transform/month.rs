//! Month sheet transformer

use super::{TransformContext, DATE_FORMAT, HOLIDAY_MARK, TIME_FORMAT};
use crate::template::{LAST_DAY_ROW, SPECIALTY_COLUMN};
use crate::workbook::{Cell, CellStyle, CellValue, PageSetup, Sheet};
use crate::xlsx::excel_serial;
use chrono::Datelike;

const PRINT_SCALE: u16 = 60;

/// Populate `target` from the month archetype for `month` (1..=12).
///
/// Row 0 is the header, rows 1..=31 are day rows. Rows without a calendar
/// day lose their date and, if the profile says so, their formulas. Every
/// calendar day gets its date and holiday flag, even where the archetype
/// has no cell for them.
pub fn transform_month(template: &Sheet, target: &mut Sheet, month: u32, ctx: &TransformContext<'_>) {
    let days = ctx.calendar.days_in(month);

    for ((row, col), tpl_cell) in template.cells() {
        let index = row as usize;
        let day = (index > 0 && index <= days.len()).then(|| days[index - 1]);
        let is_day_row = day.is_some_and(|d| d.date().month() == month);

        let mut style = tpl_cell.style.clone();
        if day.is_some() {
            apply_day_format(col, &mut style);
        }

        let value = match &tpl_cell.value {
            CellValue::Text(_) | CellValue::Blank if col == SPECIALTY_COLUMN && day.is_some() => {
                let holiday = day.is_some_and(|d| d.is_holiday());
                CellValue::text(if holiday { HOLIDAY_MARK } else { "" })
            }
            CellValue::Text(text) => CellValue::Text(text.clone()),
            CellValue::Blank => CellValue::Blank,
            CellValue::Number(_) if col == 0 => match day.filter(|_| is_day_row) {
                Some(day) => CellValue::Number(excel_serial(day.date())),
                None => CellValue::text(""),
            },
            CellValue::Number(n) => CellValue::Number(*n),
            CellValue::Formula(_)
                if ctx.profile.blank_missing_day_formulas && row <= LAST_DAY_ROW && !is_day_row =>
            {
                CellValue::text("")
            }
            CellValue::Formula(formula) => CellValue::Formula(formula.clone()),
            other @ (CellValue::Bool(_) | CellValue::Error(_)) => other.clone(),
        };

        target.set_cell(row, col, Cell::styled(value, style));
    }

    for (row, day) in (1u32..).zip(days).filter(|(_, d)| d.date().month() == month) {
        if template.cell(row, 0).is_none() {
            let mut style = CellStyle::default();
            apply_day_format(0, &mut style);
            target.set_cell(row, 0, Cell::styled(CellValue::Number(excel_serial(day.date())), style));
        }
        if template.cell(row, SPECIALTY_COLUMN).is_none() {
            let mark = if day.is_holiday() { HOLIDAY_MARK } else { "" };
            target.set_cell(row, SPECIALTY_COLUMN, Cell::new(CellValue::text(mark)));
        }
    }

    target.page_setup = PageSetup {
        scale: Some(PRINT_SCALE),
        landscape: true,
        paper_size: Some(PageSetup::A4),
    };
    target.set_name(ctx.month_label(month));
}

fn apply_day_format(col: u16, style: &mut CellStyle) {
    match col {
        0 => style.num_format = DATE_FORMAT.to_string(),
        1 | 2 => style.num_format = TIME_FORMAT.to_string(),
        _ => {}
    }
}
