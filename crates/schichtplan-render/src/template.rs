//! Template workbooks
//!
//! A template holds two archetype sheets: the summary at index
//! [`SUMMARY_SHEET`] and the month sheet at index [`MONTH_SHEET`]. The
//! transformers are tied to their layout:
//!
//! ```text
//! Summary                                Month
//! row 0..=4  texts with year tokens      row 0      column headers
//! row 7      month-start dates (B..M)    row 1..=31 day rows, holiday flag in J
//! row 8..    monthly totals, one column  totals block in column H, starting
//!            per month, plus derived     at row 8 + near offset (1-based)
//!            rows at the excluded rows
//! ```
//!
//! The built-in template is generated per [`TemplateProfile`] so that its
//! totals block lines up with the profile's offsets. External templates are
//! read with calamine for values and formulas; styles, blank cells, column
//! widths and page setup come from [`styles`](crate::styles).

use crate::transform::{DATE_FORMAT, HOURS_FORMAT, MONTH_YEAR_FORMAT, TIME_FORMAT};
use crate::workbook::{Cell, CellStyle, CellValue, HorizontalAlign, Sheet, Workbook};
use crate::xlsx::excel_serial;
use crate::styles::{self, SheetLayout};
use crate::RenderError;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use chrono::NaiveDate;
use schichtplan_core::{CompanionYear, Locale, ProfileTable, TemplateProfile};
use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

pub const SUMMARY_SHEET: usize = 0;
pub const MONTH_SHEET: usize = 1;

/// Summary row holding the month-start dates
pub const DATE_HEADER_ROW: u32 = 7;
/// Last month row that can hold a calendar day
pub const LAST_DAY_ROW: u32 = 31;
/// Month column receiving the holiday flag
pub const SPECIALTY_COLUMN: u16 = 9;
/// Month column holding the totals referenced from the summary
pub const TOTALS_COLUMN: &str = "H";

const SUMMARY_NAME: &str = "Übersicht";
const MONTH_NAME: &str = "Monat";
const HEADER_FILL: u32 = 0xD9D9D9;

const DAY_HEADERS: [&str; 10] = [
    "Datum",
    "Beginn",
    "Ende",
    "Pause (h)",
    "Arbeitszeit (h)",
    "Nacht (h)",
    "Sonntag (h)",
    "Feiertag (h)",
    "Bemerkung",
    "Feiertag",
];

/// Totals block of the month sheet, in row order
const MONTH_TOTALS: [(&str, &str); 7] = [
    ("Arbeitsstunden", "SUM(E2:E32)"),
    ("Nachtstunden", "SUM(F2:F32)"),
    ("Sonntagsstunden", "SUM(G2:G32)"),
    ("Feiertagsstunden", "SUM(H2:H32)"),
    ("Feiertage", "COUNTIF(J2:J32,\"F\")"),
    ("Urlaubstage", "COUNTIF(I2:I32,\"U\")"),
    ("Krankheitstage", "COUNTIF(I2:I32,\"K\")"),
];

/// Build the bundled template for `profile`
pub fn builtin(profile: TemplateProfile) -> Result<Workbook, RenderError> {
    let table = profile.table();
    let mut workbook = Workbook::new();
    workbook.push_sheet(summary_archetype(table))?;
    workbook.push_sheet(month_archetype(table))?;
    Ok(workbook)
}

fn header_style() -> CellStyle {
    CellStyle::new()
        .bold()
        .border()
        .fill(HEADER_FILL)
        .align(HorizontalAlign::Center)
}

fn month_archetype(table: &ProfileTable) -> Sheet {
    let mut sheet = Sheet::new(MONTH_NAME);
    let input = CellStyle::new().border();
    let hours = input.clone().num_format(HOURS_FORMAT);

    for (col, title) in (0u16..).zip(DAY_HEADERS) {
        sheet.set_cell(0, col, Cell::styled(CellValue::text(title), header_style()));
    }

    for row in 1..=LAST_DAY_ROW {
        let r = row + 1;
        let cells = [
            (CellValue::Number(0.0), input.clone().num_format(DATE_FORMAT)),
            (CellValue::Blank, input.clone().num_format(TIME_FORMAT)),
            (CellValue::Blank, input.clone().num_format(TIME_FORMAT)),
            (CellValue::Blank, hours.clone()),
            (
                CellValue::formula(format!(
                    "IF(OR(B{r}=\"\",C{r}=\"\"),0,MOD(C{r}-B{r},1)*24-D{r})"
                )),
                hours.clone(),
            ),
            (CellValue::Blank, hours.clone()),
            (
                CellValue::formula(format!("IF(A{r}=\"\",0,IF(WEEKDAY(A{r},2)=7,E{r},0))")),
                hours.clone(),
            ),
            (CellValue::formula(format!("IF(J{r}=\"F\",E{r},0)")), hours.clone()),
            (CellValue::Blank, input.clone()),
            (CellValue::Blank, input.clone().align(HorizontalAlign::Center)),
        ];
        for (col, (value, style)) in (0u16..).zip(cells) {
            sheet.set_cell(row, col, Cell::styled(value, style));
        }
    }

    let first_total = table.near_offset + DATE_HEADER_ROW;
    for (row, (label, formula)) in (first_total..).zip(MONTH_TOTALS) {
        sheet.set_cell(row, 6, Cell::styled(CellValue::text(label), CellStyle::new().bold()));
        sheet.set_cell(
            row,
            7,
            Cell::styled(CellValue::formula(formula), hours.clone().bold()),
        );
    }

    for (col, width) in [12.0, 8.0, 8.0, 10.0, 14.0, 10.0, 12.0, 14.0, 24.0, 9.0]
        .into_iter()
        .enumerate()
    {
        sheet.set_column_width(col as u16, width);
    }
    sheet
}

/// Rows of the summary below the date header
enum SummaryRow {
    /// Per-month reference into the totals block
    Monthly(usize),
    /// Night, Sunday and holiday hours added up
    Surcharges,
    /// Vacation days taken so far, remaining vacation in the sum column
    VacationTaken,
}

fn summary_rows(table: &ProfileTable) -> Vec<(u32, SummaryRow)> {
    let first_total = table.near_offset + DATE_HEADER_ROW + 1;
    let mut derived = vec![SummaryRow::Surcharges, SummaryRow::VacationTaken].into_iter();
    let mut rows = Vec::new();
    let mut row = DATE_HEADER_ROW + 1;
    loop {
        if table.is_excluded(row) {
            match derived.next() {
                Some(kind) => rows.push((row, kind)),
                None => break,
            }
        } else {
            let index = (table.month_total_row(row) - first_total) as usize;
            if index >= MONTH_TOTALS.len() {
                break;
            }
            rows.push((row, SummaryRow::Monthly(index)));
        }
        if derived.len() == 0 {
            break;
        }
        row += 1;
    }
    rows
}

fn summary_archetype(table: &ProfileTable) -> Sheet {
    let mut sheet = Sheet::new(SUMMARY_NAME);
    let current = table.current_year_token;
    let companion = table.companion_year_token;
    let (carried_from, entitled_for) = match table.companion {
        CompanionYear::Previous => (companion, current),
        CompanionYear::Next => (current, companion),
    };

    sheet.set_cell(
        0,
        0,
        Cell::styled(CellValue::text("Jahresübersicht Schichtplan"), CellStyle::new().bold()),
    );
    sheet.set_cell(
        1,
        0,
        Cell::styled(CellValue::text(format!("Stand {current}")), CellStyle::new().italic()),
    );
    let intro = [
        (format!("Resturlaub aus {carried_from}"), 0.0),
        (format!("Urlaubsanspruch {entitled_for}"), 30.0),
        (format!("Überstunden aus {carried_from}"), 0.0),
    ];
    for (row, (label, value)) in (2u32..).zip(intro) {
        sheet.set_cell(row, 0, Cell::new(CellValue::Text(label)));
        sheet.set_cell(
            row,
            1,
            Cell::styled(CellValue::Number(value), CellStyle::new().border().num_format("0")),
        );
    }

    let template_year: Option<i32> = current.parse().ok();
    sheet.set_cell(DATE_HEADER_ROW, 0, Cell::styled(CellValue::text("Monat"), header_style()));
    for month in 1..=12u32 {
        let start = template_year
            .and_then(|year| NaiveDate::from_ymd_opt(year, month, 1))
            .map_or(0.0, excel_serial);
        sheet.set_cell(
            DATE_HEADER_ROW,
            month as u16,
            Cell::styled(CellValue::Number(start), header_style().num_format(MONTH_YEAR_FORMAT)),
        );
    }
    sheet.set_cell(DATE_HEADER_ROW, 13, Cell::styled(CellValue::text("Summe"), header_style()));

    let rows = summary_rows(table);
    let vacation_row = rows
        .iter()
        .find(|(_, kind)| matches!(kind, SummaryRow::Monthly(5)))
        .map_or(0, |(row, _)| row + 1);
    let value_style = CellStyle::new().border().num_format(HOURS_FORMAT);

    for (row, kind) in &rows {
        let r = row + 1;
        let label = match kind {
            SummaryRow::Monthly(index) => MONTH_TOTALS[*index].0,
            SummaryRow::Surcharges => "Zuschlagsstunden",
            SummaryRow::VacationTaken => "Urlaubstage kumuliert",
        };
        sheet.set_cell(*row, 0, Cell::styled(CellValue::text(label), CellStyle::new().bold()));

        for month in 1..=12u32 {
            let letter = column_letter(month as u16);
            let formula = match kind {
                SummaryRow::Monthly(_) => format!(
                    "'{} {}'!{TOTALS_COLUMN}{}",
                    Locale::German.month_abbreviation(month),
                    current,
                    table.month_total_row(*row)
                ),
                SummaryRow::Surcharges => format!("SUM({letter}10:{letter}12)"),
                SummaryRow::VacationTaken => format!("SUM($B${vacation_row}:{letter}{vacation_row})"),
            };
            sheet.set_cell(
                *row,
                month as u16,
                Cell::styled(CellValue::formula(formula), value_style.clone()),
            );
        }

        let total = match kind {
            SummaryRow::VacationTaken => format!("$B$3+$B$4-M{r}"),
            _ => format!("SUM(B{r}:M{r})"),
        };
        sheet.set_cell(*row, 13, Cell::styled(CellValue::formula(total), value_style.clone().bold()));
    }

    sheet.set_column_width(0, 28.0);
    for col in 1..=13 {
        sheet.set_column_width(col, 11.0);
    }
    sheet
}

/// Column letter for a 0-based column index below 26
fn column_letter(col: u16) -> char {
    char::from(b'A' + (col % 26) as u8)
}

// ============================================================================
// External templates
// ============================================================================

/// Load a template workbook from an `.xlsx` file
pub fn load(path: &Path) -> Result<Workbook, RenderError> {
    let bytes = fs::read(path)
        .map_err(|e| RenderError::Template(format!("cannot open {}: {e}", path.display())))?;
    load_bytes(&bytes)
}

/// Load a template workbook from in-memory `.xlsx` bytes
pub fn load_bytes(bytes: &[u8]) -> Result<Workbook, RenderError> {
    let reader: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| RenderError::Template(format!("cannot read template: {e}")))?;
    let layouts = styles::read_layouts(Cursor::new(bytes))?;
    read_template(reader, layouts)
}

fn read_template<RS: Read + Seek>(
    mut reader: Xlsx<RS>,
    mut layouts: HashMap<String, SheetLayout>,
) -> Result<Workbook, RenderError> {
    let mut workbook = Workbook::new();
    for name in reader.sheet_names() {
        let values = reader
            .worksheet_range(&name)
            .map_err(|e| RenderError::Template(format!("sheet {name}: {e}")))?;
        let formulas = reader
            .worksheet_formula(&name)
            .map_err(|e| RenderError::Template(format!("sheet {name} formulas: {e}")))?;

        let mut sheet = Sheet::new(name.as_str());
        if let Some((row0, col0)) = values.start() {
            for (row, col, data) in values.used_cells() {
                sheet.set_value(row0 + row as u32, (col0 as usize + col) as u16, data_value(data));
            }
        }
        if let Some((row0, col0)) = formulas.start() {
            for (row, col, formula) in formulas.used_cells() {
                sheet.set_value(
                    row0 + row as u32,
                    (col0 as usize + col) as u16,
                    CellValue::formula(formula),
                );
            }
        }
        if let Some(layout) = layouts.remove(&name) {
            apply_layout(&mut sheet, layout);
        }
        workbook.push_sheet(sheet)?;
    }

    if workbook.len() <= MONTH_SHEET {
        return Err(RenderError::Template(format!(
            "expected a summary and a month sheet, found {} sheet(s)",
            workbook.len()
        )));
    }
    Ok(workbook)
}

fn apply_layout(sheet: &mut Sheet, layout: SheetLayout) {
    for ((row, col), style) in layout.cells {
        let value = sheet.value(row, col).cloned().unwrap_or(CellValue::Blank);
        sheet.set_cell(row, col, Cell::styled(value, style));
    }
    for (col, width) in layout.column_widths {
        sheet.set_column_width(col, width);
    }
    sheet.page_setup = layout.page_setup;
}

fn data_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Blank,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::CellKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_has_two_archetypes() {
        let template = builtin(TemplateProfile::Legacy).unwrap();
        assert_eq!(template.len(), 2);
        assert_eq!(template.sheet(SUMMARY_SHEET).unwrap().name(), "Übersicht");
        assert_eq!(template.sheet(MONTH_SHEET).unwrap().name(), "Monat");
    }

    #[test]
    fn month_totals_line_up_with_offsets() {
        for profile in [TemplateProfile::Legacy, TemplateProfile::Planning] {
            let table = profile.table();
            let template = builtin(profile).unwrap();
            let month = template.sheet(MONTH_SHEET).unwrap();
            let summary = template.sheet(SUMMARY_SHEET).unwrap();

            for (row, kind) in summary_rows(table) {
                if let SummaryRow::Monthly(index) = kind {
                    let target = table.month_total_row(row) - 1;
                    assert_eq!(
                        month.value(target, 6),
                        Some(&CellValue::text(MONTH_TOTALS[index].0)),
                        "{profile} row {row}"
                    );
                    assert_eq!(
                        summary.value(row, 0),
                        Some(&CellValue::text(MONTH_TOTALS[index].0))
                    );
                }
            }
        }
    }

    #[test]
    fn excluded_rows_hold_derived_formulas() {
        let template = builtin(TemplateProfile::Legacy).unwrap();
        let summary = template.sheet(SUMMARY_SHEET).unwrap();

        assert_eq!(summary.value(12, 1), Some(&CellValue::formula("SUM(B10:B12)")));
        assert_eq!(summary.value(15, 3), Some(&CellValue::formula("SUM($B$15:D15)")));
        assert_eq!(summary.last_row(), Some(15));

        let planning = builtin(TemplateProfile::Planning).unwrap();
        let summary = planning.sheet(SUMMARY_SHEET).unwrap();
        assert_eq!(summary.value(16, 1), Some(&CellValue::formula("SUM($B$15:B15)")));
        assert_eq!(summary.value(15, 0), Some(&CellValue::text("Krankheitstage")));
    }

    #[test]
    fn year_tokens_follow_the_profile() {
        let legacy = builtin(TemplateProfile::Legacy).unwrap();
        let summary = legacy.sheet(SUMMARY_SHEET).unwrap();
        assert_eq!(summary.value(2, 0), Some(&CellValue::text("Resturlaub aus 2017")));
        assert_eq!(summary.value(3, 0), Some(&CellValue::text("Urlaubsanspruch 2018")));

        let planning = builtin(TemplateProfile::Planning).unwrap();
        let summary = planning.sheet(SUMMARY_SHEET).unwrap();
        assert_eq!(summary.value(3, 0), Some(&CellValue::text("Urlaubsanspruch 2019")));
    }

    #[test]
    fn month_archetype_day_rows() {
        let template = builtin(TemplateProfile::Legacy).unwrap();
        let month = template.sheet(MONTH_SHEET).unwrap();

        assert_eq!(month.row(0).count(), DAY_HEADERS.len());
        for row in 1..=LAST_DAY_ROW {
            assert_eq!(month.value(row, 0).map(CellValue::kind), Some(CellKind::Numeric));
            assert_eq!(
                month.value(row, SPECIALTY_COLUMN).map(CellValue::kind),
                Some(CellKind::Blank)
            );
        }
        assert_eq!(
            month.value(20, 7),
            Some(&CellValue::formula("IF(J21=\"F\",E21,0)"))
        );
    }

    #[test]
    fn loaded_template_keeps_styles_and_layout() {
        let builtin = builtin(TemplateProfile::Legacy).unwrap();
        let bytes = crate::xlsx::render_to_bytes(&builtin, 2018).unwrap();
        let loaded = load_bytes(&bytes).unwrap();

        let month = loaded.sheet(MONTH_SHEET).unwrap();
        let expected = builtin.sheet(MONTH_SHEET).unwrap();
        for row in 1..=LAST_DAY_ROW {
            let flag = month.cell(row, SPECIALTY_COLUMN).unwrap();
            assert_eq!(flag.value, CellValue::Blank);
            assert_eq!(flag.style, expected.cell(row, SPECIALTY_COLUMN).unwrap().style);
        }
        assert_eq!(month.cell(1, 0).unwrap().style.num_format, DATE_FORMAT);
        assert!(month.cell(1, 0).unwrap().style.border);
        assert_eq!(month.cell(0, 3).unwrap().style, header_style());
        assert_eq!(month.cell(5, 1).unwrap().style.num_format, TIME_FORMAT);
        assert_eq!(month.column_widths(), expected.column_widths());

        let summary = loaded.sheet(SUMMARY_SHEET).unwrap();
        assert_eq!(
            summary.cell(DATE_HEADER_ROW, 4).unwrap().style,
            header_style().num_format(MONTH_YEAR_FORMAT)
        );
        assert!(summary.cell(1, 0).unwrap().style.italic);
    }

    #[test]
    fn corrupt_template_is_rejected() {
        assert!(matches!(
            load_bytes(b"not a zip file"),
            Err(RenderError::Template(_))
        ));
        assert!(matches!(
            load(Path::new("/nonexistent/template.xlsx")),
            Err(RenderError::Template(_))
        ));
    }
}
