//! XLSX serialization
//!
//! Writes the in-memory [`Workbook`] with rust_xlsxwriter. The document
//! creation time is pinned to January 1st of the target year, so the same
//! input always produces the same bytes.

use crate::workbook::{CellStyle, CellValue, HorizontalAlign, Sheet, Workbook};
use crate::RenderError;
use chrono::NaiveDate;
use rust_xlsxwriter::{
    Color, DocProperties, ExcelDateTime, Format, FormatAlign, FormatBorder,
    Workbook as XlsxWorkbook, Worksheet,
};

/// Excel serial number of `date` in the 1900 date system.
///
/// Day 1 is 1900-01-01. Excel counts the non-existent 1900-02-29, so dates
/// from 1900-03-01 on are shifted by one.
pub fn excel_serial(date: NaiveDate) -> f64 {
    let leap_bug = NaiveDate::from_ymd_opt(1900, 3, 1).unwrap_or(NaiveDate::MIN);
    let epoch = if date < leap_bug {
        NaiveDate::from_ymd_opt(1899, 12, 31)
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)
    };
    epoch.map_or(0.0, |epoch| (date - epoch).num_days() as f64)
}

/// Serialize `workbook` into xlsx bytes
pub fn render_to_bytes(workbook: &Workbook, year: i32) -> Result<Vec<u8>, RenderError> {
    let mut xlsx = XlsxWorkbook::new();

    let created = u16::try_from(year)
        .ok()
        .and_then(|year| ExcelDateTime::from_ymd(year, 1, 1).ok())
        .ok_or_else(|| RenderError::InvalidData(format!("year {year} cannot be stored in a workbook")))?;
    let properties = DocProperties::new().set_creation_datetime(&created);
    xlsx.set_properties(&properties);

    for sheet in workbook.sheets() {
        let worksheet = xlsx.add_worksheet();
        write_sheet(worksheet, sheet)?;
    }

    xlsx.save_to_buffer()
        .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet) -> Result<(), RenderError> {
    worksheet
        .set_name(sheet.name())
        .map_err(|e| RenderError::Format(format!("sheet {}: {e}", sheet.name())))?;

    for (&col, &width) in sheet.column_widths() {
        worksheet
            .set_column_width(col, width)
            .map_err(|e| RenderError::Format(format!("sheet {} column {}: {e}", sheet.name(), col + 1)))?;
    }

    let setup = &sheet.page_setup;
    if setup.landscape {
        worksheet.set_landscape();
    }
    if let Some(size) = setup.paper_size {
        worksheet.set_paper_size(size);
    }
    if let Some(scale) = setup.scale {
        worksheet.set_print_scale(scale);
    }

    for ((row, col), cell) in sheet.cells() {
        let format = to_format(&cell.style);
        let written = match &cell.value {
            CellValue::Text(text) if text.is_empty() => worksheet.write_blank(row, col, &format),
            CellValue::Text(text) => worksheet.write_string_with_format(row, col, text, &format),
            CellValue::Blank => worksheet.write_blank(row, col, &format),
            CellValue::Number(n) => worksheet.write_number_with_format(row, col, *n, &format),
            CellValue::Formula(formula) => {
                worksheet.write_formula_with_format(row, col, formula.as_str(), &format)
            }
            CellValue::Bool(b) => worksheet.write_boolean_with_format(row, col, *b, &format),
            CellValue::Error(e) => worksheet.write_string_with_format(row, col, e, &format),
        };
        written.map_err(|e| {
            RenderError::Format(format!("{}!R{}C{}: {e}", sheet.name(), row + 1, col + 1))
        })?;
    }
    Ok(())
}

fn to_format(style: &CellStyle) -> Format {
    let mut format = Format::new();
    if !style.num_format.is_empty() {
        format = format.set_num_format(&style.num_format);
    }
    if style.bold {
        format = format.set_bold();
    }
    if style.italic {
        format = format.set_italic();
    }
    if style.border {
        format = format.set_border(FormatBorder::Thin);
    }
    if let Some(rgb) = style.fill {
        format = format.set_background_color(Color::RGB(rgb));
    }
    if let Some(align) = style.align {
        format = format.set_align(match align {
            HorizontalAlign::Left => FormatAlign::Left,
            HorizontalAlign::Center => FormatAlign::Center,
            HorizontalAlign::Right => FormatAlign::Right,
        });
    }
    if style.wrap {
        format = format.set_text_wrap();
    }
    format
}
