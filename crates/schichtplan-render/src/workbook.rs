//! In-memory workbook model
//!
//! Templates are read into and transformed on this model; the
//! [`xlsx`](crate::xlsx) module serializes it. Cells are addressed by
//! 0-based `(row, col)` pairs and kept in row-major order.

use crate::RenderError;
use std::collections::BTreeMap;

// ============================================================================
// Cell Values
// ============================================================================

/// Tag of a [`CellValue`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    Text,
    Blank,
    Numeric,
    Formula,
    Boolean,
    Error,
}

/// Content of a cell. Formulas are stored without the leading `=`.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Blank,
    Number(f64),
    Formula(String),
    Bool(bool),
    Error(String),
}

impl CellValue {
    pub fn text(text: impl Into<String>) -> Self {
        CellValue::Text(text.into())
    }

    pub fn formula(formula: impl AsRef<str>) -> Self {
        let formula = formula.as_ref();
        CellValue::Formula(formula.strip_prefix('=').unwrap_or(formula).to_string())
    }

    pub fn kind(&self) -> CellKind {
        match self {
            CellValue::Text(_) => CellKind::Text,
            CellValue::Blank => CellKind::Blank,
            CellValue::Number(_) => CellKind::Numeric,
            CellValue::Formula(_) => CellKind::Formula,
            CellValue::Bool(_) => CellKind::Boolean,
            CellValue::Error(_) => CellKind::Error,
        }
    }

    /// The value as a plain string, formulas with their `=`
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(text) => text.clone(),
            CellValue::Blank => String::new(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Formula(formula) => format!("={formula}"),
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
            CellValue::Error(error) => error.clone(),
        }
    }

    /// True for blank cells and empty text
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Blank => true,
            CellValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Convert to `kind` where the content allows it.
    ///
    /// Values that cannot be represented as `kind` are returned unchanged,
    /// formulas are never synthesized from other values.
    pub fn coerce(self, kind: CellKind) -> Self {
        if self.kind() == kind {
            return self;
        }
        match (kind, self) {
            (CellKind::Text, value) => CellValue::Text(value.as_text()),
            (CellKind::Blank, value) if value.is_empty() => CellValue::Blank,
            (CellKind::Numeric, CellValue::Text(text)) => match text.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) if text.is_empty() => CellValue::Blank,
                Err(_) => CellValue::Text(text),
            },
            (CellKind::Numeric, CellValue::Bool(b)) => CellValue::Number(if b { 1.0 } else { 0.0 }),
            (CellKind::Boolean, CellValue::Text(text)) => {
                match text.trim().to_ascii_uppercase().as_str() {
                    "TRUE" => CellValue::Bool(true),
                    "FALSE" => CellValue::Bool(false),
                    _ => CellValue::Text(text),
                }
            }
            (CellKind::Boolean, CellValue::Number(n)) => CellValue::Bool(n != 0.0),
            (_, value) => value,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// ============================================================================
// Styles
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

/// Visual style of a cell.
///
/// A plain value type: every cell owns its copy, so changing one cell's
/// number format never leaks into another cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellStyle {
    /// Excel number format code, empty for "General"
    pub num_format: String,
    pub bold: bool,
    pub italic: bool,
    /// Thin border on all sides
    pub border: bool,
    /// Background colour as `0xRRGGBB`
    pub fill: Option<u32>,
    pub align: Option<HorizontalAlign>,
    pub wrap: bool,
}

impl CellStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_format(mut self, code: impl Into<String>) -> Self {
        self.num_format = code.into();
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn border(mut self) -> Self {
        self.border = true;
        self
    }

    pub fn fill(mut self, rgb: u32) -> Self {
        self.fill = Some(rgb);
        self
    }

    pub fn align(mut self, align: HorizontalAlign) -> Self {
        self.align = Some(align);
        self
    }

    pub fn wrap(mut self) -> Self {
        self.wrap = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

impl Cell {
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            style: CellStyle::default(),
        }
    }

    pub fn styled(value: CellValue, style: CellStyle) -> Self {
        Self { value, style }
    }
}

// ============================================================================
// Sheets
// ============================================================================

/// Print layout hints
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageSetup {
    /// Print scale in percent
    pub scale: Option<u16>,
    pub landscape: bool,
    /// Excel paper size index (9 = A4)
    pub paper_size: Option<u8>,
}

impl PageSetup {
    pub const A4: u8 = 9;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<(u32, u16), Cell>,
    column_widths: BTreeMap<u16, f64>,
    pub page_setup: PageSetup,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn value(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cell(row, col).map(|cell| &cell.value)
    }

    pub fn set_cell(&mut self, row: u32, col: u16, cell: Cell) {
        self.cells.insert((row, col), cell);
    }

    /// Replace the value of a cell, keeping its style
    pub fn set_value(&mut self, row: u32, col: u16, value: CellValue) {
        self.cells
            .entry((row, col))
            .and_modify(|cell| cell.value = value.clone())
            .or_insert_with(|| Cell::new(value));
    }

    /// All populated cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = ((u32, u16), &Cell)> {
        self.cells.iter().map(|(&pos, cell)| (pos, cell))
    }

    /// Cells of one row, left to right
    pub fn row(&self, row: u32) -> impl Iterator<Item = (u16, &Cell)> {
        self.cells
            .range((row, 0)..=(row, u16::MAX))
            .map(|(&(_, col), cell)| (col, cell))
    }

    /// Index of the last populated row
    pub fn last_row(&self) -> Option<u32> {
        self.cells.keys().next_back().map(|&(row, _)| row)
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub fn column_widths(&self) -> &BTreeMap<u16, f64> {
        &self.column_widths
    }
}

// ============================================================================
// Workbook
// ============================================================================

/// Ordered collection of uniquely named sheets
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|sheet| sheet.name == name)
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.position(name).map(|index| &self.sheets[index])
    }

    /// Append a sheet; names must be unique within the workbook
    pub fn push_sheet(&mut self, sheet: Sheet) -> Result<usize, RenderError> {
        if self.position(&sheet.name).is_some() {
            return Err(RenderError::InvalidData(format!(
                "duplicate sheet name: {}",
                sheet.name
            )));
        }
        self.sheets.push(sheet);
        Ok(self.sheets.len() - 1)
    }

    /// Append a copy of the sheet at `index` under a new name
    pub fn clone_sheet(&mut self, index: usize, name: &str) -> Result<usize, RenderError> {
        let mut copy = self
            .sheet(index)
            .cloned()
            .ok_or_else(|| RenderError::InvalidData(format!("no sheet at index {index}")))?;
        copy.set_name(name);
        self.push_sheet(copy)
    }

    pub fn remove_sheet(&mut self, index: usize) -> Option<Sheet> {
        (index < self.sheets.len()).then(|| self.sheets.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn coerce_to_template_kind() {
        assert_eq!(CellValue::Number(3.0).coerce(CellKind::Text), CellValue::text("3"));
        assert_eq!(CellValue::text("").coerce(CellKind::Blank), CellValue::Blank);
        assert_eq!(CellValue::text("x").coerce(CellKind::Blank), CellValue::text("x"));
        assert_eq!(CellValue::text("2.5").coerce(CellKind::Numeric), CellValue::Number(2.5));
        assert_eq!(CellValue::text("TRUE").coerce(CellKind::Boolean), CellValue::Bool(true));
        assert_eq!(
            CellValue::text("abc").coerce(CellKind::Formula),
            CellValue::text("abc")
        );
    }

    #[test]
    fn formula_prefix_is_stripped() {
        assert_eq!(CellValue::formula("=SUM(A1:A3)"), CellValue::Formula("SUM(A1:A3)".into()));
        assert_eq!(CellValue::formula("SUM(A1:A3)").as_text(), "=SUM(A1:A3)");
    }

    #[test]
    fn set_value_keeps_style() {
        let mut sheet = Sheet::new("S");
        sheet.set_cell(1, 1, Cell::styled(CellValue::Number(1.0), CellStyle::new().bold()));
        sheet.set_value(1, 1, CellValue::text("x"));

        let cell = sheet.cell(1, 1).unwrap();
        assert_eq!(cell.value, CellValue::text("x"));
        assert!(cell.style.bold);
    }

    #[test]
    fn row_iteration_is_ordered() {
        let mut sheet = Sheet::new("S");
        sheet.set_value(2, 5, CellValue::Blank);
        sheet.set_value(2, 1, CellValue::Blank);
        sheet.set_value(3, 0, CellValue::Blank);

        let cols: Vec<u16> = sheet.row(2).map(|(col, _)| col).collect();
        assert_eq!(cols, vec![1, 5]);
        assert_eq!(sheet.last_row(), Some(3));
    }

    #[test]
    fn sheet_names_are_unique() {
        let mut book = Workbook::new();
        book.push_sheet(Sheet::new("A")).unwrap();
        assert!(book.push_sheet(Sheet::new("A")).is_err());

        let index = book.clone_sheet(0, "B").unwrap();
        assert_eq!(index, 1);
        assert!(book.clone_sheet(0, "B").is_err());
        assert_eq!(book.remove_sheet(0).map(|s| s.name().to_string()), Some("A".into()));
        assert_eq!(book.position("B"), Some(0));
    }
}
