//! Cell styles and sheet layout of `.xlsx` templates
//!
//! calamine reads values and formulas only. This module opens the package a
//! second time and walks the parts calamine skips:
//!
//! - `xl/styles.xml`: number formats, fonts, fills, borders and the `cellXfs`
//!   table every cell's `s` attribute points into
//! - `xl/workbook.xml` + its relationships: sheet name to worksheet part
//! - `xl/worksheets/*.xml`: per-cell style index (blank cells included),
//!   `<col>` widths and `<pageSetup>`
//!
//! Only what [`CellStyle`] and [`PageSetup`] can express is kept.

use crate::workbook::{CellStyle, HorizontalAlign, PageSetup};
use crate::RenderError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Seek};
use zip::result::ZipError;
use zip::ZipArchive;

const STYLES_PART: &str = "xl/styles.xml";
const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// Padding writers add to a character width when storing `<col width>`
const WIDTH_PADDINGS: [f64; 2] = [0.832_031_25, 0.710_937_5];
const WIDTH_TOLERANCE: f64 = 0.0005;

/// Styles and layout of one worksheet, keyed like [`Sheet`](crate::Sheet)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SheetLayout {
    /// Every `<c>` element, including cells without a value
    pub cells: BTreeMap<(u32, u16), CellStyle>,
    pub column_widths: BTreeMap<u16, f64>,
    pub page_setup: PageSetup,
}

/// Read the layout of every worksheet, keyed by sheet name
pub fn read_layouts<R: Read + Seek>(reader: R) -> Result<HashMap<String, SheetLayout>, RenderError> {
    let mut archive = ZipArchive::new(reader)
        .map_err(|e| RenderError::Template(format!("cannot read template: {e}")))?;

    let styles = match read_part(&mut archive, STYLES_PART)? {
        Some(xml) => parse_styles(&xml)?,
        None => Vec::new(),
    };
    let workbook = read_part(&mut archive, WORKBOOK_PART)?
        .ok_or_else(|| RenderError::Template(format!("{WORKBOOK_PART} is missing")))?;
    let rels = read_part(&mut archive, WORKBOOK_RELS_PART)?.unwrap_or_default();

    let mut layouts = HashMap::new();
    for (name, part) in sheet_parts(&workbook, &rels)? {
        if let Some(xml) = read_part(&mut archive, &part)? {
            layouts.insert(name, parse_sheet(&xml, &part, &styles)?);
        }
    }
    Ok(layouts)
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
) -> Result<Option<String>, RenderError> {
    let mut file = match archive.by_name(part) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(RenderError::Template(format!("{part}: {e}"))),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| RenderError::Template(format!("{part}: {e}")))?;
    Ok(Some(xml))
}

// ============================================================================
// XML walking
// ============================================================================

enum Element<'a> {
    Open(&'a BytesStart<'a>),
    Close(&'a [u8]),
}

/// Feed every element of `xml` to `visit`; empty elements open and close
fn walk(xml: &str, part: &str, mut visit: impl FnMut(Element<'_>)) -> Result<(), RenderError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => visit(Element::Open(&e)),
            Ok(Event::Empty(e)) => {
                visit(Element::Open(&e));
                visit(Element::Close(e.local_name().as_ref()));
            }
            Ok(Event::End(e)) => visit(Element::Close(e.local_name().as_ref())),
            Ok(Event::Eof) => return Ok(()),
            Err(e) => return Err(RenderError::Template(format!("{part}: {e}"))),
            _ => {}
        }
    }
}

fn attr(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn attr_num<T: std::str::FromStr>(element: &BytesStart<'_>, key: &[u8]) -> Option<T> {
    attr(element, key).and_then(|v| v.parse().ok())
}

/// `<b/>`, `<b val="1"/>` are on, `<b val="0"/>` is off
fn flag(element: &BytesStart<'_>, key: &[u8]) -> bool {
    attr(element, key).map_or(true, |v| v != "0" && v != "false")
}

/// Relationship id (`r:id`), whatever the namespace prefix
fn relationship_id(element: &BytesStart<'_>) -> Option<String> {
    element.attributes().flatten().find_map(|a| {
        (a.key.prefix().is_some() && a.key.local_name().as_ref() == b"id")
            .then(|| a.unescape_value().ok().map(|v| v.into_owned()))
            .flatten()
    })
}

// ============================================================================
// styles.xml
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    NumFmts,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

impl Section {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"numFmts" => Some(Section::NumFmts),
            b"fonts" => Some(Section::Fonts),
            b"fills" => Some(Section::Fills),
            b"borders" => Some(Section::Borders),
            b"cellXfs" => Some(Section::CellXfs),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Font {
    bold: bool,
    italic: bool,
}

#[derive(Default)]
struct Xf {
    num_fmt: u32,
    font: usize,
    fill: usize,
    border: usize,
    align: Option<HorizontalAlign>,
    wrap: bool,
}

/// Resolve the `cellXfs` table into one [`CellStyle`] per style index
fn parse_styles(xml: &str) -> Result<Vec<CellStyle>, RenderError> {
    let mut num_formats: HashMap<u32, String> = HashMap::new();
    let mut fonts: Vec<Font> = Vec::new();
    let mut fills: Vec<Option<u32>> = Vec::new();
    let mut borders: Vec<bool> = Vec::new();
    let mut xfs: Vec<Xf> = Vec::new();
    let mut section = None;

    walk(xml, STYLES_PART, |element| match element {
        Element::Open(e) => {
            let tag = e.local_name();
            let tag = tag.as_ref();
            if let Some(opened) = Section::from_tag(tag) {
                section = Some(opened);
                return;
            }
            match (section, tag) {
                (Some(Section::NumFmts), b"numFmt") => {
                    if let (Some(id), Some(code)) = (attr_num(e, b"numFmtId"), attr(e, b"formatCode")) {
                        num_formats.insert(id, code);
                    }
                }
                (Some(Section::Fonts), b"font") => fonts.push(Font::default()),
                (Some(Section::Fonts), b"b") => {
                    if let Some(font) = fonts.last_mut() {
                        font.bold = flag(e, b"val");
                    }
                }
                (Some(Section::Fonts), b"i") => {
                    if let Some(font) = fonts.last_mut() {
                        font.italic = flag(e, b"val");
                    }
                }
                (Some(Section::Fills), b"fill") => fills.push(None),
                (Some(Section::Fills), b"fgColor") => {
                    let rgb = attr(e, b"rgb").and_then(|argb| parse_rgb(&argb));
                    if let (Some(fill), Some(rgb)) = (fills.last_mut(), rgb) {
                        *fill = Some(rgb);
                    }
                }
                (Some(Section::Borders), b"border") => borders.push(false),
                (Some(Section::Borders), b"left" | b"right" | b"top" | b"bottom") => {
                    let drawn = attr(e, b"style").is_some_and(|style| style != "none");
                    if let Some(border) = borders.last_mut() {
                        *border |= drawn;
                    }
                }
                (Some(Section::CellXfs), b"xf") => xfs.push(Xf {
                    num_fmt: attr_num(e, b"numFmtId").unwrap_or(0),
                    font: attr_num(e, b"fontId").unwrap_or(0),
                    fill: attr_num(e, b"fillId").unwrap_or(0),
                    border: attr_num(e, b"borderId").unwrap_or(0),
                    ..Xf::default()
                }),
                (Some(Section::CellXfs), b"alignment") => {
                    if let Some(xf) = xfs.last_mut() {
                        xf.align = attr(e, b"horizontal").and_then(|h| match h.as_str() {
                            "left" => Some(HorizontalAlign::Left),
                            "center" | "centerContinuous" => Some(HorizontalAlign::Center),
                            "right" => Some(HorizontalAlign::Right),
                            _ => None,
                        });
                        xf.wrap = attr(e, b"wrapText").is_some_and(|v| v == "1" || v == "true");
                    }
                }
                _ => {}
            }
        }
        Element::Close(tag) => {
            if Section::from_tag(tag).is_some() {
                section = None;
            }
        }
    })?;

    Ok(xfs
        .iter()
        .map(|xf| {
            let font = fonts.get(xf.font);
            CellStyle {
                num_format: num_formats
                    .get(&xf.num_fmt)
                    .cloned()
                    .unwrap_or_else(|| builtin_num_format(xf.num_fmt).to_string()),
                bold: font.is_some_and(|f| f.bold),
                italic: font.is_some_and(|f| f.italic),
                border: borders.get(xf.border).copied().unwrap_or(false),
                fill: fills.get(xf.fill).copied().flatten(),
                align: xf.align,
                wrap: xf.wrap,
            }
        })
        .collect())
}

/// `FFRRGGBB` or `RRGGBB` to `0xRRGGBB`
fn parse_rgb(argb: &str) -> Option<u32> {
    let rgb = argb.get(argb.len().checked_sub(6)?..)?;
    u32::from_str_radix(rgb, 16).ok()
}

/// Format codes Excel implies for the reserved ids; empty is "General"
fn builtin_num_format(id: u32) -> &'static str {
    match id {
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        49 => "@",
        _ => "",
    }
}

// ============================================================================
// workbook.xml
// ============================================================================

/// Sheet names in workbook order with the zip path of their worksheet part
fn sheet_parts(workbook: &str, rels: &str) -> Result<Vec<(String, String)>, RenderError> {
    let mut targets = HashMap::new();
    walk(rels, WORKBOOK_RELS_PART, |element| {
        if let Element::Open(e) = element {
            if e.local_name().as_ref() == b"Relationship" {
                if let (Some(id), Some(target)) = (attr(e, b"Id"), attr(e, b"Target")) {
                    targets.insert(id, target);
                }
            }
        }
    })?;

    let mut sheets = Vec::new();
    walk(workbook, WORKBOOK_PART, |element| {
        if let Element::Open(e) = element {
            if e.local_name().as_ref() == b"sheet" {
                let target = relationship_id(e).and_then(|id| targets.get(&id));
                if let (Some(name), Some(target)) = (attr(e, b"name"), target) {
                    let part = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("xl/{target}"),
                    };
                    sheets.push((name, part));
                }
            }
        }
    })?;
    Ok(sheets)
}

// ============================================================================
// Worksheets
// ============================================================================

fn parse_sheet(xml: &str, part: &str, styles: &[CellStyle]) -> Result<SheetLayout, RenderError> {
    let mut layout = SheetLayout::default();

    walk(xml, part, |element| {
        let Element::Open(e) = element else {
            return;
        };
        match e.local_name().as_ref() {
            b"c" => {
                let Some(pos) = attr(e, b"r").as_deref().and_then(parse_cell_ref) else {
                    return;
                };
                let style = attr_num::<usize>(e, b"s")
                    .and_then(|index| styles.get(index))
                    .cloned()
                    .unwrap_or_default();
                layout.cells.insert(pos, style);
            }
            b"col" => {
                let custom = attr(e, b"customWidth").is_some_and(|v| v == "1" || v == "true");
                let width = attr_num::<f64>(e, b"width");
                let (Some(min), Some(max), Some(width), true) =
                    (attr_num::<u16>(e, b"min"), attr_num::<u16>(e, b"max"), width, custom)
                else {
                    return;
                };
                for col in min.max(1)..=max {
                    layout.column_widths.insert(col - 1, strip_padding(width));
                }
            }
            b"pageSetup" => {
                layout.page_setup = PageSetup {
                    scale: attr_num(e, b"scale"),
                    landscape: attr(e, b"orientation").is_some_and(|o| o == "landscape"),
                    paper_size: attr_num(e, b"paperSize"),
                };
            }
            _ => {}
        }
    })?;
    Ok(layout)
}

/// `"J2"` to `(1, 9)`
fn parse_cell_ref(reference: &str) -> Option<(u32, u16)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() {
        return None;
    }
    let col = letters.bytes().try_fold(0u32, |acc, b| {
        b.is_ascii_uppercase().then(|| acc * 26 + u32::from(b - b'A') + 1)
    })?;
    let row: u32 = digits.parse().ok()?;
    Some((row.checked_sub(1)?, u16::try_from(col - 1).ok()?))
}

/// Character width as the writer was given it
fn strip_padding(stored: f64) -> f64 {
    let frac = stored % 1.0;
    WIDTH_PADDINGS
        .iter()
        .find(|padding| (frac - *padding).abs() < WIDTH_TOLERANCE && stored >= **padding)
        .map_or(stored, |padding| ((stored - padding) * 10_000.0).round() / 10_000.0)
}
