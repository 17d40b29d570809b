//! # schichtplan-render
//!
//! Template-driven rendering of yearly shift-schedule workbooks.
//!
//! This crate provides:
//! - An in-memory workbook model (`Workbook`, `Sheet`, `Cell`)
//! - The built-in template and a loader for external `.xlsx` templates
//! - Month and summary sheet transformers
//! - The `WorkbookAssembler` that turns a template into 13 populated sheets
//! - XLSX serialization and the per-person output fanout
//!
//! ## Example
//!
//! ```rust,ignore
//! use schichtplan_core::{GenerationContext, GeneratorConfig};
//! use schichtplan_render::{template, xlsx, WorkbookAssembler};
//!
//! let calendar = GenerationContext::build(&config, today)?;
//! let template = template::builtin(profile)?;
//! let workbook = WorkbookAssembler::new(profile, locale).assemble(&template, &calendar)?;
//! let bytes = xlsx::render_to_bytes(&workbook, calendar.target_year())?;
//! std::fs::write("Anna Schichtplan 2019.xlsx", bytes)?;
//! ```

pub mod assemble;
pub mod output;
pub mod styles;
pub mod template;
pub mod transform;
pub mod workbook;
pub mod xlsx;

pub use assemble::WorkbookAssembler;
pub use output::{write_outputs, OutputSummary};
pub use workbook::{Cell, CellKind, CellStyle, CellValue, HorizontalAlign, PageSetup, Sheet, Workbook};

use chrono::NaiveDate;
use schichtplan_core::{ConfigError, GenerationContext, GeneratorConfig};
use std::path::PathBuf;
use thiserror::Error;

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Run a complete generation: calendar, template, assembly, files.
///
/// `today` decides the default target year and the current year shown on
/// the summary sheet.
pub fn generate(config: &GeneratorConfig, today: NaiveDate) -> Result<OutputSummary, RenderError> {
    let calendar = GenerationContext::build(config, today)?;
    let profile = config.template_profile()?;
    let locale = config.locale()?;

    let template = match &config.template {
        Some(path) => template::load(path)?,
        None => template::builtin(profile)?,
    };

    let workbook = WorkbookAssembler::new(profile, locale).assemble(&template, &calendar)?;
    let bytes = xlsx::render_to_bytes(&workbook, calendar.target_year())?;

    write_outputs(
        &bytes,
        calendar.person_names(),
        calendar.target_year(),
        &config.output_dir(),
        config.file_naming(),
    )
}
