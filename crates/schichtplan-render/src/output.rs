//! Per-person output files

use crate::RenderError;
use schichtplan_core::FileNaming;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of writing the generated workbook for every requested person
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputSummary {
    /// Number of people the run was asked for
    pub requested: usize,
    /// Files that were written, primary file first
    pub written: Vec<PathBuf>,
    /// Copies that could not be created
    pub failed: Vec<PathBuf>,
}

impl OutputSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Write `bytes` once per person into `dir`.
///
/// The file for the first name is written directly. Every further name gets
/// a byte-for-byte copy of it. A failing primary write aborts the run, a
/// failing copy is logged and skipped.
pub fn write_outputs(
    bytes: &[u8],
    names: &[String],
    year: i32,
    dir: &Path,
    naming: FileNaming,
) -> Result<OutputSummary, RenderError> {
    let Some((primary_name, others)) = names.split_first() else {
        return Err(RenderError::InvalidData("no person names to write".into()));
    };

    fs::create_dir_all(dir).map_err(|source| RenderError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let primary = dir.join(naming.file_name(primary_name, year));
    fs::write(&primary, bytes).map_err(|source| RenderError::Write {
        path: primary.clone(),
        source,
    })?;
    info!(path = %primary.display(), "wrote schedule");

    let mut summary = OutputSummary {
        requested: names.len(),
        written: vec![primary.clone()],
        failed: Vec::new(),
    };

    for name in others {
        let target = dir.join(naming.file_name(name, year));
        if target == primary {
            continue;
        }
        match fs::copy(&primary, &target) {
            Ok(_) => {
                info!(path = %target.display(), "copied schedule");
                summary.written.push(target);
            }
            Err(e) => {
                warn!(path = %target.display(), error = %e, "failed to copy schedule");
                summary.failed.push(target);
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn one_file_per_person() {
        let dir = TempDir::new().unwrap();
        let summary = write_outputs(
            b"PK-bytes",
            &names(&["Anna", "Ben", "Cem"]),
            2019,
            dir.path(),
            FileNaming::PersonFirst,
        )
        .unwrap();

        assert_eq!(summary.requested, 3);
        assert_eq!(summary.written.len(), 3);
        assert!(summary.is_complete());
        for name in ["Anna", "Ben", "Cem"] {
            let path = dir.path().join(format!("{name} Schichtplan 2019.xlsx"));
            assert_eq!(fs::read(&path).unwrap(), b"PK-bytes");
        }
    }

    #[test]
    fn legacy_naming_and_nested_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("out").join("2019");
        let summary =
            write_outputs(b"x", &names(&["Anna"]), 2019, &nested, FileNaming::Legacy).unwrap();

        assert_eq!(summary.written, vec![nested.join("Schichtplan Anna 2019.xlsx")]);
        assert!(nested.join("Schichtplan Anna 2019.xlsx").is_file());
    }

    #[test]
    fn duplicate_name_is_written_once() {
        let dir = TempDir::new().unwrap();
        let summary = write_outputs(
            b"x",
            &names(&["Anna", "Anna"]),
            2019,
            dir.path(),
            FileNaming::PersonFirst,
        )
        .unwrap();

        assert_eq!(summary.requested, 2);
        assert_eq!(summary.written.len(), 1);
        assert!(summary.is_complete());
    }

    #[test]
    fn existing_files_are_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Anna Schichtplan 2019.xlsx");
        fs::write(&path, b"old").unwrap();

        write_outputs(b"new", &names(&["Anna"]), 2019, dir.path(), FileNaming::PersonFirst)
            .unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn unwritable_directory_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"").unwrap();

        let result = write_outputs(b"x", &names(&["Anna"]), 2019, &blocker, FileNaming::PersonFirst);
        assert!(matches!(result, Err(RenderError::Write { .. })));
    }

    #[test]
    fn failed_copy_is_reported() {
        let dir = TempDir::new().unwrap();
        // A directory in place of the copy target makes fs::copy fail
        fs::create_dir(dir.path().join("Ben Schichtplan 2019.xlsx")).unwrap();

        let summary = write_outputs(
            b"x",
            &names(&["Anna", "Ben", "Cem"]),
            2019,
            dir.path(),
            FileNaming::PersonFirst,
        )
        .unwrap();

        assert_eq!(summary.written.len(), 2);
        assert_eq!(summary.failed, vec![dir.path().join("Ben Schichtplan 2019.xlsx")]);
        assert!(!summary.is_complete());
    }

    #[test]
    fn empty_name_list_is_rejected() {
        let dir = TempDir::new().unwrap();
        let result = write_outputs(b"x", &[], 2019, dir.path(), FileNaming::PersonFirst);
        assert!(matches!(result, Err(RenderError::InvalidData(_))));
    }
}
