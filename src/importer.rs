// CSV Importer - employees.csv → Employee entities
//
// One record per line, no header: first_name,last_name,weekly_salary.
// The two conditions the program reports to the user (missing file, empty
// file) get their own error variants; everything else malformed aborts the
// import for the run.

use crate::employee::Employee;
use csv::ReaderBuilder;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Failures at the import boundary.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The employee file does not exist.
    #[error("employee file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The employee file opened but contained no records at all.
    #[error("employee file is empty: {path}")]
    EmptyFile { path: PathBuf },

    /// A row with missing fields or a non-numeric salary; extra trailing
    /// fields are ignored. `line` is the 1-based record number.
    #[error("malformed employee row {line} in {path}: {source}")]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: csv::Error,
    },

    /// Any other I/O failure while reading the file.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// IMPORT
// ============================================================================

/// One raw CSV row. Fields deserialize positionally since the file carries
/// no header.
#[derive(Debug, Deserialize)]
struct CsvEmployeeRow {
    first_name: String,
    last_name: String,
    weekly_salary: f64,
}

/// Read an employee CSV and append one `Employee` per row to `employees`.
///
/// Returns the number of rows appended. On a malformed row the import stops
/// with an error; rows appended before the bad one stay in the collection,
/// matching the append-in-place contract.
pub fn import_csv(path: &Path, employees: &mut Vec<Employee>) -> ImportResult<usize> {
    let file = File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => ImportError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ImportError::Io {
            path: path.to_path_buf(),
            source: err,
        },
    })?;

    let mut reader = ReaderBuilder::new().has_headers(false).from_reader(file);

    let mut appended = 0;
    for (index, result) in reader.deserialize::<CsvEmployeeRow>().enumerate() {
        let row = result.map_err(|err| row_error(path, index + 1, err))?;

        employees.push(Employee::new(
            row.first_name,
            row.last_name,
            row.weekly_salary,
        ));
        appended += 1;
    }

    // Zero-byte and whitespace-only files both land here: no records, which
    // is a distinct condition from the file being absent.
    if appended == 0 {
        return Err(ImportError::EmptyFile {
            path: path.to_path_buf(),
        });
    }

    Ok(appended)
}

/// Sort a per-record error into the right variant: a failure reading the
/// underlying file is `Io` (a directory path fails here, not at open), and
/// everything else is a malformed row.
fn row_error(path: &Path, line: usize, err: csv::Error) -> ImportError {
    if !err.is_io_error() {
        return ImportError::Malformed {
            path: path.to_path_buf(),
            line,
            source: err,
        };
    }

    let source = match err.into_kind() {
        csv::ErrorKind::Io(source) => source,
        kind => io::Error::new(io::ErrorKind::Other, format!("{kind:?}")),
    };

    ImportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// SHA-256 of the file bytes, as lowercase hex. Recorded alongside a seed so
/// the store remembers exactly which file it was loaded from.
pub fn file_checksum(path: &Path) -> ImportResult<String> {
    let bytes = std::fs::read(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => ImportError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ImportError::Io {
            path: path.to_path_buf(),
            source: err,
        },
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_csv(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_import_well_formed_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "employees.csv",
            "David,Barnes,835.00\nJames,Kirk,453.00\nJean-Luc,Picard,290.00\n",
        );

        let mut employees = Vec::new();
        let appended = import_csv(&path, &mut employees).unwrap();

        assert_eq!(appended, 3);
        assert_eq!(employees.len(), 3);

        assert_eq!(employees[0].first_name, "David");
        assert_eq!(employees[0].last_name, "Barnes");
        assert_eq!(employees[0].weekly_salary, 835.00);
        assert_eq!(employees[0].id, None);

        assert_eq!(employees[2].first_name, "Jean-Luc");
        assert_eq!(employees[2].weekly_salary, 290.00);
    }

    #[test]
    fn test_import_appends_to_existing_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "employees.csv", "Kathryn,Janeway,184.00\n");

        let mut employees = vec![Employee::new(
            "Jonathan".to_string(),
            "Archer".to_string(),
            135.00,
        )];
        let appended = import_csv(&path, &mut employees).unwrap();

        assert_eq!(appended, 1);
        assert_eq!(employees.len(), 2);
        assert_eq!(employees[0].first_name, "Jonathan");
        assert_eq!(employees[1].first_name, "Kathryn");
    }

    #[test]
    fn test_import_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");

        let mut employees = Vec::new();
        let err = import_csv(&path, &mut employees).unwrap_err();

        assert!(matches!(err, ImportError::FileNotFound { .. }));
        assert!(employees.is_empty());
    }

    #[test]
    fn test_import_zero_byte_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "employees.csv", "");

        let mut employees = Vec::new();
        let err = import_csv(&path, &mut employees).unwrap_err();

        assert!(matches!(err, ImportError::EmptyFile { .. }));
    }

    #[test]
    fn test_import_whitespace_only_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "employees.csv", "\n\n");

        let mut employees = Vec::new();
        let err = import_csv(&path, &mut employees).unwrap_err();

        assert!(matches!(err, ImportError::EmptyFile { .. }));
    }

    #[test]
    fn test_empty_and_not_found_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let empty = write_csv(&dir, "empty.csv", "");
        let absent = dir.path().join("absent.csv");

        let empty_err = import_csv(&empty, &mut Vec::new()).unwrap_err();
        let absent_err = import_csv(&absent, &mut Vec::new()).unwrap_err();

        assert!(matches!(empty_err, ImportError::EmptyFile { .. }));
        assert!(matches!(absent_err, ImportError::FileNotFound { .. }));
    }

    #[test]
    fn test_import_directory_path_is_io_error() {
        // A directory opens fine but fails on the first read, which must
        // surface as an I/O problem rather than a bad row.
        let dir = tempfile::tempdir().unwrap();

        let err = import_csv(dir.path(), &mut Vec::new()).unwrap_err();

        assert!(matches!(err, ImportError::Io { .. }));
    }

    #[test]
    fn test_import_non_numeric_salary_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "employees.csv", "David,Barnes,lots\n");

        let err = import_csv(&path, &mut Vec::new()).unwrap_err();

        match err {
            ImportError::Malformed { line, .. } => assert_eq!(line, 1),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_import_short_row_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "employees.csv", "David,Barnes\n");

        let err = import_csv(&path, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ImportError::Malformed { .. }));
    }

    #[test]
    fn test_import_ignores_extra_trailing_fields() {
        // Only the first three fields count; uniform extras pass through.
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "employees.csv",
            "David,Barnes,835.00,extra\nJames,Kirk,453.00,extra\n",
        );

        let mut employees = Vec::new();
        let appended = import_csv(&path, &mut employees).unwrap();

        assert_eq!(appended, 2);
        assert_eq!(employees[0].weekly_salary, 835.00);
        assert_eq!(employees[1].last_name, "Kirk");
    }

    #[test]
    fn test_import_stops_at_first_bad_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "employees.csv",
            "David,Barnes,835.00\nBenjamin,Sisko,not-a-number\nKathryn,Janeway,184.00\n",
        );

        let mut employees = Vec::new();
        let err = import_csv(&path, &mut employees).unwrap_err();

        match err {
            ImportError::Malformed { line, .. } => assert_eq!(line, 2),
            other => panic!("expected Malformed, got {other:?}"),
        }
        // The row before the bad one was already appended.
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].first_name, "David");
    }

    #[test]
    fn test_import_accepts_negative_salary() {
        // Non-negative in practice, but unenforced.
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "employees.csv", "Owing,Money,-12.50\n");

        let mut employees = Vec::new();
        import_csv(&path, &mut employees).unwrap();

        assert_eq!(employees[0].weekly_salary, -12.50);
    }

    #[test]
    fn test_error_display_names_the_path() {
        let not_found = ImportError::FileNotFound {
            path: PathBuf::from("employees.csv"),
        };
        assert_eq!(
            not_found.to_string(),
            "employee file not found: employees.csv"
        );

        let empty = ImportError::EmptyFile {
            path: PathBuf::from("employees.csv"),
        };
        assert_eq!(empty.to_string(), "employee file is empty: employees.csv");
    }

    #[test]
    fn test_file_checksum_is_stable_hex() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "employees.csv", "David,Barnes,835.00\n");

        let first = file_checksum(&path).unwrap();
        let second = file_checksum(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_file_checksum_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = file_checksum(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound { .. }));
    }
}
