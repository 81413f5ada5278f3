//! Filesystem access.
//!
//! RULE: Only store.rs opens files.
//! Everything else works on in-memory tables and strings.

use crate::{
    error::{GraphError, GraphResult},
    table::{Cell, RecordTable},
};
use std::{fs::File, io::BufReader, path::Path};

/// Load a CSV file into a record table, reading at most `row_cap` rows.
/// A missing file surfaces as `GraphError::Io` with a NotFound cause.
pub fn load_table(path: impl AsRef<Path>, row_cap: Option<usize>) -> GraphResult<RecordTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| GraphError::io(path, e))?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let table = RecordTable::from_reader(name, BufReader::new(file), row_cap)?;
    log::info!("loaded {} rows from {}", table.len(), path.display());
    Ok(table)
}

/// Write a table back out as CSV (used for the cleaned copies).
pub fn write_table(path: impl AsRef<Path>, table: &RecordTable) -> GraphResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| GraphError::io(path, e))?;
    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record(table.headers())?;
    for row in table.rows() {
        wtr.write_record(row.cells().iter().map(Cell::raw))?;
    }
    wtr.flush().map_err(|e| GraphError::io(path, e))?;
    log::info!("wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Read a whole text file (pipeline configs).
pub fn read_document(path: impl AsRef<Path>) -> GraphResult<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|e| GraphError::io(path, e))
}

/// Write a finished document (HTML) to `path`, replacing any existing file.
pub fn write_document(path: impl AsRef<Path>, contents: &str) -> GraphResult<()> {
    let path = path.as_ref();
    std::fs::write(path, contents).map_err(|e| GraphError::io(path, e))?;
    log::info!("wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_table(dir.path().join("absent.csv"), None).unwrap_err();
        assert!(err.is_not_found(), "got {err:?}");
    }

    #[test]
    fn written_table_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let src = "id,name,funding_total_usd\nc:1,Acme,1000\nc:2,\"Beta, Inc\",\n";
        let table = RecordTable::from_reader("objects", src.as_bytes(), None).unwrap();

        let path = dir.path().join("objects_cleaned.csv");
        write_table(&path, &table).unwrap();
        let loaded = load_table(&path, None).unwrap();

        assert_eq!(loaded.name(), "objects_cleaned");
        assert_eq!(loaded.headers(), table.headers());
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.row(1).unwrap().key("name").as_deref(), Some("Beta, Inc"));
        assert!(!loaded.row(1).unwrap().is_present("funding_total_usd"));
    }

    #[test]
    fn cleaned_copy_keeps_input_text() {
        let dir = tempfile::tempdir().unwrap();
        let src = "id,name,zip,price\nc:1,Infinity,02139,10.50\n007,Bond,1.0,1e3\n";
        let table = RecordTable::from_reader("objects", src.as_bytes(), None).unwrap();

        let path = dir.path().join("objects_cleaned.csv");
        write_table(&path, &table).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, src);
    }

    #[test]
    fn read_document_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_document(dir.path().join("absent.json")).unwrap_err();
        assert!(err.is_not_found(), "got {err:?}");
    }
}
