//! CSV tables shared by every stage that reads tabular data.

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim, WriterBuilder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Input path not found: {path}")]
    NotFound { path: PathBuf },
    #[error("Failed to list {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("No CSV files found under {path}")]
    NoCsvFiles { path: PathBuf },
    #[error("Invalid CSV in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Missing column '{column}'")]
    MissingColumn { column: String },
    #[error("Column '{column}' row {row}: could not convert '{value}' to a number")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },
}

/// Header-ordered rows of string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Borrow every cell of a named column.
    pub fn column(&self, name: &str) -> Result<Vec<&str>, TableError> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|row| cell(row, idx)).collect())
    }

    /// Parse a named column as numbers; empty or non-numeric cells are errors.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, TableError> {
        let idx = self.require_column(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row_idx, row)| {
                let value = cell(row, idx);
                parse_number(value).ok_or_else(|| TableError::NotNumeric {
                    column: name.to_string(),
                    row: row_idx,
                    value: value.to_string(),
                })
            })
            .collect()
    }

    /// Build a row-major `f32` matrix from the named columns, in the given order.
    pub fn feature_matrix(&self, columns: &[String]) -> Result<Vec<Vec<f32>>, TableError> {
        let mut matrix = vec![Vec::with_capacity(columns.len()); self.rows.len()];
        for column in columns {
            for (row, value) in matrix.iter_mut().zip(self.numeric_column(column)?) {
                row.push(value as f32);
            }
        }
        Ok(matrix)
    }

    /// Append another table's rows, unioning columns in first-seen order.
    ///
    /// Cells for columns a table does not carry are left empty.
    pub fn append(&mut self, other: Table) {
        let mut mapping = Vec::with_capacity(other.headers.len());
        for header in &other.headers {
            let idx = match self.column_index(header) {
                Some(idx) => idx,
                None => {
                    self.headers.push(header.clone());
                    for row in &mut self.rows {
                        row.push(String::new());
                    }
                    self.headers.len() - 1
                }
            };
            mapping.push(idx);
        }
        let width = self.headers.len();
        for row in other.rows {
            let mut out = vec![String::new(); width];
            for (value, &idx) in row.into_iter().zip(mapping.iter()) {
                out[idx] = value;
            }
            self.rows.push(out);
        }
    }

    fn require_column(&self, name: &str) -> Result<usize, TableError> {
        self.column_index(name)
            .ok_or_else(|| TableError::MissingColumn {
                column: name.to_string(),
            })
    }
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Parse a CSV cell as a number, treating blanks as missing.
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok()
}

/// Resolve a file path or a directory of `*.csv` files into a sorted list.
pub fn csv_inputs(path: &Path) -> Result<Vec<PathBuf>, TableError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(TableError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let mut files = std::fs::read_dir(path)
        .map_err(|source| TableError::ReadDir {
            path: path.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect::<Vec<_>>();
    files.sort();
    Ok(files)
}

/// Load one CSV file or concatenate every CSV file in a directory.
pub fn load_tables(path: &Path) -> Result<Table, TableError> {
    let files = csv_inputs(path)?;
    if files.is_empty() {
        return Err(TableError::NoCsvFiles {
            path: path.to_path_buf(),
        });
    }
    tracing::info!("Found {} CSV file(s) under {}", files.len(), path.display());
    let mut table = Table::default();
    for file in &files {
        table.append(read_csv(file)?);
    }
    tracing::info!(
        rows = table.len(),
        columns = table.headers.len(),
        "Loaded dataset with columns {:?}",
        table.headers
    );
    Ok(table)
}

pub fn read_csv(path: &Path) -> Result<Table, TableError> {
    let csv_err = |source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_string)
        .collect();
    let mut table = Table::new(headers);
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        table.rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(table)
}

/// Write a table with its header row, creating parent directories.
pub fn write_csv(path: &Path, table: &Table) -> Result<(), TableError> {
    let write_err = |source| TableError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .map_err(|source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    let mut write_record = |record: &[String]| {
        writer.write_record(record).map_err(|source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        })
    };
    write_record(&table.headers)?;
    for row in &table.rows {
        write_record(row)?;
    }
    writer.flush().map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|v| v.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn append_unions_columns_in_first_seen_order() {
        let mut left = table(&["a", "b"], &[&["1", "2"]]);
        left.append(table(&["b", "c"], &[&["3", "4"]]));
        assert_eq!(left.headers, vec!["a", "b", "c"]);
        assert_eq!(left.rows[0], vec!["1", "2", ""]);
        assert_eq!(left.rows[1], vec!["", "3", "4"]);
    }

    #[test]
    fn numeric_column_reports_bad_cells() {
        let t = table(&["x"], &[&["1.5"], &["oops"]]);
        let err = t.numeric_column("x").unwrap_err();
        assert!(matches!(err, TableError::NotNumeric { row: 1, .. }));
        assert!(matches!(
            t.numeric_column("y").unwrap_err(),
            TableError::MissingColumn { .. }
        ));
    }

    #[test]
    fn directory_inputs_are_concatenated_in_name_order() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.csv"), "x,label\n3,1\n").unwrap();
        std::fs::write(dir.path().join("a.csv"), "x,label\n1,0\n2,1\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let loaded = load_tables(dir.path()).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.column("x").unwrap(), vec!["1", "2", "3"]);
    }

    #[test]
    fn empty_directory_and_missing_path_fail() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_tables(dir.path()).unwrap_err(),
            TableError::NoCsvFiles { .. }
        ));
        assert!(matches!(
            load_tables(&dir.path().join("missing")).unwrap_err(),
            TableError::NotFound { .. }
        ));
    }

    #[test]
    fn write_then_read_keeps_headers_and_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");
        let t = table(&["name", "value"], &[&["a, b", "1"]]);
        write_csv(&path, &t).unwrap();
        assert_eq!(read_csv(&path).unwrap(), t);
    }
}
