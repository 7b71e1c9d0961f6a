//! CSV file handling module for framesql
//!
//! This module moves dataframes between delimited text files and memory. It
//! provides functionality for:
//!
//! - Parsing file specifications in the format `[table_name=]file_path.csv`
//! - Reading delimited files with a header row into dataframes, inferring the
//!   type of every cell
//! - Writing dataframes as delimited text, index columns first
//! - Resolving the field separator given on the command line

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::dataframe::DataFrame;
use crate::error::{FrameSqlError, FrameSqlResult};
use crate::value::Value;

/// A file to load and the table to load it into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    /// Name of the target table
    pub table: String,
    /// Path of the file
    pub path: PathBuf,
}

/// Parse a file specification into table name and file path
///
/// Handles two formats:
/// 1. `table_name=file_path.csv` - Explicit table name and file path
/// 2. `file_path.csv` - Table name derived from the file name
///
/// # Returns
/// * `Ok(FileSpec)` with the table name and path
/// * `Err(InvalidInput)` if no table name can be derived
pub fn parse_file_spec(file_spec: &str) -> FrameSqlResult<FileSpec> {
    if let Some((table, path)) = file_spec.split_once('=') {
        if table.is_empty() || path.is_empty() {
            return Err(FrameSqlError::InvalidInput(format!(
                "Invalid file specification: {}",
                file_spec
            )));
        }
        return Ok(FileSpec {
            table: table.to_string(),
            path: PathBuf::from(path),
        });
    }

    let path = PathBuf::from(file_spec);
    let stem = path.file_stem().ok_or_else(|| {
        FrameSqlError::InvalidInput(format!("Invalid file specification: {}", file_spec))
    })?;

    Ok(FileSpec {
        table: stem.to_string_lossy().to_string(),
        path,
    })
}

/// Resolve a field separator argument into a single byte
///
/// `\t` (backslash and t) selects a tab. Without a separator, commas are used.
///
/// # Returns
/// * `Err(InvalidInput)` if the separator is not a single ASCII character
pub fn parse_delimiter(separator: Option<&str>) -> FrameSqlResult<u8> {
    match separator {
        None => Ok(b','),
        Some("\\t") => Ok(b'\t'),
        Some(s) if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        Some(s) => Err(FrameSqlError::InvalidInput(format!(
            "Field separator must be a single character, got '{}'",
            s
        ))),
    }
}

/// Read a delimited file with a header row into a dataframe
///
/// Every field goes through [`Value::infer`], so empty fields become NULL.
///
/// # Returns
/// * `Err(IoError)` if the file cannot be opened
/// * `Err(CsvError)` if the content is not valid delimited text
/// * `Err(InvalidInput)` if a row has a different number of fields than the header
pub fn read_csv<P: AsRef<Path>>(path: P, delimiter: u8) -> FrameSqlResult<DataFrame> {
    let file = File::open(path.as_ref())?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(BufReader::new(file));

    let headers = reader
        .headers()?
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();
    let mut df = DataFrame::new(headers);

    for result in reader.records() {
        let record = result?;
        let row = record.iter().map(Value::infer).collect();
        df.add_row(row)?;
    }

    debug!(
        "Read {} rows over {} columns from {}",
        df.row_count(),
        df.column_count(),
        path.as_ref().display()
    );
    Ok(df)
}

/// Write a dataframe as delimited text with a header row
///
/// NULL values are written as empty fields.
pub fn write_csv<W: Write>(df: &DataFrame, writer: W, delimiter: u8) -> FrameSqlResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    csv_writer.write_record(df.all_columns())?;
    for row in df.rows() {
        let record: Vec<String> = row
            .iter()
            .map(|value| match value {
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect();
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}
