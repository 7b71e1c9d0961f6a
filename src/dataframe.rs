//! DataFrame module for framesql
//!
//! This module provides the in-memory tabular structure exchanged with the
//! database. It handles:
//!
//! - Column storage with name lookup
//! - An index made of zero or more leading columns
//! - Projection, chunking and data type conversion
//! - Conversion to parameter records for parametrized statements
//! - Printing as comma-delimited text

use std::collections::HashMap;
use std::fmt;

use crate::connection::Params;
use crate::dtype::DataType;
use crate::error::{FrameSqlError, FrameSqlResult};
use crate::value::Value;

/// Represents a row in a dataframe, index values first
pub type Row = Vec<Value>;

/// Represents an in-memory dataframe
///
/// Every row stores the index values followed by the data values. The first
/// `index_len` entries of `columns` name the index levels.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    /// Column names, index columns first
    columns: Vec<String>,

    /// Map of column names to their positions in `columns`
    column_map: HashMap<String, usize>,

    /// Number of leading columns that form the index
    index_len: usize,

    /// Rows of data
    rows: Vec<Row>,
}

impl DataFrame {
    /// Create an empty dataframe with the given columns and no index
    pub fn new(columns: Vec<String>) -> Self {
        let column_map = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        DataFrame {
            columns,
            column_map,
            index_len: 0,
            rows: Vec::new(),
        }
    }

    /// Create a dataframe from column names and rows
    ///
    /// # Returns
    /// * `Ok(DataFrame)` holding the rows
    /// * `Err` if a row's width differs from the number of columns
    pub fn from_rows<S: Into<String>>(columns: Vec<S>, rows: Vec<Row>) -> FrameSqlResult<Self> {
        let mut df = DataFrame::new(columns.into_iter().map(Into::into).collect());
        for row in rows {
            df.add_row(row)?;
        }
        Ok(df)
    }

    /// Data column names, excluding the index
    pub fn columns(&self) -> &[String] {
        &self.columns[self.index_len..]
    }

    /// Names of the index columns
    pub fn index_names(&self) -> &[String] {
        &self.columns[..self.index_len]
    }

    /// All column names, index columns first
    pub fn all_columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of data columns, excluding the index
    pub fn column_count(&self) -> usize {
        self.columns.len() - self.index_len
    }

    /// All rows, index values first
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataframe has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add a row, index values first
    ///
    /// # Returns
    /// * `Ok(())` if the row was added
    /// * `Err` if the row width doesn't match the columns
    pub fn add_row(&mut self, row: Row) -> FrameSqlResult<()> {
        if row.len() != self.columns.len() {
            return Err(FrameSqlError::InvalidInput(format!(
                "Row has {} values, but the dataframe has {} columns",
                row.len(),
                self.columns.len()
            )));
        }

        self.rows.push(row);
        Ok(())
    }

    /// Position of a column (index or data) by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_map.get(name).copied()
    }

    /// Value at a row position and column name
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let col_idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col_idx])
    }

    /// All values of a column
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let col_idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[col_idx]).collect())
    }

    /// Update a single value
    ///
    /// # Returns
    /// * `Ok(())` if the update was successful
    /// * `Err` if the row is out of bounds or the column doesn't exist
    pub fn set_value(&mut self, row: usize, column: &str, value: Value) -> FrameSqlResult<()> {
        let col_idx = self
            .column_index(column)
            .ok_or_else(|| FrameSqlError::InvalidColumnName(column.to_string()))?;
        let row_count = self.rows.len();
        let target = self.rows.get_mut(row).ok_or_else(|| {
            FrameSqlError::InvalidInput(format!(
                "Row {} is out of bounds (dataframe has {} rows)",
                row, row_count
            ))
        })?;
        target[col_idx] = value;
        Ok(())
    }

    /// Make the named columns the index of the dataframe
    ///
    /// The index columns move to the front in the given order. Columns of a
    /// previous index that are not named become data columns again.
    ///
    /// # Returns
    /// * `Ok(())` if the index was set
    /// * `Err(SetIndex)` if a name is not a column of the dataframe
    pub fn set_index<S: AsRef<str>>(&mut self, names: &[S]) -> FrameSqlResult<()> {
        let mut order = Vec::with_capacity(self.columns.len());
        for name in names {
            let name = name.as_ref();
            let idx = self.column_index(name).ok_or_else(|| {
                FrameSqlError::SetIndex(format!(
                    "'{}' is not a column. Columns: {:?}",
                    name, self.columns
                ))
            })?;
            if order.contains(&idx) {
                return Err(FrameSqlError::SetIndex(format!(
                    "'{}' is given more than once",
                    name
                )));
            }
            order.push(idx);
        }
        let index_len = order.len();
        let rest: Vec<usize> = (0..self.columns.len())
            .filter(|i| !order.contains(i))
            .collect();
        order.extend(rest);

        let columns: Vec<String> = order.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| order.iter().map(|&i| row[i].clone()).collect())
            .collect();

        let mut reordered = DataFrame::new(columns);
        reordered.rows = rows;
        reordered.index_len = index_len;
        *self = reordered;
        Ok(())
    }

    /// Turn the index columns into data columns
    pub fn reset_index(&mut self) {
        self.index_len = 0;
    }

    /// Create a new dataframe with only the named columns, without index
    ///
    /// # Returns
    /// * `Ok(DataFrame)` containing the projected columns
    /// * `Err(InvalidColumnName)` if a name is not a column
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> FrameSqlResult<Self> {
        let mut indices = Vec::with_capacity(names.len());
        let mut invalid = Vec::new();
        for name in names {
            match self.column_index(name.as_ref()) {
                Some(idx) => indices.push(idx),
                None => invalid.push(name.as_ref().to_string()),
            }
        }
        if !invalid.is_empty() {
            return Err(FrameSqlError::InvalidColumnName(format!(
                "{:?}. Columns and index of dataframe: {:?}",
                invalid, self.columns
            )));
        }

        let columns = indices.iter().map(|&i| self.columns[i].clone()).collect();
        let mut result = DataFrame::new(columns);
        result.rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(result)
    }

    /// Rename columns using (old, new) pairs
    ///
    /// # Returns
    /// * `Err(InvalidColumnName)` if an old name is not a column
    pub fn rename<S: AsRef<str>>(&mut self, renames: &[(S, S)]) -> FrameSqlResult<()> {
        for (old, new) in renames {
            let idx = self
                .column_index(old.as_ref())
                .ok_or_else(|| FrameSqlError::InvalidColumnName(old.as_ref().to_string()))?;
            self.columns[idx] = new.as_ref().to_string();
        }
        self.column_map = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Ok(())
    }

    /// Split the dataframe into dataframes of at most `size` rows
    ///
    /// A `size` of zero yields the whole dataframe as a single chunk.
    pub fn chunks(&self, size: usize) -> Vec<DataFrame> {
        let size = if size == 0 { self.rows.len().max(1) } else { size };
        self.rows
            .chunks(size)
            .map(|rows| DataFrame {
                columns: self.columns.clone(),
                column_map: self.column_map.clone(),
                index_len: self.index_len,
                rows: rows.to_vec(),
            })
            .collect()
    }

    /// Apply a conversion to every value of a column
    pub(crate) fn map_column<F>(&mut self, col_idx: usize, mut f: F) -> FrameSqlResult<()>
    where
        F: FnMut(&Value) -> FrameSqlResult<Value>,
    {
        for row in &mut self.rows {
            row[col_idx] = f(&row[col_idx])?;
        }
        Ok(())
    }

    /// Positions of the columns that hold datetimes
    ///
    /// A column qualifies when it has at least one datetime and all its
    /// non-null values are datetimes.
    pub fn datetime_columns(&self) -> Vec<usize> {
        (0..self.columns.len())
            .filter(|&idx| {
                let mut seen = false;
                for row in &self.rows {
                    match &row[idx] {
                        Value::Null => {}
                        v if v.is_datetime() => seen = true,
                        _ => return false,
                    }
                }
                seen
            })
            .collect()
    }

    /// Convert columns to the given data types
    ///
    /// # Returns
    /// * `Ok(DataFrame)` with the converted columns
    /// * `Err(DataTypeConversion)` if a key is not a column or a value cannot be converted
    pub fn astype<S: AsRef<str>>(&self, dtypes: &[(S, DataType)]) -> FrameSqlResult<Self> {
        let difference: Vec<&str> = dtypes
            .iter()
            .map(|(name, _)| name.as_ref())
            .filter(|name| self.column_index(name).is_none())
            .collect();
        if !difference.is_empty() {
            return Err(FrameSqlError::DataTypeConversion(format!(
                "Only column names can be used for the keys in dtypes.\nColumns   : {:?}\nDifference: {}",
                self.columns,
                difference.join(", ")
            )));
        }

        let mut result = self.clone();
        for (name, dtype) in dtypes {
            let name = name.as_ref();
            // Presence was checked above
            let Some(idx) = result.column_index(name) else { continue };
            result.map_column(idx, |value| {
                dtype.cast(value).map_err(|reason| {
                    FrameSqlError::DataTypeConversion(format!("column '{}': {}", name, reason))
                })
            })?;
        }
        Ok(result)
    }

    /// Whether any value is missing (NULL or NaN)
    pub fn has_missing(&self) -> bool {
        self.rows.iter().flatten().any(Value::is_missing)
    }

    /// Convert float NaN values to NULL
    ///
    /// Some databases cannot bind NaN in parametrized statements, so NaN is
    /// replaced before the data is written.
    pub fn convert_nan_to_none(&self) -> Self {
        let mut result = self.clone();
        for value in result.rows.iter_mut().flatten() {
            if value.is_nan() {
                *value = Value::Null;
            }
        }
        result
    }

    /// Convert every row into a parameter record keyed by column name
    pub fn to_records(&self) -> Vec<Params> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

/// Comma-delimited rendering with a header line, index columns first
impl fmt::Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.columns.join(","))?;
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(ToString::to_string).collect();
            writeln!(f, "{}", line.join(","))?;
        }
        Ok(())
    }
}
