//! Data loading utilities

use crate::error::{CropError, Result};
use ndarray::Array2;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// CSV loader for labeled training data
pub struct DataLoader {
    /// Rows scanned for schema inference
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: 1000,
        }
    }

    /// Set number of rows used to infer column types
    pub fn with_infer_schema_length(mut self, n: usize) -> Self {
        self.infer_schema_length = n.max(1);
        self
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let start = Instant::now();

        let file = File::open(path)
            .map_err(|e| CropError::DataError(format!("{}: {}", path.display(), e)))?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| CropError::DataError(format!("{}: {}", path.display(), e)))?;

        debug!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded CSV"
        );

        Ok(df)
    }
}

/// Extract named numeric columns into a row-major `Array2<f64>`.
///
/// Integer columns are cast to `f64`. Nulls and cells that do not parse as
/// numbers are rejected; no imputation is done.
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let series = df
                .column(col_name)
                .map_err(|_| CropError::FeatureNotFound(col_name.clone()))?;

            if series.null_count() > 0 {
                return Err(CropError::DataError(format!(
                    "Column '{}' has {} missing values",
                    col_name,
                    series.null_count()
                )));
            }

            let series_f64 = series
                .cast(&DataType::Float64)
                .map_err(|e| CropError::DataError(e.to_string()))?;
            let values = series_f64
                .f64()
                .map_err(|e| CropError::DataError(e.to_string()))?;

            // A non-strict cast turns unparseable strings into nulls
            if values.null_count() > 0 {
                return Err(CropError::DataError(format!(
                    "Column '{}' has {} non-numeric values",
                    col_name,
                    values.null_count()
                )));
            }

            let values: Vec<f64> = values.into_iter().flatten().collect();
            if let Some(row) = values.iter().position(|v| !v.is_finite()) {
                return Err(CropError::DataError(format!(
                    "Column '{}' has a non-finite value at row {}",
                    col_name, row
                )));
            }

            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]))
}

/// Extract a label column as strings. Numeric labels are rendered as text.
pub fn column_to_strings(df: &DataFrame, col_name: &str) -> Result<Vec<String>> {
    let series = df
        .column(col_name)
        .map_err(|_| CropError::FeatureNotFound(col_name.to_string()))?;

    if series.null_count() > 0 {
        return Err(CropError::DataError(format!(
            "Label column '{}' has {} missing values",
            col_name,
            series.null_count()
        )));
    }

    let as_str = series
        .cast(&DataType::String)
        .map_err(|e| CropError::DataError(e.to_string()))?;
    let labels = as_str
        .str()
        .map_err(|e| CropError::DataError(e.to_string()))?;

    Ok(labels
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect())
}
