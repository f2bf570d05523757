//! Column-wise feature transforms.
//!
//! The output column set depends only on the configured column list (and, for
//! one-hot columns, on the distinct values present), never on row order.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::table::{self, Table, TableError};

pub const TRANSFORMED_FILE_NAME: &str = "transformed_data.csv";

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("No feature columns configured")]
    NoColumns,
}

/// Transform applied to a single input column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    #[default]
    Passthrough,
    /// Rescale to `[0, 1]`.
    MinMax,
    /// Zero mean, unit population variance.
    Standard,
    /// One `<column>_<value>` indicator column per distinct value.
    OneHot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(default)]
    pub transform: Transform,
}

impl ColumnSpec {
    pub fn new(name: &str, transform: Transform) -> Self {
        Self {
            name: name.to_string(),
            transform,
        }
    }
}

/// Column layout of the diabetes dataset the pipeline ships with.
pub fn default_columns() -> Vec<ColumnSpec> {
    use Transform::{MinMax, Passthrough};
    vec![
        ColumnSpec::new("Pregnancies", Passthrough),
        ColumnSpec::new("Glucose", MinMax),
        ColumnSpec::new("BloodPressure", MinMax),
        ColumnSpec::new("SkinThickness", MinMax),
        ColumnSpec::new("Insulin", MinMax),
        ColumnSpec::new("BMI", MinMax),
        ColumnSpec::new("DiabetesPedigreeFunction", Passthrough),
        ColumnSpec::new("Age", Passthrough),
        ColumnSpec::new("Outcome", Passthrough),
    ]
}

/// Apply `columns` to `input`, producing a table with the same row count.
pub fn transform_table(input: &Table, columns: &[ColumnSpec]) -> Result<Table, FeatureError> {
    if columns.is_empty() {
        return Err(FeatureError::NoColumns);
    }
    let mut headers = Vec::new();
    let mut output_columns: Vec<Vec<String>> = Vec::new();
    for config in columns {
        match config.transform {
            Transform::Passthrough => {
                headers.push(config.name.clone());
                output_columns.push(
                    input
                        .column(&config.name)?
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                );
            }
            Transform::MinMax => {
                headers.push(config.name.clone());
                output_columns.push(format_all(min_max(&input.numeric_column(&config.name)?)));
            }
            Transform::Standard => {
                headers.push(config.name.clone());
                output_columns.push(format_all(standardize(&input.numeric_column(&config.name)?)));
            }
            Transform::OneHot => {
                let values = input.column(&config.name)?;
                let categories: BTreeSet<&str> = values.iter().copied().collect();
                for category in categories {
                    headers.push(format!("{}_{}", config.name, category));
                    output_columns.push(
                        values
                            .iter()
                            .map(|value| if *value == category { "1" } else { "0" }.to_string())
                            .collect(),
                    );
                }
            }
        }
    }

    let mut out = Table::new(headers);
    out.rows = (0..input.len())
        .map(|row| output_columns.iter().map(|column| column[row].clone()).collect())
        .collect();
    Ok(out)
}

fn min_max(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    values
        .iter()
        .map(|v| if range > 0.0 { (v - min) / range } else { 0.0 })
        .collect()
}

fn standardize(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    values
        .iter()
        .map(|v| if std > 0.0 { (v - mean) / std } else { 0.0 })
        .collect()
}

fn format_all(values: Vec<f64>) -> Vec<String> {
    values.into_iter().map(|v| v.to_string()).collect()
}

/// Load, transform and write `<output_dir>/transformed_data.csv`.
pub fn engineer_features(
    dataset: &Path,
    output_dir: &Path,
    columns: &[ColumnSpec],
) -> Result<PathBuf, FeatureError> {
    let input = table::load_tables(dataset)?;
    let transformed = transform_table(&input, columns)?;
    // The last configured column is the outcome label.
    tracing::info!(
        num_samples = transformed.len(),
        num_features = transformed.headers.len().saturating_sub(1),
        "Transformed dataset"
    );
    let path = output_dir.join(TRANSFORMED_FILE_NAME);
    table::write_csv(&path, &transformed)?;
    tracing::info!("Transformed dataset saved to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> Table {
        Table {
            headers: vec!["size".into(), "color".into(), "label".into()],
            rows: vec![
                vec!["10".into(), "red".into(), "0".into()],
                vec!["20".into(), "blue".into(), "1".into()],
                vec!["30".into(), "red".into(), "1".into()],
            ],
        }
    }

    #[test]
    fn min_max_and_one_hot_layout() {
        let columns = vec![
            ColumnSpec::new("size", Transform::MinMax),
            ColumnSpec::new("color", Transform::OneHot),
            ColumnSpec::new("label", Transform::Passthrough),
        ];
        let out = transform_table(&input(), &columns).unwrap();
        assert_eq!(out.headers, vec!["size", "color_blue", "color_red", "label"]);
        assert_eq!(out.len(), 3);
        assert_eq!(out.rows[0], vec!["0", "0", "1", "0"]);
        assert_eq!(out.rows[1], vec!["0.5", "1", "0", "1"]);
        assert_eq!(out.rows[2], vec!["1", "0", "1", "1"]);
    }

    #[test]
    fn standard_scaling_centers_values() {
        let columns = vec![ColumnSpec::new("size", Transform::Standard)];
        let out = transform_table(&input(), &columns).unwrap();
        let values = out.numeric_column("size").unwrap();
        assert!(values.iter().sum::<f64>().abs() < 1e-9);
        assert!((values[2] - 1.224_744_871).abs() < 1e-6);
    }

    #[test]
    fn constant_column_scales_to_zero() {
        assert_eq!(min_max(&[3.0, 3.0]), vec![0.0, 0.0]);
        assert_eq!(standardize(&[3.0, 3.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn missing_column_is_fatal() {
        let err = transform_table(&input(), &default_columns()).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::Table(TableError::MissingColumn { .. })
        ));
    }

    #[test]
    fn non_numeric_min_max_is_fatal() {
        let columns = vec![ColumnSpec::new("color", Transform::MinMax)];
        assert!(transform_table(&input(), &columns).is_err());
    }
}
