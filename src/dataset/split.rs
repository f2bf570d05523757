//! Seeded train/test partitioning of a loaded table.

use std::path::{Path, PathBuf};

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use thiserror::Error;

use super::table::{self, Table, TableError};

pub const TRAIN_FILE_NAME: &str = "train_data.csv";
pub const TEST_FILE_NAME: &str = "test_data.csv";

#[derive(Debug, Error)]
pub enum SplitError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("Split ratio must be between 0 and 1 (exclusive), got {0}")]
    InvalidRatio(f64),
    #[error("Dataset has no rows to split")]
    Empty,
}

/// Partition options.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Fraction of rows that go to the training set.
    pub ratio: f64,
    /// Seed for the shuffle so reruns produce the same partition.
    pub seed: u64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            ratio: 0.7,
            seed: 42,
        }
    }
}

/// Number of training rows for `total` rows at `ratio`.
pub fn train_count(total: usize, ratio: f64) -> usize {
    ((total as f64) * ratio).round().clamp(0.0, total as f64) as usize
}

/// Shuffle rows with a seeded RNG and cut them into `(train, test)`.
pub fn split_table(table: &Table, options: &SplitOptions) -> Result<(Table, Table), SplitError> {
    if !(options.ratio > 0.0 && options.ratio < 1.0) {
        return Err(SplitError::InvalidRatio(options.ratio));
    }
    if table.is_empty() {
        return Err(SplitError::Empty);
    }
    let mut indices: Vec<usize> = (0..table.len()).collect();
    let mut rng = StdRng::seed_from_u64(options.seed);
    indices.shuffle(&mut rng);

    let cut = train_count(table.len(), options.ratio);
    let pick = |ids: &[usize]| Table {
        headers: table.headers.clone(),
        rows: ids.iter().map(|&idx| table.rows[idx].clone()).collect(),
    };
    Ok((pick(&indices[..cut]), pick(&indices[cut..])))
}

/// Written output locations of a split run.
#[derive(Debug, Clone)]
pub struct SplitOutputs {
    pub train_file: PathBuf,
    pub test_file: PathBuf,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Load every CSV under `input`, split it, and write both halves.
pub fn split_dataset(
    input: &Path,
    train_dir: &Path,
    test_dir: &Path,
    options: &SplitOptions,
) -> Result<SplitOutputs, SplitError> {
    let loaded = table::load_tables(input)?;
    let (train, test) = split_table(&loaded, options)?;

    let train_file = train_dir.join(TRAIN_FILE_NAME);
    let test_file = test_dir.join(TEST_FILE_NAME);
    table::write_csv(&train_file, &train)?;
    tracing::info!("Train dataset with {} rows saved to {}", train.len(), train_file.display());
    table::write_csv(&test_file, &test)?;
    tracing::info!("Test dataset with {} rows saved to {}", test.len(), test_file.display());

    Ok(SplitOutputs {
        train_file,
        test_file,
        train_rows: train.len(),
        test_rows: test.len(),
    })
}
