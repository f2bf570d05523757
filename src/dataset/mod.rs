//! Tabular dataset handling: CSV loading, splitting and feature transforms.

pub mod features;
pub mod split;
pub mod table;

pub use table::{Table, TableError, load_tables, write_csv};
