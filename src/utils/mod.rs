//! Utility functions and types

pub mod data_loader;

pub use data_loader::{column_to_strings, columns_to_array2, DataLoader};
