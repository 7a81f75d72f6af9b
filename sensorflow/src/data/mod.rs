//! Tabular data passed between pipeline stages.

mod csv_io;
mod dataset;

pub use csv_io::{read_csv, read_csv_from, write_csv, write_csv_to};
pub use dataset::{Cell, Column, Dataset, Record, MISSING_MARKERS};
