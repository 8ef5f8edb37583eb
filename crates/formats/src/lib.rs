//! Table readers and writers for MovieLens CSV files
//!
//! This crate parses the raw ratings, movies, tags and links tables into
//! typed rows and writes filtered tables back out atomically.

pub mod dataset;
pub mod error;
pub mod reader;
pub mod record;
pub mod writer;

pub use dataset::{load_dataset, load_dataset_with_progress, Dataset, DatasetPaths};
pub use error::{Error, Result};
pub use reader::{count_rows, load_table, TableReader};
pub use record::{HalfStars, Link, Movie, MovieId, Rating, Table, TableRow, Tag, UserId};
pub use writer::{write_dataset, OutputPaths, StagedTable, WrittenTable, DEFAULT_SUFFIX};
