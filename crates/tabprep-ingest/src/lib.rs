//! Table ingestion and dataset storage.
//!
//! Loads uploaded tables (`O_<id>.csv`, or `O_<id>.json` as JSON lines) into
//! Polars DataFrames and stores transformed datasets (`P_<job>.json`) as
//! index-oriented JSON.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use tabprep_ingest::{read_original, write_index_json};
//!
//! let df = read_original(Path::new("result/original_data"), 7)?;
//! write_index_json(&df, Path::new("result/preprocessed_data/P_7.json"))?;
//! ```

mod error;
mod index_json;
mod table;

// === Error Types ===
pub use error::{IngestError, Result};

// === Table Loading ===
pub use table::{
    ORIGINAL_PREFIX, TRANSFORMED_PREFIX, locate_original, read_original, read_table,
    transformed_file_name,
};

// === Index-Oriented JSON ===
pub use index_json::{read_index_json, write_index_json};
