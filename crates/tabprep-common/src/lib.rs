//! Shared utilities for tabprep crates.
//!
//! Conversions between Polars `AnyValue`s, plain strings, floats and JSON.

pub mod polars;

pub use polars::{
    any_to_f64, any_to_json, any_to_string, column_names, format_numeric, parse_f64, round_to,
    series_to_json,
};
