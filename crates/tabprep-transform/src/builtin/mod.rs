//! Built-in transformers.
//!
//! - **scalers**: standard, min-max, max-abs, robust, normalizer, binarizer
//! - **encoders**: label, ordinal, one-hot, label binarizer
//! - **discretize**: k-bins discretizer
//! - **impute**: simple imputer

use std::collections::BTreeMap;

use crate::params::ParamValue;

pub mod discretize;
pub mod encoders;
pub mod impute;
pub mod scalers;
mod stats;

pub use discretize::KBinsDiscretizer;
pub use encoders::{LabelBinarizer, LabelEncoder, OneHotEncoder, OrdinalEncoder};
pub use impute::SimpleImputer;
pub use scalers::{Binarizer, MaxAbsScaler, MinMaxScaler, Normalizer, RobustScaler, StandardScaler};

/// Builds a parameter map from `(name, value)` pairs.
fn param_map<const N: usize>(entries: [(&str, ParamValue); N]) -> BTreeMap<String, ParamValue> {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}
