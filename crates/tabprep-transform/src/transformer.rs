//! The transformer capability.
//!
//! Every column transform (scaler, encoder, discretizer, imputer) is reached
//! only through the [`Transformer`] trait. The pipeline never inspects the
//! concrete type: it sets parameters, fits, transforms, asks for the class
//! vocabulary and persists the fitted state.
//!
//! # Implementing a Transformer
//!
//! Each transformer should:
//! 1. Implement this trait for a struct holding its parameters and fitted state
//! 2. Register a factory in [`crate::TransformerRegistry::default()`]
//!
//! # Example
//!
//! ```ignore
//! use tabprep_transform::{ColumnData, Transformer, builtin::StandardScaler};
//!
//! let mut scaler = StandardScaler::default();
//! let output = scaler.fit_transform(&ColumnData::numeric(vec![1.0, 2.0, 3.0]))?;
//! let state = scaler.state()?;
//! ```

use std::collections::BTreeMap;

use tabprep_model::ClassVocabulary;

use crate::column::{ColumnData, TransformOutput};
use crate::error::{Result, TransformError};
use crate::params::ParamValue;

/// A stateful column transform.
pub trait Transformer: Send + Sync {
    /// Class name of the transform (e.g. `StandardScaler`).
    fn name(&self) -> &'static str;

    /// Current parameter values, keyed by parameter name.
    fn params(&self) -> BTreeMap<String, ParamValue>;

    /// Assign one parameter.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::ParameterSyntax`] for unknown parameter names
    /// or values of the wrong type.
    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()>;

    /// Learn from `input` and return its transformed form.
    fn fit_transform(&mut self, input: &ColumnData) -> Result<TransformOutput>;

    /// Transform `input` with the fitted state.
    fn transform(&self, input: &ColumnData) -> Result<TransformOutput>;

    /// Undo the transform, if the transform is invertible.
    fn inverse_transform(&self, _output: &TransformOutput) -> Result<ColumnData> {
        Err(TransformError::NotInvertible {
            transformer: self.name(),
        })
    }

    /// Original and encoded classes learned during fit, for encoders.
    ///
    /// `input` is the column the transformer was fitted on.
    fn class_vocabulary(&self, _input: &ColumnData) -> Option<ClassVocabulary> {
        None
    }

    /// Serializable parameters and fitted state.
    fn state(&self) -> Result<serde_json::Value>;
}

/// Error for a parameter name or value a transformer does not accept.
pub(crate) fn reject_param(name: &str, value: &ParamValue) -> TransformError {
    TransformError::ParameterSyntax {
        name: name.to_string(),
        value: value.to_string(),
    }
}

/// Encode a transformer state struct.
pub(crate) fn encode_state<T: serde::Serialize>(name: &str, state: &T) -> Result<serde_json::Value> {
    serde_json::to_value(state).map_err(|source| TransformError::State {
        transformer: name.to_string(),
        source,
    })
}

/// Decode a transformer state struct.
pub(crate) fn decode_state<T: serde::de::DeserializeOwned>(
    name: &str,
    state: serde_json::Value,
) -> Result<T> {
    serde_json::from_value(state).map_err(|source| TransformError::State {
        transformer: name.to_string(),
        source,
    })
}
