//! Vectorizer construction parameters.
//!
//! The configuration is a JSON document, so the exact feature set and hash
//! space of a trained model can be shipped alongside its weights and replayed
//! at serving time.

use serde::{Deserialize, Serialize};

use crate::error::{FeaturizeError, Result};

/// One feature-state entry: a named blob and the loader that decodes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureStateEntry {
    /// Entry name, also the key of the parameter blob.
    pub name: String,
    /// Registered loader id.
    pub loader: String,
}

/// The full vectorizer configuration.
///
/// # Examples
///
/// ```
/// use featurize_core::config::VectorizerConfig;
///
/// let config: VectorizerConfig = serde_json::from_str(
///     r#"{
///         "hash_bits": 18,
///         "features": [["device"], ["device", "bid"]]
///     }"#,
/// ).unwrap();
/// assert_eq!(config.hash_bits, 18);
/// assert_eq!(config.features.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Width of the output hash space, 1..=32.
    pub hash_bits: u32,
    /// Feature definitions, each a list of namespace names. A single name is
    /// a plain feature, several names are an interaction cross.
    pub features: Vec<Vec<String>>,
    /// Precomputed states to load before construction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_states: Vec<FeatureStateEntry>,
}

impl VectorizerConfig {
    /// Parses a configuration from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| FeaturizeError::ConfigError {
            message: e.to_string(),
        })
    }

    /// Serializes the configuration back to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| FeaturizeError::ConfigError {
            message: e.to_string(),
        })
    }
}
