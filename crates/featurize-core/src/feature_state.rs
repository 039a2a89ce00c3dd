//! Precomputed lookup state for transformations.
//!
//! Some transformations need more than the incoming record, for example an
//! id-to-cluster table computed offline. Such state is loaded once at
//! vectorizer construction from named binary blobs, each deserialized by a
//! registered loader, and handed to the transformations that need it.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{FeaturizeError, Result};

/// A named piece of precomputed state, opaque to the pipeline.
///
/// Implementations downcast via [`as_any`](FeatureState::as_any) inside the
/// transformations that know their concrete type.
pub trait FeatureState: Send + Sync {
    /// Returns `self` for downcasting to the concrete state type.
    fn as_any(&self) -> &dyn Any;
}

/// Deserializes one binary blob into a feature state.
pub type FeatureStateLoader =
    Box<dyn Fn(&[u8]) -> std::result::Result<Arc<dyn FeatureState>, String> + Send + Sync>;

/// Registered loaders, keyed by the loader id configuration refers to.
#[derive(Default)]
pub struct FeatureStateLoaderRegistry {
    by_id: HashMap<String, FeatureStateLoader>,
}

impl FeatureStateLoaderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            by_id: HashMap::new(),
        }
    }

    /// Registers a loader under an id, replacing any previous loader.
    pub fn register<F>(mut self, id: impl Into<String>, loader: F) -> Self
    where
        F: Fn(&[u8]) -> std::result::Result<Arc<dyn FeatureState>, String> + Send + Sync + 'static,
    {
        self.by_id.insert(id.into(), Box::new(loader));
        self
    }

    /// Loads the state for one configured entry.
    ///
    /// # Errors
    ///
    /// - [`FeaturizeError::UnknownFeatureStateLoader`] if `loader_id` is not
    ///   registered.
    /// - [`FeaturizeError::MissingFeatureStateBlob`] if `blobs` has no entry
    ///   named `name`.
    /// - [`FeaturizeError::FeatureStateLoadFailed`] if the loader rejects the
    ///   blob.
    pub fn load(
        &self,
        name: &str,
        loader_id: &str,
        blobs: &HashMap<String, Vec<u8>>,
    ) -> Result<Arc<dyn FeatureState>> {
        let loader =
            self.by_id
                .get(loader_id)
                .ok_or_else(|| FeaturizeError::UnknownFeatureStateLoader {
                    name: name.to_string(),
                    loader: loader_id.to_string(),
                })?;
        let blob = blobs
            .get(name)
            .ok_or_else(|| FeaturizeError::MissingFeatureStateBlob {
                name: name.to_string(),
            })?;
        let state = loader(blob).map_err(|message| FeaturizeError::FeatureStateLoadFailed {
            name: name.to_string(),
            message,
        })?;
        tracing::debug!(name, loader_id, bytes = blob.len(), "loaded feature state");
        Ok(state)
    }
}

/// Loaded feature states, keyed by entry name.
#[derive(Default, Clone)]
pub struct FeatureStates {
    by_name: HashMap<String, Arc<dyn FeatureState>>,
}

impl FeatureStates {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }

    /// Adds a loaded state.
    pub fn insert(&mut self, name: impl Into<String>, state: Arc<dyn FeatureState>) {
        self.by_name.insert(name.into(), state);
    }

    /// Returns the state registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn FeatureState>> {
        self.by_name.get(name)
    }

    /// Returns the state under `name` downcast to its concrete type.
    pub fn get_as<T: FeatureState + 'static>(&self, name: &str) -> Option<&T> {
        self.by_name
            .get(name)
            .and_then(|state| state.as_any().downcast_ref::<T>())
    }

    /// Returns the number of loaded states.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns whether no state is loaded.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
