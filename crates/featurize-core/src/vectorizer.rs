//! The assembled pipeline: domain record in, sparse vector out.
//!
//! A [`Vectorizer`] chains the three stages (transform, hash, combine)
//! behind one call, so online scorers and offline batch runs share a single
//! code path. Construction happens through [`VectorizerBuilder`], which
//! resolves configuration against the schema and raises every schema or
//! configuration error up front.

use std::collections::HashMap;

use crate::audit::{AuditEntry, AuditState};
use crate::combine::{FeatureDefinition, InteractionCombiner};
use crate::config::VectorizerConfig;
use crate::error::Result;
use crate::feature_state::{FeatureStateLoaderRegistry, FeatureStates};
use crate::hasher::Hasher;
use crate::schema::{FeatureSchema, NamespaceId};
use crate::sparse::SparseVector;
use crate::transform::{RecordTransformer, TransformationRegistry};

/// Produces [`FeatureStates`]-aware transformations at build time.
///
/// The closure runs after feature states are loaded, so transformations can
/// capture the state they need.
pub type TransformationFactory<R> =
    Box<dyn FnOnce(&FeatureStates) -> TransformationRegistry<R>>;

/// A fully constructed feature-vectorization pipeline.
pub struct Vectorizer<R> {
    schema: FeatureSchema,
    transformer: RecordTransformer<R>,
    hasher: Hasher,
    combiner: InteractionCombiner,
}

impl<R> Vectorizer<R> {
    /// Vectorizes one domain record.
    pub fn apply(&self, record: &R) -> SparseVector {
        let raw = self.transformer.apply(record);
        let hashed = self.hasher.apply(&raw);
        self.combiner.apply(&hashed)
    }

    /// Vectorizes one domain record, also reporting the provenance of every
    /// output index.
    ///
    /// The vector is identical to [`apply`](Self::apply); entries come back
    /// sorted by index, with the constant bias reported as the dummy feature.
    pub fn apply_audited(&self, record: &R) -> (SparseVector, Vec<AuditEntry>) {
        let raw = self.transformer.apply(record);
        let mut audit = AuditState::new();
        let hashed = self.hasher.apply_audited(&raw, &mut audit);
        let (vector, sources) = self.combiner.apply_audited(&hashed, &audit);

        let entries = vector
            .iter()
            .map(|(index, value)| {
                let chain = sources.get(&index).map(Vec::as_slice).unwrap_or(&[]);
                AuditEntry::from_sources(&self.schema, index, value, chain)
            })
            .collect();
        (vector, entries)
    }

    /// The schema the pipeline was built against.
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// The configured feature definitions.
    pub fn definitions(&self) -> &[FeatureDefinition] {
        self.combiner.definitions()
    }
}

/// Builds a [`Vectorizer`] from schema, configuration, transformations, and
/// feature-state inputs.
pub struct VectorizerBuilder<R> {
    schema: FeatureSchema,
    config: VectorizerConfig,
    loaders: FeatureStateLoaderRegistry,
    blobs: HashMap<String, Vec<u8>>,
    transformations: Option<TransformationFactory<R>>,
}

impl<R> VectorizerBuilder<R> {
    /// Starts a builder for one schema and configuration.
    pub fn new(schema: FeatureSchema, config: VectorizerConfig) -> Self {
        Self {
            schema,
            config,
            loaders: FeatureStateLoaderRegistry::new(),
            blobs: HashMap::new(),
            transformations: None,
        }
    }

    /// Supplies the transformation registry directly, for pipelines that use
    /// no feature state.
    pub fn transformations(self, registry: TransformationRegistry<R>) -> Self
    where
        R: 'static,
    {
        self.transformation_factory(move |_| registry)
    }

    /// Supplies a factory that builds transformations once feature states are
    /// loaded.
    pub fn transformation_factory<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(&FeatureStates) -> TransformationRegistry<R> + 'static,
    {
        self.transformations = Some(Box::new(factory));
        self
    }

    /// Registers the feature-state loaders configuration may refer to.
    pub fn loaders(mut self, loaders: FeatureStateLoaderRegistry) -> Self {
        self.loaders = loaders;
        self
    }

    /// Supplies the parameter blobs feature states are loaded from.
    pub fn blobs(mut self, blobs: HashMap<String, Vec<u8>>) -> Self {
        self.blobs = blobs;
        self
    }

    /// Resolves everything and constructs the pipeline.
    ///
    /// # Errors
    ///
    /// Any schema, definition, hash-space, transformation-coverage, or
    /// feature-state error surfaces here; a successfully built vectorizer
    /// cannot fail at apply time.
    pub fn build(self) -> Result<Vectorizer<R>> {
        let mut states = FeatureStates::new();
        for entry in &self.config.feature_states {
            let state = self.loaders.load(&entry.name, &entry.loader, &self.blobs)?;
            states.insert(entry.name.clone(), state);
        }

        let mut definitions = Vec::with_capacity(self.config.features.len());
        for names in &self.config.features {
            definitions.push(FeatureDefinition::from_names(&self.schema, names)?);
        }

        let mut required: Vec<NamespaceId> = definitions
            .iter()
            .flat_map(|fd| fd.components().iter().copied())
            .collect();
        required.sort();
        required.dedup();

        let registry = match self.transformations {
            Some(factory) => factory(&states),
            None => TransformationRegistry::new(),
        };
        let transformer = RecordTransformer::new(&self.schema, &required, registry)?;
        let combiner = InteractionCombiner::new(self.config.hash_bits, definitions)?;

        tracing::debug!(
            hash_bits = self.config.hash_bits,
            features = self.config.features.len(),
            feature_states = states.len(),
            "constructed vectorizer"
        );

        Ok(Vectorizer {
            schema: self.schema,
            transformer,
            hasher: Hasher::new(),
            combiner,
        })
    }
}
