//! Entity engine
//!
//! One engine per entity type. It owns the capability profile resolved at
//! connection time, the entity's view registry and its counters, and is the
//! only entry point callers need.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::capability::CapabilityProfile;
use crate::compiler::{
    normalized_conditions, CompiledQuery, Condition, EntityDescriptor, KeyCompiler, QueryOptions,
    ViewDefinition, ID_FIELD,
};
use crate::config::EngineConfig;
use crate::errors::{QueryError, QueryResult};
use crate::executor::QueryExecutor;
use crate::materializer::{
    cap_count, extract_count, Document, Materialize, QueryOutput, ResultMaterializer,
};
use crate::observability::{Event, Logger, MetricsRegistry, MetricsSnapshot};
use crate::registry::IndexRegistry;
use crate::transport::{DocumentStore, StoreError, VersionSource, ViewResponse};

/// Query engine for one entity type
pub struct ViewEngine<S: DocumentStore, T: Materialize = Document> {
    store: Arc<S>,
    entity: EntityDescriptor,
    profile: CapabilityProfile,
    config: EngineConfig,
    registry: IndexRegistry,
    metrics: MetricsRegistry,
    logger: Logger,
    _marker: PhantomData<fn() -> T>,
}

impl<S: DocumentStore + VersionSource, T: Materialize> ViewEngine<S, T> {
    /// Connects to the store, resolving its capabilities once.
    ///
    /// A `store_version` in the configuration is used instead of asking the
    /// store.
    pub fn connect(
        store: Arc<S>,
        entity: EntityDescriptor,
        config: EngineConfig,
    ) -> QueryResult<Self> {
        let version = match &config.store_version {
            Some(version) => version.clone(),
            None => store.server_version()?,
        };
        let profile = CapabilityProfile::resolve(&version)?;
        Self::with_profile(store, entity, profile, config)
    }
}

impl<S: DocumentStore, T: Materialize> ViewEngine<S, T> {
    /// Builds an engine for an already resolved profile
    pub fn with_profile(
        store: Arc<S>,
        entity: EntityDescriptor,
        profile: CapabilityProfile,
        config: EngineConfig,
    ) -> QueryResult<Self> {
        let logger = Logger::new(config.severity()?);

        let version = profile.version().to_string();
        logger.event(
            Event::CapabilityResolved,
            &[
                ("entity", entity.type_name()),
                ("limit_param", profile.limit_param().as_str()),
                ("version", version.as_str()),
            ],
        );

        Ok(Self {
            registry: IndexRegistry::new(entity.design_id()),
            store,
            entity,
            profile,
            config,
            metrics: MetricsRegistry::new(),
            logger,
            _marker: PhantomData,
        })
    }

    pub fn entity(&self) -> &EntityDescriptor {
        &self.entity
    }

    pub fn profile(&self) -> &CapabilityProfile {
        &self.profile
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// Logger built from this engine's `log_level`
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Every document matching the options
    pub fn find(&self, options: QueryOptions) -> QueryResult<Vec<T>> {
        let result = self.find_inner(self.prepare(options));
        self.observe("find", result)
    }

    /// The first match, if any
    pub fn find_first(&self, options: QueryOptions) -> QueryResult<Option<T>> {
        let result = self
            .find_inner(self.prepare(options).with_limit(1))
            .map(|docs| docs.into_iter().next());
        self.observe("find_first", result)
    }

    /// The first match walking the view backwards, if any
    pub fn find_last(&self, options: QueryOptions) -> QueryResult<Option<T>> {
        let result = self
            .find_inner(self.prepare(options).descending().with_limit(1))
            .map(|docs| docs.into_iter().next());
        self.observe("find_last", result)
    }

    /// Documents by id, in the order given, duplicates removed.
    ///
    /// A single id is fetched directly and must belong to this entity and
    /// satisfy the conditions, otherwise NotFound is returned. Several ids
    /// are looked up together and the ones that do not qualify are skipped.
    pub fn find_by_ids<I, K>(&self, ids: I, options: QueryOptions) -> QueryResult<Vec<T>>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut seen = HashSet::new();
        let ids: Vec<String> = ids
            .into_iter()
            .map(Into::into)
            .filter(|id| seen.insert(id.clone()))
            .collect();

        let result = self.find_by_ids_inner(&ids, self.prepare(options));
        self.observe("find_by_ids", result)
    }

    /// True if any document matches the options
    pub fn exists(&self, options: QueryOptions) -> QueryResult<bool> {
        self.find_first(options).map(|doc| doc.is_some())
    }

    /// True if the id names a document of this entity
    pub fn exists_id(&self, id: &str) -> QueryResult<bool> {
        let result = match self.find_one_by_id(id, &self.prepare(QueryOptions::new())) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        };
        self.observe("exists_id", result)
    }

    /// Number of matches, capped by the options' offset and limit
    pub fn count(&self, options: QueryOptions) -> QueryResult<u64> {
        let result = self.count_inner(self.prepare(options));
        self.observe("count", result)
    }

    /// Counts the matches a scoped finder with this limit and offset would
    /// return. Reduce-capable stores count server side; older stores load
    /// the scoped documents and count them.
    pub fn count_scoped(
        &self,
        options: QueryOptions,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> QueryResult<u64> {
        let mut options = self.prepare(options);
        options.limit = limit;
        options.offset = offset;

        let result = if self.profile.reduce_counting() {
            self.count_inner(options)
        } else {
            self.find_inner(options).map(|docs| docs.len() as u64)
        };
        self.observe("count_scoped", result)
    }

    /// Queries a caller-supplied view stored in this entity's design document
    pub fn custom_view(
        &self,
        name: &str,
        map: &str,
        reduce: Option<&str>,
        options: QueryOptions,
    ) -> QueryResult<QueryOutput<T>> {
        let view = ViewDefinition::new(name, map, reduce.map(str::to_string));
        let result = self.custom_inner(view, self.prepare(options));
        self.observe("custom_view", result)
    }

    /// Queries a view declared on the entity, its default options underneath
    /// the caller's
    pub fn named_view(&self, name: &str, options: QueryOptions) -> QueryResult<QueryOutput<T>> {
        let result = match self.entity.custom_view(name) {
            Some(declared) => {
                let view = ViewDefinition::new(
                    declared.name.clone(),
                    declared.map.clone(),
                    declared.reduce.clone(),
                );
                self.custom_inner(view, self.prepare(options.over(&declared.defaults)))
            }
            None => Err(QueryError::UnknownView {
                entity: self.entity.type_name().to_string(),
                view: name.to_string(),
            }),
        };
        self.observe("named_view", result)
    }

    fn compiler(&self) -> KeyCompiler<'_> {
        KeyCompiler::new(&self.entity, &self.profile, &self.config.discriminator_field)
    }

    fn execute(&self, query: &CompiledQuery) -> QueryResult<ViewResponse> {
        let executor = QueryExecutor::new(
            self.store.as_ref(),
            &self.registry,
            &self.metrics,
            &self.logger,
        );
        Ok(executor.execute(query)?)
    }

    /// Applies engine-wide configuration to call options
    fn prepare(&self, mut options: QueryOptions) -> QueryOptions {
        if !self.config.update_index {
            options.skip_index_update = true;
        }
        options
    }

    fn find_inner(&self, options: QueryOptions) -> QueryResult<Vec<T>> {
        let query = self.compiler().compile_find(&options);
        let response = self.execute(&query)?;
        self.materialize(&options, response)
    }

    fn count_inner(&self, options: QueryOptions) -> QueryResult<u64> {
        let query = self.compiler().compile_count(&options);
        let response = self.execute(&query)?;
        let total = extract_count(&response, query.reduce_counted)?;
        self.metrics.increment_counts();
        Ok(cap_count(total, options.limit, options.offset))
    }

    fn custom_inner(
        &self,
        view: ViewDefinition,
        options: QueryOptions,
    ) -> QueryResult<QueryOutput<T>> {
        let query = self.compiler().compile_custom(view, &options)?;
        let response = self.execute(&query)?;
        let output =
            ResultMaterializer::for_query(&options, &self.entity).output(response.rows)?;
        if let QueryOutput::Documents(docs) = &output {
            self.metrics.add_documents_materialized(docs.len() as u64);
        }
        Ok(output)
    }

    fn find_by_ids_inner(&self, ids: &[String], options: QueryOptions) -> QueryResult<Vec<T>> {
        match ids {
            [] => Ok(Vec::new()),
            [id] => self.find_one_by_id(id, &options).map(|doc| vec![doc]),
            _ if self.profile.multi_key() => {
                // Conditions are checked in memory; the key is the id alone.
                let conditions = normalized_conditions(&options);
                let keys = ids
                    .iter()
                    .map(|id| Value::Array(vec![Value::from(id.as_str())]))
                    .collect();
                let lookup = QueryOptions {
                    conditions: Default::default(),
                    use_key: Some(vec![ID_FIELD.to_string()]),
                    keys: Some(keys),
                    limit: None,
                    offset: None,
                    descending: false,
                    ..options.clone()
                };

                let query = self.compiler().compile_find(&lookup);
                let response = self.execute(&query)?;
                let rows = response
                    .rows
                    .into_iter()
                    .filter(|row| satisfies(&conditions, &row.value))
                    .collect();
                let docs: Vec<T> =
                    ResultMaterializer::for_query(&options, &self.entity).documents(rows)?;
                self.metrics.add_documents_materialized(docs.len() as u64);
                Ok(docs)
            }
            _ => {
                let mut docs = Vec::with_capacity(ids.len());
                for id in ids {
                    match self.find_one_by_id(id, &options) {
                        Ok(doc) => docs.push(doc),
                        Err(err) if err.is_not_found() => continue,
                        Err(err) => return Err(err),
                    }
                }
                Ok(docs)
            }
        }
    }

    /// Fetches by id and checks entity membership and conditions in memory
    fn find_one_by_id(&self, id: &str, options: &QueryOptions) -> QueryResult<T> {
        let document = self.store.get(id)?;

        let is_entity = document
            .get(&self.config.discriminator_field)
            .and_then(Value::as_str)
            == Some(self.entity.discriminator());
        if !is_entity || !satisfies(&normalized_conditions(options), &document) {
            return Err(StoreError::NotFound(format!(
                "{} '{}'",
                self.entity.type_name(),
                id
            ))
            .into());
        }

        let doc = ResultMaterializer::for_query(options, &self.entity).document(document)?;
        self.metrics.add_documents_materialized(1);
        Ok(doc)
    }

    fn materialize(&self, options: &QueryOptions, response: ViewResponse) -> QueryResult<Vec<T>> {
        let docs: Vec<T> =
            ResultMaterializer::for_query(options, &self.entity).documents(response.rows)?;
        self.metrics.add_documents_materialized(docs.len() as u64);
        Ok(docs)
    }

    /// Counts the outcome and logs failures with their code
    fn observe<R>(&self, operation: &str, result: QueryResult<R>) -> QueryResult<R> {
        match &result {
            Ok(_) => self.metrics.increment_queries_executed(),
            Err(err) => {
                self.metrics.increment_queries_failed();
                let message = err.to_string();
                self.logger.event(
                    Event::QueryFailed,
                    &[
                        ("code", err.code()),
                        ("entity", self.entity.type_name()),
                        ("message", message.as_str()),
                        ("operation", operation),
                    ],
                );
            }
        }
        result
    }
}

/// Checks normalized conditions against a document in memory
fn satisfies(conditions: &[(String, Condition)], document: &Value) -> bool {
    conditions
        .iter()
        .all(|(field, condition)| condition.matches(document.get(field)))
}
