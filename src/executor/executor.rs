//! Query executor
//!
//! Runs compiled queries against the store.
//!
//! ```text
//! Compiled ──ok──────────────▶ Materialized
//!    │ view missing (first time)
//!    ▼
//! Registering ──ensure──▶ Compiled (retry once)
//!                            │ view missing again
//!                            ▼
//!                          Failed
//! ```
//!
//! Any other store error fails immediately. Ad-hoc queries skip the whole
//! machine and evaluate the sources directly.

use std::collections::HashSet;

use crate::compiler::{CompiledQuery, ViewRequest};
use crate::observability::{Event, Logger, MetricsRegistry};
use crate::registry::{EnsureOutcome, IndexRegistry};
use crate::transport::{DocumentStore, ViewParams, ViewResponse, ViewRow};

use super::errors::{ExecutorError, ExecutorResult};

/// Where one view request stands
#[derive(Debug)]
enum State {
    Compiled,
    Registering,
    Materialized(ViewResponse),
    Failed(ExecutorError),
}

/// Executes compiled queries for one entity
pub struct QueryExecutor<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    registry: &'a IndexRegistry,
    metrics: &'a MetricsRegistry,
    logger: &'a Logger,
}

impl<'a, S: DocumentStore + ?Sized> QueryExecutor<'a, S> {
    pub fn new(
        store: &'a S,
        registry: &'a IndexRegistry,
        metrics: &'a MetricsRegistry,
        logger: &'a Logger,
    ) -> Self {
        Self {
            store,
            registry,
            metrics,
            logger,
        }
    }

    /// Executes a compiled query and returns the rows as the store sent them
    /// (merged and paged when the key list was split per key).
    pub fn execute(&self, query: &CompiledQuery) -> ExecutorResult<ViewResponse> {
        match &query.request {
            ViewRequest::Single(params) => self.fetch(query, params),
            ViewRequest::PerKey {
                requests,
                skip,
                limit,
            } => {
                let view = query.path.to_string();
                let key_count = requests.len().to_string();
                self.logger.event(
                    Event::MultiKeyFallback,
                    &[("keys", key_count.as_str()), ("view", view.as_str())],
                );
                self.metrics.add_fallback_queries(requests.len() as u64);

                let responses = requests
                    .iter()
                    .map(|params| self.fetch(query, params))
                    .collect::<ExecutorResult<Vec<_>>>()?;
                Ok(merge_responses(responses, *skip, *limit))
            }
        }
    }

    fn fetch(&self, query: &CompiledQuery, params: &ViewParams) -> ExecutorResult<ViewResponse> {
        if query.ad_hoc {
            self.fetch_ad_hoc(query, params)
        } else {
            self.fetch_view(query, params)
        }
    }

    fn fetch_ad_hoc(
        &self,
        query: &CompiledQuery,
        params: &ViewParams,
    ) -> ExecutorResult<ViewResponse> {
        self.logger.event(Event::AdHocQuery, &[("view", query.view.name.as_str())]);
        self.metrics.increment_ad_hoc_queries();

        Ok(self
            .store
            .query_ad_hoc(&query.view.map, query.view.reduce.as_deref(), params)?)
    }

    /// Queries the stored view, registering it once if the store lacks it
    fn fetch_view(
        &self,
        query: &CompiledQuery,
        params: &ViewParams,
    ) -> ExecutorResult<ViewResponse> {
        let view = query.path.to_string();
        let mut registered: Option<EnsureOutcome> = None;
        let mut state = State::Compiled;

        loop {
            state = match state {
                State::Materialized(response) => return Ok(response),
                State::Failed(err) => return Err(err),
                State::Compiled => self.query_once(query, params, &view, registered),
                State::Registering => match self.registry.ensure(self.store, &query.view) {
                    Ok(outcome) => {
                        self.record_registration(&view, outcome);
                        registered = Some(outcome);
                        State::Compiled
                    }
                    Err(err) => State::Failed(err.into()),
                },
            };
        }
    }

    fn query_once(
        &self,
        query: &CompiledQuery,
        params: &ViewParams,
        view: &str,
        registered: Option<EnsureOutcome>,
    ) -> State {
        self.logger.event(
            Event::ViewQueryBegin,
            &[("kind", query.kind.as_str()), ("view", view)],
        );
        self.metrics.increment_view_queries();

        match self.store.query_view(&query.path, params) {
            Ok(response) => {
                let rows = response.rows.len().to_string();
                self.logger.event(
                    Event::ViewQueryComplete,
                    &[("rows", rows.as_str()), ("view", view)],
                );
                State::Materialized(response)
            }
            Err(err) if err.is_not_found() => match registered {
                None => {
                    self.logger.event(Event::ViewMissing, &[("view", view)]);
                    self.metrics.increment_view_misses();
                    State::Registering
                }
                Some(_) => State::Failed(ExecutorError::ViewUnavailable {
                    view: view.to_string(),
                    source: err,
                }),
            },
            Err(err) => State::Failed(err.into()),
        }
    }

    fn record_registration(&self, view: &str, outcome: EnsureOutcome) {
        match outcome {
            EnsureOutcome::Created => {
                self.logger.event(
                    Event::DesignDocumentCreated,
                    &[("design", self.registry.design_id()), ("view", view)],
                );
                self.metrics.increment_design_documents_created();
                self.metrics.increment_views_registered();
            }
            EnsureOutcome::Extended => {
                self.logger.event(Event::ViewRegistered, &[("view", view)]);
                self.metrics.increment_views_registered();
            }
            EnsureOutcome::AlreadyPresent => {}
        }
    }
}

/// Concatenates per-key responses, keeping the first row seen for each
/// document id, then applies skip and limit to the merged rows
fn merge_responses(
    responses: Vec<ViewResponse>,
    skip: Option<u64>,
    limit: Option<u64>,
) -> ViewResponse {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged: Vec<ViewRow> = Vec::new();

    for row in responses.into_iter().flat_map(|r| r.rows) {
        match &row.id {
            Some(id) if !seen.insert(id.clone()) => continue,
            _ => merged.push(row),
        }
    }

    let rows = merged
        .into_iter()
        .skip(skip.unwrap_or(0) as usize)
        .take(limit.map(|n| n as usize).unwrap_or(usize::MAX))
        .collect();

    ViewResponse::from_rows(rows)
}
