//! Key compiler
//!
//! Turns query options into a view definition and encoded view parameters
//! without touching the network. Compilation is deterministic: the same
//! field set and operation always yield the same view name.

use serde_json::Value;

use crate::capability::{CapabilityProfile, CapabilityResult, Feature};
use crate::transport::{ViewParams, ViewPath};

use super::entity::EntityDescriptor;
use super::fields::SearchSpec;
use super::functions::{count_reduce_function, map_function};
use super::keys::{as_key_array, KeyEncoding};
use super::options::QueryOptions;
use super::view::{view_name, ViewDefinition, ViewPrefix};

/// What a compiled query is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Find,
    Count,
    Custom,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Find => "find",
            QueryKind::Count => "count",
            QueryKind::Custom => "custom",
        }
    }
}

/// How the view is asked for rows
#[derive(Debug, Clone, PartialEq)]
pub enum ViewRequest {
    /// One request
    Single(ViewParams),
    /// One exact-key request per key, for stores without multi-key lookups.
    /// Skip and limit apply to the merged, deduplicated rows.
    PerKey {
        requests: Vec<ViewParams>,
        skip: Option<u64>,
        limit: Option<u64>,
    },
}

impl ViewRequest {
    fn set_reduce(&mut self, reduce: Option<bool>) {
        match self {
            ViewRequest::Single(params) => params.reduce = reduce,
            ViewRequest::PerKey { requests, .. } => {
                for params in requests {
                    params.reduce = reduce;
                }
            }
        }
    }
}

/// A query ready for execution
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub kind: QueryKind,
    /// Key fields and conditions (custom views have no derived key fields)
    pub search: SearchSpec,
    pub view: ViewDefinition,
    pub path: ViewPath,
    pub request: ViewRequest,
    /// Count comes from the reduce step rather than from counting rows
    pub reduce_counted: bool,
    /// Evaluate directly instead of through the stored view
    pub ad_hoc: bool,
}

/// Compiles query options for one entity under one capability profile
pub struct KeyCompiler<'a> {
    entity: &'a EntityDescriptor,
    profile: &'a CapabilityProfile,
    discriminator_field: &'a str,
}

impl<'a> KeyCompiler<'a> {
    pub fn new(
        entity: &'a EntityDescriptor,
        profile: &'a CapabilityProfile,
        discriminator_field: &'a str,
    ) -> Self {
        Self {
            entity,
            profile,
            discriminator_field,
        }
    }

    /// Compiles a finder query.
    ///
    /// On reduce-capable stores the finder view also carries the counting
    /// reduce, switched off here, so counts can reuse the same index.
    pub fn compile_find(&self, options: &QueryOptions) -> CompiledQuery {
        let search = SearchSpec::derive(options, self.entity);
        let view = self.generated_view(ViewPrefix::Find, &search.key_fields);

        let mut request = self.request(KeyEncoding::encode(&search.conditions), options, true);
        if view.has_reduce() {
            request.set_reduce(Some(false));
        }

        CompiledQuery {
            kind: QueryKind::Find,
            path: self.path(&view),
            search,
            view,
            request,
            reduce_counted: false,
            ad_hoc: options.ad_hoc,
        }
    }

    /// Compiles a count query.
    ///
    /// Offset and limit are never sent: they would page over the reduced row
    /// rather than the matches. Callers cap the count afterwards.
    pub fn compile_count(&self, options: &QueryOptions) -> CompiledQuery {
        let search = SearchSpec::derive(options, self.entity);
        let encoding = KeyEncoding::encode(&search.conditions);
        let multi = matches!(encoding, KeyEncoding::Multi(_)) || options.keys.is_some();

        let (view, reduce_counted) = if self.profile.reduce_counting() {
            // Reducing over a key list is not a single total, so count rows.
            (
                self.generated_view(ViewPrefix::Find, &search.key_fields),
                !multi,
            )
        } else {
            (
                self.generated_view(ViewPrefix::Count, &search.key_fields),
                false,
            )
        };

        let mut request = self.request(encoding, options, false);
        if view.has_reduce() && !reduce_counted {
            request.set_reduce(Some(false));
        }

        CompiledQuery {
            kind: QueryKind::Count,
            path: self.path(&view),
            search,
            view,
            request,
            reduce_counted,
            ad_hoc: options.ad_hoc,
        }
    }

    /// Compiles a query against a caller-supplied view.
    ///
    /// Conditions are encoded against whatever key the custom map emits.
    /// Switching a reduce off needs a store that supports it.
    pub fn compile_custom(
        &self,
        view: ViewDefinition,
        options: &QueryOptions,
    ) -> CapabilityResult<CompiledQuery> {
        if view.has_reduce() && options.reduce == Some(false) {
            self.profile.require(Feature::ReduceCounting)?;
        }

        let search = SearchSpec::derive(options, self.entity);
        let search = SearchSpec {
            key_fields: Vec::new(),
            conditions: search.conditions,
        };

        let mut request = self.request(KeyEncoding::encode(&search.conditions), options, true);
        request.set_reduce(options.reduce);

        Ok(CompiledQuery {
            kind: QueryKind::Custom,
            path: self.path(&view),
            search,
            view,
            request,
            reduce_counted: false,
            ad_hoc: options.ad_hoc,
        })
    }

    fn generated_view(&self, prefix: ViewPrefix, key_fields: &[String]) -> ViewDefinition {
        let reduce = match prefix {
            ViewPrefix::Find if self.profile.reduce_counting() => Some(count_reduce_function()),
            ViewPrefix::Find => None,
            ViewPrefix::Count => None,
        };

        ViewDefinition::new(
            view_name(prefix, key_fields),
            map_function(
                self.discriminator_field,
                self.entity.discriminator(),
                key_fields,
            ),
            reduce,
        )
    }

    fn path(&self, view: &ViewDefinition) -> ViewPath {
        ViewPath::new(self.entity.design_name(), view.name.clone())
    }

    /// Builds the view request.
    ///
    /// Explicit start/end keys and key lists win over encoded conditions.
    /// Descending swaps start and end since the store reverses before it
    /// applies the range.
    fn request(&self, encoding: KeyEncoding, options: &QueryOptions, paging: bool) -> ViewRequest {
        let mut base = ViewParams {
            descending: options.descending,
            stale: options.skip_index_update,
            ..ViewParams::default()
        };
        let mut keys: Option<Vec<Value>> = None;

        match encoding {
            KeyEncoding::Unbounded => {}
            KeyEncoding::Exact(key) => base.key = Some(key),
            KeyEncoding::Range { start, end } => {
                base.start_key = Some(start);
                base.end_key = Some(end);
            }
            KeyEncoding::Multi(list) => keys = Some(list),
        }

        if let Some(start) = &options.start_key {
            base.start_key = Some(start.clone());
        }
        if let Some(end) = &options.end_key {
            base.end_key = Some(end.clone());
        }
        if let Some(list) = &options.keys {
            keys = Some(list.clone());
        }

        if base.descending {
            std::mem::swap(&mut base.start_key, &mut base.end_key);
        }
        base.start_key = base.start_key.map(as_key_array);
        base.end_key = base.end_key.map(as_key_array);

        let (skip, limit) = if paging {
            (options.offset, options.limit)
        } else {
            (None, None)
        };

        match keys {
            Some(list) if !self.profile.multi_key() => ViewRequest::PerKey {
                requests: list
                    .into_iter()
                    .map(|key| ViewParams {
                        key: Some(key),
                        ..base.clone()
                    })
                    .collect(),
                skip,
                limit,
            },
            list => {
                base.keys = list;
                base.skip = skip;
                base.limit = limit.map(|n| (self.profile.limit_param(), n));
                ViewRequest::Single(base)
            }
        }
    }
}
