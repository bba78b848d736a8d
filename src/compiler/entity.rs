//! Entity descriptors
//!
//! What the query layer needs to know about one document type: its name,
//! the discriminator value its documents carry, and the fields that shape
//! default keys and default ordering.

use convert_case::{Case, Casing};

use super::options::QueryOptions;

/// A view declared up front on an entity, with its own map/reduce sources
#[derive(Debug, Clone, PartialEq)]
pub struct CustomView {
    pub name: String,
    pub map: String,
    pub reduce: Option<String>,
    /// Options applied under every call's options
    pub defaults: QueryOptions,
}

impl CustomView {
    pub fn new(name: impl Into<String>, map: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            map: map.into(),
            reduce: None,
            defaults: QueryOptions::default(),
        }
    }

    pub fn with_reduce(mut self, reduce: impl Into<String>) -> Self {
        self.reduce = Some(reduce.into());
        self
    }

    pub fn with_defaults(mut self, defaults: QueryOptions) -> Self {
        self.defaults = defaults;
        self
    }
}

/// Static description of one entity type
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    type_name: String,
    design_name: String,
    discriminator: String,
    created_at: Option<String>,
    default_sort: Option<String>,
    custom_views: Vec<CustomView>,
}

impl EntityDescriptor {
    /// Describes an entity. The discriminator defaults to the type name and
    /// the design document name is the type name in snake case.
    pub fn new(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            design_name: type_name.to_case(Case::Snake),
            discriminator: type_name.clone(),
            type_name,
            created_at: None,
            default_sort: None,
            custom_views: Vec::new(),
        }
    }

    /// Overrides the discriminator value stored on documents
    pub fn with_discriminator(mut self, value: impl Into<String>) -> Self {
        self.discriminator = value.into();
        self
    }

    /// Declares the creation timestamp field
    pub fn with_created_at(mut self, field: impl Into<String>) -> Self {
        self.created_at = Some(field.into());
        self
    }

    /// Sorts every materialized result by this field unless the query orders
    pub fn with_default_sort(mut self, field: impl Into<String>) -> Self {
        self.default_sort = Some(field.into());
        self
    }

    pub fn with_view(mut self, view: CustomView) -> Self {
        self.custom_views.push(view);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn design_name(&self) -> &str {
        &self.design_name
    }

    /// Returns the design document id (`_design/<name>`)
    pub fn design_id(&self) -> String {
        format!("_design/{}", self.design_name)
    }

    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    pub fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    pub fn default_sort(&self) -> Option<&str> {
        self.default_sort.as_deref()
    }

    pub fn custom_view(&self, name: &str) -> Option<&CustomView> {
        self.custom_views.iter().find(|v| v.name == name)
    }
}
