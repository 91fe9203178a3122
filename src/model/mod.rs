//! Model descriptors
//!
//! A model type describes how it maps onto a REST resource by returning a
//! [`ModelDescriptor`] from [`Model::descriptor`]: which connection it talks
//! to, the path segment of its collection, where the records sit in a
//! response, which scopes it offers and which run by default.
//!
//! # Example
//!
//! ```ignore
//! use restmodel::{Model, ModelDescriptor, Record};
//!
//! struct User(Record);
//!
//! impl Model for User {
//!     fn descriptor() -> ModelDescriptor<Self> {
//!         ModelDescriptor::new()
//!             .with_root("users")
//!             .with_take_param("limit")
//!             .with_scope("active", |builder, _| {
//!                 builder.filter("status", "active");
//!             })
//!     }
//!
//!     fn from_record(record: Record) -> Self {
//!         User(record)
//!     }
//! }
//! ```

mod record;

pub use record::{Accessor, AttributeSchema, Formatter, Record, DEFAULT_DATE_FORMAT};

use crate::builder::{Builder, ScopeRegistry};
use crate::config::ConnectionRegistry;
use crate::error::RestResult;
use crate::inflect;
use crate::pagination::Paginate;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// A type backed by a REST resource
pub trait Model: Sized + 'static {
    /// Describe how the type maps onto its API
    fn descriptor() -> ModelDescriptor<Self>;

    /// Wrap a normalized record
    fn from_record(record: Record) -> Self;

    /// Start a query against this model's API
    fn query(registry: &ConnectionRegistry) -> RestResult<Builder<Self>> {
        Builder::new(registry)
    }
}

/// Path segment of a model's collection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Namespace {
    /// Snake-cased type name (`BlogPost` -> `blog_post`)
    #[default]
    Derived,
    Named(String),
    /// The model's endpoints carry no namespace segment
    Disabled,
}

/// Per-model metadata consumed by the [`Builder`]
pub struct ModelDescriptor<M: Model> {
    type_name: String,
    connection: Option<String>,
    namespace: Namespace,
    root: Option<String>,
    scope_names: Vec<String>,
    scopes: ScopeRegistry<M>,
    take_param: Option<String>,
    order_param: Option<String>,
    pagination: Option<Arc<dyn Paginate<M>>>,
    schema: Arc<AttributeSchema>,
}

impl<M: Model> Default for ModelDescriptor<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Clone for ModelDescriptor<M> {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name.clone(),
            connection: self.connection.clone(),
            namespace: self.namespace.clone(),
            root: self.root.clone(),
            scope_names: self.scope_names.clone(),
            scopes: self.scopes.clone(),
            take_param: self.take_param.clone(),
            order_param: self.order_param.clone(),
            pagination: self.pagination.clone(),
            schema: Arc::clone(&self.schema),
        }
    }
}

impl<M: Model> ModelDescriptor<M> {
    /// Descriptor with defaults; the type name comes from `M`
    pub fn new() -> Self {
        Self {
            type_name: inflect::type_basename(std::any::type_name::<M>()).to_string(),
            connection: None,
            namespace: Namespace::Derived,
            root: None,
            scope_names: Vec::new(),
            scopes: ScopeRegistry::new(),
            take_param: None,
            order_param: None,
            pagination: None,
            schema: Arc::new(AttributeSchema::default()),
        }
    }

    // =========================================================================
    // Declaration
    // =========================================================================

    /// Override the type name used to derive the namespace
    pub fn with_type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = name.into();
        self
    }

    /// Use a named connection instead of the registry default
    pub fn with_connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = Some(connection.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Namespace::Named(namespace.into());
        self
    }

    pub fn without_namespace(mut self) -> Self {
        self.namespace = Namespace::Disabled;
        self
    }

    /// Key under which list responses nest their records
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Query parameter `take()` writes to
    pub fn with_take_param(mut self, param: impl Into<String>) -> Self {
        self.take_param = Some(param.into());
        self
    }

    /// Query parameter `order_by()` writes to
    pub fn with_order_param(mut self, param: impl Into<String>) -> Self {
        self.order_param = Some(param.into());
        self
    }

    /// Register a scope handler
    pub fn with_scope<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Builder<M>, &[Value]) + Send + Sync + 'static,
    {
        self.scopes.register(name, handler);
        self
    }

    /// Run a scope on every new builder, after the ones already declared
    pub fn with_default_scope(mut self, name: impl Into<String>) -> Self {
        self.scope_names.push(name.into());
        self
    }

    /// Pagination hooks used by `paginate()`
    pub fn with_pagination<P>(mut self, pagination: P) -> Self
    where
        P: Paginate<M> + 'static,
    {
        self.pagination = Some(Arc::new(pagination));
        self
    }

    /// Attributes cast to dates
    pub fn with_dates<I, S>(mut self, dates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::make_mut(&mut self.schema)
            .dates
            .extend(dates.into_iter().map(Into::into));
        self
    }

    /// `chrono` format string for date attributes
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.schema).date_format = Some(format.into());
        self
    }

    /// Register a computed attribute
    pub fn with_accessor<F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> Value + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.schema)
            .accessors
            .insert(name.into(), Arc::new(accessor));
        self
    }

    /// Store an accessor's value in the attributes of every record
    pub fn with_append(mut self, name: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.schema).appends.push(name.into());
        self
    }

    /// Reshape raw records before they are stored
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(Map<String, Value>) -> Map<String, Value> + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.schema).formatter = Some(Arc::new(formatter));
        self
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn connection(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// The namespace segment endpoints use, if any
    pub fn resolved_namespace(&self) -> Option<String> {
        match &self.namespace {
            Namespace::Disabled => None,
            Namespace::Named(name) if !name.is_empty() => Some(name.clone()),
            Namespace::Named(_) | Namespace::Derived => Some(inflect::snake_case(&self.type_name)),
        }
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn scope_names(&self) -> &[String] {
        &self.scope_names
    }

    pub fn scopes(&self) -> &ScopeRegistry<M> {
        &self.scopes
    }

    pub fn take_param(&self) -> Option<&str> {
        self.take_param.as_deref()
    }

    pub fn order_param(&self) -> Option<&str> {
        self.order_param.as_deref()
    }

    pub fn pagination(&self) -> Option<Arc<dyn Paginate<M>>> {
        self.pagination.clone()
    }

    pub fn attribute_schema(&self) -> Arc<AttributeSchema> {
        Arc::clone(&self.schema)
    }

    /// Build a record from raw data and wrap it in the model type
    pub fn instantiate(&self, data: Map<String, Value>) -> M {
        M::from_record(Record::build(data, self.attribute_schema()))
    }
}

impl<M: Model> fmt::Debug for ModelDescriptor<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("type_name", &self.type_name)
            .field("connection", &self.connection)
            .field("namespace", &self.namespace)
            .field("root", &self.root)
            .field("scope_names", &self.scope_names)
            .field("scopes", &self.scopes.names())
            .field("take_param", &self.take_param)
            .field("order_param", &self.order_param)
            .field("pagination", &self.pagination.is_some())
            .field("schema", &self.schema)
            .finish()
    }
}
