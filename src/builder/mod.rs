//! Query builder
//!
//! A [`Builder`] collects everything one API call needs (query parameters,
//! payload, resource id, action) and turns the response into model
//! instances. Chained calls take `&mut self`, terminal calls run the
//! request.
//!
//! # Architecture
//!
//! - [`endpoint`] - Assembles `url/version/namespace/id/action`
//! - [`normalize`] - Finds the record list inside a decoded body
//! - [`scope`] - Named query mutations registered per model
//!
//! # Example
//!
//! ```ignore
//! let mut query = User::query(&registry)?;
//! query.filter("role", "admin").scope("active", &[]);
//! query.take(20)?;
//! let admins: Vec<User> = query.get().await;
//! ```

pub mod endpoint;
pub mod normalize;
mod scope;

pub use scope::{ScopeHandler, ScopeRegistry};

use crate::config::{ConnectionConfig, ConnectionRegistry};
use crate::error::{RestError, RestResult};
use crate::http::{HttpExecutor, RawResponse};
use crate::model::{Model, ModelDescriptor};
use crate::pagination::Paginated;
use endpoint::assemble_endpoint;
use normalize::normalize;
use reqwest::Method;
use serde_json::{Map, Value};
use std::fmt;

/// Per-query state bound to one model type
pub struct Builder<M: Model> {
    descriptor: ModelDescriptor<M>,
    connection: String,
    config: ConnectionConfig,
    executor: HttpExecutor,
    query: Map<String, Value>,
    payload: Option<Value>,
    action: Option<String>,
    id: Option<String>,
    last_response: Option<RawResponse>,
    dataset: Option<Value>,
}

impl<M: Model> Builder<M> {
    /// Create a builder on the model's connection and run its default scopes
    pub fn new(registry: &ConnectionRegistry) -> RestResult<Self> {
        let descriptor = M::descriptor();
        let connection = descriptor
            .connection()
            .unwrap_or_else(|| registry.default_connection())
            .to_string();
        let config = registry.resolve(&connection)?.clone();
        let executor = HttpExecutor::new(&config.options)?;

        let mut builder = Self {
            descriptor,
            connection,
            config,
            executor,
            query: Map::new(),
            payload: None,
            action: None,
            id: None,
            last_response: None,
            dataset: None,
        };
        builder.init_scopes();

        Ok(builder)
    }

    /// Run the API call on another connection
    pub fn on(&mut self, registry: &ConnectionRegistry, connection: &str) -> RestResult<&mut Self> {
        let config = registry.resolve(connection)?.clone();
        self.executor = HttpExecutor::new(&config.options)?;
        self.config = config;
        self.connection = connection.to_string();
        Ok(self)
    }

    fn init_scopes(&mut self) {
        let names = self.descriptor.scope_names().to_vec();
        for name in &names {
            self.call_scope(name, &[]);
        }
    }

    // =========================================================================
    // Query state
    // =========================================================================

    /// Set a query parameter (the `where` of the query)
    #[doc(alias = "where")]
    pub fn filter(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Limit the number of results through the model's take parameter
    pub fn take(&mut self, take: u64) -> RestResult<&mut Self> {
        let Some(param) = self.descriptor.take_param().map(str::to_string) else {
            return Err(RestError::Unsupported("take"));
        };
        Ok(self.filter(param, take))
    }

    /// Order the results through the model's order parameter
    pub fn order_by(&mut self, order: impl Into<Value>) -> RestResult<&mut Self> {
        let Some(param) = self.descriptor.order_param().map(str::to_string) else {
            return Err(RestError::Unsupported("order_by"));
        };
        Ok(self.filter(param, order))
    }

    /// Set the action segment appended after the resource id
    pub fn action(&mut self, action: impl Into<String>) -> &mut Self {
        self.action = Some(action.into());
        self
    }

    /// Set the resource id segment
    ///
    /// The id is percent-encoded into a single path segment: a `/` inside it
    /// is sent as `%2F`, never as a path separator. Use
    /// [`action`](Self::action) for extra segments.
    pub fn id(&mut self, id: impl ToString) -> &mut Self {
        self.id = Some(id.to_string());
        self
    }

    /// Set the JSON payload sent with the request
    pub fn payload(&mut self, payload: impl Into<Value>) -> &mut Self {
        self.payload = Some(payload.into());
        self
    }

    /// Invoke a scope; unknown scopes leave the builder untouched
    pub fn scope(&mut self, name: &str, args: &[Value]) -> &mut Self {
        self.call_scope(name, args);
        self
    }

    /// Invoke a scope, reporting whether the model registers it
    pub fn call_scope(&mut self, name: &str, args: &[Value]) -> bool {
        let Some(handler) = self.descriptor.scopes().get(name) else {
            tracing::trace!("No scope `{}` on {}", name, self.descriptor.type_name());
            return false;
        };

        tracing::trace!("Applying scope `{}` on {}", name, self.descriptor.type_name());
        handler(self, args);
        true
    }

    /// Answer every request from this data instead of the API
    pub fn dataset(&mut self, data: Value) -> RestResult<&mut Self> {
        match data {
            Value::Array(_) | Value::Object(_) => {
                self.dataset = Some(data);
                Ok(self)
            }
            other => Err(RestError::InvalidInput(format!(
                "dataset must be a JSON array or object, got {}",
                other
            ))),
        }
    }

    /// Same as [`dataset`](Self::dataset), from a JSON string
    pub fn dataset_json(&mut self, json: &str) -> RestResult<&mut Self> {
        let data: Value = serde_json::from_str(json)
            .map_err(|e| RestError::InvalidInput(format!("invalid json sent as dataset: {}", e)))?;
        self.dataset(data)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// The namespace segment of this model's endpoints
    pub fn namespace(&self) -> Option<String> {
        self.descriptor.resolved_namespace()
    }

    /// The URL the next request goes to
    pub fn endpoint(&self) -> String {
        let namespace = self.namespace();
        assemble_endpoint(
            &self.config.url,
            self.config.version.as_deref(),
            namespace.as_deref(),
            self.id.as_deref(),
            self.action.as_deref(),
        )
    }

    pub fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    pub fn payload_value(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn connection(&self) -> &str {
        &self.connection
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn descriptor(&self) -> &ModelDescriptor<M> {
        &self.descriptor
    }

    /// Response of the last request, if one was made and answered
    pub fn last_response(&self) -> Option<&RawResponse> {
        self.last_response.as_ref()
    }

    /// Response of the last request, running a GET first if none was made
    pub async fn response(&mut self) -> Option<&RawResponse> {
        if self.last_response.is_none() {
            self.request(Method::GET).await;
        }
        self.last_response.as_ref()
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Perform the request and return the decoded body
    ///
    /// Failed requests and unreadable bodies yield `None`; the response, if
    /// any, stays available through [`last_response`](Self::last_response).
    pub async fn request(&mut self, method: Method) -> Option<Value> {
        if let Some(dataset) = &self.dataset {
            tracing::debug!("{} {} answered from dataset", method, self.endpoint());
            return Some(dataset.clone());
        }

        let endpoint = self.endpoint();
        let execution = self
            .executor
            .execute(method, &endpoint, &self.query, self.payload.as_ref())
            .await;

        self.last_response = execution.response;
        execution.body
    }

    /// Fetch the records matching the query
    pub async fn get(&mut self) -> Vec<M> {
        let body = self.request(Method::GET).await;
        let namespace = self.namespace();

        normalize(body, self.descriptor.root(), namespace.as_deref())
            .into_iter()
            .map(|record| self.descriptor.instantiate(record))
            .collect()
    }

    /// Fetch a single record by id
    pub async fn find(&mut self, id: impl ToString) -> Option<M> {
        self.id(id);
        self.get().await.into_iter().next()
    }

    /// POST `data` and wrap the returned object
    pub async fn create(&mut self, data: impl Into<Value>) -> Option<M> {
        self.payload = Some(data.into());

        match self.request(Method::POST).await {
            Some(Value::Object(record)) => Some(self.descriptor.instantiate(record)),
            Some(other) => {
                tracing::warn!(
                    "Create on {} returned a non-object body: {}",
                    self.endpoint(),
                    other
                );
                None
            }
            None => None,
        }
    }

    /// Fetch one page; `page` defaults to the first
    pub async fn paginate(&mut self, per_page: u64, page: Option<u64>) -> Paginated<M> {
        let page = page.unwrap_or(1);
        let hook = self.descriptor.pagination();

        if let Some(hook) = &hook {
            hook.prepare(self, per_page, page);
        }

        let items = self.get().await;

        let total = hook
            .and_then(|hook| hook.total(self))
            .filter(|total| *total > 0)
            .unwrap_or(items.len() as u64);

        Paginated::new(items, total, per_page, page)
    }

    /// Fetching everything at once has no implementation
    pub fn all(&self) -> RestResult<Vec<M>> {
        Err(RestError::NotImplemented("all"))
    }
}

impl<M: Model> fmt::Debug for Builder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("model", &self.descriptor.type_name())
            .field("connection", &self.connection)
            .field("endpoint", &self.endpoint())
            .field("query", &self.query)
            .field("payload", &self.payload)
            .field("dataset", &self.dataset.is_some())
            .field("last_status", &self.last_response.as_ref().map(|r| r.status))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;
    use serde_json::json;

    #[derive(Debug)]
    struct User(Record);

    impl Model for User {
        fn descriptor() -> ModelDescriptor<Self> {
            ModelDescriptor::new()
                .with_namespace("users")
                .with_root("users")
                .with_take_param("limit")
                .with_scope("active", |builder, _| {
                    builder.filter("status", "active");
                })
                .with_scope("role", |builder, args| {
                    if let Some(role) = args.first() {
                        builder.filter("role", role.clone());
                    }
                })
                .with_scope("mine", |builder, _| {
                    builder.action("mine");
                })
                .with_default_scope("active")
        }

        fn from_record(record: Record) -> Self {
            User(record)
        }
    }

    struct Tag(Record);

    impl Model for Tag {
        fn descriptor() -> ModelDescriptor<Self> {
            ModelDescriptor::new()
                .with_connection("tags")
                .without_namespace()
        }

        fn from_record(record: Record) -> Self {
            Tag(record)
        }
    }

    fn registry() -> ConnectionRegistry {
        ConnectionRegistry::new("main")
            .with_connection(
                "main",
                ConnectionConfig::new("https://api.example.com").with_version("v1"),
            )
            .with_connection("tags", ConnectionConfig::new("https://tags.example.com/"))
    }

    #[test]
    fn test_default_scopes_run_at_construction() {
        let builder = User::query(&registry()).unwrap();
        assert_eq!(builder.query().get("status"), Some(&json!("active")));
        assert_eq!(builder.connection(), "main");
    }

    #[test]
    fn test_scope_with_arguments_and_unknown_scope() {
        let mut builder = User::query(&registry()).unwrap();
        builder
            .scope("role", &[json!("admin")])
            .scope("does_not_exist", &[json!(1)]);

        assert_eq!(builder.query().get("role"), Some(&json!("admin")));
        assert_eq!(builder.query().len(), 2);
        assert!(!builder.call_scope("does_not_exist", &[]));
        assert!(builder.call_scope("mine", &[]));
        assert_eq!(builder.endpoint(), "https://api.example.com/v1/users/mine");
    }

    #[test]
    fn test_filter_last_write_wins() {
        let mut builder = User::query(&registry()).unwrap();
        builder.filter("page", 1).filter("page", 2);
        assert_eq!(builder.query().get("page"), Some(&json!(2)));
    }

    #[test]
    fn test_take_and_order_by() {
        let mut builder = User::query(&registry()).unwrap();
        builder.take(5).unwrap();
        assert_eq!(builder.query().get("limit"), Some(&json!(5)));
        assert_eq!(
            builder.order_by("name").unwrap_err(),
            RestError::Unsupported("order_by")
        );

        let mut tags = Tag::query(&registry()).unwrap();
        assert_eq!(tags.take(5).unwrap_err(), RestError::Unsupported("take"));
    }

    #[test]
    fn test_id_and_action_overwrite() {
        let mut builder = User::query(&registry()).unwrap();
        builder.id(5).action("posts").id(7).action("comments");
        assert_eq!(
            builder.endpoint(),
            "https://api.example.com/v1/users/7/comments"
        );
    }

    #[test]
    fn test_slash_in_id_stays_one_segment() {
        let mut builder = User::query(&registry()).unwrap();
        builder.id("team/42").action("members");
        assert_eq!(
            builder.endpoint(),
            "https://api.example.com/v1/users/team%2F42/members"
        );
    }

    #[test]
    fn test_model_connection_and_disabled_namespace() {
        let mut tags = Tag::query(&registry()).unwrap();
        assert_eq!(tags.connection(), "tags");
        tags.id("rust");
        assert_eq!(tags.endpoint(), "https://tags.example.com/rust");
    }

    #[test]
    fn test_unknown_connection_fails_at_construction() {
        let registry = ConnectionRegistry::new("main");
        let err = User::query(&registry).unwrap_err();
        assert_eq!(err, RestError::UnknownConnection("main".to_string()));
    }

    #[test]
    fn test_bad_timeout_fails_at_construction() {
        let options = crate::config::TransportOptions {
            timeout: Some(-1.0),
            ..Default::default()
        };
        let registry = ConnectionRegistry::new("main").with_connection(
            "main",
            ConnectionConfig::new("https://api.example.com").with_options(options),
        );

        assert!(matches!(
            User::query(&registry).unwrap_err(),
            RestError::Configuration(_)
        ));
    }

    #[test]
    fn test_on_switches_connection() {
        let registry = registry();
        let mut builder = User::query(&registry).unwrap();
        builder.on(&registry, "tags").unwrap();
        assert_eq!(builder.endpoint(), "https://tags.example.com/users");
        assert!(builder.on(&registry, "nope").is_err());
        assert_eq!(builder.connection(), "tags");
    }

    #[test]
    fn test_all_is_not_implemented() {
        let builder = User::query(&registry()).unwrap();
        assert_eq!(builder.all().unwrap_err(), RestError::NotImplemented("all"));
    }

    #[test]
    fn test_dataset_validation() {
        let mut builder = User::query(&registry()).unwrap();
        assert!(builder.dataset(json!(42)).is_err());
        assert!(builder.dataset_json("{not json").is_err());
        assert!(builder.dataset_json("[]").is_ok());
    }

    #[test]
    fn test_dataset_bypasses_network() {
        let mut builder = User::query(&registry()).unwrap();
        builder
            .dataset_json(r#"{"users": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]}"#)
            .unwrap();

        let users = tokio_test::block_on(builder.get());
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].0.get("name"), Some(json!("b")));
        assert!(builder.last_response().is_none());
    }

    #[test]
    fn test_find_uses_dataset_and_sets_id() {
        let mut builder = User::query(&registry()).unwrap();
        builder.dataset(json!([{"id": 5}])).unwrap();

        let user = tokio_test::block_on(builder.find(5));
        assert_eq!(user.unwrap().0.get("id"), Some(json!(5)));
        assert_eq!(builder.endpoint(), "https://api.example.com/v1/users/5");
    }

    #[test]
    fn test_create_from_dataset_object() {
        let mut builder = User::query(&registry()).unwrap();
        builder.dataset(json!({"id": 9, "name": "a"})).unwrap();

        let user = tokio_test::block_on(builder.create(json!({"name": "a"}))).unwrap();
        assert_eq!(
            user.0.attributes(),
            json!({"id": 9, "name": "a"}).as_object().unwrap()
        );
        assert_eq!(builder.payload_value(), Some(&json!({"name": "a"})));
    }

    #[test]
    fn test_paginate_without_hook_uses_page_length() {
        let mut builder = User::query(&registry()).unwrap();
        builder.dataset(json!([{"id": 1}, {"id": 2}, {"id": 3}])).unwrap();

        let page = tokio_test::block_on(builder.paginate(10, None));
        assert_eq!(page.total, 3);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.per_page, 10);
    }
}
