//! ActiveRecord-style query builder for REST APIs
//!
//! Models describe how they map onto a REST resource; a [`Builder`] turns
//! chained calls into one HTTP request and the JSON response into model
//! instances.
//!
//! # Module Structure
//!
//! - [`config`] - Named connections and the registry they are resolved from
//! - [`model`] - The [`Model`] trait, descriptors and [`Record`] instances
//! - [`builder`] - Query state, endpoint assembly and response normalization
//! - [`http`] - Request execution on top of `reqwest`
//! - [`pagination`] - Pagination hooks and page results
//! - [`logging`] - Optional file logger for the crate's `tracing` events
//!
//! # Example
//!
//! ```ignore
//! use restmodel::{ConnectionConfig, ConnectionRegistry, Model, ModelDescriptor, Record};
//!
//! struct User(Record);
//!
//! impl Model for User {
//!     fn descriptor() -> ModelDescriptor<Self> {
//!         ModelDescriptor::new().with_root("users").with_take_param("limit")
//!     }
//!
//!     fn from_record(record: Record) -> Self {
//!         User(record)
//!     }
//! }
//!
//! async fn example() -> anyhow::Result<()> {
//!     let registry = ConnectionRegistry::default()
//!         .with_connection("default", ConnectionConfig::new("https://api.example.com"));
//!
//!     let mut query = User::query(&registry)?;
//!     query.filter("role", "admin");
//!     query.take(10)?;
//!     let admins = query.get().await;
//!     Ok(())
//! }
//! ```
//!
//! # Failures
//!
//! Configuration mistakes and unsupported operations return [`RestError`].
//! HTTP failures do not: a status >= 300, a transport error or an unreadable
//! body produce an empty result, and [`Builder::last_response`] tells them
//! apart from a genuinely empty answer.

pub mod builder;
pub mod config;
pub mod error;
pub mod http;
pub mod inflect;
pub mod logging;
pub mod model;
pub mod pagination;

pub use builder::{Builder, ScopeHandler, ScopeRegistry};
pub use config::{BasicAuth, ConnectionConfig, ConnectionRegistry, TransportOptions};
pub use error::{RestError, RestResult};
pub use http::RawResponse;
pub use model::{AttributeSchema, Model, ModelDescriptor, Namespace, Record};
pub use pagination::{Paginate, Paginated, QueryPagination};
