//! Error types for the query builder.
//!
//! Only configuration problems and API misuse surface as errors. HTTP-level
//! failures (status >= 300, transport errors, unreadable bodies) never do:
//! they collapse into empty results and the captured response stays
//! available through [`Builder::last_response`](crate::Builder::last_response).

use thiserror::Error;

/// Errors raised synchronously to the caller of a builder operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RestError {
    /// No connection is registered under the requested name.
    #[error("connection `{0}` not configured")]
    UnknownConnection(String),

    /// The registry or its transport options are unusable.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The model does not declare the parameter this operation maps onto.
    #[error("{0} is not supported by this API")]
    Unsupported(&'static str),

    /// The operation exists on the builder but has no implementation.
    #[error("the {0} method is not yet implemented")]
    NotImplemented(&'static str),

    /// Input handed to the builder could not be used.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience result type.
pub type RestResult<T> = Result<T, RestError>;
