//! Scope registry
//!
//! Scopes are named query mutations a model offers, e.g. `active` adding
//! `status=active`. Lookups of unknown names simply miss; the builder treats
//! that as a no-op.

use super::Builder;
use crate::model::Model;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A scope handler receives the builder and the call's arguments
pub type ScopeHandler<M> = Arc<dyn Fn(&mut Builder<M>, &[Value]) + Send + Sync>;

/// Named scope handlers of one model
pub struct ScopeRegistry<M: Model> {
    handlers: BTreeMap<String, ScopeHandler<M>>,
}

impl<M: Model> ScopeRegistry<M> {
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Register (or replace) a handler
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&mut Builder<M>, &[Value]) + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<ScopeHandler<M>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<M: Model> Default for ScopeRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Clone for ScopeRegistry<M> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}
