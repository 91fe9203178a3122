//! Pagination
//!
//! `Builder::paginate` asks the model's [`Paginate`] hook to shape the query
//! for a page, runs the query, then asks the hook for the total. Models
//! without a hook get the page length as total.

use crate::builder::normalize::lookup_value;
use crate::builder::Builder;
use crate::model::Model;
use serde::Serialize;

/// Pagination hooks a model can provide
pub trait Paginate<M: Model>: Send + Sync {
    /// Add page/size parameters to the query
    fn prepare(&self, builder: &mut Builder<M>, per_page: u64, page: u64);

    /// Total number of records, read after the page was fetched
    fn total(&self, _builder: &Builder<M>) -> Option<u64> {
        None
    }
}

/// Page/size query parameters with the total read from a header or body path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPagination {
    page_param: String,
    per_page_param: String,
    total_header: Option<String>,
    total_path: Option<String>,
}

impl QueryPagination {
    pub fn new(page_param: impl Into<String>, per_page_param: impl Into<String>) -> Self {
        Self {
            page_param: page_param.into(),
            per_page_param: per_page_param.into(),
            total_header: None,
            total_path: None,
        }
    }

    /// Read the total from a response header, e.g. `X-Total-Count`
    pub fn with_total_header(mut self, header: impl Into<String>) -> Self {
        self.total_header = Some(header.into());
        self
    }

    /// Read the total from a dotted path in the response body, e.g. `meta.total`
    pub fn with_total_path(mut self, path: impl Into<String>) -> Self {
        self.total_path = Some(path.into());
        self
    }
}

impl<M: Model> Paginate<M> for QueryPagination {
    fn prepare(&self, builder: &mut Builder<M>, per_page: u64, page: u64) {
        builder
            .filter(self.page_param.as_str(), page)
            .filter(self.per_page_param.as_str(), per_page);
    }

    fn total(&self, builder: &Builder<M>) -> Option<u64> {
        let response = builder.last_response()?;

        if let Some(header) = &self.total_header {
            if let Some(total) = response.header(header).and_then(|v| v.trim().parse().ok()) {
                return Some(total);
            }
        }

        let path = self.total_path.as_deref()?;
        let body = response.json()?;
        match lookup_value(&body, path)? {
            serde_json::Value::Number(number) => number.as_u64(),
            serde_json::Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<M> {
    pub items: Vec<M>,
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
}

impl<M> Paginated<M> {
    pub fn new(items: Vec<M>, total: u64, per_page: u64, current_page: u64) -> Self {
        Self {
            items,
            total,
            per_page,
            current_page,
        }
    }

    /// Number of the last page (at least 1)
    pub fn last_page(&self) -> u64 {
        if self.per_page == 0 {
            return 1;
        }
        self.total.div_ceil(self.per_page).max(1)
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, M> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<M> {
        self.items
    }
}

impl<M> IntoIterator for Paginated<M> {
    type Item = M;
    type IntoIter = std::vec::IntoIter<M>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, M> IntoIterator for &'a Paginated<M> {
    type Item = &'a M;
    type IntoIter = std::slice::Iter<'a, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_page_rounds_up() {
        let page = Paginated::new(vec![1; 10], 57, 10, 2);
        assert_eq!(page.last_page(), 6);
        assert!(page.has_more_pages());
        assert_eq!(page.len(), 10);
    }

    #[test]
    fn test_last_page_is_at_least_one() {
        let page: Paginated<u8> = Paginated::new(Vec::new(), 0, 10, 1);
        assert_eq!(page.last_page(), 1);
        assert!(!page.has_more_pages());
        assert!(page.is_empty());

        let page: Paginated<u8> = Paginated::new(Vec::new(), 5, 0, 1);
        assert_eq!(page.last_page(), 1);
    }
}
