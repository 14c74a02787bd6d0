//! Deterministic cache keys for read operations.
//!
//! Keys have the shape `{resource}:{operation}[:{qualifier}]`:
//!
//! ```text
//! customers:list:page=1&page_size=20
//! customers:list
//! customers:get:42
//! ```
//!
//! Query parameters are ordered by name, so equal queries always produce the
//! same key regardless of how the caller assembled them. Ids, names and values
//! are form-encoded, so a caller-supplied `&`, `=` or `:` cannot make two
//! different reads share a key, and `*` cannot act as a wildcard in the
//! invalidation patterns built from them.

use std::collections::BTreeMap;
use url::form_urlencoded::byte_serialize;

use crate::constants::operations;

/// Key for a collection read with the given query
pub fn list_key(resource: &str, query: &BTreeMap<String, String>) -> String {
    operation_key(resource, operations::LIST, query)
}

/// Key for a single-entity read
pub fn item_key(resource: &str, id: &str) -> String {
    format!("{resource}:{}:{}", operations::GET, escape(id))
}

/// Key for an arbitrary operation and parameter set
pub fn operation_key(resource: &str, operation: &str, params: &BTreeMap<String, String>) -> String {
    if params.is_empty() {
        return format!("{resource}:{operation}");
    }
    format!("{resource}:{operation}:{}", canonical_params(params))
}

/// Key for a single-entity read qualified by extra query parameters
pub fn item_query_key(resource: &str, id: &str, params: &BTreeMap<String, String>) -> String {
    let item = item_key(resource, id);
    if params.is_empty() {
        return item;
    }
    format!("{item}:{}", canonical_params(params))
}

/// `name=value` pairs joined by `&`, in name order
fn canonical_params(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(name, value)| format!("{}={}", escape(name), escape(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn escape(component: &str) -> String {
    byte_serialize(component.as_bytes())
        .collect::<String>()
        .replace('*', "%2A")
}

/// Pattern matching every cached listing of a resource
pub fn list_pattern(resource: &str) -> String {
    format!("{resource}:{}*", operations::LIST)
}

/// Pattern matching every cached read of a resource
pub fn resource_pattern(resource: &str) -> String {
    format!("{resource}:*")
}
