//! Query document construction

use crate::error::{Error, Result};
use crate::types::{JsonValue, QueryDocument};
use serde_json::json;

/// Flags that shape the query document
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Comma-separated fields to include, or to exclude when prefixed with `^`
    pub fields: Option<String>,
    /// Lucene query string
    pub query_string: Option<String>,
    /// Disable `_source` entirely
    pub metadata_only: bool,
    /// Page size
    pub size: usize,
    /// Random document order
    pub random: bool,
}

/// Parse a user-provided base document
///
/// Blank input means no base document.
pub fn parse_base_query(input: &str) -> Result<Option<QueryDocument>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<JsonValue>(input)? {
        JsonValue::Object(map) => Ok(Some(map)),
        other => Err(Error::config(format!(
            "query must be a JSON object, got: {other}"
        ))),
    }
}

/// Build the scroll query from an optional base document and flags
pub fn build_query(base: Option<QueryDocument>, options: &QueryOptions) -> QueryDocument {
    let mut query = base.unwrap_or_default();

    if let Some(fields) = options.fields.as_deref().filter(|f| !f.is_empty()) {
        if !query.contains_key("_source") {
            query.insert("_source".to_string(), source_filter(fields));
        }
    }
    if options.metadata_only {
        query.insert("_source".to_string(), JsonValue::Bool(false));
    }
    query
        .entry("size")
        .or_insert_with(|| json!(options.size));
    query.entry("sort").or_insert_with(|| json!(["_doc"]));
    query.entry("query").or_insert_with(|| {
        match options.query_string.as_deref().filter(|q| !q.is_empty()) {
            Some(q) => json!({ "query_string": { "query": q } }),
            None => json!({ "match_all": {} }),
        }
    });

    if options.random {
        let inner = query.remove("query").unwrap_or_else(|| json!({ "match_all": {} }));
        query.insert(
            "query".to_string(),
            json!({
                "function_score": {
                    "query": inner,
                    "random_score": {},
                    "boost_mode": "replace"
                }
            }),
        );
        query.insert("sort".to_string(), json!(["_score"]));
    }

    query
}

fn source_filter(fields: &str) -> JsonValue {
    match fields.strip_prefix('^') {
        Some(excluded) => json!({ "excludes": split_fields(excluded) }),
        None => json!(split_fields(fields)),
    }
}

fn split_fields(fields: &str) -> Vec<&str> {
    fields.split(',').collect()
}
