//! Query module
//!
//! Builds the search request body sent when opening each scroll.
//!
//! # Overview
//!
//! The caller may provide a base document (usually read from standard
//! input). Defaults are only injected for keys the base document doesn't
//! set, so an explicit query always wins over flags.

mod builder;

pub use builder::{build_query, parse_base_query, QueryOptions};
