//! Common types used throughout esdump
//!
//! Shared type aliases used across multiple modules.

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Search request body sent when opening a scroll
pub type QueryDocument = JsonObject;

/// One raw hit payload, exactly as returned by the cluster
pub type Record = bytes::Bytes;
