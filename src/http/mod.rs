//! HTTP transport module
//!
//! Provides the three-verb transport contract used by the scroll engine and
//! its reqwest-backed implementation.
//!
//! # Features
//!
//! - **Transport trait**: `get` / `delete` with optional JSON body, returning
//!   the status and raw body so callers decide how to interpret non-200s
//! - **TLS**: system roots, a custom CA file, or no verification
//! - **Compression**: gzip on by default, switchable off

mod client;

pub use client::{
    is_loopback, HttpClient, HttpClientConfig, HttpClientConfigBuilder, Response, Transport,
    VerifyMode,
};
